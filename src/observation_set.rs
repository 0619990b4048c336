//! # Observation sets
//!
//! [`ObservationSet`] is the immutable input of every estimation run: `n` observations of a
//! `p`-dimensional quantity stored as an owned `n × p` [`DMatrix`] (one row per observation).
//!
//! ## Construction
//!
//! * [`ObservationSet::from_columns`] – `p` equal-length sequences, one per dimension.
//! * [`ObservationSet::from_rows`] – `n` fixed-size vectors, one per observation.
//! * [`ObservationSet::from_matrix`] – an existing `n × p` matrix.
//!
//! All constructors reject empty input, ragged sequences and non-finite values.
//!
//! ## Subsets
//!
//! Subset extraction (`select_rows`) always **copies** the selected rows into a
//! new set. A subset never aliases the full dataset, so a concentration step can re-rank every
//! observation of the full set while the current subset statistics stay untouched.
//!
//! ## Example
//!
//! ```rust
//! use fastmcd::observation_set::ObservationSet;
//!
//! let x1 = vec![1.0, 2.0, 3.0, 4.0];
//! let x2 = vec![2.0, 1.0, 4.0, 3.0];
//! let data = ObservationSet::from_columns(&[x1, x2]).unwrap();
//! assert_eq!(data.n(), 4);
//! assert_eq!(data.p(), 2);
//! ```
use nalgebra::{DMatrix, DVectorView, RowDVector};

use crate::mcd_errors::McdError;

/// `n` observations × `p` dimensions, rows are observations.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSet {
    data: DMatrix<f64>,
}

impl ObservationSet {
    /// Build a set from `p` columns of equal length (column-oriented input).
    ///
    /// Arguments
    /// -----------------
    /// * `columns`: one sequence per dimension, all of length `n`.
    ///
    /// Return
    /// ----------
    /// * The `n × p` observation set, or [`McdError::InvalidInput`] if there are no columns,
    ///   the columns are empty or of different lengths, or a value is not finite.
    pub fn from_columns<C: AsRef<[f64]>>(columns: &[C]) -> Result<Self, McdError> {
        let p = columns.len();
        if p == 0 {
            return Err(McdError::InvalidInput("no dimensions given".into()));
        }
        let n = columns[0].as_ref().len();
        if let Some((j, col)) = columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.as_ref().len() != n)
        {
            return Err(McdError::InvalidInput(format!(
                "dimension {j} has {} values, expected {n}",
                col.as_ref().len()
            )));
        }

        Self::from_matrix(DMatrix::from_fn(n, p, |i, j| columns[j].as_ref()[i]))
    }

    /// Build a set from `n` observation vectors of identical length `p` (row-oriented input).
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, McdError> {
        let n = rows.len();
        if n == 0 {
            return Err(McdError::InvalidInput("no observations given".into()));
        }
        let p = rows[0].as_ref().len();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.as_ref().len() != p) {
            return Err(McdError::InvalidInput(format!(
                "observation {i} has {} values, expected {p}",
                row.as_ref().len()
            )));
        }

        Self::from_matrix(DMatrix::from_fn(n, p, |i, j| rows[i].as_ref()[j]))
    }

    /// Wrap an existing `n × p` matrix.
    pub fn from_matrix(data: DMatrix<f64>) -> Result<Self, McdError> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(McdError::InvalidInput(format!(
                "empty observation set ({} x {})",
                data.nrows(),
                data.ncols()
            )));
        }
        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            // column-major storage
            let (i, j) = (pos % data.nrows(), pos / data.nrows());
            return Err(McdError::InvalidInput(format!(
                "non-finite value at observation {i}, dimension {j}"
            )));
        }
        Ok(ObservationSet { data })
    }

    /// Number of observations.
    #[inline]
    pub fn n(&self) -> usize {
        self.data.nrows()
    }

    /// Number of dimensions.
    #[inline]
    pub fn p(&self) -> usize {
        self.data.ncols()
    }

    #[inline]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Borrow the values of one dimension across all observations.
    #[inline]
    pub fn column(&self, j: usize) -> DVectorView<'_, f64> {
        self.data.column(j)
    }

    /// Copy of observation `i` as a row vector.
    #[inline]
    pub fn row(&self, i: usize) -> RowDVector<f64> {
        self.data.row(i).into_owned()
    }

    /// Copy the observations at `indices` (in the given order) into a new set.
    ///
    /// Indices always come from the estimator itself and are in bounds.
    pub(crate) fn select_rows(&self, indices: &[usize]) -> ObservationSet {
        ObservationSet {
            data: self.data.select_rows(indices.iter()),
        }
    }

    /// Check the structural requirements of an MCD run: `p ≥ 2` and `n > p`.
    pub fn validate_for_mcd(&self) -> Result<(), McdError> {
        if self.p() < 2 {
            return Err(McdError::InvalidInput(
                "univariate data (p = 1) is not supported".into(),
            ));
        }
        if self.n() <= self.p() {
            return Err(McdError::InvalidInput(format!(
                "need more observations than dimensions (n = {}, p = {})",
                self.n(),
                self.p()
            )));
        }
        Ok(())
    }
}

/// Coverage `h` of the MCD subset for `n` observations in `p` dimensions.
///
/// With `n2 = ⌊(n + p + 1) / 2⌋` the coverage is
///
/// ```text
/// h = ⌊2·n2 − n + 2·(n − n2)·alpha⌋
/// ```
///
/// so `alpha = 0.5` gives the maximal-breakdown choice `h = n2` and `alpha → 1` approaches `n`.
///
/// Return
/// ----------
/// * `h` with `p + 1 ≤ h < n`, or [`McdError::InvalidInput`] when the coverage would use
///   every observation (`h ≥ n`) or `n ≤ p`.
pub fn coverage_h(n: usize, p: usize, alpha: f64) -> Result<usize, McdError> {
    if n <= p {
        return Err(McdError::InvalidInput(format!(
            "need more observations than dimensions (n = {n}, p = {p})"
        )));
    }
    let n2 = (n + p + 1) / 2;
    let h = (2.0 * n2 as f64 - n as f64 + 2.0 * (n - n2) as f64 * alpha).floor() as usize;
    if h >= n {
        return Err(McdError::InvalidInput(format!(
            "coverage h = {h} must be smaller than n = {n} (p = {p}, alpha = {alpha})"
        )));
    }
    Ok(h.max(p + 1))
}
