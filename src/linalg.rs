//! # Linear algebra primitives
//!
//! Small set of dense helpers used by every stage of the estimator:
//!
//! * [`mean`] – per-dimension mean of an [`ObservationSet`],
//! * `sample_covariance` – unbiased covariance of two equal-length sequences (divisor `N − 1`),
//! * [`covariance_matrix`] – symmetric matrix of pairwise sample covariances,
//! * [`means_and_covariance`] – both of the above in one call,
//! * [`determinant`] / [`inverse`] – via the LU decomposition of [`nalgebra`],
//! * [`is_nonsingular`] – scale-free rank test of a scatter matrix.
//!
//! ## Singular matrices
//!
//! [`determinant`] never fails: a singular or degenerate matrix simply yields `0.0` or a tiny
//! rounding residue of either sign. The residue of exactly collinear data is not reliably zero,
//! so usability is decided by [`is_nonsingular`], which looks at the LU pivots of the matrix
//! rescaled to unit diagonal. [`inverse`] applies the same test and reports
//! [`McdError::SingularScatter`] when it fails.
use nalgebra::{DMatrix, DVector};

use crate::constants::{Location, Scatter, SINGULAR_PIVOT_RTOL};
use crate::mcd_errors::McdError;
use crate::observation_set::ObservationSet;

/// Per-dimension mean of the observations.
pub fn mean(data: &ObservationSet) -> Location {
    let n = data.n() as f64;
    DVector::from_iterator(
        data.p(),
        (0..data.p()).map(|j| data.column(j).sum() / n),
    )
}

/// Unbiased sample covariance of two sequences of identical length `N ≥ 2`.
///
/// ```text
/// cov(a, b) = Σ (aᵢ − ā)(bᵢ − b̄) / (N − 1)
/// ```
///
/// Both sequences are columns of the same [`ObservationSet`].
pub(crate) fn sample_covariance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    a.iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / (n - 1.0)
}

/// Sample covariance matrix (divisor `n − 1`) of the observations.
///
/// The upper triangle is computed pairwise and mirrored into the lower one so the result is
/// exactly symmetric.
pub fn covariance_matrix(data: &ObservationSet) -> Scatter {
    let p = data.p();
    let mut cov = DMatrix::zeros(p, p);
    for i in 0..p {
        for j in i..p {
            cov[(i, j)] = sample_covariance(data.column(i).as_slice(), data.column(j).as_slice());
        }
    }
    cov.fill_lower_triangle_with_upper_triangle();
    cov
}

/// Location and scatter of a set of observations, the statistics of one MCD subset.
pub fn means_and_covariance(data: &ObservationSet) -> (Location, Scatter) {
    (mean(data), covariance_matrix(data))
}

/// Determinant of a square matrix through its LU decomposition.
///
/// Singular input is not an error: the returned value is `0.0` or a rounding-level residue.
pub fn determinant(m: &DMatrix<f64>) -> f64 {
    m.clone().lu().determinant()
}

/// Whether a scatter matrix has full rank.
///
/// The matrix is rescaled to unit diagonal (a correlation matrix for a covariance) and every
/// LU pivot of the result must exceed [`SINGULAR_PIVOT_RTOL`] in magnitude. A zero or
/// non-finite diagonal entry makes the matrix singular.
///
/// The rescaling makes the test independent of the units of each dimension.
pub fn is_nonsingular(m: &DMatrix<f64>) -> bool {
    if !m.is_square() || m.is_empty() {
        return false;
    }
    let diag = m.diagonal();
    if diag.iter().any(|&v| !v.is_finite() || v <= 0.0) {
        return false;
    }
    let scale = diag.map(|v| 1.0 / v.sqrt());
    let unit = DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| m[(i, j)] * scale[i] * scale[j]);
    unit.lu()
        .u()
        .diagonal()
        .iter()
        .all(|pivot| pivot.abs() > SINGULAR_PIVOT_RTOL)
}

/// Inverse of a square matrix through its LU decomposition.
///
/// Return
/// ----------
/// * The inverse, or [`McdError::SingularScatter`] if [`is_nonsingular`] rejects the matrix.
/// * [`McdError::DimensionMismatch`] if the matrix is not square.
pub fn inverse(m: &DMatrix<f64>) -> Result<DMatrix<f64>, McdError> {
    if !m.is_square() {
        return Err(McdError::DimensionMismatch {
            expected: m.nrows(),
            found: m.ncols(),
        });
    }
    if !is_nonsingular(m) {
        return Err(McdError::SingularScatter);
    }
    m.clone().lu().try_inverse().ok_or(McdError::SingularScatter)
}
