//! # Squared Mahalanobis distances
//!
//! For a center `T` and a scatter matrix `S`, the squared Mahalanobis distance of an
//! observation `x` is
//!
//! ```text
//! d²(x) = (x − T)ᵀ S⁻¹ (x − T)
//! ```
//!
//! [`maha_dist_sq`] evaluates it for a whole [`ObservationSet`] at once and returns the
//! distances in input order. Note that this is the *squared* distance, the quantity that follows
//! a χ²(p) law for normal data.
//!
//! ## Exact fit
//!
//! When at least `h` observations lie on a hyperplane the MCD scatter is singular and `S⁻¹`
//! does not exist. [`Hyperplane`] recovers the plane from the null space of `S` and measures
//! the squared orthogonal distance of every observation to it instead.
//!
//! ## Example
//!
//! ```rust
//! use fastmcd::linalg::means_and_covariance;
//! use fastmcd::mahalanobis::maha_dist_sq;
//! use fastmcd::observation_set::ObservationSet;
//!
//! let data = ObservationSet::from_rows(&[
//!     [1.0, 2.0], [2.0, 2.5], [3.0, 4.5], [4.0, 4.0], [2.5, 3.5],
//! ]).unwrap();
//! let (center, scatter) = means_and_covariance(&data);
//! let d2 = maha_dist_sq(&data, &center, &scatter).unwrap();
//! assert_eq!(d2.len(), 5);
//! ```
use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::constants::{DistanceSq, Location, Scatter, EXACT_FIT_RTOL, NULL_SPACE_RTOL};
use crate::linalg::inverse;
use crate::mcd_errors::McdError;
use crate::observation_set::ObservationSet;

/// Squared Mahalanobis distance of every observation from `center` under `scatter`.
///
/// Arguments
/// -----------------
/// * `data`: the `n × p` observations.
/// * `center`: location vector of length `p`.
/// * `scatter`: `p × p` covariance matrix.
///
/// Return
/// ----------
/// * `n` squared distances aligned with the observation order.
///
/// Errors
/// ----------
/// * [`McdError::DimensionMismatch`] if `center` is not of length `p` or `scatter` is not `p × p`.
/// * [`McdError::SingularScatter`] if `scatter` cannot be inverted.
pub fn maha_dist_sq(
    data: &ObservationSet,
    center: &Location,
    scatter: &Scatter,
) -> Result<DistanceSq, McdError> {
    check_shapes(data, center, scatter)?;

    let inv = inverse(scatter)?;
    let centered = centered(data, center);
    let projected = &centered * &inv;

    Ok((0..data.n())
        .map(|i| centered.row(i).dot(&projected.row(i)))
        .collect())
}

fn check_shapes(
    data: &ObservationSet,
    center: &Location,
    scatter: &Scatter,
) -> Result<(), McdError> {
    let p = data.p();
    if center.len() != p {
        return Err(McdError::DimensionMismatch {
            expected: p,
            found: center.len(),
        });
    }
    if scatter.nrows() != p || scatter.ncols() != p {
        return Err(McdError::DimensionMismatch {
            expected: p,
            found: if scatter.nrows() != p {
                scatter.nrows()
            } else {
                scatter.ncols()
            },
        });
    }
    Ok(())
}

fn centered(data: &ObservationSet, center: &Location) -> DMatrix<f64> {
    let x = data.matrix();
    DMatrix::from_fn(data.n(), data.p(), |i, j| x[(i, j)] - center[j])
}

/// Hyperplane containing the observations behind a singular scatter matrix.
///
/// The normals are the eigenvectors of `S` whose eigenvalue is below
/// [`NULL_SPACE_RTOL`] times the largest one. A scatter that is singular only through rounding
/// may have no eigenvalue that small, in which case the weakest direction is used.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperplane {
    center: Location,
    /// `p × k` matrix of unit normals, one column per null direction.
    normals: DMatrix<f64>,
    /// Largest eigenvalue of the scatter.
    spread: f64,
}

impl Hyperplane {
    /// Hyperplane through `center` orthogonal to the null space of `scatter`.
    ///
    /// Errors
    /// ----------
    /// * [`McdError::DimensionMismatch`] if `center` and `scatter` do not agree in size.
    pub fn from_scatter(center: &Location, scatter: &Scatter) -> Result<Self, McdError> {
        let p = center.len();
        if scatter.nrows() != p || scatter.ncols() != p {
            return Err(McdError::DimensionMismatch {
                expected: p,
                found: scatter.nrows(),
            });
        }

        let eigen = SymmetricEigen::new(scatter.clone());
        let spread = eigen.eigenvalues.max().max(0.0);
        let mut null: Vec<usize> = (0..p)
            .filter(|&k| eigen.eigenvalues[k] <= NULL_SPACE_RTOL * spread)
            .collect();
        if null.is_empty() {
            null.push(eigen.eigenvalues.imin());
        }
        let columns: Vec<DVector<f64>> = null
            .iter()
            .map(|&k| eigen.eigenvectors.column(k).into_owned())
            .collect();

        Ok(Hyperplane {
            center: center.clone(),
            normals: DMatrix::from_columns(&columns),
            spread,
        })
    }

    /// Number of independent directions orthogonal to the plane.
    pub fn codim(&self) -> usize {
        self.normals.ncols()
    }

    /// Squared distance below which an observation counts as lying on the plane.
    pub fn tolerance_sq(&self) -> f64 {
        EXACT_FIT_RTOL * EXACT_FIT_RTOL * self.spread
    }

    /// Squared orthogonal distance of every observation to the plane, input order.
    pub fn dist_sq(&self, data: &ObservationSet) -> Result<DistanceSq, McdError> {
        if self.center.len() != data.p() {
            return Err(McdError::DimensionMismatch {
                expected: data.p(),
                found: self.center.len(),
            });
        }
        let offsets = centered(data, &self.center) * &self.normals;
        Ok(offsets.row_iter().map(|r| r.norm_squared()).collect())
    }
}

#[cfg(test)]
mod mahalanobis_test {
    use approx::assert_abs_diff_eq;
    use nalgebra::{dmatrix, dvector};

    use super::*;
    use crate::linalg::means_and_covariance;

    #[test]
    fn test_identity_scatter_is_squared_euclidean() {
        let data = ObservationSet::from_rows(&[[0.0, 0.0], [3.0, 4.0], [1.0, -1.0]]).unwrap();
        let d2 = maha_dist_sq(&data, &dvector![0.0, 0.0], &DMatrix::identity(2, 2)).unwrap();
        assert_eq!(d2, vec![0.0, 25.0, 2.0]);
    }

    #[test]
    fn test_matches_r_reference() {
        let x1 = vec![3.853, 2.401, 2.253, 3.067, 1.887, 3.293, 3.995, 2.559, 2.785, 2.228];
        let x2 = vec![4.294, 1.915, 1.315, 4.641, 1.611, 2.838, 3.696, 1.337, 2.853, 2.434];
        let x3 = vec![4.785, 2.352, 2.023, 4.978, 2.329, 3.101, 4.494, 2.204, 3.468, 3.075];
        let data = ObservationSet::from_columns(&[x1, x2, x3]).unwrap();
        let (center, scatter) = means_and_covariance(&data);

        let d2 = maha_dist_sq(&data, &center, &scatter).unwrap();
        let expected = [
            2.1838336, 1.9673401, 1.3335029, 4.9191627, 2.1246818, 5.3297995, 4.9022487,
            2.5335913, 0.1952562, 1.5105832,
        ];
        for (got, exp) in d2.iter().zip(expected) {
            assert_abs_diff_eq!(*got, exp, epsilon = 1e-6);
        }

        // recomputation is bit-identical
        assert_eq!(d2, maha_dist_sq(&data, &center, &scatter).unwrap());
    }

    #[test]
    fn test_dimension_mismatch() {
        let data = ObservationSet::from_rows(&[[0.0, 0.0], [1.0, 2.0], [2.0, 1.0]]).unwrap();
        let err = maha_dist_sq(&data, &dvector![0.0, 0.0, 0.0], &DMatrix::identity(2, 2))
            .unwrap_err();
        assert_eq!(
            err,
            McdError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );

        let err = maha_dist_sq(&data, &dvector![0.0, 0.0], &DMatrix::identity(3, 3)).unwrap_err();
        assert_eq!(
            err,
            McdError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_singular_scatter() {
        let data = ObservationSet::from_rows(&[[0.0, 0.0], [1.0, 2.0], [2.0, 1.0]]).unwrap();
        let err = maha_dist_sq(&data, &dvector![0.0, 0.0], &dmatrix![1.0, 1.0; 1.0, 1.0])
            .unwrap_err();
        assert_eq!(err, McdError::SingularScatter);
    }

    #[test]
    fn test_hyperplane_of_collinear_support() {
        // support on the line y = 2x, one observation off it
        let line = ObservationSet::from_rows(&[[0.0, 0.0], [1.0, 2.0], [2.0, 4.0], [3.0, 6.0]])
            .unwrap();
        let (center, scatter) = means_and_covariance(&line);
        let plane = Hyperplane::from_scatter(&center, &scatter).unwrap();
        assert_eq!(plane.codim(), 1);

        let data =
            ObservationSet::from_rows(&[[0.0, 0.0], [1.5, 3.0], [10.0, 20.0], [2.0, 0.0]]).unwrap();
        let d2 = plane.dist_sq(&data).unwrap();
        for on_line in &d2[..3] {
            assert!(*on_line <= plane.tolerance_sq());
        }
        // (2, 0) is 4/√5 away from y = 2x
        assert_abs_diff_eq!(d2[3], 16.0 / 5.0, epsilon = 1e-9);
    }
}
