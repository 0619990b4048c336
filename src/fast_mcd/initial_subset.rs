//! # Initial subsets
//!
//! Method 2 of subsection 3.1 of Rousseeuw & Van Driessen: draw a random `(p + 1)`-subset,
//! enlarge it one observation at a time until its covariance is nonsingular, then apply one
//! concentration step with the target coverage.
//!
//! The enlargement is bounded by the number of observations. Data where even the full set has
//! a zero covariance determinant (collinear or constant dimensions) fails with
//! [`McdError::SingularSubset`] instead of looping.
use rand::seq::SliceRandom;
use rand::Rng;

use crate::fast_mcd::concentration::concentration_step;
use crate::fast_mcd::trial::Trial;
use crate::linalg::{is_nonsingular, means_and_covariance};
use crate::mcd_errors::McdError;
use crate::observation_set::ObservationSet;

/// Draw an initial candidate on `data` for coverage `h`.
///
/// Arguments
/// -----------------
/// * `data`: the dataset to sample from and to rank against.
/// * `h`: target coverage, `p + 1 ≤ h ≤ n`.
/// * `rng`: generator driving the random permutation.
///
/// Return
/// ----------
/// * The trial produced by one concentration step from the first nonsingular subset.
///
/// Errors
/// ----------
/// * [`McdError::SingularSubset`] if no prefix of the permutation, up to all `n` observations,
///   has a full-rank covariance (see [`is_nonsingular`]).
pub fn form_initial_subset(
    data: &ObservationSet,
    h: usize,
    rng: &mut impl Rng,
) -> Result<Trial, McdError> {
    let n = data.n();
    let mut permutation: Vec<usize> = (0..n).collect();
    permutation.shuffle(rng);

    for size in (data.p() + 1)..=n {
        let (t0, s0) = means_and_covariance(&data.select_rows(&permutation[..size]));
        if is_nonsingular(&s0) {
            return concentration_step(data, h, &t0, &s0);
        }
    }

    Err(McdError::SingularSubset { observations: n })
}
