//! # Concentration steps
//!
//! Practical application of Theorem 1 of Rousseeuw & Van Driessen (1999): given a current
//! estimate `(T, S)`, rank **all** observations of a dataset by their squared Mahalanobis
//! distance, keep the `h` nearest ones and recompute the mean and covariance on them. The
//! determinant of the new covariance never exceeds the old one.
//!
//! * [`concentration_step`] – a single C-step,
//! * [`h_smallest`] – the subset selection rule (ties broken by ascending index),
//! * [`check_monotonicity`] – determinant check with a relative rounding tolerance,
//! * [`refine`] – repeated C-steps with early stop on convergence.
//!
//! The selected indices are sorted before the statistics are computed, so an unchanged subset
//! reproduces a bit-identical determinant. This is what makes the exact convergence test of
//! [`refine`] reliable.
use log::{debug, warn};
use ordered_float::OrderedFloat;

use crate::constants::{Location, Scatter, MONOTONICITY_RTOL};
use crate::fast_mcd::trial::Trial;
use crate::linalg::{determinant, is_nonsingular, means_and_covariance};
use crate::mahalanobis::{maha_dist_sq, Hyperplane};
use crate::mcd_errors::McdError;
use crate::observation_set::ObservationSet;

/// Where the starting estimate of a [`refine`] call was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The start trial was concentrated on the same dataset; its determinant is comparable.
    SameData,
    /// The start trial comes from another dataset (group → merged sample → full set).
    OtherData,
}

/// Indices of the `h` smallest distances, sorted ascending.
///
/// Equal distances are resolved by the original index (stable sort), so the selection is
/// fully deterministic.
pub fn h_smallest(d2: &[f64], h: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..d2.len()).collect();
    order.sort_by_key(|&i| OrderedFloat(d2[i]));
    order.truncate(h);
    order.sort_unstable();
    order
}

/// One concentration step of `(location, scatter)` over `data` with coverage `h`.
///
/// A singular `scatter` (exact fit of a previous dataset) ranks the observations by their
/// distance to its [`Hyperplane`] instead. A singular result gets a determinant of exactly
/// `0.0`, whatever rounding residue LU leaves.
///
/// Return
/// ----------
/// * The new [`Trial`] (mean, covariance and determinant of the `h` nearest observations),
///   or [`McdError::DimensionMismatch`] if `location` or `scatter` are mis-shaped.
pub fn concentration_step(
    data: &ObservationSet,
    h: usize,
    location: &Location,
    scatter: &Scatter,
) -> Result<Trial, McdError> {
    let d2 = if is_nonsingular(scatter) {
        maha_dist_sq(data, location, scatter)?
    } else {
        Hyperplane::from_scatter(location, scatter)?.dist_sq(data)?
    };
    let support = h_smallest(&d2, h);
    let (location, scatter) = means_and_covariance(&data.select_rows(&support));

    Ok(Trial {
        determinant: if is_nonsingular(&scatter) {
            determinant(&scatter)
        } else {
            0.0
        },
        location,
        scatter,
        support,
        converged: false,
    })
}

/// Check `current ≤ previous·(1 + 1e-9)`.
///
/// Smaller excesses are rounding noise and pass silently.
pub fn check_monotonicity(previous: f64, current: f64) -> Result<(), McdError> {
    if current > previous + previous.abs() * MONOTONICITY_RTOL {
        Err(McdError::MonotonicityViolation { previous, current })
    } else {
        Ok(())
    }
}

/// Apply up to `max_steps` concentration steps to `start`.
///
/// The loop stops early once a step leaves the determinant (or the subset) unchanged; the
/// returned trial is then tagged `converged`. Running out of steps is not an error, the last
/// trial is returned untagged.
///
/// Arguments
/// -----------------
/// * `data`: dataset the steps rank against.
/// * `h`: coverage on `data`.
/// * `start`: initial estimate.
/// * `max_steps`: step budget (`0` returns `start` untouched).
/// * `origin`: whether `start`'s determinant and support refer to `data`.
/// * `strict`: turn a monotonicity violation into an error instead of a warning.
///
/// A step producing a zero determinant (the h-subset lies in a hyperplane) ends the loop as
/// converged, since no smaller determinant exists.
pub fn refine(
    data: &ObservationSet,
    h: usize,
    start: Trial,
    max_steps: usize,
    origin: Origin,
    strict: bool,
) -> Result<Trial, McdError> {
    let mut current = start;
    let mut comparable = origin == Origin::SameData;

    if comparable && current.determinant <= 0.0 {
        current.converged = true;
        return Ok(current);
    }

    for step in 0..max_steps {
        let mut next = concentration_step(data, h, &current.location, &current.scatter)?;

        if comparable {
            if let Err(err) = check_monotonicity(current.determinant, next.determinant) {
                if strict {
                    return Err(err);
                }
                warn!("tolerating determinant increase at step {step}: {err}");
            }
            if next.determinant == current.determinant || next.support == current.support {
                debug!("converged after {} steps (det = {:e})", step + 1, next.determinant);
                next.converged = true;
                return Ok(next);
            }
        }

        if next.determinant <= 0.0 {
            debug!("exact fit reached after {} steps", step + 1);
            next.converged = true;
            return Ok(next);
        }

        current = next;
        comparable = true;
    }

    Ok(current)
}

#[cfg(test)]
mod concentration_test {
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::linalg::means_and_covariance;

    fn noisy_set(n: usize, seed: u64) -> ObservationSet {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows: Vec<[f64; 3]> = (0..n)
            .map(|i| {
                let scale = if i % 7 == 0 { 25.0 } else { 1.0 };
                [
                    scale * rng.random_range(-1.0..1.0),
                    rng.random_range(-1.0..1.0),
                    scale * rng.random_range(-1.0..1.0) + 0.5 * i as f64 / n as f64,
                ]
            })
            .collect();
        ObservationSet::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_h_smallest_ties_by_index() {
        let d2 = [3.0, 1.0, 2.0, 1.0, 0.5, 2.0];
        assert_eq!(h_smallest(&d2, 3), vec![1, 3, 4]);
        assert_eq!(h_smallest(&d2, 4), vec![1, 2, 3, 4]);
        assert_eq!(h_smallest(&[1.0; 5], 2), vec![0, 1]);
    }

    #[test]
    fn test_step_selects_nearest_observations() {
        let data = noisy_set(60, 1);
        let (t, s) = means_and_covariance(&data);
        let d2 = maha_dist_sq(&data, &t, &s).unwrap();

        let trial = concentration_step(&data, 31, &t, &s).unwrap();
        assert_eq!(trial.support.len(), 31);

        let worst_kept = trial
            .support
            .iter()
            .map(|&i| d2[i])
            .fold(f64::MIN, f64::max);
        for i in (0..60).filter(|i| !trial.support.contains(i)) {
            assert!(d2[i] >= worst_kept);
        }

        let (t_sub, s_sub) = means_and_covariance(&data.select_rows(&trial.support));
        assert_eq!(trial.location, t_sub);
        assert_eq!(trial.scatter, s_sub);
    }

    #[test]
    fn test_determinant_never_increases() {
        let data = noisy_set(80, 7);
        let (mut t, mut s) = means_and_covariance(&data);
        let mut det = determinant(&s);
        for _ in 0..10 {
            let next = concentration_step(&data, 42, &t, &s).unwrap();
            assert!(next.determinant <= det * (1.0 + 1e-9));
            check_monotonicity(det, next.determinant).unwrap();
            det = next.determinant;
            t = next.location;
            s = next.scatter;
        }
    }

    #[test]
    fn test_check_monotonicity_tolerance() {
        assert!(check_monotonicity(1.0, 1.0 + 1e-12).is_ok());
        assert!(check_monotonicity(1.0, 0.5).is_ok());
        assert_eq!(
            check_monotonicity(1.0, 1.1),
            Err(McdError::MonotonicityViolation {
                previous: 1.0,
                current: 1.1
            })
        );
    }

    #[test]
    fn test_refine_converges_and_is_idempotent() {
        let data = noisy_set(80, 3);
        let (t, s) = means_and_covariance(&data);
        let start = concentration_step(&data, 42, &t, &s).unwrap();

        let refined = refine(&data, 42, start.clone(), 100, Origin::SameData, true).unwrap();
        assert!(refined.converged);
        assert!(refined.determinant <= start.determinant);

        // a converged trial does not move anymore
        let again = refine(&data, 42, refined.clone(), 100, Origin::SameData, true).unwrap();
        assert!(again.converged);
        assert_eq!(again.support, refined.support);
        assert_relative_eq!(again.determinant, refined.determinant);
    }

    #[test]
    fn test_refine_zero_steps_returns_start() {
        let data = noisy_set(30, 5);
        let (t, s) = means_and_covariance(&data);
        let start = concentration_step(&data, 17, &t, &s).unwrap();
        let same = refine(&data, 17, start.clone(), 0, Origin::SameData, false).unwrap();
        assert_eq!(same, start);
    }

    #[test]
    fn test_exact_fit_start_ranks_by_plane_distance() {
        // 30 observations on y = x, 10 scattered ones
        let mut rng = StdRng::seed_from_u64(12);
        let mut rows: Vec<[f64; 2]> = (0..30).map(|i| [0.25 * i as f64, 0.25 * i as f64]).collect();
        rows.extend((0..10).map(|_| [rng.random_range(-4.0..4.0), rng.random_range(5.0..9.0)]));
        let data = ObservationSet::from_rows(&rows).unwrap();

        let (t, s) = means_and_covariance(&data.select_rows(&(0..10).collect::<Vec<_>>()));
        assert!(!is_nonsingular(&s));

        let start = concentration_step(&data, 21, &t, &s).unwrap();
        assert!(start.support.iter().all(|&i| i < 30));
        assert_eq!(start.determinant, 0.0);

        let refined = refine(&data, 21, start.clone(), 10, Origin::OtherData, true).unwrap();
        assert!(refined.converged);
        assert_eq!(refined.determinant, 0.0);
        assert!(refined.support.iter().all(|&i| i < 30));

        // an exact fit on the same data is final
        let same = refine(&data, 21, start.clone(), 10, Origin::SameData, true).unwrap();
        assert!(same.converged);
        assert_eq!(same.support, start.support);
    }
}
