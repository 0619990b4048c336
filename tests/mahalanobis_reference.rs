mod common;

use approx::assert_abs_diff_eq;
use common::{r_reference_set, R_MAHALANOBIS_SQ};
use fastmcd::linalg::{determinant, means_and_covariance};
use fastmcd::mahalanobis::maha_dist_sq;

#[test]
fn mahalanobis_matches_r() {
    let data = r_reference_set();
    let (center, scatter) = means_and_covariance(&data);
    let d2 = maha_dist_sq(&data, &center, &scatter).unwrap();

    assert_eq!(d2.len(), R_MAHALANOBIS_SQ.len());
    for (got, exp) in d2.iter().zip(R_MAHALANOBIS_SQ) {
        assert_abs_diff_eq!(*got, exp, epsilon = 1e-6);
    }
}

#[test]
fn mahalanobis_is_deterministic() {
    let data = r_reference_set();
    let (center, scatter) = means_and_covariance(&data);
    let first = maha_dist_sq(&data, &center, &scatter).unwrap();
    let second = maha_dist_sq(&data, &center, &scatter).unwrap();
    assert_eq!(first, second);
}

#[test]
fn squared_distances_sum_to_trace_identity() {
    // Σ d²ᵢ = (n − 1)·p when center and scatter are the sample moments
    let data = r_reference_set();
    let (center, scatter) = means_and_covariance(&data);
    let d2 = maha_dist_sq(&data, &center, &scatter).unwrap();
    assert_abs_diff_eq!(d2.iter().sum::<f64>(), 27.0, epsilon = 1e-9);
    assert!(determinant(&scatter) > 0.0);
}
