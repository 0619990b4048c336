use fastmcd::ObservationSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Reference dataset of the R session `mahalanobis(obs, colMeans(obs), var(obs))`.
pub fn r_reference_set() -> ObservationSet {
    let x1 = vec![3.853, 2.401, 2.253, 3.067, 1.887, 3.293, 3.995, 2.559, 2.785, 2.228];
    let x2 = vec![4.294, 1.915, 1.315, 4.641, 1.611, 2.838, 3.696, 1.337, 2.853, 2.434];
    let x3 = vec![4.785, 2.352, 2.023, 4.978, 2.329, 3.101, 4.494, 2.204, 3.468, 3.075];
    ObservationSet::from_columns(&[x1, x2, x3]).unwrap()
}

/// Squared distances returned by R for [`r_reference_set`].
pub const R_MAHALANOBIS_SQ: [f64; 10] = [
    2.1838336, 1.9673401, 1.3335029, 4.9191627, 2.1246818, 5.3297995, 4.9022487, 2.5335913,
    0.1952562, 1.5105832,
];

/// Hawkins, Bradu & Kass artificial data (x1, x2, x3), from the R package robustbase.
///
/// Rows 0..14 are leverage points, 0..10 being the bad ones.
pub const HBK: [[f64; 3]; 75] = [
    [10.1, 19.6, 28.3],
    [9.5, 20.5, 28.9],
    [10.7, 20.2, 31.0],
    [9.9, 21.5, 31.7],
    [10.3, 21.1, 31.1],
    [10.8, 20.4, 29.2],
    [10.5, 20.9, 29.1],
    [9.9, 19.6, 28.8],
    [9.7, 20.7, 31.0],
    [9.3, 19.7, 30.3],
    [11.0, 24.0, 35.0],
    [12.0, 23.0, 37.0],
    [12.0, 26.0, 34.0],
    [11.0, 34.0, 34.0],
    [3.4, 2.9, 2.1],
    [3.1, 2.2, 0.3],
    [0.0, 1.6, 0.2],
    [2.3, 1.6, 2.0],
    [0.8, 2.9, 1.6],
    [3.1, 3.4, 2.2],
    [2.6, 2.2, 1.9],
    [0.4, 3.2, 1.9],
    [2.0, 2.3, 0.8],
    [1.3, 2.3, 0.5],
    [1.0, 0.0, 0.4],
    [0.9, 3.3, 2.5],
    [3.3, 2.5, 2.9],
    [1.8, 0.8, 2.0],
    [1.2, 0.9, 0.8],
    [1.2, 0.7, 3.4],
    [3.1, 1.4, 1.0],
    [0.5, 2.4, 0.3],
    [1.5, 3.1, 1.5],
    [0.4, 0.0, 0.7],
    [3.1, 2.4, 3.0],
    [1.1, 2.2, 2.7],
    [0.1, 3.0, 2.6],
    [1.5, 1.2, 0.2],
    [2.1, 0.0, 1.2],
    [0.5, 2.0, 1.2],
    [3.4, 1.6, 2.9],
    [0.3, 1.0, 2.7],
    [0.1, 3.3, 0.9],
    [1.8, 0.5, 3.2],
    [1.9, 0.1, 0.6],
    [1.8, 0.5, 3.0],
    [3.0, 0.1, 0.8],
    [3.1, 1.6, 3.0],
    [3.1, 2.5, 1.9],
    [2.1, 2.8, 2.9],
    [2.3, 1.5, 0.4],
    [3.3, 0.6, 1.2],
    [0.3, 0.4, 3.3],
    [1.1, 3.0, 0.3],
    [0.5, 2.4, 0.9],
    [1.8, 3.2, 0.9],
    [1.8, 0.7, 0.7],
    [2.4, 3.4, 1.5],
    [1.6, 2.1, 3.0],
    [0.3, 1.5, 3.3],
    [0.4, 3.4, 3.0],
    [0.9, 0.1, 0.3],
    [1.1, 2.7, 0.2],
    [2.8, 3.0, 2.9],
    [2.0, 0.7, 2.7],
    [0.2, 1.8, 0.8],
    [1.6, 2.0, 1.2],
    [0.1, 0.0, 1.1],
    [2.0, 0.6, 0.3],
    [1.0, 2.2, 2.9],
    [2.2, 2.5, 2.3],
    [0.6, 2.0, 1.5],
    [0.3, 1.7, 2.2],
    [0.0, 2.2, 1.6],
    [0.3, 0.4, 2.6]
];

pub fn hbk_set() -> ObservationSet {
    ObservationSet::from_rows(&HBK).unwrap()
}

/// `n` draws of a correlated 3-dimensional normal with mean (1, -2, 0.5).
///
/// The covariance is `L Lᵀ` with a fixed lower-triangular `L`.
pub fn correlated_normal(n: usize, seed: u64) -> ObservationSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<[f64; 3]> = (0..n)
        .map(|_| {
            let z: [f64; 3] = [
                rng.sample(StandardNormal),
                rng.sample(StandardNormal),
                rng.sample(StandardNormal),
            ];
            [
                1.0 + 2.0 * z[0],
                -2.0 + 0.8 * z[0] + 1.5 * z[1],
                0.5 - 0.3 * z[0] + 0.6 * z[1] + 0.5 * z[2],
            ]
        })
        .collect();
    ObservationSet::from_rows(&rows).unwrap()
}

/// Replace every `stride`-th row of a normal sample by a far away point.
pub fn contaminated_normal(n: usize, stride: usize, seed: u64) -> (ObservationSet, Vec<usize>) {
    let clean = correlated_normal(n, seed);
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let mut rows: Vec<[f64; 3]> = (0..n)
        .map(|i| {
            let r = clean.row(i);
            [r[0], r[1], r[2]]
        })
        .collect();
    let outliers: Vec<usize> = (0..n).step_by(stride).collect();
    for &i in &outliers {
        rows[i] = [
            25.0 + rng.random_range(-1.0..1.0),
            25.0 + rng.random_range(-1.0..1.0),
            -25.0 + rng.random_range(-1.0..1.0),
        ];
    }
    (ObservationSet::from_rows(&rows).unwrap(), outliers)
}
