use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use fastmcd::{McdEstimation, McdParams, ObservationSet, OutlierDetector};

/// Standard normal cloud in `p` dimensions with every tenth row pushed away.
fn contaminated_cloud(n: usize, p: usize, seed: u64) -> ObservationSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let shift = if i % 10 == 0 { 15.0 } else { 0.0 };
            (0..p)
                .map(|_| shift + rng.sample::<f64, _>(StandardNormal))
                .collect()
        })
        .collect();
    ObservationSet::from_rows(&rows).unwrap()
}

fn bench_small_dataset(c: &mut Criterion) {
    let data = contaminated_cloud(400, 4, 0xC0FFEE);
    let params = McdParams::builder().seed(1).build().unwrap();

    c.bench_function("fast_mcd/small_n400_p4", |b| {
        b.iter(|| black_box(data.estimate_mcd(black_box(&params)).unwrap()))
    });
}

fn bench_large_dataset(c: &mut Criterion) {
    let data = contaminated_cloud(20_000, 5, 0xBADC0DE);
    let parallel = McdParams::builder().seed(1).build().unwrap();
    let sequential = McdParams::builder()
        .parallel(false)
        .seed(1)
        .build()
        .unwrap();

    let mut group = c.benchmark_group("fast_mcd/large_n20000_p5");
    group.sample_size(10);
    group.bench_function("parallel", |b| {
        b.iter(|| black_box(data.estimate_mcd(&parallel).unwrap()))
    });
    group.bench_function("sequential", |b| {
        b.iter(|| black_box(data.estimate_mcd(&sequential).unwrap()))
    });
    group.finish();
}

fn bench_outlier_detection(c: &mut Criterion) {
    let data = contaminated_cloud(5_000, 3, 42);
    let detector = OutlierDetector::default();

    let mut group = c.benchmark_group("outlier_detector");
    group.sample_size(20);
    group.bench_function("detect_n5000_p3", |b| {
        b.iter(|| black_box(detector.detect(&data).unwrap()))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_small_dataset,
    bench_large_dataset,
    bench_outlier_detection
);
criterion_main!(benches);
