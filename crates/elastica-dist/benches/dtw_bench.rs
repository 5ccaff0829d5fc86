//! Criterion benchmarks for the EAP kernels: DTW under different cut-off
//! regimes, and the windowed variant.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use elastica_dist::{cdtw_univariate, dtw_univariate, msm_univariate};

fn make_sine(n: usize, offset: f64) -> Vec<f64> {
    (0..n).map(|i| (i as f64 * 0.1).sin() + offset).collect()
}

fn bench_dtw(c: &mut Criterion) {
    let lengths = [64usize, 256, 1024];
    let mut group = c.benchmark_group("dtw_eap");

    for &len in &lengths {
        let a = make_sine(len, 0.0);
        let b = make_sine(len, 1.0);
        let mut buf = Vec::new();
        let exact = dtw_univariate(&a, &b, 2.0, f64::NAN, &mut buf);

        group.bench_with_input(BenchmarkId::new("full_dp", len), &len, |bencher, _| {
            let mut buf = Vec::new();
            bencher.iter(|| dtw_univariate(&a, &b, 2.0, f64::NAN, &mut buf));
        });
        group.bench_with_input(BenchmarkId::new("pruned", len), &len, |bencher, _| {
            let mut buf = Vec::new();
            bencher.iter(|| dtw_univariate(&a, &b, 2.0, f64::INFINITY, &mut buf));
        });
        group.bench_with_input(BenchmarkId::new("tight_cutoff", len), &len, |bencher, _| {
            let mut buf = Vec::new();
            bencher.iter(|| dtw_univariate(&a, &b, 2.0, exact, &mut buf));
        });
    }

    group.finish();
}

fn bench_cdtw(c: &mut Criterion) {
    let a = make_sine(1024, 0.0);
    let b = make_sine(1024, 1.0);

    c.bench_function("cdtw_1024_w64", |bencher| {
        let mut buf = Vec::new();
        bencher.iter(|| cdtw_univariate(&a, &b, 2.0, 64, f64::INFINITY, &mut buf));
    });
}

fn bench_msm(c: &mut Criterion) {
    let a = make_sine(256, 0.0);
    let b = make_sine(256, 1.0);

    c.bench_function("msm_256_c05", |bencher| {
        let mut buf = Vec::new();
        bencher.iter(|| msm_univariate(&a, &b, 0.5, f64::INFINITY, &mut buf));
    });
}

criterion_group!(benches, bench_dtw, bench_cdtw, bench_msm);
criterion_main!(benches);
