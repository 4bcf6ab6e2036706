//! Solver benchmarks: continuous descent, QUBO backends, and risk evaluation.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use varopt::backend::{AnnealingSampler, ExhaustiveSampler};
use varopt::{
    CombinatorialOptimizer, ContinuousOptimizer, CovarianceMatrix, Optimizer, ReturnVector,
    RiskConfig, RiskMetrics,
};

/// Synthetic market with `n` assets from a one-factor model.
///
/// Uses a simple deterministic RNG so runs are comparable.
fn generate_market(n: usize) -> (ReturnVector, CovarianceMatrix) {
    // Simple deterministic PRNG (xorshift32)
    let mut rng_state: u32 = 42;
    let mut next = || {
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 17;
        rng_state ^= rng_state << 5;
        (rng_state % 10_000) as f64 / 10_000.0
    };

    let returns: Vec<f64> = (0..n).map(|_| -0.005 + 0.025 * next()).collect();
    let beta: Vec<f64> = (0..n).map(|_| 0.02 * next()).collect();
    let idio: Vec<f64> = (0..n).map(|_| 1e-5 + 5e-4 * next()).collect();

    let cov = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| beta[i] * beta[j] + if i == j { idio[i] } else { 0.0 })
                .collect()
        })
        .collect();

    (
        ReturnVector::new(returns).unwrap(),
        CovarianceMatrix::new(cov).unwrap(),
    )
}

fn bench_continuous(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize/continuous");
    let config = RiskConfig::default().max_var(20_000.0);
    let optimizer = ContinuousOptimizer::new(0.01);

    for n in [5, 20, 100] {
        let (r, cov) = generate_market(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(optimizer.solve(&r, &cov, &config).unwrap()));
        });
    }

    group.finish();
}

fn bench_exhaustive(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize/exhaustive");
    let config = RiskConfig::default();
    let optimizer = CombinatorialOptimizer::new(ExhaustiveSampler, 0.01).with_shots(10);

    for n in [8, 12, 16] {
        let (r, cov) = generate_market(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(optimizer.solve(&r, &cov, &config).unwrap()));
        });
    }

    group.finish();
}

fn bench_annealing(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize/annealing");
    let config = RiskConfig::default();

    for n in [20, 50] {
        let (r, cov) = generate_market(n);
        let optimizer =
            CombinatorialOptimizer::new(AnnealingSampler::new(7).sweeps(200), 0.01).with_shots(16);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(optimizer.solve(&r, &cov, &config).unwrap()));
        });
    }

    group.finish();
}

fn bench_risk_metrics(c: &mut Criterion) {
    let (r, cov) = generate_market(100);
    let config = RiskConfig::default();
    let metrics = RiskMetrics::new(&r, &cov, &config).unwrap();
    let w = vec![0.01; 100];

    c.bench_function("risk/var_cvar_100_assets", |b| {
        b.iter(|| {
            black_box(metrics.var(black_box(&w)).unwrap());
            black_box(metrics.cvar(black_box(&w)).unwrap());
        });
    });
}

#[cfg(feature = "parallel")]
fn bench_sweep(c: &mut Criterion) {
    use varopt::sweep::sweep;

    let (r, cov) = generate_market(20);
    let optimizer = ContinuousOptimizer::new(0.01);
    let configs: Vec<RiskConfig> = (1..=32)
        .map(|k| RiskConfig::default().max_var(1_000.0 * k as f64))
        .collect();

    c.bench_function("sweep/32_ceilings_20_assets", |b| {
        b.iter(|| black_box(sweep(&optimizer, &r, &cov, &configs)));
    });
}

#[cfg(feature = "parallel")]
criterion_group!(
    benches,
    bench_continuous,
    bench_exhaustive,
    bench_annealing,
    bench_risk_metrics,
    bench_sweep,
);

#[cfg(not(feature = "parallel"))]
criterion_group!(
    benches,
    bench_continuous,
    bench_exhaustive,
    bench_annealing,
    bench_risk_metrics,
);

criterion_main!(benches);
