//! Property-based tests for risk and allocation invariants.
//!
//! Covariance matrices are drawn from a one-factor model (`ββᵀ + D`) so they
//! are symmetric and positive definite by construction.

use proptest::prelude::*;
use varopt::backend::{ExhaustiveSampler, QuboBackend};
use varopt::{
    ContinuousOptimizer, CovarianceMatrix, Optimizer, Penalties, ProblemFormulator, ReturnVector,
    RiskConfig, RiskMetrics, SolverSettings, normalize,
};

type Market = (Vec<f64>, Vec<Vec<f64>>, Vec<f64>);

/// Returns, covariance, and strictly positive raw weights of matching size.
fn market_strategy(max_assets: usize) -> impl Strategy<Value = Market> {
    (1..=max_assets).prop_flat_map(|n| {
        (
            prop::collection::vec(-0.02f64..0.03, n),
            prop::collection::vec(0.0f64..0.02, n),
            prop::collection::vec(1e-5f64..1e-3, n),
            prop::collection::vec(0.01f64..1.0, n),
        )
            .prop_map(|(returns, beta, idio, raw)| {
                let n = returns.len();
                let cov = (0..n)
                    .map(|i| {
                        (0..n)
                            .map(|j| beta[i] * beta[j] + if i == j { idio[i] } else { 0.0 })
                            .collect()
                    })
                    .collect();
                (returns, cov, raw)
            })
    })
}

fn confidence_strategy() -> impl Strategy<Value = f64> {
    0.5f64..0.999
}

fn build(returns: Vec<f64>, cov: Vec<Vec<f64>>) -> (ReturnVector, CovarianceMatrix) {
    (
        ReturnVector::new(returns).unwrap(),
        CovarianceMatrix::new(cov).unwrap(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // ========================================================================
    // RISK MEASURES
    // ========================================================================

    /// Expected shortfall is never better than the quantile it averages beyond.
    #[test]
    fn cvar_never_exceeds_var(
        (returns, cov, raw) in market_strategy(8),
        confidence in confidence_strategy(),
    ) {
        let (r, c) = build(returns, cov);
        let config = RiskConfig::with_confidence(confidence);
        let metrics = RiskMetrics::new(&r, &c, &config).unwrap();
        let w = normalize(&raw).unwrap();

        let var = metrics.var(w.as_slice()).unwrap();
        let cvar = metrics.cvar(w.as_slice()).unwrap();
        prop_assert!(cvar <= var + 1e-9 * var.abs().max(1.0), "var={var} cvar={cvar}");
    }

    /// Raising the confidence level can only deepen the tail.
    #[test]
    fn var_decreases_with_confidence(
        (returns, cov, raw) in market_strategy(6),
        lo in 0.5f64..0.9,
        bump in 0.01f64..0.09,
    ) {
        let (r, c) = build(returns, cov);
        let w = normalize(&raw).unwrap();
        let low = RiskConfig::with_confidence(lo);
        let high = RiskConfig::with_confidence(lo + bump);

        let var_low = RiskMetrics::new(&r, &c, &low).unwrap().var(w.as_slice()).unwrap();
        let var_high = RiskMetrics::new(&r, &c, &high).unwrap().var(w.as_slice()).unwrap();
        prop_assert!(var_high <= var_low + 1e-9);
    }

    /// The tail-loss penalty is zero under the ceiling and positive above it.
    #[test]
    fn tail_loss_penalty_matches_breach(
        (returns, cov, raw) in market_strategy(6),
        max_var in 1.0f64..100_000.0,
    ) {
        let (r, c) = build(returns, cov);
        let config = RiskConfig::default();
        let metrics = RiskMetrics::new(&r, &c, &config).unwrap();
        let w = normalize(&raw).unwrap();

        let var = metrics.var(w.as_slice()).unwrap();
        let penalty = metrics.var_constraint_penalty(w.as_slice(), max_var).unwrap();
        prop_assert!(penalty >= 0.0);
        if -var > max_var {
            prop_assert!(penalty > 0.0);
        } else {
            prop_assert_eq!(penalty, 0.0);
        }
    }

    // ========================================================================
    // NORMALIZATION
    // ========================================================================

    #[test]
    fn normalize_sums_to_one_and_is_idempotent(raw in prop::collection::vec(0.0f64..10.0, 1..20)) {
        prop_assume!(raw.iter().sum::<f64>() > 0.0);
        let once = normalize(&raw).unwrap();
        let sum: f64 = once.as_slice().iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);

        let twice = normalize(once.as_slice()).unwrap();
        for (a, b) in once.as_slice().iter().zip(twice.as_slice()) {
            prop_assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn normalize_rejects_any_negative(
        mut raw in prop::collection::vec(0.0f64..10.0, 1..10),
        idx in any::<prop::sample::Index>(),
        neg in -10.0f64..-1e-9,
    ) {
        let i = idx.index(raw.len());
        raw[i] = neg;
        prop_assert!(normalize(&raw).is_err());
    }

    // ========================================================================
    // QUBO SHAPE AND GROUND STATE
    // ========================================================================

    #[test]
    fn qubo_has_expected_shape((returns, cov, _raw) in market_strategy(10)) {
        let (r, c) = build(returns, cov);
        let n = r.len();
        let config = RiskConfig::default();
        let problem = ProblemFormulator::new(&r, &c, &config, 0.01, Penalties::default()).unwrap();
        let q = problem.qubo().unwrap();

        prop_assert_eq!(q.linear().len(), n);
        prop_assert!(q.quadratic().len() <= n * (n + 1) / 2);
        prop_assert!(q.quadratic().keys().all(|&(i, j)| i <= j && j < n));
    }

    /// Exhaustive search finds an energy no sampled bitstring can beat.
    #[test]
    fn exhaustive_ground_state_is_minimal(
        (returns, cov, _raw) in market_strategy(6),
        candidates in prop::collection::vec(prop::collection::vec(0u8..=1, 6), 1..8),
    ) {
        let (r, c) = build(returns, cov);
        let n = r.len();
        let config = RiskConfig::default();
        let problem = ProblemFormulator::new(&r, &c, &config, 0.01, Penalties::default()).unwrap();
        let q = problem.qubo().unwrap();

        let best = ExhaustiveSampler.sample(&q, 1).unwrap();
        prop_assert_eq!(best.len(), 1);
        for bits in &candidates {
            prop_assert!(best[0].energy <= q.energy(&bits[..n]) + 1e-9);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // ========================================================================
    // CONTINUOUS SOLVER
    // ========================================================================

    /// Every iterate stays on the simplex and the result never loses to the
    /// equal-weight start.
    #[test]
    fn continuous_stays_feasible_and_improves((returns, cov, _raw) in market_strategy(6)) {
        let (r, c) = build(returns, cov);
        let n = r.len();
        let config = RiskConfig::default();
        let settings = SolverSettings { max_iterations: 200, ..SolverSettings::default() };
        let optimizer = ContinuousOptimizer::new(0.0).with_settings(settings);

        let result = optimizer.solve(&r, &c, &config).unwrap();
        prop_assert_eq!(result.raw_allocation.len(), n);
        prop_assert!(result.raw_allocation.iter().all(|w| *w >= 0.0));
        let sum: f64 = result.raw_allocation.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);

        let problem = ProblemFormulator::new(&r, &c, &config, 0.0, Penalties::default()).unwrap();
        let start = problem.objective(&vec![1.0 / n as f64; n]).unwrap();
        prop_assert!(result.objective_value <= start + 1e-12);
    }
}
