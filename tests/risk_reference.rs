//! Estimator reference tests.
//!
//! Reference values come from closed-form normal-distribution formulas
//! (McNeil/Frey/Embrechts 2005) and from deterministic price paths whose tail
//! metrics can be computed by hand:
//!
//! Scaled N(mu, sigma) losses: VaR = mu + sigma * Phi^{-1}(p),
//!                             ES  = mu + sigma * phi(Phi^{-1}(p)) / (1 - p)
//! Linear +$1/day path:        constant daily loss of 1 for a short holder.

use std::collections::BTreeMap;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use chrono::{Days, NaiveDate};
use nalgebra::{DMatrix, DVector};

use openvar::calibration::{Moments, estimate_covariance_matrix, estimate_moments};
use openvar::core::{PositionBook, PriceFrame, PriceSeries, RiskConfig, Side};
use openvar::math::{normal_inv_cdf, normal_pdf};
use openvar::risk::{historical_var_es, monte_carlo_var_es, parametric_var_es};

fn frame(columns: &[(&str, &[f64])]) -> PriceFrame {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let mut map = BTreeMap::new();
    for (ticker, prices) in columns {
        let dates = (0..prices.len() as u64).map(|i| start + Days::new(i)).collect();
        map.insert(
            ticker.to_string(),
            PriceSeries::new(dates, prices.to_vec()).unwrap(),
        );
    }
    PriceFrame::from_series(&map).unwrap()
}

/// Prices rising by exactly $1/day, starting at $1.
fn linear_prices(n: usize) -> Vec<f64> {
    (1..=n).map(|i| i as f64).collect()
}

/// Mildly mean-reverting sawtooth with an occasional drop; enough dispersion
/// for every estimator to produce a strictly positive VaR.
fn choppy_prices(n: usize) -> Vec<f64> {
    let mut prices = Vec::with_capacity(n);
    let mut p = 100.0;
    for i in 0..n {
        let step = match i % 5 {
            0 => 1.012,
            1 => 0.993,
            2 => 1.007,
            3 => 0.979,
            _ => 1.009,
        };
        p *= step;
        prices.push(p);
    }
    prices
}

// ============================================================================
// Historical estimator
// ============================================================================

#[test]
fn historical_long_on_monotone_rise_has_zero_tail() {
    let f = frame(&[("X", &linear_prices(100))]);
    let book = PositionBook::new().with_position("X", 1.0);

    let tail = historical_var_es(&book, &f, 0.95, 1, Side::Long).unwrap();
    assert_eq!(tail.var, 0.0);
    assert_eq!(tail.es, 0.0);
}

#[test]
fn historical_short_on_dollar_per_day_rise_loses_exactly_one() {
    let f = frame(&[("X", &linear_prices(100))]);
    let book = PositionBook::new().with_position("X", 1.0);

    let tail = historical_var_es(&book, &f, 0.95, 1, Side::Short).unwrap();
    assert_abs_diff_eq!(tail.var, 1.0, epsilon = 1.0e-12);
    assert_abs_diff_eq!(tail.es, 1.0, epsilon = 1.0e-12);
}

#[test]
fn historical_share_count_scales_dollar_tail_linearly() {
    let f = frame(&[("X", &choppy_prices(120))]);
    let one = PositionBook::new().with_position("X", 1.0);
    let ten = PositionBook::new().with_position("X", 10.0);

    let t1 = historical_var_es(&one, &f, 0.95, 1, Side::Long).unwrap();
    let t10 = historical_var_es(&ten, &f, 0.95, 1, Side::Long).unwrap();

    assert_relative_eq!(t10.var, 10.0 * t1.var, epsilon = 1.0e-9);
    assert_relative_eq!(t10.es, 10.0 * t1.es, epsilon = 1.0e-9);
}

#[test]
fn es_dominates_var_across_estimators_and_levels() {
    let f = frame(&[("X", &choppy_prices(200))]);
    let book = PositionBook::new().with_position("X", 25.0);
    let moments = estimate_moments(&f, 252.0).unwrap();

    for p in [0.90, 0.95, 0.99] {
        let hist = historical_var_es(&book, &f, p, 1, Side::Long).unwrap();
        assert!(hist.es >= hist.var, "historical es < var at p={p}");

        let para = parametric_var_es(&book, &f, &moments, p, 1, 252.0).unwrap();
        assert!(para.es >= para.var, "parametric es < var at p={p}");

        let cfg = RiskConfig::default()
            .with_confidence(p)
            .with_n_sims(2_000)
            .with_seed(99);
        let mc = monte_carlo_var_es(&book, &f, &moments, &cfg).unwrap();
        assert!(mc.es >= mc.var, "monte carlo es < var at p={p}");
    }
}

// ============================================================================
// Parametric estimator against the scaled-normal closed form
// ============================================================================

struct ScaledNormalCase {
    mu_ann: f64,
    sigma_ann: f64,
    p: f64,
    horizon_days: usize,
}

fn scaled_normal_cases() -> Vec<ScaledNormalCase> {
    vec![
        ScaledNormalCase {
            mu_ann: 0.0,
            sigma_ann: 0.20,
            p: 0.99,
            horizon_days: 1,
        },
        ScaledNormalCase {
            mu_ann: 0.0,
            sigma_ann: 0.20,
            p: 0.95,
            horizon_days: 1,
        },
        ScaledNormalCase {
            mu_ann: 0.10,
            sigma_ann: 0.30,
            p: 0.99,
            horizon_days: 10,
        },
        ScaledNormalCase {
            mu_ann: -0.05,
            sigma_ann: 0.15,
            p: 0.975,
            horizon_days: 5,
        },
    ]
}

#[test]
fn parametric_matches_scaled_normal_closed_form() {
    // Latest price 100 with a single share fixes V0 = 100.
    let f = frame(&[("X", &[99.0, 101.0, 100.0])]);
    let book = PositionBook::new().with_position("X", 1.0);

    for case in scaled_normal_cases() {
        let moments = Moments::new(
            vec!["X".to_string()],
            DVector::from_vec(vec![case.mu_ann]),
            DMatrix::from_vec(1, 1, vec![case.sigma_ann * case.sigma_ann]),
        )
        .unwrap();

        let tail =
            parametric_var_es(&book, &f, &moments, case.p, case.horizon_days, 252.0).unwrap();

        let h = case.horizon_days as f64;
        let mu_h = case.mu_ann / 252.0 * h;
        let sigma_h = case.sigma_ann * (h / 252.0).sqrt();
        let z = normal_inv_cdf(1.0 - case.p);
        let expected_var = -(mu_h + z * sigma_h) * 100.0;
        let expected_es = (-mu_h + sigma_h * normal_pdf(z) / (1.0 - case.p)) * 100.0;

        assert_relative_eq!(tail.var, expected_var, epsilon = 1.0e-8);
        assert_relative_eq!(tail.es, expected_es, epsilon = 1.0e-8);
    }
}

// ============================================================================
// Monte Carlo against the parametric estimator on the same moments
// ============================================================================

#[test]
fn monte_carlo_converges_to_parametric_for_small_returns() {
    // With a one-day horizon and ~1% daily vol, exp(x) - 1 ~ x, so the
    // simulated tail should sit close to the closed form on the same moments.
    let f = frame(&[("X", &[99.0, 101.0, 100.0])]);
    let book = PositionBook::new().with_position("X", 1.0);
    let moments = Moments::new(
        vec!["X".to_string()],
        DVector::from_vec(vec![0.0]),
        DMatrix::from_vec(1, 1, vec![0.04]),
    )
    .unwrap();

    let para = parametric_var_es(&book, &f, &moments, 0.95, 1, 252.0).unwrap();
    let cfg = RiskConfig::default()
        .with_confidence(0.95)
        .with_n_sims(60_000)
        .with_seed(2024);
    let mc = monte_carlo_var_es(&book, &f, &moments, &cfg).unwrap();

    assert_relative_eq!(mc.var, para.var, max_relative = 0.03);
    assert_relative_eq!(mc.es, para.es, max_relative = 0.03);
}

#[test]
fn monte_carlo_is_reproducible_and_seed_sensitive() {
    let f = frame(&[("X", &choppy_prices(80)), ("Y", &choppy_prices(80))]);
    let book = PositionBook::new()
        .with_position("X", 3.0)
        .with_position("Y", 7.0);
    let moments = estimate_moments(&f, 252.0).unwrap();
    let cfg = RiskConfig::default().with_n_sims(1_000).with_seed(5);

    let a = monte_carlo_var_es(&book, &f, &moments, &cfg).unwrap();
    let b = monte_carlo_var_es(&book, &f, &moments, &cfg).unwrap();
    assert_eq!(a.var, b.var);
    assert_eq!(a.es, b.es);

    let c = monte_carlo_var_es(&book, &f, &moments, &cfg.with_seed(6)).unwrap();
    assert_ne!(a.var, c.var);
}

// ============================================================================
// Calibration properties
// ============================================================================

#[test]
fn covariance_estimate_is_symmetric_for_every_pair() {
    let a = choppy_prices(60);
    let b = linear_prices(60);
    let c: Vec<f64> = a.iter().map(|p| 500.0 - p * 0.5).collect();
    let f = frame(&[("A", &a), ("B", &b), ("C", &c)]);

    let cov = estimate_covariance_matrix(&f, 252.0).unwrap();
    for i in 0..3 {
        for j in 0..3 {
            assert_eq!(cov[(i, j)], cov[(j, i)], "asymmetry at ({i},{j})");
        }
    }
}

#[test]
fn two_asset_diversification_never_exceeds_comonotone_var() {
    let a = choppy_prices(150);
    let b: Vec<f64> = choppy_prices(150).iter().rev().cloned().collect();
    let f = frame(&[("A", &a), ("B", &b)]);
    let book = PositionBook::new()
        .with_position("A", 1.0)
        .with_position("B", 1.0);

    let moments = estimate_moments(&f, 252.0).unwrap();
    let combined = parametric_var_es(&book, &f, &moments, 0.99, 1, 252.0).unwrap();

    let alone_a = parametric_var_es(
        &PositionBook::new().with_position("A", 1.0),
        &f,
        &moments,
        0.99,
        1,
        252.0,
    )
    .unwrap();
    let alone_b = parametric_var_es(
        &PositionBook::new().with_position("B", 1.0),
        &f,
        &moments,
        0.99,
        1,
        252.0,
    )
    .unwrap();

    // Sub-additivity of normal VaR: diversification cannot hurt.
    assert!(combined.var <= alone_a.var + alone_b.var + 1.0e-9);
}
