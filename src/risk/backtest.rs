//! VaR backtest validation: realized portfolio P&L, exception indicators, and
//! the Kupiec proportion-of-failures test.
//!
//! The Kupiec statistic compares the observed exception rate against the rate
//! implied by the VaR confidence level with a likelihood ratio that is
//! chi-square with one degree of freedom under the null:
//!
//! ```text
//! l1 = x ln(x/n) + (n - x) ln((n - x)/n)     empirical rate
//! l0 = x ln(p0)  + (n - x) ln(1 - p0)        hypothesized rate p0 = 1 - p
//! LR = 2 (l1 - l0)
//! ```
//!
//! The log-likelihood difference form is used throughout; it avoids forming
//! the raw likelihoods as products of small probabilities before the ratio.
//!
//! References:
//! - Kupiec (1995), unconditional coverage test.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::core::{
    DatedSeries, ExceptionSeries, KupiecResult, PositionBook, PriceFrame, RiskConfig, RiskError,
    Side,
};

use super::monte_carlo::rolling_var_series;
use super::weights::compute_portfolio_values;
use super::{validate_confidence, validate_horizon};

/// Historical portfolio P&L over the holding horizon.
///
/// `pnl(t) = value(t) - value(t - horizon_days)`; the first `horizon_days`
/// entries are undefined and dropped, so the result is indexed by the dates
/// from row `horizon_days` onward.
pub fn compute_portfolio_pnl(
    positions: &PositionBook,
    frame: &PriceFrame,
    horizon_days: usize,
) -> Result<DatedSeries, RiskError> {
    validate_horizon(horizon_days)?;

    let values = compute_portfolio_values(positions, frame)?;
    if values.len() <= horizon_days {
        return Err(RiskError::InsufficientData {
            required: horizon_days + 1,
            available: values.len(),
        });
    }

    let pnl: Vec<f64> = (horizon_days..values.len())
        .map(|t| values[t] - values[t - horizon_days])
        .collect();
    DatedSeries::new(frame.dates()[horizon_days..].to_vec(), pnl)
}

/// Flags the days on which realized loss exceeded the contemporaneous VaR.
///
/// An exception is `(-pnl) > var`. The two series must share dates exactly;
/// any mismatch is `Misaligned`; there is no implicit reindexing or
/// interpolation.
pub fn compute_exceptions(
    pnl: &DatedSeries,
    var_series: &DatedSeries,
) -> Result<ExceptionSeries, RiskError> {
    pnl.ensure_aligned(var_series)?;

    let flags = pnl
        .values()
        .iter()
        .zip(var_series.values())
        .map(|(pnl, var)| -pnl > *var)
        .collect();
    Ok(ExceptionSeries::new(pnl.dates().to_vec(), flags))
}

/// Kupiec proportion-of-failures test.
///
/// Zero exceptions or all-exceptions are perfect-fit degenerate cases and
/// return exactly `(0.0, 1.0)` rather than evaluating `ln(0)`.
///
/// Fails with `InvalidInput` when `n_obs == 0` or `n_exceptions > n_obs` or
/// `p` lies outside `(0, 1)`.
pub fn kupiec_test(n_exceptions: usize, n_obs: usize, p: f64) -> Result<KupiecResult, RiskError> {
    validate_confidence(p)?;
    if n_obs == 0 {
        return Err(RiskError::InvalidInput("n_obs must be > 0".to_string()));
    }
    if n_exceptions > n_obs {
        return Err(RiskError::InvalidInput(format!(
            "n_exceptions {n_exceptions} exceeds n_obs {n_obs}"
        )));
    }

    if n_exceptions == 0 || n_exceptions == n_obs {
        return Ok(KupiecResult {
            lr_statistic: 0.0,
            p_value: 1.0,
        });
    }

    let p0 = 1.0 - p;
    let x = n_exceptions as f64;
    let n = n_obs as f64;

    let l1 = x * (x / n).ln() + (n - x) * ((n - x) / n).ln();
    let l0 = x * p0.ln() + (n - x) * (1.0 - p0).ln();
    let lr = (2.0 * (l1 - l0)).max(0.0);

    let chi = ChiSquared::new(1.0).expect("valid chi-square dof");
    let p_value = 1.0 - chi.cdf(lr);

    Ok(KupiecResult {
        lr_statistic: lr,
        p_value,
    })
}

/// Rolling Monte Carlo VaR backtest over one portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBacktestReport {
    /// Rolling one-step VaR forecasts, one per post-window date.
    pub var_series: DatedSeries,
    /// Breach indicators aligned with `var_series`.
    pub exceptions: ExceptionSeries,
    /// Fraction of backtest days that breached VaR.
    pub exception_rate: f64,
    /// Unconditional-coverage test of the breach count.
    pub kupiec: KupiecResult,
}

/// Runs the full rolling Monte Carlo backtest: per-date recalibrated VaR
/// forecasts, realized P&L, exception flags, and the Kupiec verdict.
///
/// Requires `cfg.window >= cfg.horizon_days` so every forecast date has a
/// defined realized P&L.
pub fn run_monte_carlo_backtest(
    frame: &PriceFrame,
    positions: &PositionBook,
    side: Side,
    cfg: &RiskConfig,
) -> Result<VarBacktestReport, RiskError> {
    if cfg.window < cfg.horizon_days {
        return Err(RiskError::InvalidInput(format!(
            "window {} shorter than horizon {}",
            cfg.window, cfg.horizon_days
        )));
    }

    let var_series = rolling_var_series(frame, positions, side, cfg)?;
    let pnl = compute_portfolio_pnl(positions, frame, cfg.horizon_days)?
        .from_date(var_series.dates()[0]);

    let exceptions = compute_exceptions(&pnl, &var_series)?;
    let kupiec = kupiec_test(exceptions.count(), exceptions.len(), cfg.confidence)?;
    let exception_rate = exceptions.count() as f64 / exceptions.len() as f64;

    tracing::info!(
        days = exceptions.len(),
        exceptions = exceptions.count(),
        lr_statistic = kupiec.lr_statistic,
        p_value = kupiec.p_value,
        "monte carlo var backtest complete"
    );

    Ok(VarBacktestReport {
        var_series,
        exceptions,
        exception_rate,
        kupiec,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::{Days, NaiveDate};

    use crate::core::PriceSeries;

    use super::*;

    fn d(i: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Days::new(i)
    }

    fn one_asset_frame(prices: Vec<f64>) -> PriceFrame {
        let dates = (0..prices.len() as u64).map(d).collect();
        let mut map = BTreeMap::new();
        map.insert("A".to_string(), PriceSeries::new(dates, prices).unwrap());
        PriceFrame::from_series(&map).unwrap()
    }

    #[test]
    fn two_day_pnl_drops_the_undefined_first_entry() {
        let frame = one_asset_frame(vec![100.0, 102.0]);
        let book = PositionBook::new().with_position("A", 1.0);

        let pnl = compute_portfolio_pnl(&book, &frame, 1).unwrap();
        assert_eq!(pnl.len(), 1);
        assert_eq!(pnl.dates(), &[d(1)]);
        assert_abs_diff_eq!(pnl.values()[0], 2.0, epsilon = 1.0e-8);
    }

    #[test]
    fn exceptions_flag_losses_beyond_var() {
        let dates: Vec<NaiveDate> = (0..4).map(d).collect();
        let pnl = DatedSeries::new(dates.clone(), vec![0.0, -5.0, -1.0, -10.0]).unwrap();
        let var = DatedSeries::new(dates, vec![1.0; 4]).unwrap();

        let exc = compute_exceptions(&pnl, &var).unwrap();
        assert_eq!(exc.flags(), &[false, true, false, true]);
        assert_eq!(exc.count(), 2);

        let (lr, p_value) = {
            let k = kupiec_test(exc.count(), exc.len(), 0.95).unwrap();
            (k.lr_statistic, k.p_value)
        };
        assert!(lr >= 0.0);
        assert!((0.0..=1.0).contains(&p_value));
    }

    #[test]
    fn misaligned_series_are_rejected() {
        let pnl = DatedSeries::new(vec![d(0), d(1)], vec![0.0, -5.0]).unwrap();
        let shifted = DatedSeries::new(vec![d(1), d(2)], vec![1.0, 1.0]).unwrap();
        let shorter = DatedSeries::new(vec![d(0)], vec![1.0]).unwrap();

        assert!(matches!(
            compute_exceptions(&pnl, &shifted),
            Err(RiskError::Misaligned(_))
        ));
        assert!(matches!(
            compute_exceptions(&pnl, &shorter),
            Err(RiskError::Misaligned(_))
        ));
    }

    #[test]
    fn kupiec_degenerate_counts_return_perfect_fit() {
        for n in [1usize, 10, 250, 1000] {
            for p in [0.95, 0.99] {
                assert_eq!(
                    kupiec_test(0, n, p).unwrap(),
                    KupiecResult {
                        lr_statistic: 0.0,
                        p_value: 1.0
                    }
                );
                assert_eq!(
                    kupiec_test(n, n, p).unwrap(),
                    KupiecResult {
                        lr_statistic: 0.0,
                        p_value: 1.0
                    }
                );
            }
        }
    }

    #[test]
    fn kupiec_statistic_is_nonnegative_with_probability_p_value() {
        for (x, n) in [(1usize, 100usize), (5, 250), (13, 250), (40, 500), (3, 1000)] {
            let k = kupiec_test(x, n, 0.99).unwrap();
            assert!(k.lr_statistic >= 0.0);
            assert!((0.0..=1.0).contains(&k.p_value));
        }
    }

    #[test]
    fn kupiec_on_target_rate_is_not_rejected() {
        // 5 exceptions in 500 days at 99% is exactly the expected count.
        let k = kupiec_test(5, 500, 0.99).unwrap();
        assert!(k.p_value > 0.10);

        // 25 exceptions in 500 days is a fivefold breach rate.
        let bad = kupiec_test(25, 500, 0.99).unwrap();
        assert!(bad.lr_statistic > k.lr_statistic);
        assert!(bad.p_value < 0.01);
    }

    #[test]
    fn kupiec_matches_hand_computed_statistic() {
        let x = 10.0_f64;
        let n = 250.0_f64;
        let p0 = 0.01_f64;
        let l1 = x * (x / n).ln() + (n - x) * ((n - x) / n).ln();
        let l0 = x * p0.ln() + (n - x) * (1.0 - p0).ln();

        let k = kupiec_test(10, 250, 0.99).unwrap();
        assert_relative_eq!(k.lr_statistic, 2.0 * (l1 - l0), epsilon = 1.0e-12);
    }

    #[test]
    fn kupiec_rejects_out_of_range_counts() {
        assert!(matches!(
            kupiec_test(1, 0, 0.99),
            Err(RiskError::InvalidInput(_))
        ));
        assert!(matches!(
            kupiec_test(11, 10, 0.99),
            Err(RiskError::InvalidInput(_))
        ));
        assert!(matches!(
            kupiec_test(1, 10, 1.0),
            Err(RiskError::InvalidInput(_))
        ));
    }

    #[test]
    fn backtest_report_aligns_exceptions_with_forecasts() {
        // Mildly noisy uptrend: long positions rarely breach.
        let mut prices = Vec::with_capacity(80);
        let mut p = 100.0;
        for i in 0..80 {
            p *= if i % 7 == 3 { 0.985 } else { 1.004 };
            prices.push(p);
        }
        let frame = one_asset_frame(prices);
        let book = PositionBook::new().with_position("A", 10.0);
        let cfg = RiskConfig::default()
            .with_confidence(0.95)
            .with_window(60)
            .with_n_sims(200)
            .with_seed(11);

        let report = run_monte_carlo_backtest(&frame, &book, Side::Long, &cfg).unwrap();
        assert_eq!(report.var_series.len(), 20);
        assert_eq!(report.exceptions.len(), 20);
        assert_eq!(report.exceptions.dates(), report.var_series.dates());
        assert!(report.kupiec.p_value.is_finite());
        assert_relative_eq!(
            report.exception_rate,
            report.exceptions.count() as f64 / 20.0,
            epsilon = 1.0e-12
        );
    }
}
