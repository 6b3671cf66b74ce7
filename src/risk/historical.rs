//! Historical-simulation VaR/ES from realized portfolio P&L.
//!
//! No distributional assumption and no calibration dependency: the estimator
//! differences the portfolio dollar-value series over the holding horizon and
//! reads the tail of the resulting empirical loss distribution directly.

use crate::core::{PositionBook, PriceFrame, RiskError, Side, TailRisk};
use crate::math::{empirical_quantile, tail_mean};

use super::weights::compute_portfolio_values;
use super::{validate_confidence, validate_horizon};

/// Historical VaR and ES in dollar terms.
///
/// Steps:
/// 1. portfolio value per row: `sum_i shares_i * price_i(t)`,
/// 2. P&L over the horizon: `v(t) - v(t - horizon_days)`, dropping the first
///    `horizon_days` undefined entries,
/// 3. raw loss per [`Side`], clipped at zero (one-sided tail risk),
/// 4. VaR = linear-interpolation p-quantile of the losses,
/// 5. ES = mean of losses at or above VaR.
///
/// Fails with `InsufficientData` when fewer than `horizon_days + 1` aligned
/// observations remain.
pub fn historical_var_es(
    positions: &PositionBook,
    frame: &PriceFrame,
    p: f64,
    horizon_days: usize,
    side: Side,
) -> Result<TailRisk, RiskError> {
    validate_confidence(p)?;
    validate_horizon(horizon_days)?;

    let values = compute_portfolio_values(positions, frame)?;
    if values.len() <= horizon_days {
        return Err(RiskError::InsufficientData {
            required: horizon_days + 1,
            available: values.len(),
        });
    }

    let mut losses: Vec<f64> = (horizon_days..values.len())
        .map(|t| side.loss(values[t] - values[t - horizon_days]).max(0.0))
        .collect();

    let var = empirical_quantile(&mut losses, p);
    let es = tail_mean(&losses, var);
    Ok(TailRisk { var, es })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::assert_relative_eq;
    use chrono::{Days, NaiveDate};

    use crate::core::PriceSeries;

    use super::*;

    fn one_asset_frame(prices: &[f64]) -> PriceFrame {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates = (0..prices.len() as u64).map(|i| start + Days::new(i)).collect();
        let mut map = BTreeMap::new();
        map.insert(
            "X".to_string(),
            PriceSeries::new(dates, prices.to_vec()).unwrap(),
        );
        PriceFrame::from_series(&map).unwrap()
    }

    fn linear_series(n: usize) -> Vec<f64> {
        // Prices rise by exactly $1/day.
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn long_position_on_rising_prices_never_loses() {
        let frame = one_asset_frame(&linear_series(100));
        let book = PositionBook::new().with_position("X", 1.0);

        let tail = historical_var_es(&book, &frame, 0.95, 1, Side::Long).unwrap();
        assert_eq!(tail.var, 0.0);
        assert_eq!(tail.es, 0.0);
    }

    #[test]
    fn short_position_on_rising_prices_loses_one_dollar_daily() {
        let frame = one_asset_frame(&linear_series(100));
        let book = PositionBook::new().with_position("X", 1.0);

        let tail = historical_var_es(&book, &frame, 0.95, 1, Side::Short).unwrap();
        assert_relative_eq!(tail.var, 1.0, epsilon = 1.0e-12);
        assert_relative_eq!(tail.es, 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn es_dominates_var_on_mixed_pnl() {
        let prices = [100.0, 99.0, 101.0, 97.0, 98.5, 96.0, 99.5, 94.0, 95.0, 93.0];
        let frame = one_asset_frame(&prices);
        let book = PositionBook::new().with_position("X", 10.0);

        let tail = historical_var_es(&book, &frame, 0.90, 1, Side::Long).unwrap();
        assert!(tail.var > 0.0);
        assert!(tail.es >= tail.var);
    }

    #[test]
    fn horizon_widening_shrinks_the_sample() {
        let frame = one_asset_frame(&linear_series(5));
        let book = PositionBook::new().with_position("X", 1.0);

        // 4 observations at horizon 1, error at horizon 5.
        assert!(historical_var_es(&book, &frame, 0.95, 4, Side::Short).is_ok());
        assert_eq!(
            historical_var_es(&book, &frame, 0.95, 5, Side::Short),
            Err(RiskError::InsufficientData {
                required: 6,
                available: 5
            })
        );
    }

    #[test]
    fn multi_day_horizon_accumulates_pnl() {
        let frame = one_asset_frame(&linear_series(10));
        let book = PositionBook::new().with_position("X", 1.0);

        // Over 2 days the price always rises by exactly $2.
        let tail = historical_var_es(&book, &frame, 0.95, 2, Side::Short).unwrap();
        assert_relative_eq!(tail.var, 2.0, epsilon = 1.0e-12);
        assert_relative_eq!(tail.es, 2.0, epsilon = 1.0e-12);
    }

    #[test]
    fn invalid_confidence_is_rejected() {
        let frame = one_asset_frame(&linear_series(10));
        let book = PositionBook::new().with_position("X", 1.0);
        for p in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                historical_var_es(&book, &frame, p, 1, Side::Long),
                Err(RiskError::InvalidInput(_))
            ));
        }
    }
}
