//! Portfolio risk estimators and backtest validation.
//!
//! Three VaR/ES estimators share one set of definitions (loss-positive
//! convention, linear-interpolation quantile, tail-mean ES, horizon scaling
//! from annualized moments) so their outputs are directly comparable:
//! - [`historical_var_es`], empirical quantiles of realized P&L,
//! - [`parametric_var_es`], closed-form delta-normal,
//! - [`monte_carlo_var_es`] / [`monte_carlo_at`], simulated correlated
//!   log-returns, with a rolling-window recalibration mode for backtesting.
//!
//! The [`backtest`] module validates any VaR series against realized P&L via
//! exception indicators and the Kupiec proportion-of-failures test.

pub mod backtest;
pub mod historical;
pub mod monte_carlo;
pub mod parametric;
pub mod weights;

pub use backtest::{
    VarBacktestReport, compute_exceptions, compute_portfolio_pnl, kupiec_test,
    run_monte_carlo_backtest,
};
pub use historical::historical_var_es;
pub use monte_carlo::{monte_carlo_at, monte_carlo_var_es, rolling_var_series};
pub use parametric::parametric_var_es;
pub use weights::{compute_portfolio_values, compute_weights};

use crate::core::RiskError;

pub(crate) fn validate_confidence(p: f64) -> Result<(), RiskError> {
    if !p.is_finite() || p <= 0.0 || p >= 1.0 {
        return Err(RiskError::InvalidInput(format!(
            "confidence must lie in (0, 1), got {p}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_horizon(horizon_days: usize) -> Result<(), RiskError> {
    if horizon_days == 0 {
        return Err(RiskError::InvalidInput(
            "horizon_days must be >= 1".to_string(),
        ));
    }
    Ok(())
}
