//! Closed-form parametric (delta-normal) VaR/ES.
//!
//! Assumes portfolio returns are normally distributed at the chosen horizon,
//! a deliberate approximation distinct from the empirical estimators. Under
//! that assumption both metrics have closed forms:
//!
//! ```text
//! z     = Phi^-1(1 - p)
//! VaR_r = -(mu_p + z * sigma_p)
//! ES_r  = -mu_p + sigma_p * phi(z) / (1 - p)
//! ```
//!
//! with `mu_p`, `sigma_p` the horizon-scaled portfolio moments and results
//! converted to dollars through the current notional.

use crate::calibration::Moments;
use crate::core::{PositionBook, PriceFrame, RiskError, TailRisk};
use crate::math::{normal_inv_cdf, normal_pdf};

use super::weights::compute_weights;
use super::{validate_confidence, validate_horizon};

// Quadratic forms of a PSD matrix can dip this far below zero from round-off;
// anything more negative means the covariance input itself is broken.
const VARIANCE_ROUNDOFF_TOL: f64 = 1.0e-10;

/// Parametric VaR and ES in dollar terms.
///
/// Annual moments are rescaled to the horizon (`x / trading_days *
/// horizon_days`), portfolio mean and volatility come from the weight vector
/// (`w . mu_h` and `sqrt(w . cov_h . w)`), and the normal closed forms above
/// are evaluated at confidence `p`.
///
/// Fails with `NonPositiveDefiniteCovariance` when the covariance quadratic
/// form is materially negative.
pub fn parametric_var_es(
    positions: &PositionBook,
    frame: &PriceFrame,
    moments: &Moments,
    p: f64,
    horizon_days: usize,
    trading_days_per_year: f64,
) -> Result<TailRisk, RiskError> {
    validate_confidence(p)?;
    validate_horizon(horizon_days)?;

    let (w, v0) = compute_weights(positions, frame)?;
    let (mu_ann, cov_ann) = moments.select(&positions.tickers())?;

    let scale = horizon_days as f64 / trading_days_per_year;
    let mu_h = mu_ann.scale(scale);
    let cov_h = cov_ann.scale(scale);

    let mu_p = w.dot(&mu_h);
    let variance = (&cov_h * &w).dot(&w);
    if variance < -VARIANCE_ROUNDOFF_TOL {
        return Err(RiskError::NonPositiveDefiniteCovariance);
    }
    let sigma_p = variance.max(0.0).sqrt();

    let z = normal_inv_cdf(1.0 - p);
    let var_r = -(mu_p + z * sigma_p);
    let es_r = -mu_p + sigma_p * normal_pdf(z) / (1.0 - p);

    Ok(TailRisk {
        var: var_r * v0,
        es: es_r * v0,
    })
}
