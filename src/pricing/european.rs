//! Black-Scholes closed forms for European calls and puts.
//!
//! References: Hull, *Options, Futures, and Other Derivatives* (11th ed.),
//! Ch. 15.
//!
//! Degenerate-input policy: zero volatility (or zero time to expiry) is a
//! valid input with a defined sentinel price, not an error: the call returns
//! its undiscounted intrinsic value `max(S - K, 0)` and the put its
//! strike-discounted counterpart `max(K e^{-rT} - S, 0)`.

use crate::math::normal_cdf;

use super::OptionType;

// Below this level the d1/d2 terms lose all meaning numerically.
const MIN_VOL: f64 = 1.0e-12;

/// Black-Scholes price for a European option with zero dividend yield.
///
/// Parameters:
/// - `s`: current spot price.
/// - `k`: strike price.
/// - `r`: continuously compounded risk-free rate (annualized).
/// - `sigma`: implied volatility (annualized).
/// - `t`: time to expiry in years.
///
/// # Panics
/// Panics if `s` or `k` is not strictly positive, `sigma` is negative, `t` is
/// negative, or any input is non-finite.
pub fn bs_price(option_type: OptionType, s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    validate_inputs(s, k, r, sigma, t);

    if sigma <= MIN_VOL || t <= 0.0 {
        return match option_type {
            OptionType::Call => (s - k).max(0.0),
            OptionType::Put => (k * (-r * t).exp() - s).max(0.0),
        };
    }

    let vt = sigma * t.sqrt();
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / vt;
    let d2 = d1 - vt;
    let df = (-r * t).exp();

    match option_type {
        OptionType::Call => s * normal_cdf(d1) - k * df * normal_cdf(d2),
        OptionType::Put => k * df * normal_cdf(-d2) - s * normal_cdf(-d1),
    }
}

/// Black-Scholes price for a European call.
///
/// # Examples
/// ```rust
/// use openvar::pricing::bs_call;
///
/// let price = bs_call(100.0, 100.0, 0.05, 0.20, 1.0);
/// assert!(price > 10.0 && price < 11.0);
/// ```
pub fn bs_call(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    bs_price(OptionType::Call, s, k, r, sigma, t)
}

/// Black-Scholes price for a European put.
pub fn bs_put(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> f64 {
    bs_price(OptionType::Put, s, k, r, sigma, t)
}

fn validate_inputs(s: f64, k: f64, r: f64, sigma: f64, t: f64) {
    assert!(s.is_finite() && s > 0.0, "spot must be finite and > 0");
    assert!(k.is_finite() && k > 0.0, "strike must be finite and > 0");
    assert!(r.is_finite(), "rate must be finite");
    assert!(
        sigma.is_finite() && sigma >= 0.0,
        "volatility must be finite and >= 0"
    );
    assert!(t.is_finite() && t >= 0.0, "expiry must be finite and >= 0");
}
