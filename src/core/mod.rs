//! Core error and configuration types shared by calibration, estimation, and
//! backtesting.

pub mod types;

pub use types::*;

/// Errors surfaced by the risk API.
///
/// Every variant is local and non-recoverable for the call that produced it:
/// the detecting function fails fast and returns immediately, with no retry or
/// partial-result policy. Degenerate-but-valid inputs (zero exceptions, zero
/// volatility) produce defined results, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    /// Fewer observations than the requested statistic needs.
    InsufficientData { required: usize, available: usize },
    /// Total portfolio notional is zero, so weights are undefined.
    ZeroPortfolioValue,
    /// Parameter or count outside its documented domain.
    InvalidInput(String),
    /// Series feeding an elementwise operation do not share dates.
    Misaligned(String),
    /// Covariance matrix cannot support a multivariate normal draw.
    NonPositiveDefiniteCovariance,
}

impl std::fmt::Display for RiskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientData {
                required,
                available,
            } => write!(
                f,
                "insufficient data: need at least {required} observations, got {available}"
            ),
            Self::ZeroPortfolioValue => write!(f, "portfolio value is zero"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::Misaligned(msg) => write!(f, "misaligned series: {msg}"),
            Self::NonPositiveDefiniteCovariance => {
                write!(f, "covariance matrix is not positive semi-definite")
            }
        }
    }
}

impl std::error::Error for RiskError {}

/// Estimation parameters carried explicitly into each call.
///
/// Replaces process-wide configuration constants: nothing in the crate reads
/// global state, so two calls with different configs never interfere.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RiskConfig {
    /// VaR confidence level in `(0, 1)`.
    pub confidence: f64,
    /// Expected Shortfall confidence level in `(0, 1)`.
    pub es_confidence: f64,
    /// Holding period in trading days.
    pub horizon_days: usize,
    /// Rolling calibration window length in trading days.
    pub window: usize,
    /// Trading days per year used for annualization.
    pub trading_days_per_year: f64,
    /// Number of Monte Carlo trials.
    pub n_sims: usize,
    /// RNG seed for reproducible Monte Carlo draws.
    pub seed: u64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            confidence: 0.99,
            es_confidence: 0.975,
            horizon_days: 1,
            window: 250,
            trading_days_per_year: 252.0,
            n_sims: 10_000,
            seed: 42,
        }
    }
}

impl RiskConfig {
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_horizon_days(mut self, horizon_days: usize) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_n_sims(mut self, n_sims: usize) -> Self {
        self.n_sims = n_sims;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
