//! Drift and covariance calibration from daily price histories.
//!
//! All statistics are computed on day-over-day natural-log returns and
//! annualized by `trading_days_per_year` (drift) or its square root
//! (volatility). Multi-asset inputs arrive pre-aligned as a [`PriceFrame`],
//! so pairwise covariances are taken over exactly the shared date set.

use nalgebra::{DMatrix, DVector};

use crate::core::{PriceFrame, PriceSeries, RiskError};
use crate::math::{sample_mean, sample_std_dev};

/// Annualized drift vector and covariance matrix for a set of tickers.
///
/// Recomputed per calibration window and never mutated; the ticker list fixes
/// the index order of both the vector and the matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Moments {
    tickers: Vec<String>,
    mu_ann: DVector<f64>,
    cov_ann: DMatrix<f64>,
}

impl Moments {
    pub fn new(
        tickers: Vec<String>,
        mu_ann: DVector<f64>,
        cov_ann: DMatrix<f64>,
    ) -> Result<Self, RiskError> {
        let n = tickers.len();
        if mu_ann.len() != n || cov_ann.nrows() != n || cov_ann.ncols() != n {
            return Err(RiskError::InvalidInput(format!(
                "moment dimensions must match ticker count {n}"
            )));
        }
        Ok(Self {
            tickers,
            mu_ann,
            cov_ann,
        })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn mu_ann(&self) -> &DVector<f64> {
        &self.mu_ann
    }

    pub fn cov_ann(&self) -> &DMatrix<f64> {
        &self.cov_ann
    }

    /// Annualized drift for one ticker.
    pub fn drift(&self, ticker: &str) -> Option<f64> {
        let i = self.index_of(ticker)?;
        Some(self.mu_ann[i])
    }

    /// Drift sub-vector and covariance sub-matrix for `tickers`, in the
    /// requested order.
    ///
    /// This is the explicit label-based selection step that keeps estimator
    /// weight vectors and calibrated moments indexed identically.
    pub fn select(&self, tickers: &[String]) -> Result<(DVector<f64>, DMatrix<f64>), RiskError> {
        let mut idx = Vec::with_capacity(tickers.len());
        for t in tickers {
            let i = self
                .index_of(t)
                .ok_or_else(|| RiskError::InvalidInput(format!("unknown ticker {t}")))?;
            idx.push(i);
        }
        let mu = DVector::from_iterator(idx.len(), idx.iter().map(|&i| self.mu_ann[i]));
        let cov = DMatrix::from_fn(idx.len(), idx.len(), |r, c| self.cov_ann[(idx[r], idx[c])]);
        Ok((mu, cov))
    }

    fn index_of(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }
}

/// Day-over-day natural-log price ratios; length `len(prices) - 1`.
///
/// The undefined leading entry is dropped rather than emitted as a NaN.
pub fn log_returns(series: &PriceSeries) -> Vec<f64> {
    log_returns_of(series.prices())
}

pub(crate) fn log_returns_of(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}

/// Annualized mean and sample standard deviation (Bessel's correction) of
/// daily log returns.
///
/// A series of exactly two prices yields a single return: the drift is that
/// return annualized and the dispersion is reported as zero, since one
/// observation carries no spread information.
pub fn estimate_mu_sigma(
    series: &PriceSeries,
    trading_days_per_year: f64,
) -> Result<(f64, f64), RiskError> {
    validate_trading_days(trading_days_per_year)?;
    if series.len() < 2 {
        return Err(RiskError::InsufficientData {
            required: 2,
            available: series.len(),
        });
    }

    let returns = log_returns(series);
    let mu = sample_mean(&returns) * trading_days_per_year;
    let sigma = if returns.len() < 2 {
        0.0
    } else {
        sample_std_dev(&returns) * trading_days_per_year.sqrt()
    };
    Ok((mu, sigma))
}

/// Annualized sample covariance matrix of per-ticker log returns.
///
/// The frame is already joined on shared dates, so every return series has
/// identical length and date labels. The result is exactly symmetric by
/// construction, with entries scaled by `trading_days_per_year`.
pub fn estimate_covariance_matrix(
    frame: &PriceFrame,
    trading_days_per_year: f64,
) -> Result<DMatrix<f64>, RiskError> {
    validate_trading_days(trading_days_per_year)?;
    let panel = return_panel(frame)?;
    let n_assets = panel.len();
    let n_obs = panel[0].len();

    let means: Vec<f64> = panel.iter().map(|r| sample_mean(r)).collect();
    let mut cov = DMatrix::zeros(n_assets, n_assets);
    for i in 0..n_assets {
        for j in i..n_assets {
            let mut sum = 0.0;
            for t in 0..n_obs {
                sum += (panel[i][t] - means[i]) * (panel[j][t] - means[j]);
            }
            let v = sum / (n_obs as f64 - 1.0) * trading_days_per_year;
            cov[(i, j)] = v;
            cov[(j, i)] = v;
        }
    }
    Ok(cov)
}

/// Calibrates the full [`Moments`] bundle (drift vector + covariance matrix)
/// from a price frame.
pub fn estimate_moments(
    frame: &PriceFrame,
    trading_days_per_year: f64,
) -> Result<Moments, RiskError> {
    validate_trading_days(trading_days_per_year)?;
    let panel = return_panel(frame)?;
    let mu = DVector::from_iterator(
        panel.len(),
        panel
            .iter()
            .map(|r| sample_mean(r) * trading_days_per_year),
    );
    let cov = estimate_covariance_matrix(frame, trading_days_per_year)?;
    Moments::new(frame.tickers().to_vec(), mu, cov)
}

/// Log-return series per ticker, in frame column order.
///
/// Covariance needs at least two aligned returns (three shared dates) for the
/// Bessel denominator to be defined.
fn return_panel(frame: &PriceFrame) -> Result<Vec<Vec<f64>>, RiskError> {
    if frame.num_rows() < 3 {
        return Err(RiskError::InsufficientData {
            required: 3,
            available: frame.num_rows(),
        });
    }
    Ok(frame
        .tickers()
        .iter()
        .map(|t| log_returns_of(frame.column(t).expect("frame column for own ticker")))
        .collect())
}

fn validate_trading_days(trading_days_per_year: f64) -> Result<(), RiskError> {
    if !trading_days_per_year.is_finite() || trading_days_per_year <= 0.0 {
        return Err(RiskError::InvalidInput(format!(
            "trading_days_per_year must be finite and > 0, got {trading_days_per_year}"
        )));
    }
    Ok(())
}
