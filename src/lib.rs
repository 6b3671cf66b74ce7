//! OpenVaR computes market-risk metrics for a fixed-position equity portfolio:
//! historical-simulation, closed-form parametric (delta-normal), and Monte Carlo
//! Value-at-Risk and Expected Shortfall, a Kupiec proportion-of-failures
//! backtest, and elementary Black-Scholes option pricing.
//!
//! The crate is built for offline batch analysis of daily close-price series.
//! Every estimator is a pure function of its inputs (plus an explicit RNG seed
//! for Monte Carlo), so a given seed and data set reproduce results bit for bit.
//!
//! Conventions shared by all three estimators, so their outputs are comparable:
//! - losses are positive dollar amounts, clipped at zero (one-sided tail risk),
//! - VaR is the linear-interpolation p-quantile of the loss distribution,
//! - ES is the mean of losses at or above VaR,
//! - drift and covariance are annualized by `trading_days_per_year` and scaled
//!   back to the holding horizon before use.
//!
//! References used across modules:
//! - McNeil, Frey, Embrechts, *Quantitative Risk Management* (2005/2015), VaR/ES theory.
//! - J.P. Morgan/Reuters, *RiskMetrics Technical Document* (1996), delta-normal practice.
//! - Kupiec (1995), unconditional-coverage likelihood-ratio test.
//! - Glasserman (2004), correlated Monte Carlo simulation.
//!
//! # Feature Flags
//! - `parallel`: enables Rayon-powered fan-out of the rolling Monte Carlo backtest.
//!
//! # Quick Start
//! Historical VaR/ES for a one-asset portfolio:
//! ```rust
//! use std::collections::BTreeMap;
//!
//! use chrono::{Days, NaiveDate};
//! use openvar::core::{PositionBook, PriceFrame, PriceSeries, Side};
//! use openvar::risk::historical_var_es;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let dates: Vec<NaiveDate> = (0..10).map(|i| start + Days::new(i)).collect();
//! let prices = vec![100.0, 101.0, 99.5, 100.5, 98.0, 99.0, 101.5, 100.0, 102.0, 101.0];
//!
//! let mut series = BTreeMap::new();
//! series.insert("ACME".to_string(), PriceSeries::new(dates, prices).unwrap());
//! let frame = PriceFrame::from_series(&series).unwrap();
//! let book = PositionBook::new().with_position("ACME", 10.0);
//!
//! let tail = historical_var_es(&book, &frame, 0.95, 1, Side::Long).unwrap();
//! assert!(tail.es >= tail.var && tail.var >= 0.0);
//! ```
//!
//! Price a Black-Scholes call:
//! ```rust
//! use openvar::pricing::{bs_call, bs_put};
//!
//! let call = bs_call(100.0, 100.0, 0.05, 0.20, 1.0);
//! let put = bs_put(100.0, 100.0, 0.05, 0.20, 1.0);
//! assert!(call > put);
//! ```

pub mod calibration;
pub mod core;
pub mod data;
pub mod math;
pub mod pricing;
pub mod risk;
