//! Data model for the risk engine: validated price containers, the position
//! book, and the small value types returned by estimators.
//!
//! All containers are computed fresh per call and immutable once constructed;
//! alignment between series is established explicitly (never positionally) so
//! that elementwise consumers can fail with [`RiskError::Misaligned`] instead
//! of silently reindexing.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::RiskError;

/// Ordered `(date, price)` history for one ticker.
///
/// Invariants enforced at construction: dates strictly increasing (hence no
/// duplicates), prices finite and strictly positive, both columns the same
/// length and non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new(dates: Vec<NaiveDate>, prices: Vec<f64>) -> Result<Self, RiskError> {
        if dates.len() != prices.len() {
            return Err(RiskError::InvalidInput(format!(
                "dates ({}) and prices ({}) must have the same length",
                dates.len(),
                prices.len()
            )));
        }
        if dates.is_empty() {
            return Err(RiskError::InsufficientData {
                required: 1,
                available: 0,
            });
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RiskError::InvalidInput(
                "dates must be strictly increasing".to_string(),
            ));
        }
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(RiskError::InvalidInput(
                "prices must be finite and strictly positive".to_string(),
            ));
        }
        Ok(Self { dates, prices })
    }

    pub fn from_pairs(pairs: Vec<(NaiveDate, f64)>) -> Result<Self, RiskError> {
        let (dates, prices) = pairs.into_iter().unzip();
        Self::new(dates, prices)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Most recent price in the series.
    pub fn last_price(&self) -> f64 {
        self.prices[self.prices.len() - 1]
    }
}

/// Several tickers joined on the intersection of their dates.
///
/// This is the single explicit alignment step in the crate: every estimator
/// consumes an already-aligned frame, so per-row arithmetic across tickers is
/// well defined. Columns are stored in sorted ticker order, which makes every
/// derived vector and matrix ordering deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceFrame {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl PriceFrame {
    /// Joins per-ticker series on their shared dates.
    ///
    /// Fails with `InsufficientData` when the input map is empty or when the
    /// date intersection is empty (fully disjoint histories).
    pub fn from_series(series: &BTreeMap<String, PriceSeries>) -> Result<Self, RiskError> {
        if series.is_empty() {
            return Err(RiskError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for s in series.values() {
            for d in s.dates() {
                *counts.entry(*d).or_insert(0) += 1;
            }
        }
        let dates: Vec<NaiveDate> = counts
            .into_iter()
            .filter(|(_, n)| *n == series.len())
            .map(|(d, _)| d)
            .collect();
        if dates.is_empty() {
            return Err(RiskError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let mut tickers = Vec::with_capacity(series.len());
        let mut columns = Vec::with_capacity(series.len());
        for (ticker, s) in series {
            let by_date: BTreeMap<NaiveDate, f64> = s
                .dates()
                .iter()
                .copied()
                .zip(s.prices().iter().copied())
                .collect();
            let column = dates.iter().map(|d| by_date[d]).collect();
            tickers.push(ticker.clone());
            columns.push(column);
        }

        Ok(Self {
            dates,
            tickers,
            columns,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn num_tickers(&self) -> usize {
        self.tickers.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Full price column for `ticker`, if present.
    pub fn column(&self, ticker: &str) -> Option<&[f64]> {
        let idx = self.tickers.iter().position(|t| t == ticker)?;
        Some(&self.columns[idx])
    }

    /// Price of `ticker` at row `row`.
    pub fn price_at(&self, row: usize, ticker: &str) -> Result<f64, RiskError> {
        if row >= self.num_rows() {
            return Err(RiskError::InvalidInput(format!(
                "row {row} out of range for frame with {} rows",
                self.num_rows()
            )));
        }
        let column = self
            .column(ticker)
            .ok_or_else(|| RiskError::InvalidInput(format!("unknown ticker {ticker}")))?;
        Ok(column[row])
    }

    /// Sub-frame over rows `[start, end)`, keeping every ticker.
    pub fn slice_rows(&self, start: usize, end: usize) -> Result<Self, RiskError> {
        if start >= end || end > self.num_rows() {
            return Err(RiskError::InvalidInput(format!(
                "row range [{start}, {end}) invalid for frame with {} rows",
                self.num_rows()
            )));
        }
        Ok(Self {
            dates: self.dates[start..end].to_vec(),
            tickers: self.tickers.clone(),
            columns: self.columns.iter().map(|c| c[start..end].to_vec()).collect(),
        })
    }
}

/// Ticker to share-count mapping.
///
/// Share counts are always positive; direction of exposure is the explicit
/// [`Side`] argument of the estimators, never the share-count sign. Backed by
/// a `BTreeMap` so iteration order (and hence every weight-vector ordering
/// derived from it) is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionBook {
    positions: BTreeMap<String, f64>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a holding.
    ///
    /// # Panics
    /// Panics if `shares` is non-finite or not strictly positive.
    pub fn with_position(mut self, ticker: &str, shares: f64) -> Self {
        assert!(
            shares.is_finite() && shares > 0.0,
            "share count must be finite and > 0"
        );
        self.positions.insert(ticker.to_string(), shares);
        self
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn shares(&self, ticker: &str) -> Option<f64> {
        self.positions.get(ticker).copied()
    }

    /// Holdings in sorted ticker order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.positions.iter().map(|(t, s)| (t.as_str(), *s))
    }

    /// Tickers in sorted order.
    pub fn tickers(&self) -> Vec<String> {
        self.positions.keys().cloned().collect()
    }
}

/// Direction of portfolio exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Converts a signed P&L into a raw (unclipped) loss for this side.
    ///
    /// A long position loses when P&L is negative, a short when it is positive.
    pub fn loss(self, pnl: f64) -> f64 {
        match self {
            Self::Long => -pnl,
            Self::Short => pnl,
        }
    }
}

/// Which tail metric a unified estimator entry point should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskMeasure {
    ValueAtRisk,
    ExpectedShortfall,
}

/// Dollar VaR/ES pair at a single confidence level.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TailRisk {
    pub var: f64,
    pub es: f64,
}

impl TailRisk {
    pub fn select(&self, measure: RiskMeasure) -> f64 {
        match measure {
            RiskMeasure::ValueAtRisk => self.var,
            RiskMeasure::ExpectedShortfall => self.es,
        }
    }
}

/// Date-indexed numeric series (portfolio P&L, VaR forecasts).
#[derive(Debug, Clone, PartialEq)]
pub struct DatedSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl DatedSeries {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, RiskError> {
        if dates.len() != values.len() {
            return Err(RiskError::InvalidInput(format!(
                "dates ({}) and values ({}) must have the same length",
                dates.len(),
                values.len()
            )));
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RiskError::InvalidInput(
                "dates must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { dates, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Verifies date-for-date equality with `other`.
    ///
    /// This is the explicit join check elementwise consumers run before any
    /// arithmetic; there is no implicit reindexing or interpolation.
    pub fn ensure_aligned(&self, other: &DatedSeries) -> Result<(), RiskError> {
        if self.len() != other.len() {
            return Err(RiskError::Misaligned(format!(
                "series lengths differ: {} vs {}",
                self.len(),
                other.len()
            )));
        }
        for (i, (a, b)) in self.dates.iter().zip(other.dates.iter()).enumerate() {
            if a != b {
                return Err(RiskError::Misaligned(format!(
                    "dates differ at index {i}: {a} vs {b}"
                )));
            }
        }
        Ok(())
    }

    /// Sub-series restricted to dates at or after `from`.
    pub fn from_date(&self, from: NaiveDate) -> DatedSeries {
        let start = self.dates.partition_point(|d| *d < from);
        DatedSeries {
            dates: self.dates[start..].to_vec(),
            values: self.values[start..].to_vec(),
        }
    }
}

/// Per-day VaR breach indicators aligned with the series they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionSeries {
    dates: Vec<NaiveDate>,
    flags: Vec<bool>,
}

impl ExceptionSeries {
    pub(crate) fn new(dates: Vec<NaiveDate>, flags: Vec<bool>) -> Self {
        debug_assert_eq!(dates.len(), flags.len());
        Self { dates, flags }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    /// Number of breach days.
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&x| x).count()
    }
}

/// Kupiec proportion-of-failures test output: the likelihood-ratio statistic
/// (`>= 0`, chi-square with 1 df under the null) and its p-value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KupiecResult {
    pub lr_statistic: f64,
    pub p_value: f64,
}
