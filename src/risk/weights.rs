//! Portfolio valuation: dollar values, total notional, and weight vectors
//! derived from share counts and prices.

use nalgebra::DVector;

use crate::core::{PositionBook, PriceFrame, RiskError};

/// Weight vector and total notional from the latest frame prices.
///
/// Dollar value per ticker is `shares * latest price`; `V0` is their sum and
/// the weights are `values / V0`. Ordering follows the book's sorted tickers.
///
/// Fails with `ZeroPortfolioValue` when `V0 == 0` and with `InvalidInput` when
/// the book is empty or holds a ticker absent from the frame.
pub fn compute_weights(
    positions: &PositionBook,
    frame: &PriceFrame,
) -> Result<(DVector<f64>, f64), RiskError> {
    weights_at_row(positions, frame, frame.num_rows() - 1)
}

/// Weight vector and notional priced at a specific frame row.
///
/// Used by the rolling Monte Carlo estimator, which values the book at the
/// evaluation date rather than at the end of the history.
pub fn weights_at_row(
    positions: &PositionBook,
    frame: &PriceFrame,
    row: usize,
) -> Result<(DVector<f64>, f64), RiskError> {
    if positions.is_empty() {
        return Err(RiskError::InvalidInput(
            "position book must not be empty".to_string(),
        ));
    }

    let mut values = Vec::with_capacity(positions.len());
    for (ticker, shares) in positions.iter() {
        values.push(shares * frame.price_at(row, ticker)?);
    }

    let v0: f64 = values.iter().sum();
    if v0 == 0.0 {
        return Err(RiskError::ZeroPortfolioValue);
    }

    let w = DVector::from_iterator(values.len(), values.iter().map(|v| v / v0));
    Ok((w, v0))
}

/// Portfolio dollar value at every frame row: `sum_i shares_i * price_i(t)`.
pub fn compute_portfolio_values(
    positions: &PositionBook,
    frame: &PriceFrame,
) -> Result<Vec<f64>, RiskError> {
    if positions.is_empty() {
        return Err(RiskError::InvalidInput(
            "position book must not be empty".to_string(),
        ));
    }

    let mut values = vec![0.0; frame.num_rows()];
    for (ticker, shares) in positions.iter() {
        let column = frame
            .column(ticker)
            .ok_or_else(|| RiskError::InvalidInput(format!("unknown ticker {ticker}")))?;
        for (v, price) in values.iter_mut().zip(column) {
            *v += shares * price;
        }
    }
    Ok(values)
}
