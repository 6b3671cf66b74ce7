//! Command-line entry point for portfolio risk reports.
//!
//! Wires the CSV loader, the three VaR/ES estimators, and the rolling Monte
//! Carlo backtest into one batch utility. Each CSV argument holds one
//! ticker's daily closes (`Dates` / `PX_LAST` columns); the book is sized to
//! a fixed target notional per symbol at the latest close.

use std::error::Error;

use tracing::Level;

use openvar::calibration::estimate_moments;
use openvar::core::{PositionBook, PriceFrame, RiskConfig, Side};
use openvar::data::load_price_series;
use openvar::risk::{
    compute_weights, historical_var_es, monte_carlo_var_es, parametric_var_es,
    run_monte_carlo_backtest,
};

// Dollars allocated to each symbol at the latest close.
const TARGET_NOTIONAL: f64 = 100_000.0;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let files: Vec<String> = std::env::args().skip(1).collect();
    if files.is_empty() {
        eprintln!("usage: risk-report <prices.csv> [<prices.csv> ...]");
        std::process::exit(2);
    }

    let series = load_price_series(&files)?;
    let frame = PriceFrame::from_series(&series)?;

    let mut book = PositionBook::new();
    for ticker in frame.tickers() {
        let last = frame.price_at(frame.num_rows() - 1, ticker)?;
        book = book.with_position(ticker, (TARGET_NOTIONAL / last).floor().max(1.0));
    }

    let cfg = RiskConfig::default();
    let (weights, v0) = compute_weights(&book, &frame)?;

    println!(
        "portfolio: {} assets over {} shared dates, V0 = {v0:.2}",
        frame.num_tickers(),
        frame.num_rows()
    );
    for (i, ticker) in frame.tickers().iter().enumerate() {
        println!(
            "  {ticker:<8} {:>12.1} shares  weight {:.4}",
            book.shares(ticker).unwrap_or(0.0),
            weights[i]
        );
    }

    let historical = historical_var_es(&book, &frame, cfg.confidence, cfg.horizon_days, Side::Long)?;
    println!(
        "historical  {:>4.1}% {}d  var {:>12.2}  es {:>12.2}",
        cfg.confidence * 100.0,
        cfg.horizon_days,
        historical.var,
        historical.es
    );

    let moments = estimate_moments(&frame, cfg.trading_days_per_year)?;
    let parametric = parametric_var_es(
        &book,
        &frame,
        &moments,
        cfg.confidence,
        cfg.horizon_days,
        cfg.trading_days_per_year,
    )?;
    println!(
        "parametric  {:>4.1}% {}d  var {:>12.2}  es {:>12.2}",
        cfg.confidence * 100.0,
        cfg.horizon_days,
        parametric.var,
        parametric.es
    );

    let simulated = monte_carlo_var_es(&book, &frame, &moments, &cfg)?;
    println!(
        "monte carlo {:>4.1}% {}d  var {:>12.2}  es {:>12.2}  ({} paths, seed {})",
        cfg.confidence * 100.0,
        cfg.horizon_days,
        simulated.var,
        simulated.es,
        cfg.n_sims,
        cfg.seed
    );

    if frame.num_rows() > cfg.window {
        let report = run_monte_carlo_backtest(&frame, &book, Side::Long, &cfg)?;
        println!(
            "backtest    {} days, {} exceptions ({:.2}% observed vs {:.2}% target)",
            report.exceptions.len(),
            report.exceptions.count(),
            report.exception_rate * 100.0,
            (1.0 - cfg.confidence) * 100.0
        );
        println!(
            "kupiec      lr {:.4}  p-value {:.4}  -> {}",
            report.kupiec.lr_statistic,
            report.kupiec.p_value,
            if report.kupiec.p_value < 0.05 {
                "reject coverage"
            } else {
                "coverage accepted"
            }
        );
    } else {
        println!(
            "backtest    skipped: {} rows < window {} + 1",
            frame.num_rows(),
            cfg.window
        );
    }

    Ok(())
}
