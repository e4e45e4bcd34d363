//! Core data types for the portfolio model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A daily OHLCV price bar as delivered by a price source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    /// Trading date
    pub date: NaiveDate,
    /// Opening price
    pub open: f64,
    /// Highest price of the day
    pub high: f64,
    /// Lowest price of the day
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Traded volume
    pub volume: u64,
}

impl PriceBar {
    /// Create a bar where open, high, low and close are all the same price.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}

/// A holding in the portfolio: what was bought, when, and for how much.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    /// Ticker symbol (uppercase)
    pub ticker: String,
    /// Acquisition date; the first day the holding contributes
    pub buy_in_date: NaiveDate,
    /// Amount invested at acquisition
    pub buy_in_amount: f64,
    /// Share count as declared by the user
    pub shares_declared: f64,
}

impl Holding {
    /// Create a holding, rejecting non-positive or non-finite buy-in amounts.
    pub fn new(
        ticker: &str,
        buy_in_date: NaiveDate,
        buy_in_amount: f64,
        shares_declared: f64,
    ) -> Result<Self> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(Error::InvalidHolding("empty ticker".to_string()));
        }
        if !buy_in_amount.is_finite() || buy_in_amount <= 0.0 {
            return Err(Error::InvalidHolding(format!(
                "{ticker}: buy-in amount must be positive, got {buy_in_amount}"
            )));
        }

        Ok(Self {
            ticker,
            buy_in_date,
            buy_in_amount,
            shares_declared,
        })
    }
}

/// One point of a return series, shared by every timeline kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    /// Period-over-period return; `None` where it is undefined
    pub relative_daily_return: Option<f64>,
    /// Compounded return since the first point
    pub relative_cumulative_return: f64,
}

/// Peak-to-trough decline of a wealth index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Drawdown {
    /// Largest decline as a (non-positive) fraction, e.g. -0.25
    pub max_drawdown: f64,
    /// `max_drawdown` expressed in percent
    pub max_drawdown_pct: f64,
    /// Date the running maximum was last reached before the trough
    pub peak_date: NaiveDate,
    /// Date of the deepest drawdown
    pub trough_date: NaiveDate,
}

/// Risk metrics for a return timeline.
///
/// Ratios are `None` when they are undefined for the series (zero variance,
/// no downside, too few observations), never coerced to zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskReport {
    /// Annualized Sharpe ratio
    pub sharpe_ratio: Option<f64>,
    /// Annualized Sortino ratio
    pub sortino_ratio: Option<f64>,
    /// Annualized volatility of daily returns
    pub volatility_annualized: Option<f64>,
    /// Largest drawdown as a fraction
    pub max_drawdown: f64,
    /// Largest drawdown in percent
    pub max_drawdown_pct: f64,
    pub peak_date: NaiveDate,
    pub trough_date: NaiveDate,
    /// Annual risk-free rate used for the excess returns
    pub risk_free_rate: f64,
    pub periods_per_year: u32,
}

/// OLS regression of portfolio returns on a benchmark's returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionResult {
    /// Display name of the benchmark
    pub benchmark_name: String,
    /// Intercept of the fit (per period)
    pub alpha: f64,
    /// `(1 + alpha)^periods_per_year - 1`
    pub alpha_annualized: f64,
    /// Slope of the fit
    pub beta: f64,
    /// Coefficient of determination; `None` if the portfolio series is flat
    pub r_squared: Option<f64>,
    /// Annualized standard deviation of active returns
    pub tracking_error: Option<f64>,
    /// Annualized mean active return over tracking error
    pub information_ratio: Option<f64>,
    /// Number of dates that entered the fit
    pub observations: usize,
}

/// Headline performance numbers for a portfolio timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// End-of-period value on the first date
    pub start_value: f64,
    /// End-of-period value on the last date
    pub end_value: f64,
    /// Sum over holdings of last minus first end-of-period value; excludes
    /// the capital each holding was bought with
    pub total_absolute_return: f64,
    /// Compounded return over the whole timeline
    pub cumulative_return: f64,
    /// Cumulative return scaled to one year; `None` for a single-day timeline
    pub annualized_return: Option<f64>,
}

/// API response wrapper used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
