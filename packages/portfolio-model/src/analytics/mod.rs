//! Portfolio analytics over return timelines.
//!
//! Provides risk metrics, benchmark regression and performance summaries.

mod performance;
mod regression;
mod risk;

pub use performance::summarize_performance;
pub use regression::{regress, regress_benchmark};
pub use risk::{
    calculate_max_drawdown, calculate_risk_report, conditional_value_at_risk, sharpe_ratio,
    sortino_ratio, value_at_risk, volatility,
};

/// Standard deviations at or below this are treated as zero.
pub(crate) const ZERO_VARIANCE_TOLERANCE: f64 = 1e-12;

/// Default number of trading periods in a year.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
