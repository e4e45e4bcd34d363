//! Portfolio risk metrics calculation.
//!
//! Provides Sharpe ratio, Sortino ratio, max drawdown and volatility
//! calculations. VaR and CVaR are not supported and say so explicitly.

use super::{mean, sample_std, ZERO_VARIANCE_TOLERANCE};
use crate::timeline::ReturnSeries;
use crate::types::{Drawdown, ReturnPoint, RiskReport};
use crate::{Error, Result};

/// Calculate the risk report for a return timeline.
///
/// # Arguments
///
/// * `series` - Any timeline with daily returns (usually the portfolio)
/// * `risk_free_rate` - Annual risk-free rate (e.g., 0.02 for 2%)
/// * `periods_per_year` - Trading periods per year (typically 252)
///
/// # Returns
///
/// The report with ratios set to `None` where they are undefined, or an error
/// if the timeline is empty.
pub fn calculate_risk_report<S: ReturnSeries + ?Sized>(
    series: &S,
    risk_free_rate: f64,
    periods_per_year: u32,
) -> Result<RiskReport> {
    let points = series.return_points();
    let returns = returns_after_first_date(&points);

    let drawdown = calculate_max_drawdown(&points)?;
    let sharpe = sharpe_ratio(&returns, risk_free_rate, periods_per_year);
    let sortino = sortino_ratio(&returns, risk_free_rate, periods_per_year);

    if sharpe.is_none() {
        tracing::warn!(
            observations = returns.len(),
            "Sharpe ratio undefined for this return series"
        );
    }

    Ok(RiskReport {
        sharpe_ratio: sharpe,
        sortino_ratio: sortino,
        volatility_annualized: volatility(&returns, periods_per_year),
        max_drawdown: drawdown.max_drawdown,
        max_drawdown_pct: drawdown.max_drawdown_pct,
        peak_date: drawdown.peak_date,
        trough_date: drawdown.trough_date,
        risk_free_rate,
        periods_per_year,
    })
}

/// Defined daily returns strictly after the first date of the series.
pub(crate) fn returns_after_first_date(points: &[ReturnPoint]) -> Vec<f64> {
    let Some(first) = points.first().map(|p| p.date) else {
        return Vec::new();
    };

    points
        .iter()
        .filter(|p| p.date > first)
        .filter_map(|p| p.relative_daily_return)
        .collect()
}

fn excess_returns(returns: &[f64], risk_free_rate: f64, periods_per_year: u32) -> Vec<f64> {
    let daily_rf = risk_free_rate / periods_per_year as f64;
    returns.iter().map(|r| r - daily_rf).collect()
}

/// Calculate the maximum drawdown of a return timeline.
///
/// Works on the wealth index `1 + cumulative_return`. The trough is the first
/// date with the deepest drawdown; the peak is the latest date at or before
/// the trough where wealth equals the running maximum at the trough.
pub fn calculate_max_drawdown(points: &[ReturnPoint]) -> Result<Drawdown> {
    let wealth: Vec<f64> = points
        .iter()
        .map(|p| 1.0 + p.relative_cumulative_return)
        .collect();

    let (max_drawdown, peak, trough) = max_drawdown_of_wealth(&wealth).ok_or_else(|| {
        Error::InsufficientData("Max drawdown needs at least one data point".to_string())
    })?;

    Ok(Drawdown {
        max_drawdown,
        max_drawdown_pct: max_drawdown * 100.0,
        peak_date: points[peak].date,
        trough_date: points[trough].date,
    })
}

/// Returns `(max_drawdown, peak_index, trough_index)` for a wealth index.
fn max_drawdown_of_wealth(wealth: &[f64]) -> Option<(f64, usize, usize)> {
    let first = *wealth.first()?;

    let mut running_max = Vec::with_capacity(wealth.len());
    let mut current_max = first;
    for &value in wealth {
        if value > current_max {
            current_max = value;
        }
        running_max.push(current_max);
    }

    let mut max_drawdown = 0.0;
    let mut trough = 0;
    for (i, (&value, &peak_value)) in wealth.iter().zip(&running_max).enumerate() {
        let drawdown = (value - peak_value) / peak_value;
        if drawdown < max_drawdown {
            max_drawdown = drawdown;
            trough = i;
        }
    }

    // Walk back from the trough to where the running max was last reached
    let peak_value = running_max[trough];
    let peak = (0..=trough)
        .rev()
        .find(|&i| wealth[i] == peak_value)
        .unwrap_or(0);

    Some((max_drawdown, peak, trough))
}

/// Calculate Sharpe ratio from daily returns.
///
/// # Arguments
///
/// * `returns` - Daily returns
/// * `risk_free_rate` - Annual risk-free rate
/// * `periods_per_year` - Trading periods per year
///
/// # Returns
///
/// Annualized Sharpe ratio, or `None` with fewer than two returns or zero
/// variance.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: u32) -> Option<f64> {
    if periods_per_year == 0 {
        return None;
    }
    let excess = excess_returns(returns, risk_free_rate, periods_per_year);
    let std = sample_std(&excess)?;
    if std <= ZERO_VARIANCE_TOLERANCE {
        return None;
    }

    Some(mean(&excess)? / std * (periods_per_year as f64).sqrt())
}

/// Calculate Sortino ratio from daily returns.
///
/// Downside deviation is `sqrt(mean(min(excess, 0)^2))` over every period,
/// not only the negative ones.
///
/// # Returns
///
/// Annualized Sortino ratio, or `None` when there is no downside deviation.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: u32) -> Option<f64> {
    if periods_per_year == 0 {
        return None;
    }
    let excess = excess_returns(returns, risk_free_rate, periods_per_year);
    let downside: Vec<f64> = excess.iter().map(|e| e.min(0.0).powi(2)).collect();
    let downside_deviation = mean(&downside)?.sqrt();

    if downside_deviation <= ZERO_VARIANCE_TOLERANCE {
        return None;
    }

    Some(mean(&excess)? / downside_deviation * (periods_per_year as f64).sqrt())
}

/// Calculate annualized volatility (sample standard deviation) from returns.
pub fn volatility(returns: &[f64], periods_per_year: u32) -> Option<f64> {
    if periods_per_year == 0 {
        return None;
    }
    sample_std(returns).map(|std| std * (periods_per_year as f64).sqrt())
}

/// Value at Risk is not implemented.
///
/// Always returns [`Error::UnsupportedMetric`] so that callers cannot mistake
/// it for a computed zero-risk result.
pub fn value_at_risk(_returns: &[f64], _confidence: f64) -> Result<f64> {
    Err(Error::UnsupportedMetric("value_at_risk"))
}

/// Conditional Value at Risk (expected shortfall) is not implemented.
pub fn conditional_value_at_risk(_returns: &[f64], _confidence: f64) -> Result<f64> {
    Err(Error::UnsupportedMetric("conditional_value_at_risk"))
}
