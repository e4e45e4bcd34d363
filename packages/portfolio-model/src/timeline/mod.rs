//! Per-date timelines for holdings, benchmarks and the aggregated portfolio.
//!
//! Every timeline is an ordered, immutable sequence of per-date records:
//!
//! - **AssetTimeline**: one holding's values and returns
//! - **BenchmarkTimeline**: returns of a reference index
//! - **PortfolioTimeline**: date-by-date sums over all asset timelines

mod asset;
mod benchmark;
mod portfolio;
mod returns;

pub use asset::{AssetRecord, AssetTimeline};
pub use benchmark::{BenchmarkRecord, BenchmarkTimeline};
pub use portfolio::{PortfolioRecord, PortfolioTimeline};
pub use returns::{
    annualize_rate, annualize_return, cumulative_returns, relative_returns, round_cents,
};

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::types::{PriceBar, ReturnPoint};
use crate::{Error, Result};

/// A timeline that exposes a daily return series.
pub trait ReturnSeries {
    /// Return points in ascending date order.
    fn return_points(&self) -> Vec<ReturnPoint>;

    /// First date of the series, if any.
    fn first_date(&self) -> Option<NaiveDate> {
        self.return_points().first().map(|p| p.date)
    }

    /// Last date of the series, if any.
    fn last_date(&self) -> Option<NaiveDate> {
        self.return_points().last().map(|p| p.date)
    }
}

/// Sort bars by date, keep the last bar for a repeated date, and drop bars
/// before `since`.
///
/// Fails with [`Error::MissingData`] when nothing is left and with
/// [`Error::InvalidData`] on non-finite or non-positive closes.
pub(crate) fn normalize_bars(
    ticker: &str,
    bars: Vec<PriceBar>,
    since: Option<NaiveDate>,
) -> Result<Vec<PriceBar>> {
    let by_date: BTreeMap<NaiveDate, PriceBar> = bars
        .into_iter()
        .filter(|bar| since.map_or(true, |start| bar.date >= start))
        .map(|bar| (bar.date, bar))
        .collect();

    if by_date.is_empty() {
        return Err(Error::MissingData(ticker.to_string()));
    }

    if let Some(bar) = by_date
        .values()
        .find(|bar| !bar.close.is_finite() || bar.close <= 0.0)
    {
        return Err(Error::InvalidData {
            ticker: ticker.to_string(),
            reason: format!("close {} on {}", bar.close, bar.date),
        });
    }

    Ok(by_date.into_values().collect())
}
