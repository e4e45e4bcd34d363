//! Portfolio performance analytics.

use crate::timeline::{annualize_return, AssetTimeline, PortfolioTimeline};
use crate::types::PerformanceSummary;
use crate::{Error, Result};

/// Summarize a portfolio timeline.
///
/// The absolute return is the change in value of each holding since its own
/// buy-in row, so later purchases are not counted as gains.
pub fn summarize_performance<'a, I>(
    portfolio: &PortfolioTimeline,
    assets: I,
    periods_per_year: u32,
) -> Result<PerformanceSummary>
where
    I: IntoIterator<Item = &'a AssetTimeline>,
{
    let (Some(first), Some(last)) = (portfolio.first(), portfolio.last()) else {
        return Err(Error::EmptyPortfolio);
    };

    let total_absolute_return: f64 = assets
        .into_iter()
        .filter_map(|asset| Some(asset.last()?.asset_value_eop - asset.first()?.asset_value_eop))
        .sum();

    let periods = portfolio.len() - 1;

    Ok(PerformanceSummary {
        start_date: first.date,
        end_date: last.date,
        start_value: first.portfolio_value_eop,
        end_value: last.portfolio_value_eop,
        total_absolute_return,
        cumulative_return: last.relative_cumulative_return,
        annualized_return: annualize_return(
            last.relative_cumulative_return,
            periods,
            periods_per_year,
        ),
    })
}
