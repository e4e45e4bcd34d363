//! Portfolio-level timeline aggregated across asset timelines.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::asset::AssetTimeline;
use super::returns::cumulative_returns;
use super::ReturnSeries;
use crate::types::ReturnPoint;
use crate::{Error, Result};

/// One row of the portfolio timeline. Field order is the persisted column order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PortfolioRecord {
    pub date: NaiveDate,
    /// `absolute_daily_return / portfolio_value_bop`; `None` when BoP is zero
    pub relative_daily_return: Option<f64>,
    pub relative_cumulative_return: f64,
    pub absolute_daily_return: f64,
    #[serde(rename = "portfolio_value_BoP")]
    pub portfolio_value_bop: f64,
    #[serde(rename = "portfolio_value_EoP")]
    pub portfolio_value_eop: f64,
    /// Number of holdings with a row on this date
    pub active_assets: usize,
}

/// Running sums for one date.
#[derive(Debug, Default, Clone, Copy)]
struct DayTotals {
    bop: f64,
    eop: f64,
    absolute: f64,
    assets: usize,
}

/// Portfolio value and returns over the union of all holding dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioTimeline {
    records: Vec<PortfolioRecord>,
}

impl PortfolioTimeline {
    /// Aggregate asset timelines into a portfolio timeline.
    ///
    /// Each date sums BoP, EoP and absolute return over the assets that have a
    /// row on that date. Assets contribute nothing before their first row.
    pub fn aggregate<'a, I>(timelines: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a AssetTimeline>,
    {
        let mut by_date: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
        let mut asset_count = 0;

        for timeline in timelines {
            asset_count += 1;
            for record in timeline.records() {
                let totals = by_date.entry(record.date).or_default();
                totals.bop += record.asset_value_bop;
                totals.eop += record.asset_value_eop;
                totals.absolute += record.absolute_daily_return;
                totals.assets += 1;
            }
        }

        if by_date.is_empty() {
            return Err(Error::EmptyPortfolio);
        }

        let daily: Vec<Option<f64>> = by_date
            .values()
            .map(|t| (t.bop != 0.0).then(|| t.absolute / t.bop))
            .collect();
        let cumulative = cumulative_returns(&daily);

        let records: Vec<PortfolioRecord> = by_date
            .into_iter()
            .zip(daily)
            .zip(cumulative)
            .map(|(((date, totals), relative_daily_return), relative_cumulative_return)| {
                PortfolioRecord {
                    date,
                    relative_daily_return,
                    relative_cumulative_return,
                    absolute_daily_return: totals.absolute,
                    portfolio_value_bop: totals.bop,
                    portfolio_value_eop: totals.eop,
                    active_assets: totals.assets,
                }
            })
            .collect();

        tracing::info!(
            assets = asset_count,
            dates = records.len(),
            "Aggregated portfolio timeline"
        );

        Ok(Self { records })
    }

    /// All records in ascending date order.
    pub fn records(&self) -> &[PortfolioRecord] {
        &self.records
    }

    /// Record for a specific date.
    pub fn get(&self, date: NaiveDate) -> Option<&PortfolioRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|idx| &self.records[idx])
    }

    pub fn first(&self) -> Option<&PortfolioRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&PortfolioRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ReturnSeries for PortfolioTimeline {
    fn return_points(&self) -> Vec<ReturnPoint> {
        self.records
            .iter()
            .map(|r| ReturnPoint {
                date: r.date,
                relative_daily_return: r.relative_daily_return,
                relative_cumulative_return: r.relative_cumulative_return,
            })
            .collect()
    }
}
