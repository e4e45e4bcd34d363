//! Per-holding timeline built from raw price bars.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::returns::{cumulative_returns, relative_returns, round_cents};
use super::{normalize_bars, ReturnSeries};
use crate::types::{Holding, PriceBar, ReturnPoint};
use crate::Result;

/// One row of an asset timeline. Field order is the persisted column order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AssetRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// Buy-in amount divided by the first close
    pub shares_calculated: f64,
    /// Share count declared on the holding
    pub shares_actual: f64,
    pub relative_daily_return: Option<f64>,
    pub relative_cumulative_return: f64,
    /// Change in end-of-period value from the previous row
    pub absolute_daily_return: f64,
    /// Previous row's end-of-period value, zero on the first row
    #[serde(rename = "asset_value_BoP")]
    pub asset_value_bop: f64,
    /// `shares_calculated * close`, rounded to cents
    #[serde(rename = "asset_value_EoP")]
    pub asset_value_eop: f64,
}

/// Timeline of a single holding from its buy-in date onwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetTimeline {
    holding: Holding,
    records: Vec<AssetRecord>,
}

impl AssetTimeline {
    /// Build the timeline of `holding` from its raw price bars.
    ///
    /// Bars dated before the buy-in date are ignored. Fails with
    /// [`Error::MissingData`](crate::Error::MissingData) when no bar remains;
    /// callers are expected to skip the holding and carry on.
    pub fn build(holding: &Holding, bars: Vec<PriceBar>) -> Result<Self> {
        let bars = normalize_bars(&holding.ticker, bars, Some(holding.buy_in_date))?;

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let daily = relative_returns(&closes);
        let cumulative = cumulative_returns(&daily);

        // Reconciles declared shares with the provider's price convention
        let shares_calculated = holding.buy_in_amount / closes[0];

        let mut records = Vec::with_capacity(bars.len());
        let mut previous_eop = 0.0;

        for (i, bar) in bars.iter().enumerate() {
            let asset_value_eop = round_cents(shares_calculated * bar.close);

            records.push(AssetRecord {
                date: bar.date,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                shares_calculated,
                shares_actual: holding.shares_declared,
                relative_daily_return: daily[i],
                relative_cumulative_return: cumulative[i],
                absolute_daily_return: asset_value_eop - previous_eop,
                asset_value_bop: previous_eop,
                asset_value_eop,
            });

            previous_eop = asset_value_eop;
        }

        tracing::debug!(
            ticker = %holding.ticker,
            rows = records.len(),
            shares_calculated,
            "Built asset timeline"
        );

        Ok(Self {
            holding: holding.clone(),
            records,
        })
    }

    /// Ticker of the underlying holding.
    pub fn ticker(&self) -> &str {
        &self.holding.ticker
    }

    /// The holding this timeline was built from.
    pub fn holding(&self) -> &Holding {
        &self.holding
    }

    /// All records in ascending date order.
    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    /// Record for a specific date, if the asset was held that day.
    pub fn get(&self, date: NaiveDate) -> Option<&AssetRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// First record (the buy-in row).
    pub fn first(&self) -> Option<&AssetRecord> {
        self.records.first()
    }

    /// Most recent record.
    pub fn last(&self) -> Option<&AssetRecord> {
        self.records.last()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the timeline has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Shares derived from the buy-in amount and first close.
    pub fn shares_calculated(&self) -> f64 {
        self.records.first().map_or(0.0, |r| r.shares_calculated)
    }
}

impl ReturnSeries for AssetTimeline {
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
