//! Market data and holdings inputs.
//!
//! Price data comes from a [`PriceSource`]; the pipeline only depends on the
//! trait, so sources can be swapped without touching the analytics.

mod csv_source;
mod holdings;
#[cfg(feature = "yahoo")]
mod yahoo;

pub use csv_source::CsvPriceSource;
pub use holdings::{load_holdings, parse_buy_in_date, read_holdings, HoldingRow};
#[cfg(feature = "yahoo")]
pub use yahoo::YahooPriceSource;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::PriceBar;
use crate::Result;

/// A source of daily price bars.
///
/// An empty vector means the source has no data for the ticker in that range;
/// the pipeline treats it as missing data and skips the ticker.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short identifier used in logs, e.g. "CSV" or "YAHOO".
    fn id(&self) -> &'static str;

    /// Fetch daily bars for `ticker` with dates in `[start, end]`, ascending.
    async fn fetch_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>>;
}

/// In-memory price source keyed by ticker.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceSource {
    bars: HashMap<String, Vec<PriceBar>>,
}

impl StaticPriceSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the bars of a ticker.
    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.insert(ticker, bars);
        self
    }

    /// Add or replace the bars of a ticker.
    pub fn insert(&mut self, ticker: &str, bars: Vec<PriceBar>) {
        self.bars.insert(ticker.to_uppercase(), bars);
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    fn id(&self) -> &'static str {
        "STATIC"
    }

    async fn fetch_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        Ok(self
            .bars
            .get(&ticker.to_uppercase())
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}
