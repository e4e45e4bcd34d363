//! Benchmark return timeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::returns::{cumulative_returns, relative_returns};
use super::{normalize_bars, ReturnSeries};
use crate::types::{PriceBar, ReturnPoint};
use crate::Result;

/// One row of a benchmark timeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkRecord {
    pub date: NaiveDate,
    pub close: f64,
    pub relative_daily_return: Option<f64>,
    pub relative_cumulative_return: f64,
}

/// Return series of a reference index such as the S&P 500.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkTimeline {
    ticker: String,
    name: String,
    records: Vec<BenchmarkRecord>,
}

impl BenchmarkTimeline {
    /// Build a benchmark timeline from raw price bars.
    ///
    /// Uses the same bar normalization and return math as asset timelines,
    /// without share or value columns.
    pub fn build(ticker: &str, name: &str, bars: Vec<PriceBar>) -> Result<Self> {
        let ticker = ticker.trim().to_uppercase();
        let bars = normalize_bars(&ticker, bars, None)?;

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let daily = relative_returns(&closes);
        let cumulative = cumulative_returns(&daily);

        let records = bars
            .iter()
            .zip(daily)
            .zip(cumulative)
            .map(|((bar, relative_daily_return), relative_cumulative_return)| {
                BenchmarkRecord {
                    date: bar.date,
                    close: bar.close,
                    relative_daily_return,
                    relative_cumulative_return,
                }
            })
            .collect();

        Ok(Self {
            ticker,
            name: name.to_string(),
            records,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Display name, e.g. "S&P 500".
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[BenchmarkRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ReturnSeries for BenchmarkTimeline {
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
