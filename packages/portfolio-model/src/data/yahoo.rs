//! Daily price bars from Yahoo Finance.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate};
use yahoo_finance_api as yahoo;

use super::PriceSource;
use crate::types::PriceBar;
use crate::{Error, Result};

/// Yahoo Finance price source.
pub struct YahooPriceSource {
    connector: yahoo::YahooConnector,
}

impl fmt::Debug for YahooPriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YahooPriceSource").finish_non_exhaustive()
    }
}

impl YahooPriceSource {
    /// Create a new Yahoo Finance price source.
    pub fn new() -> Result<Self> {
        let connector = yahoo::YahooConnector::new().map_err(|e| Error::PriceSource {
            ticker: String::new(),
            reason: e.to_string(),
        })?;
        Ok(Self { connector })
    }
}

fn to_offset_datetime(ticker: &str, date: NaiveDate) -> Result<time::OffsetDateTime> {
    let timestamp = date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp).map_err(|e| Error::PriceSource {
        ticker: ticker.to_string(),
        reason: e.to_string(),
    })
}

/// Errors Yahoo uses to say the range holds no data.
fn is_no_data(error: &yahoo::YahooError) -> bool {
    matches!(
        error,
        yahoo::YahooError::EmptyDataSet | yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult
    )
}

#[async_trait]
impl PriceSource for YahooPriceSource {
    fn id(&self) -> &'static str {
        "YAHOO"
    }

    async fn fetch_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let source_error = |reason: String| Error::PriceSource {
            ticker: ticker.to_string(),
            reason,
        };

        // Yahoo treats the end of the range as exclusive
        let end_exclusive = end.checked_add_days(Days::new(1)).unwrap_or(end);
        let start_time = to_offset_datetime(ticker, start)?;
        let end_time = to_offset_datetime(ticker, end_exclusive)?;

        let response = match self
            .connector
            .get_quote_history(ticker, start_time, end_time)
            .await
        {
            Ok(response) => response,
            Err(e) if is_no_data(&e) => return Ok(Vec::new()),
            Err(e) => return Err(source_error(e.to_string())),
        };
        let quotes = match response.quotes() {
            Ok(quotes) => quotes,
            Err(e) if is_no_data(&e) => return Ok(Vec::new()),
            Err(e) => return Err(source_error(e.to_string())),
        };

        if quotes.is_empty() {
            tracing::debug!(ticker, %start, %end, "No quotes returned");
            return Ok(Vec::new());
        }

        let bars = quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(PriceBar {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .filter(|b| b.date >= start && b.date <= end)
            .collect();

        Ok(bars)
    }
}
