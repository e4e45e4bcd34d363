//! Price bars from per-ticker CSV files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::PriceSource;
use crate::types::PriceBar;
use crate::Result;

/// Reads `<dir>/<TICKER>.csv` files with a `date,open,high,low,close,volume`
/// header. A missing file means no data for that ticker.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    /// Create a source reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the source reads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding a ticker's bars.
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker.to_uppercase()))
    }

    /// Parse bars from CSV text.
    pub fn parse(content: &str) -> Result<Vec<PriceBar>> {
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for row in reader.deserialize() {
            bars.push(row?);
        }
        Ok(bars)
    }
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    fn id(&self) -> &'static str {
        "CSV"
    }

    async fn fetch_prices(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let path = self.path_for(ticker);
        if !tokio::fs::try_exists(&path).await? {
            tracing::debug!(ticker, path = %path.display(), "No price file");
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let mut bars: Vec<PriceBar> = Self::parse(&content)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        bars.sort_by_key(|b| b.date);

        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PRICES: &str = "\
date,open,high,low,close,volume
2024-01-03,101.0,103.0,100.5,102.5,1200
2024-01-02,100.0,101.5,99.0,101.0,1000
2024-01-04,102.5,104.0,101.0,103.0,900
";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_parse() {
        let bars = CsvPriceSource::parse(PRICES).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, day(3));
        assert_eq!(bars[0].close, 102.5);
        assert_eq!(bars[1].volume, 1000);
    }

    #[test]
    fn test_parse_rejects_bad_rows() {
        let broken = "date,open,high,low,close,volume\nnot-a-date,1,1,1,1,1\n";
        assert!(CsvPriceSource::parse(broken).is_err());
    }

    #[tokio::test]
    async fn test_fetch_filters_and_sorts() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("ACME.csv"), PRICES).unwrap();

        let source = CsvPriceSource::new(dir.path());
        let bars = source.fetch_prices("acme", day(2), day(3)).await.unwrap();

        let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![day(2), day(3)]);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let source = CsvPriceSource::new(dir.path());

        let bars = source.fetch_prices("NONE", day(1), day(9)).await.unwrap();
        assert!(bars.is_empty());
    }
}
