//! Holdings input file loading.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Holding;
use crate::{Error, Result};

/// Accepted buy-in date formats, tried in order.
const DATE_FORMATS: [&str; 2] = ["%d.%m.%Y", "%Y-%m-%d"];

/// A holdings row as written in the input file, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoldingRow {
    pub ticker: String,
    /// Buy-in date, `DD.MM.YYYY` or `YYYY-MM-DD`
    #[serde(default)]
    pub buy_in_date: String,
    /// Invested amount; `None` when the cell is blank or not a number
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub buy_in_amount: Option<f64>,
    /// Declared share count, informational only
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub shares: Option<f64>,
}

impl HoldingRow {
    /// Validate the row into a [`Holding`].
    ///
    /// Fails with [`Error::UnparsableDate`] for a bad date and
    /// [`Error::InvalidHolding`] for a bad ticker or a missing or invalid
    /// amount. A missing share count is taken as 0.
    pub fn to_holding(&self) -> Result<Holding> {
        let ticker = self.ticker.trim().to_uppercase();
        let buy_in_date =
            parse_buy_in_date(&self.buy_in_date).ok_or_else(|| Error::UnparsableDate {
                ticker: ticker.clone(),
                value: self.buy_in_date.clone(),
            })?;
        let buy_in_amount = self.buy_in_amount.ok_or_else(|| {
            Error::InvalidHolding(format!("{ticker}: missing or non-numeric buy-in amount"))
        })?;

        Holding::new(
            &self.ticker,
            buy_in_date,
            buy_in_amount,
            self.shares.unwrap_or(0.0),
        )
    }
}

/// Parse a buy-in date in any of the accepted formats.
pub fn parse_buy_in_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Read holdings rows from CSV text with a
/// `ticker,buy_in_date,buy_in_amount,shares` header.
pub fn read_holdings(content: &str) -> Result<Vec<HoldingRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Load holdings rows from a CSV file.
pub fn load_holdings(path: &Path) -> Result<Vec<HoldingRow>> {
    let content = fs::read_to_string(path)?;
    let rows = read_holdings(&content)?;
    tracing::info!(path = %path.display(), holdings = rows.len(), "Loaded holdings");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HOLDINGS: &str = "\
ticker,buy_in_date,buy_in_amount,shares
AAPL,15.03.2023,1500,10
msft, 2023-06-01 ,2500.5,8
SAP,31.02.2023,1000,5
";

    #[test]
    fn test_parse_buy_in_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 15).unwrap();
        assert_eq!(parse_buy_in_date("15.03.2023"), Some(expected));
        assert_eq!(parse_buy_in_date("2023-03-15"), Some(expected));
        assert_eq!(parse_buy_in_date(" 15.03.2023 "), Some(expected));
    }

    #[test]
    fn test_parse_buy_in_date_invalid() {
        assert_eq!(parse_buy_in_date("31.02.2023"), None);
        assert_eq!(parse_buy_in_date(""), None);
        assert_eq!(parse_buy_in_date("03/15/2023"), None);
    }

    #[test]
    fn test_read_holdings() {
        let rows = read_holdings(HOLDINGS).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].ticker, "msft");
        assert_eq!(rows[1].buy_in_amount, Some(2500.5));
    }

    #[test]
    fn test_to_holding() {
        let rows = read_holdings(HOLDINGS).unwrap();

        let aapl = rows[0].to_holding().unwrap();
        assert_eq!(aapl.ticker, "AAPL");
        assert_eq!(aapl.shares_declared, 10.0);

        let msft = rows[1].to_holding().unwrap();
        assert_eq!(msft.ticker, "MSFT");
        assert_eq!(
            msft.buy_in_date,
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
        );

        let sap = rows[2].to_holding();
        assert!(matches!(
            sap,
            Err(Error::UnparsableDate { ticker, value }) if ticker == "SAP" && value == "31.02.2023"
        ));
    }

    #[test]
    fn test_to_holding_rejects_zero_amount() {
        let row = HoldingRow {
            ticker: "AAPL".to_string(),
            buy_in_date: "2023-01-02".to_string(),
            buy_in_amount: Some(0.0),
            shares: Some(1.0),
        };
        assert!(matches!(row.to_holding(), Err(Error::InvalidHolding(_))));
    }

    #[test]
    fn test_blank_cells_stay_on_their_row() {
        let rows = read_holdings(
            "\
ticker,buy_in_date,buy_in_amount,shares
AAPL,01.03.2024,1800,10
MSFT,01.03.2024,2000,
SAP,01.03.2024,,5
NVDA,01.03.2024,lots,5
",
        )
        .unwrap();
        assert_eq!(rows.len(), 4);

        let aapl = rows[0].to_holding().unwrap();
        assert_eq!(aapl.shares_declared, 10.0);

        // Blank share count is informational only
        let msft = rows[1].to_holding().unwrap();
        assert_eq!(msft.buy_in_amount, 2000.0);
        assert_eq!(msft.shares_declared, 0.0);

        assert_eq!(rows[2].buy_in_amount, None);
        assert!(matches!(
            rows[2].to_holding(),
            Err(Error::InvalidHolding(reason)) if reason.starts_with("SAP")
        ));
        assert!(matches!(rows[3].to_holding(), Err(Error::InvalidHolding(_))));
    }

    #[test]
    fn test_load_holdings_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("holdings.csv");
        std::fs::write(&path, HOLDINGS).unwrap();

        let rows = load_holdings(&path).unwrap();
        assert_eq!(rows.len(), 3);
    }
}
