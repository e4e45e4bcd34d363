//! End-to-end analytics pipeline.
//!
//! Sequences the steps over an injected [`PriceSource`]:
//!
//! 1. fetch and build one asset timeline per holding (concurrently)
//! 2. fetch and build benchmark timelines
//! 3. aggregate the portfolio timeline once every build has finished
//! 4. derive risk, regression and performance metrics
//!
//! Per-holding failures are collected as warnings and never abort the run.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::analytics::{
    calculate_risk_report, regress_benchmark, summarize_performance, TRADING_DAYS_PER_YEAR,
};
use crate::config::Config;
use crate::data::{HoldingRow, PriceSource};
use crate::timeline::{AssetTimeline, BenchmarkTimeline, PortfolioTimeline};
use crate::types::{Holding, PerformanceSummary, RegressionResult, RiskReport};
use crate::{Error, Result};

/// Parameters of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Annual risk-free rate
    pub risk_free_rate: f64,
    /// Trading periods per year
    pub periods_per_year: u32,
    /// Upper bound on concurrent price fetches
    pub max_concurrent_fetches: usize,
    /// Benchmark ticker to display name
    pub benchmarks: BTreeMap<String, String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            periods_per_year: TRADING_DAYS_PER_YEAR,
            max_concurrent_fetches: 4,
            benchmarks: BTreeMap::new(),
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            risk_free_rate: config.risk_free_rate,
            periods_per_year: config.periods_per_year,
            max_concurrent_fetches: config.max_concurrent_fetches,
            benchmarks: config.benchmarks.clone(),
        }
    }
}

/// A non-fatal problem encountered during a run.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// The price source returned no bars for a holding
    MissingData { ticker: String },
    /// A holding's buy-in date could not be parsed
    UnparsableDate { ticker: String, value: String },
    /// A holding row failed validation
    InvalidHolding { reason: String },
    /// A ticker appeared more than once; only the first holding is used
    DuplicateTicker { ticker: String },
    /// Fetching or building a holding's timeline failed
    FetchFailed { ticker: String, reason: String },
    /// A benchmark could not be built
    BenchmarkUnavailable { ticker: String, reason: String },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingData { ticker } => write!(f, "no price data for {ticker}, skipped"),
            Self::UnparsableDate { ticker, value } => {
                write!(f, "unparsable buy-in date {value:?} for {ticker}, skipped")
            }
            Self::InvalidHolding { reason } => write!(f, "invalid holding: {reason}"),
            Self::DuplicateTicker { ticker } => {
                write!(f, "duplicate holding for {ticker}, only the first is used")
            }
            Self::FetchFailed { ticker, reason } => {
                write!(f, "could not build {ticker}: {reason}")
            }
            Self::BenchmarkUnavailable { ticker, reason } => {
                write!(f, "benchmark {ticker} unavailable: {reason}")
            }
        }
    }
}

impl PipelineWarning {
    fn from_holding_error(error: Error) -> Self {
        match error {
            Error::UnparsableDate { ticker, value } => Self::UnparsableDate { ticker, value },
            other => Self::InvalidHolding {
                reason: other.to_string(),
            },
        }
    }

    fn from_build_error(ticker: &str, error: Error) -> Self {
        match error {
            Error::MissingData(ticker) => Self::MissingData { ticker },
            other => Self::FetchFailed {
                ticker: ticker.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Everything a pipeline run produces.
///
/// Portfolio-level metrics are kept as `Result`s so callers can decide
/// whether to omit a failed metric or abort.
#[derive(Debug)]
pub struct PipelineReport {
    /// Asset timelines keyed by ticker
    pub assets: BTreeMap<String, AssetTimeline>,
    pub portfolio: PortfolioTimeline,
    /// Benchmark timelines keyed by ticker
    pub benchmarks: BTreeMap<String, BenchmarkTimeline>,
    pub risk: Result<RiskReport>,
    /// Regression results keyed by benchmark ticker
    pub regressions: BTreeMap<String, Result<RegressionResult>>,
    pub performance: Result<PerformanceSummary>,
    pub warnings: Vec<PipelineWarning>,
}

/// Validate raw holdings rows.
///
/// Rows that fail validation become warnings. Fails with
/// [`Error::NoValidHoldings`] when no row survives, since there is then no
/// date to start fetching from.
pub fn validate_holdings(rows: &[HoldingRow]) -> Result<(Vec<Holding>, Vec<PipelineWarning>)> {
    let mut holdings = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();

    for row in rows {
        match row.to_holding() {
            Ok(holding) => holdings.push(holding),
            Err(error) => {
                let warning = PipelineWarning::from_holding_error(error);
                tracing::warn!("{warning}");
                warnings.push(warning);
            }
        }
    }

    if holdings.is_empty() {
        return Err(Error::NoValidHoldings);
    }

    Ok((holdings, warnings))
}

/// Portfolio analytics pipeline over a price source.
#[derive(Debug)]
pub struct Pipeline<S> {
    source: S,
    settings: PipelineSettings,
}

impl<S: PriceSource> Pipeline<S> {
    /// Create a pipeline over `source`.
    pub fn new(source: S, settings: PipelineSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Validate holdings rows, then run the pipeline on the valid ones.
    ///
    /// Validation warnings are included in the report.
    pub async fn run_rows(&self, rows: &[HoldingRow], as_of: NaiveDate) -> Result<PipelineReport> {
        let (holdings, mut warnings) = validate_holdings(rows)?;
        let mut report = self.run(&holdings, as_of).await?;
        warnings.append(&mut report.warnings);
        report.warnings = warnings;
        Ok(report)
    }

    /// Run the pipeline for `holdings` with prices up to `as_of`.
    ///
    /// Fails with [`Error::NoValidHoldings`] for an empty holding set and with
    /// [`Error::EmptyPortfolio`] when no holding produced a timeline.
    pub async fn run(&self, holdings: &[Holding], as_of: NaiveDate) -> Result<PipelineReport> {
        let start = holdings
            .iter()
            .map(|h| h.buy_in_date)
            .min()
            .ok_or(Error::NoValidHoldings)?;

        tracing::info!(
            source = self.source.id(),
            holdings = holdings.len(),
            %start,
            %as_of,
            "Starting portfolio pipeline"
        );

        let mut warnings = Vec::new();
        let holdings = dedup_holdings(holdings, &mut warnings);

        let assets = self.build_assets(&holdings, as_of, &mut warnings).await;
        let benchmarks = self.build_benchmarks(start, as_of, &mut warnings).await;

        // Every build has completed; the rest reads the maps only
        let portfolio = PortfolioTimeline::aggregate(assets.values())?;

        let periods_per_year = self.settings.periods_per_year;
        let risk = calculate_risk_report(&portfolio, self.settings.risk_free_rate, periods_per_year);
        if let Err(e) = &risk {
            tracing::warn!(error = %e, "Risk report failed");
        }

        let regressions: BTreeMap<String, Result<RegressionResult>> = benchmarks
            .iter()
            .map(|(ticker, benchmark)| {
                let result = regress_benchmark(&portfolio, benchmark, periods_per_year);
                if let Err(e) = &result {
                    tracing::warn!(benchmark = %ticker, error = %e, "Regression failed");
                }
                (ticker.clone(), result)
            })
            .collect();

        let performance = summarize_performance(&portfolio, assets.values(), periods_per_year);

        tracing::info!(
            assets = assets.len(),
            benchmarks = benchmarks.len(),
            dates = portfolio.len(),
            warnings = warnings.len(),
            "Portfolio pipeline finished"
        );

        Ok(PipelineReport {
            assets,
            portfolio,
            benchmarks,
            risk,
            regressions,
            performance,
            warnings,
        })
    }

    async fn build_asset(&self, holding: &Holding, as_of: NaiveDate) -> Result<AssetTimeline> {
        let bars = self
            .source
            .fetch_prices(&holding.ticker, holding.buy_in_date, as_of)
            .await?;
        AssetTimeline::build(holding, bars)
    }

    async fn build_assets(
        &self,
        holdings: &[Holding],
        as_of: NaiveDate,
        warnings: &mut Vec<PipelineWarning>,
    ) -> BTreeMap<String, AssetTimeline> {
        let results: Vec<(&Holding, Result<AssetTimeline>)> = stream::iter(holdings)
            .map(|holding| async move { (holding, self.build_asset(holding, as_of).await) })
            .buffer_unordered(self.settings.max_concurrent_fetches.max(1))
            .collect()
            .await;

        let mut assets = BTreeMap::new();
        for (holding, result) in results {
            match result {
                Ok(timeline) => {
                    assets.insert(holding.ticker.clone(), timeline);
                }
                Err(error) => {
                    let warning = PipelineWarning::from_build_error(&holding.ticker, error);
                    tracing::warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }

        assets
    }

    async fn build_benchmarks(
        &self,
        start: NaiveDate,
        as_of: NaiveDate,
        warnings: &mut Vec<PipelineWarning>,
    ) -> BTreeMap<String, BenchmarkTimeline> {
        let results: Vec<(&String, Result<BenchmarkTimeline>)> =
            stream::iter(&self.settings.benchmarks)
                .map(|(ticker, name)| async move {
                    let result = match self.source.fetch_prices(ticker, start, as_of).await {
                        Ok(bars) => BenchmarkTimeline::build(ticker, name, bars),
                        Err(e) => Err(e),
                    };
                    (ticker, result)
                })
                .buffer_unordered(self.settings.max_concurrent_fetches.max(1))
                .collect()
                .await;

        let mut benchmarks = BTreeMap::new();
        for (ticker, result) in results {
            match result {
                Ok(timeline) => {
                    benchmarks.insert(ticker.clone(), timeline);
                }
                Err(error) => {
                    let warning = PipelineWarning::BenchmarkUnavailable {
                        ticker: ticker.clone(),
                        reason: error.to_string(),
                    };
                    tracing::warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }

        benchmarks
    }
}

/// Keep the first holding per ticker.
fn dedup_holdings(holdings: &[Holding], warnings: &mut Vec<PipelineWarning>) -> Vec<Holding> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(holdings.len());

    for holding in holdings {
        if seen.insert(holding.ticker.as_str()) {
            unique.push(holding.clone());
        } else {
            let warning = PipelineWarning::DuplicateTicker {
                ticker: holding.ticker.clone(),
            };
            tracing::warn!("{warning}");
            warnings.push(warning);
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StaticPriceSource;
    use crate::types::PriceBar;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn bars(start: u32, closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::from_close(day(start + i as u32), c))
            .collect()
    }

    const INDEX: [f64; 8] = [100.0, 101.37, 100.88, 102.15, 101.02, 103.4, 102.75, 104.1];

    fn source() -> StaticPriceSource {
        StaticPriceSource::new()
            .with_bars("AAA", bars(1, &INDEX))
            .with_bars("BBB", bars(3, &[50.0, 49.5, 50.25, 51.0, 50.5, 52.0]))
            .with_bars("^IDX", bars(1, &INDEX))
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            benchmarks: BTreeMap::from([("^IDX".to_string(), "Index".to_string())]),
            ..Default::default()
        }
    }

    fn holding(ticker: &str, start: u32, amount: f64) -> Holding {
        Holding::new(ticker, day(start), amount, 1.0).unwrap()
    }

    #[tokio::test]
    async fn test_run_builds_everything() {
        let pipeline = Pipeline::new(source(), settings());
        let holdings = [holding("AAA", 1, 1000.0), holding("BBB", 3, 500.0)];

        let report = pipeline.run(&holdings, day(30)).await.unwrap();

        assert_eq!(report.assets.len(), 2);
        assert_eq!(report.benchmarks.len(), 1);
        assert_eq!(report.portfolio.len(), 8);
        assert!(report.warnings.is_empty());
        assert!(report.risk.is_ok());
        assert!(report.performance.is_ok());
        assert!(report.regressions["^IDX"].is_ok());
    }

    #[tokio::test]
    async fn test_single_asset_against_identical_benchmark() {
        let pipeline = Pipeline::new(source(), settings());
        let report = pipeline
            .run(&[holding("AAA", 1, 1000.0)], day(30))
            .await
            .unwrap();

        let regression = report.regressions["^IDX"].as_ref().unwrap();
        assert_eq!(regression.benchmark_name, "Index");
        assert_relative_eq!(regression.beta, 1.0, epsilon = 1e-9);
        assert_relative_eq!(regression.alpha, 0.0, epsilon = 1e-12);
        assert_relative_eq!(regression.r_squared.unwrap(), 1.0, epsilon = 1e-9);
        assert_eq!(regression.observations, INDEX.len() - 1);
    }

    #[tokio::test]
    async fn test_missing_holding_is_skipped() {
        let pipeline = Pipeline::new(source(), settings());
        let holdings = [holding("AAA", 1, 1000.0), holding("ZZZ", 1, 700.0)];

        let report = pipeline.run(&holdings, day(30)).await.unwrap();

        assert_eq!(report.assets.len(), 1);
        assert!(report.assets.contains_key("AAA"));
        assert_eq!(
            report.warnings,
            vec![PipelineWarning::MissingData {
                ticker: "ZZZ".to_string()
            }]
        );
        assert_eq!(report.portfolio.first().unwrap().portfolio_value_eop, 1000.0);
    }

    #[tokio::test]
    async fn test_all_missing_is_empty_portfolio() {
        let pipeline = Pipeline::new(StaticPriceSource::new(), settings());
        let result = pipeline.run(&[holding("AAA", 1, 1000.0)], day(30)).await;
        assert!(matches!(result, Err(Error::EmptyPortfolio)));
    }

    #[tokio::test]
    async fn test_missing_benchmark_is_warning() {
        let mut settings = settings();
        settings
            .benchmarks
            .insert("^NONE".to_string(), "Nothing".to_string());
        let pipeline = Pipeline::new(source(), settings);

        let report = pipeline
            .run(&[holding("AAA", 1, 1000.0)], day(30))
            .await
            .unwrap();

        assert_eq!(report.benchmarks.len(), 1);
        assert!(matches!(
            &report.warnings[..],
            [PipelineWarning::BenchmarkUnavailable { ticker, .. }] if ticker == "^NONE"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_tickers() {
        let pipeline = Pipeline::new(source(), settings());
        let holdings = [holding("AAA", 1, 1000.0), holding("AAA", 2, 300.0)];

        let report = pipeline.run(&holdings, day(30)).await.unwrap();
        assert_eq!(report.assets["AAA"].holding().buy_in_amount, 1000.0);
        assert!(matches!(
            &report.warnings[..],
            [PipelineWarning::DuplicateTicker { .. }]
        ));
    }

    #[tokio::test]
    async fn test_as_of_limits_range() {
        let pipeline = Pipeline::new(source(), settings());
        let report = pipeline
            .run(&[holding("AAA", 1, 1000.0)], day(4))
            .await
            .unwrap();

        assert_eq!(report.portfolio.last().unwrap().date, day(4));
        assert_eq!(report.benchmarks["^IDX"].len(), 4);
    }

    #[tokio::test]
    async fn test_run_rows_collects_validation_warnings() {
        let rows = vec![
            HoldingRow {
                ticker: "AAA".to_string(),
                buy_in_date: "01.04.2024".to_string(),
                buy_in_amount: Some(1000.0),
                shares: Some(10.0),
            },
            HoldingRow {
                ticker: "BBB".to_string(),
                buy_in_date: "soon".to_string(),
                buy_in_amount: Some(500.0),
                shares: Some(10.0),
            },
        ];
        let pipeline = Pipeline::new(source(), settings());

        let report = pipeline.run_rows(&rows, day(30)).await.unwrap();
        assert_eq!(report.assets.len(), 1);
        assert_eq!(
            report.warnings,
            vec![PipelineWarning::UnparsableDate {
                ticker: "BBB".to_string(),
                value: "soon".to_string()
            }]
        );
    }

    #[test]
    fn test_validate_holdings_none_valid() {
        let rows = vec![HoldingRow {
            ticker: "AAA".to_string(),
            buy_in_date: String::new(),
            buy_in_amount: Some(1000.0),
            shares: Some(1.0),
        }];
        assert!(matches!(
            validate_holdings(&rows),
            Err(Error::NoValidHoldings)
        ));
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config::default();
        let settings = PipelineSettings::from(&config);
        assert_eq!(settings.risk_free_rate, config.risk_free_rate);
        assert_eq!(settings.benchmarks, config.benchmarks);
    }

    #[test]
    fn test_warning_display() {
        let warning = PipelineWarning::MissingData {
            ticker: "ZZZ".to_string(),
        };
        assert_eq!(warning.to_string(), "no price data for ZZZ, skipped");
    }
}
