//! Portfolio Model - performance and risk analytics for a portfolio of holdings.
//!
//! This crate turns historical price series into portfolio analytics:
//!
//! - **Asset timelines**: per-holding values and returns from raw price bars
//! - **Portfolio aggregation**: date-by-date sums over every active holding
//! - **Risk metrics**: Sharpe ratio, Sortino ratio, max drawdown, volatility
//! - **Regression**: alpha/beta of the portfolio against benchmarks
//! - **Pipeline**: concurrent fetch and build over an injected [`PriceSource`]
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use portfolio_model::{AssetTimeline, Holding, PortfolioTimeline, PriceBar};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let holding = Holding::new("aapl", day(2), 1000.0, 10.0).unwrap();
//! let bars = vec![
//!     PriceBar::from_close(day(2), 100.0),
//!     PriceBar::from_close(day(3), 110.0),
//! ];
//!
//! let asset = AssetTimeline::build(&holding, bars).unwrap();
//! let portfolio = PortfolioTimeline::aggregate([&asset]).unwrap();
//! assert_eq!(portfolio.last().unwrap().portfolio_value_eop, 1100.0);
//! ```

pub mod analytics;
pub mod config;
pub mod data;
pub mod export;
pub mod pipeline;
pub mod timeline;
pub mod types;

// Re-export commonly used types
pub use types::{
    ApiResponse, Drawdown, Holding, PerformanceSummary, PriceBar, RegressionResult, ReturnPoint,
    RiskReport,
};

// Re-export main functionality
pub use analytics::{
    calculate_max_drawdown, calculate_risk_report, conditional_value_at_risk, regress,
    sharpe_ratio, sortino_ratio, value_at_risk, volatility,
};
pub use config::Config;
pub use data::{CsvPriceSource, PriceSource, StaticPriceSource};
pub use export::{ExportFormat, Exporter};
pub use pipeline::{Pipeline, PipelineReport, PipelineSettings, PipelineWarning};
pub use timeline::{
    AssetRecord, AssetTimeline, BenchmarkRecord, BenchmarkTimeline, PortfolioRecord,
    PortfolioTimeline, ReturnSeries,
};

/// Error types for portfolio-model operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("No price data for {0}")]
    MissingData(String),

    #[error("Unparsable buy-in date for {ticker}: {value:?}")]
    UnparsableDate { ticker: String, value: String },

    #[error("Invalid holding: {0}")]
    InvalidHolding(String),

    #[error("Invalid price data for {ticker}: {reason}")]
    InvalidData { ticker: String, reason: String },

    #[error("No holding has a usable buy-in date")]
    NoValidHoldings,

    #[error("Portfolio has no asset timelines to aggregate")]
    EmptyPortfolio,

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Degenerate statistic: {0}")]
    DegenerateStatistic(String),

    #[error("Regression needs at least 2 overlapping observations, got {observations}")]
    UnderdeterminedRegression { observations: usize },

    #[error("Metric not supported: {0}")]
    UnsupportedMetric(&'static str),

    #[error("Price source error for {ticker}: {reason}")]
    PriceSource { ticker: String, reason: String },
}

/// Result type for portfolio-model operations.
pub type Result<T> = std::result::Result<T, Error>;
