//! Configuration loading and management.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analytics::TRADING_DAYS_PER_YEAR;
use crate::{Error, Result};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "PORTFOLIO_MODEL_CONFIG";

/// Where price bars come from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Per-ticker CSV files in `prices_dir`
    #[default]
    Csv,
    /// Yahoo Finance (requires the `yahoo` feature)
    Yahoo,
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Holdings CSV (`ticker,buy_in_date,buy_in_amount,shares`)
    pub holdings_file: PathBuf,
    /// Directory of `<TICKER>.csv` price files for the CSV source
    pub prices_dir: PathBuf,
    /// Directory computed timelines are written to
    pub output_dir: PathBuf,
    /// Price source to use
    pub source: SourceKind,
    /// Annual risk-free rate (0.02 = 2%)
    pub risk_free_rate: f64,
    /// Trading periods per year
    pub periods_per_year: u32,
    /// Upper bound on concurrent price fetches
    pub max_concurrent_fetches: usize,
    /// Benchmark ticker to display name
    pub benchmarks: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            holdings_file: PathBuf::from("data/holdings.csv"),
            prices_dir: PathBuf::from("data/prices"),
            output_dir: PathBuf::from("data"),
            source: SourceKind::default(),
            risk_free_rate: 0.02,
            periods_per_year: TRADING_DAYS_PER_YEAR,
            max_concurrent_fetches: 4,
            benchmarks: BTreeMap::from([("^GSPC".to_string(), "S&P 500".to_string())]),
        }
    }
}

impl Config {
    /// Get the default config file path.
    ///
    /// Default path: `~/.portfolio-model/config.toml`
    /// Can be overridden with the `PORTFOLIO_MODEL_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".portfolio-model/config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Load a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a config from TOML text; unspecified fields take their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the numeric settings the analytics depend on.
    pub fn validate(&self) -> Result<()> {
        if self.periods_per_year == 0 {
            return Err(Error::InvalidConfig(
                "periods_per_year must be at least 1".to_string(),
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(Error::InvalidConfig(
                "max_concurrent_fetches must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Write the config as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render the config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
