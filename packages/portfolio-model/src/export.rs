//! Export of computed timelines to CSV and JSON.
//!
//! CSV output has one row per date with columns in the record field order.
//! Undefined returns are written as empty cells.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::pipeline::PipelineReport;
use crate::timeline::{AssetTimeline, BenchmarkTimeline, PortfolioTimeline};
use crate::Result;

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Types that can be written out as CSV or JSON.
pub trait Exporter {
    /// Export data to a string in the specified format.
    fn export_to_string(&self, format: ExportFormat) -> Result<String>;

    /// Export data to a file, creating parent directories.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let content = self.export_to_string(format)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}

fn records_to_csv<R: Serialize>(records: &[R]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

fn export<T: Serialize, R: Serialize>(
    value: &T,
    records: &[R],
    format: ExportFormat,
) -> Result<String> {
    match format {
        ExportFormat::Csv => records_to_csv(records),
        ExportFormat::Json => Ok(serde_json::to_string(value)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
    }
}

impl Exporter for AssetTimeline {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        export(self, self.records(), format)
    }
}

impl Exporter for PortfolioTimeline {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        export(self, self.records(), format)
    }
}

impl Exporter for BenchmarkTimeline {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        export(self, self.records(), format)
    }
}

/// File name for a ticker, with characters unsafe in paths replaced.
fn file_stem(ticker: &str) -> String {
    ticker
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

/// Write every timeline of a pipeline report as CSV under `out_dir`:
///
/// - `portfolio_investments/<TICKER>.csv` per holding
/// - `benchmarks/<TICKER>.csv` per benchmark
/// - `portfolio.csv`
///
/// Returns the paths written.
pub fn write_report(report: &PipelineReport, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let format = ExportFormat::Csv;

    for (ticker, timeline) in &report.assets {
        let path = out_dir
            .join("portfolio_investments")
            .join(format!("{}.{}", file_stem(ticker), format.extension()));
        timeline.export_to_file(&path, format)?;
        written.push(path);
    }

    for (ticker, timeline) in &report.benchmarks {
        let path = out_dir
            .join("benchmarks")
            .join(format!("{}.{}", file_stem(ticker), format.extension()));
        timeline.export_to_file(&path, format)?;
        written.push(path);
    }

    let path = out_dir.join(format!("portfolio.{}", format.extension()));
    report.portfolio.export_to_file(&path, format)?;
    written.push(path);

    tracing::info!(files = written.len(), dir = %out_dir.display(), "Wrote timelines");
    Ok(written)
}
