//! cardbatch-export: render a report as a terminal table, PDF, spreadsheet or CSV.

pub mod delimited;
pub mod pdf;
pub mod text;
pub mod xlsx;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Result, bail};
use cardbatch_core::Report;
use serde::{Deserialize, Serialize};

pub use pdf::{PdfOptions, write_pdf};
pub use text::TextTable;
pub use xlsx::{XlsxOptions, write_xlsx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    #[serde(alias = "excel")]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    /// Guess the format from a destination's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => bail!("unknown export format '{other}' (expected pdf, xlsx or csv)"),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub pdf: PdfOptions,
    pub xlsx: XlsxOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub format: ExportFormat,
    pub path: PathBuf,
    /// Report rows written, header included
    pub rows: usize,
    /// PDF page count
    pub pages: Option<usize>,
}

/// Write `report` to `path` in the given format, overwriting any existing file.
pub fn export(
    report: &Report,
    format: ExportFormat,
    path: &Path,
    opts: &ExportOptions,
) -> Result<ExportSummary> {
    let pages = match format {
        ExportFormat::Pdf => Some(write_pdf(report, path, &opts.pdf)?),
        ExportFormat::Xlsx => {
            write_xlsx(report, path, &opts.xlsx)?;
            None
        }
        ExportFormat::Csv => {
            delimited::write_csv(report, path)?;
            None
        }
    };

    tracing::info!(%format, path = %path.display(), rows = report.len(), "exported report");
    Ok(ExportSummary {
        format,
        path: path.to_path_buf(),
        rows: report.len(),
        pages,
    })
}
