use anyhow::{Context, Result};
use cardbatch_core::{GroupBy, SortDirection};
use cardbatch_export::{ExportFormat, ExportOptions, PdfOptions, XlsxOptions};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_home;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataSection,
    pub report: ReportSection,
    pub export: ExportSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Folder scanned for batch files; relative paths are under the cardbatch home
    pub xml_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReportSection {
    pub group: GroupKey,
    pub order: Order,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub pdf_rows_per_page: usize,
    pub xlsx_max_column_width: f64,
    pub default_format: ExportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKey {
    #[default]
    Date,
    CardType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl From<Order> for SortDirection {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => SortDirection::Ascending,
            Order::Desc => SortDirection::Descending,
        }
    }
}

/// Order only applies to date grouping.
pub fn group_by(group: GroupKey, order: Order) -> GroupBy {
    match group {
        GroupKey::Date => GroupBy::Date(order.into()),
        GroupKey::CardType => GroupBy::CardType,
    }
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            xml_dir: PathBuf::from("xml_files"),
        }
    }
}

impl Default for ExportSection {
    fn default() -> Self {
        let pdf = PdfOptions::default();
        let xlsx = XlsxOptions::default();
        Self {
            pdf_rows_per_page: pdf.rows_per_page,
            xlsx_max_column_width: xlsx.max_column_width,
            default_format: ExportFormat::Pdf,
        }
    }
}

impl Config {
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            pdf: PdfOptions {
                rows_per_page: self.export.pdf_rows_per_page,
                ..PdfOptions::default()
            },
            xlsx: XlsxOptions {
                max_column_width: self.export.xlsx_max_column_width,
                ..XlsxOptions::default()
            },
        }
    }
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.toml")
}

pub fn load_config(home: &Path) -> Result<Config> {
    let p = config_path(home);
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(home: &Path, cfg: &Config) -> Result<()> {
    ensure_home(home)?;
    let p = config_path(home);
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config(home: &Path) -> Result<()> {
    let p = config_path(home);
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(home, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
