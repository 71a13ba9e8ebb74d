use anyhow::{Context, Result};
use cardbatch_export::ExportFormat;
use chrono::{DateTime, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the default `~/.cardbatch` home directory.
pub const HOME_ENV: &str = "CARDBATCH_HOME";

pub fn cardbatch_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".cardbatch"))
}

pub fn ensure_home(home: &Path) -> Result<()> {
    fs::create_dir_all(home).with_context(|| format!("create {}", home.display()))
}

/// A relative data folder lives under the home directory.
pub fn resolve_data_dir(home: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        home.join(configured)
    }
}

/// Folder under the home that collects exports written without `--out`.
pub fn save_dir(home: &Path, format: ExportFormat) -> PathBuf {
    let name = match format {
        ExportFormat::Pdf => "save_pdf",
        ExportFormat::Xlsx => "save_excel",
        ExportFormat::Csv => "save_csv",
    };
    home.join(name)
}

/// `save_<format>/Report_<epoch millis>.<ext>`
pub fn default_save_path<Tz: TimeZone>(
    home: &Path,
    format: ExportFormat,
    now: DateTime<Tz>,
) -> PathBuf {
    save_dir(home, format).join(format!(
        "Report_{}.{}",
        now.timestamp_millis(),
        format.extension()
    ))
}

/// Like [`default_save_path`], creating the save folder first.
pub fn ensure_save_path<Tz: TimeZone>(
    home: &Path,
    format: ExportFormat,
    now: DateTime<Tz>,
) -> Result<PathBuf> {
    let dir = save_dir(home, format);
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(default_save_path(home, format, now))
}
