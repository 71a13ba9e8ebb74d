//! Blocking file work moved off the async runtime.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use cardbatch_core::Report;
use cardbatch_export::{ExportFormat, ExportOptions, ExportSummary};
use cardbatch_ingest::{ImportOutcome, TransactionStore, scan_xml_files};
use tokio::task::JoinHandle;

pub fn spawn_load(dir: PathBuf) -> JoinHandle<Result<TransactionStore>> {
    tokio::task::spawn_blocking(move || {
        let store = TransactionStore::new();
        store.load(scan_xml_files(&dir)?);
        tracing::info!(dir = %dir.display(), files = store.len(), "loaded batch folder");
        Ok(store)
    })
}

pub fn spawn_export(
    report: Report,
    format: ExportFormat,
    out: PathBuf,
    opts: ExportOptions,
) -> JoinHandle<Result<ExportSummary>> {
    tokio::task::spawn_blocking(move || cardbatch_export::export(&report, format, &out, &opts))
}

pub fn spawn_import(
    store: Arc<TransactionStore>,
    dir: PathBuf,
    source: PathBuf,
) -> JoinHandle<Result<ImportOutcome>> {
    tokio::task::spawn_blocking(move || cardbatch_ingest::import_file(&store, &dir, &source))
}
