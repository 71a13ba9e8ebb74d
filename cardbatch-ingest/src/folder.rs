//! The batch folder: where source XML files live and where imports are copied.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::store::{BatchReader, Selector, TransactionStore, file_key};

/// All `.xml` files directly inside `dir`, sorted by file name.
/// A missing folder is not an error; it simply holds nothing yet.
pub fn scan_xml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        tracing::info!(folder = %dir.display(), "batch folder not found");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && is_xml(&path) {
            files.push(path);
        }
    }
    files.sort_by_key(|p| file_key(p));

    if files.is_empty() {
        tracing::info!(folder = %dir.display(), "no XML files in batch folder");
    }
    Ok(files)
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xml"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Where the file now lives inside the batch folder
    pub destination: PathBuf,
    /// False when a file with the same name was already loaded
    pub added: bool,
    /// Transactions held by the store under this file name
    pub transactions: usize,
}

/// Copy `source` into the batch folder (overwriting a same-named file) and add it to the store.
pub fn import_file<R: BatchReader>(
    store: &TransactionStore<R>,
    dir: &Path,
    source: &Path,
) -> Result<ImportOutcome> {
    let name = source
        .file_name()
        .with_context(|| format!("{} has no file name", source.display()))?;
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let destination = dir.join(name);

    if !same_file(source, &destination) {
        fs::copy(source, &destination).with_context(|| {
            format!("copy {} to {}", source.display(), destination.display())
        })?;
    }

    let added = store.add(&destination);
    let transactions = store.get(&Selector::File(file_key(&destination))).len();
    Ok(ImportOutcome {
        destination,
        added,
        transactions,
    })
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
