//! In-memory transaction store keyed by source file name.
//!
//! Readers always see a complete snapshot: mutations build the next snapshot
//! outside the lock and swap it in.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use cardbatch_core::CardTransaction;
use parking_lot::RwLock;

use crate::parsers::read_batch_file;

/// Selector value meaning "every loaded file".
pub const ALL_FILES: &str = "All Files";

/// Which transactions to pull from the store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    #[default]
    AllFiles,
    File(String),
}

impl FromStr for Selector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Selector::from(s))
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        if s == ALL_FILES {
            Selector::AllFiles
        } else {
            Selector::File(s.to_string())
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::AllFiles => f.write_str(ALL_FILES),
            Selector::File(name) => f.write_str(name),
        }
    }
}

/// Turns one source file into transactions. Implementations must not fail:
/// an unusable file yields an empty sequence.
pub trait BatchReader: Send + Sync {
    fn read(&self, path: &Path) -> Vec<CardTransaction>;
}

/// Reads settlement batch XML files.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlBatchReader;

impl BatchReader for XmlBatchReader {
    fn read(&self, path: &Path) -> Vec<CardTransaction> {
        read_batch_file(path)
    }
}

/// Transactions parsed from one file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub transactions: Arc<[CardTransaction]>,
}

pub struct TransactionStore<R = XmlBatchReader> {
    reader: R,
    entries: RwLock<Arc<Vec<FileEntry>>>,
}

impl TransactionStore<XmlBatchReader> {
    pub fn new() -> Self {
        Self::with_reader(XmlBatchReader)
    }
}

impl Default for TransactionStore<XmlBatchReader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BatchReader> TransactionStore<R> {
    pub fn with_reader(reader: R) -> Self {
        Self {
            reader,
            entries: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Replace the whole store by re-reading every file.
    pub fn load<I, P>(&self, files: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut fresh: Vec<FileEntry> = Vec::new();
        for path in files {
            let path = path.as_ref();
            let name = file_key(path);
            let transactions: Arc<[CardTransaction]> = self.reader.read(path).into();
            match fresh.iter_mut().find(|e| e.name == name) {
                Some(existing) => existing.transactions = transactions,
                None => fresh.push(FileEntry { name, transactions }),
            }
        }

        let total: usize = fresh.iter().map(|e| e.transactions.len()).sum();
        tracing::info!(files = fresh.len(), transactions = total, "loaded transaction store");
        *self.entries.write() = Arc::new(fresh);
    }

    /// Add one file unless a file with the same name is already loaded.
    /// Returns whether the store changed.
    pub fn add(&self, path: &Path) -> bool {
        let name = file_key(path);
        if self.contains(&name) {
            tracing::debug!(file = %name, "already loaded; skipping");
            return false;
        }

        let transactions: Arc<[CardTransaction]> = self.reader.read(path).into();

        let mut guard = self.entries.write();
        if guard.iter().any(|e| e.name == name) {
            return false;
        }
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        tracing::info!(file = %name, transactions = transactions.len(), "added file to store");
        next.push(FileEntry { name, transactions });
        *guard = Arc::new(next);
        true
    }

    /// Transactions for one file, or every file concatenated in load order.
    /// Unknown file names yield an empty sequence.
    pub fn get(&self, selector: &Selector) -> Vec<CardTransaction> {
        let snapshot = self.snapshot();
        match selector {
            Selector::AllFiles => snapshot
                .iter()
                .flat_map(|e| e.transactions.iter().cloned())
                .collect(),
            Selector::File(name) => snapshot
                .iter()
                .find(|e| &e.name == name)
                .map(|e| e.transactions.to_vec())
                .unwrap_or_default(),
        }
    }

    /// The current contents, unaffected by later mutations.
    pub fn snapshot(&self) -> Arc<Vec<FileEntry>> {
        Arc::clone(&self.entries.read())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().iter().any(|e| e.name == name)
    }

    pub fn file_names(&self) -> Vec<String> {
        self.snapshot().iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Files are keyed by name, not full path.
pub fn file_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves canned transactions by file name and counts reads.
    struct FakeReader {
        files: HashMap<String, Vec<CardTransaction>>,
        reads: AtomicUsize,
    }

    impl FakeReader {
        fn new(files: &[(&str, usize)]) -> Self {
            let files = files
                .iter()
                .map(|(name, n)| {
                    let txns: Vec<CardTransaction> = (0..*n)
                        .map(|i| CardTransaction::new("2024-01-01", *name, i as u32, 1.0, 1.0, 0.0))
                        .collect();
                    (name.to_string(), txns)
                })
                .collect();
            Self {
                files,
                reads: AtomicUsize::new(0),
            }
        }
    }

    impl BatchReader for FakeReader {
        fn read(&self, path: &Path) -> Vec<CardTransaction> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.files.get(&file_key(path)).cloned().unwrap_or_default()
        }
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("All Files".parse::<Selector>().unwrap(), Selector::AllFiles);
        assert_eq!(Selector::from("a.xml"), Selector::File("a.xml".to_string()));
        assert_eq!(Selector::AllFiles.to_string(), ALL_FILES);
    }

    #[test]
    fn test_load_replaces_contents() {
        let store = TransactionStore::with_reader(FakeReader::new(&[("a.xml", 2), ("b.xml", 3)]));
        store.load(["dir/a.xml", "dir/b.xml"]);
        assert_eq!(store.file_names(), ["a.xml", "b.xml"]);
        assert_eq!(store.get(&Selector::AllFiles).len(), 5);

        store.load(["dir/b.xml"]);
        assert_eq!(store.file_names(), ["b.xml"]);
        assert!(store.get(&Selector::from("a.xml")).is_empty());
    }

    #[test]
    fn test_all_files_concatenates_in_insertion_order() {
        let store = TransactionStore::with_reader(FakeReader::new(&[("b.xml", 1), ("a.xml", 2)]));
        store.load(["b.xml"]);
        store.add(Path::new("a.xml"));
        let types: Vec<_> = store
            .get(&Selector::AllFiles)
            .iter()
            .map(|t| t.card_type().to_string())
            .collect();
        assert_eq!(types, ["b.xml", "a.xml", "a.xml"]);
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = TransactionStore::with_reader(FakeReader::new(&[("a.xml", 2)]));
        assert!(store.add(Path::new("in/a.xml")));
        let before = store.get(&Selector::AllFiles);

        assert!(!store.add(Path::new("elsewhere/a.xml")));
        assert_eq!(store.get(&Selector::AllFiles), before);
        assert_eq!(store.len(), 1);
        // the second add never touched the reader
        assert_eq!(store.reader.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_file_is_empty() {
        let store = TransactionStore::with_reader(FakeReader::new(&[]));
        assert!(store.is_empty());
        assert!(store.get(&Selector::from("nope.xml")).is_empty());
        assert!(store.get(&Selector::AllFiles).is_empty());
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let store = TransactionStore::with_reader(FakeReader::new(&[("a.xml", 2), ("b.xml", 1)]));
        store.load(["a.xml"]);
        let snap = store.snapshot();
        store.load(["b.xml"]);
        assert_eq!(snap[0].name, "a.xml");
        assert_eq!(snap[0].transactions.len(), 2);
    }

    #[test]
    fn test_readers_never_see_partial_load() {
        let store = TransactionStore::with_reader(FakeReader::new(&[
            ("a.xml", 10),
            ("b.xml", 20),
            ("c.xml", 30),
        ]));
        store.load(["a.xml"]);

        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..50 {
                    store.load(["a.xml", "b.xml", "c.xml"]);
                    store.load(["a.xml"]);
                }
            });
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..200 {
                        let n = store.get(&Selector::AllFiles).len();
                        assert!(n == 10 || n == 60, "saw partial contents: {n}");
                    }
                });
            }
        });
    }
}
