//! cardbatch-ingest: settlement batch XML parsing, the per-file transaction store,
//! and batch-folder scanning/import.

pub mod error;
pub mod folder;
pub mod parsers;
pub mod store;

pub use error::IngestError;
pub use folder::{ImportOutcome, import_file, scan_xml_files};
pub use parsers::{mismatched_lines, parse_batch_file, parse_batch_xml, read_batch_file};
pub use store::{ALL_FILES, BatchReader, FileEntry, Selector, TransactionStore, XmlBatchReader};
