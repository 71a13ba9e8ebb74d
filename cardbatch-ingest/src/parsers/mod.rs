pub mod xml_batch;

pub use xml_batch::{mismatched_lines, parse_batch_file, parse_batch_xml, read_batch_file};
