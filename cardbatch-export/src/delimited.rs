//! CSV export: one record per rendered table row.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use cardbatch_core::{Cell, Report};

pub fn write_csv_to<W: Write>(report: &Report, out: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(false).from_writer(out);
    for row in report.table() {
        wtr.write_record(row.iter().map(Cell::display))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv(report: &Report, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_csv_to(report, file).with_context(|| format!("write {}", path.display()))
}
