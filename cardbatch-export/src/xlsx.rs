//! Spreadsheet (.xlsx) export via rust_xlsxwriter.

use std::path::Path;

use anyhow::{Context, Result};
use cardbatch_core::{Cell, Report};
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};

use crate::text::column_widths;

#[derive(Debug, Clone)]
pub struct XlsxOptions {
    pub sheet_name: String,
    /// Upper bound for auto-sized column widths, in characters
    pub max_column_width: f64,
}

impl Default for XlsxOptions {
    fn default() -> Self {
        Self {
            sheet_name: "Report".to_string(),
            // 10000 / 256 character units
            max_column_width: 39.0,
        }
    }
}

/// Auto-fit widths: widest rendered value plus two characters of padding, capped.
pub fn fitted_widths(report: &Report, max: f64) -> Vec<f64> {
    column_widths(&report.table())
        .into_iter()
        .map(|w| ((w + 2) as f64).min(max))
        .collect()
}

/// `None` outside the years Excel can represent (1900-9999).
pub fn excel_date(date: NaiveDate) -> Option<ExcelDateTime> {
    let year = u16::try_from(date.year()).ok()?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8).ok()
}

/// Build the workbook in memory.
pub fn build_workbook(report: &Report, opts: &XlsxOptions) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(&opts.sheet_name)
        .with_context(|| format!("invalid sheet name '{}'", opts.sheet_name))?;

    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("0.00");
    let date = Format::new().set_num_format("yyyy-mm-dd");

    for (r, row) in report.table().iter().enumerate() {
        let r = r as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            let header = r == 0;
            write_cell(worksheet, r, c, cell, header.then_some(&bold), &money, &date)
                .with_context(|| format!("write cell ({r}, {c})"))?;
        }
    }

    for (c, width) in fitted_widths(report, opts.max_column_width).into_iter().enumerate() {
        worksheet
            .set_column_width(c as u16, width)
            .with_context(|| format!("set width of column {c}"))?;
    }

    Ok(workbook)
}

fn write_cell(
    ws: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    header: Option<&Format>,
    money: &Format,
    date: &Format,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    match cell {
        Cell::Empty => {}
        Cell::Text(s) => {
            match header {
                Some(fmt) => ws.write_string_with_format(row, col, s, fmt)?,
                None => ws.write_string(row, col, s)?,
            };
        }
        Cell::Count(n) => {
            ws.write_number(row, col, *n as f64)?;
        }
        Cell::Number(n) => {
            ws.write_number(row, col, *n)?;
        }
        Cell::Amount(n) => {
            ws.write_number_with_format(row, col, *n, money)?;
        }
        Cell::Date(d) => match excel_date(*d) {
            Some(dt) => {
                ws.write_datetime_with_format(row, col, &dt, date)?;
            }
            None => {
                ws.write_string(row, col, d.format("%Y-%m-%d").to_string())?;
            }
        },
    }
    Ok(())
}

pub fn write_xlsx(report: &Report, path: &Path, opts: &XlsxOptions) -> Result<()> {
    let mut workbook = build_workbook(report, opts)?;
    workbook
        .save(path)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
