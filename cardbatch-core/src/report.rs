//! Report structure produced by the aggregator and consumed by display/export adapters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::batch_date::BatchDate;
use crate::transaction::CardTransaction;

/// Column names, in rendering order.
pub const COLUMNS: [&str; 6] = ["Date", "Card Type", "Qty", "Gross", "Net", "Fee"];

pub const SUBTOTAL_LABEL: &str = "Total";
pub const GRAND_TOTAL_LABEL: &str = "Grand Total";

/// A single typed table cell. Adapters dispatch on the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Text(String),
    Count(u64),
    /// Full-precision value; formatting is up to the adapter.
    Number(f64),
    /// Monetary total, always shown with two decimals.
    Amount(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Text form used by text-based adapters.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Count(n) => n.to_string(),
            Cell::Number(n) => n.to_string(),
            Cell::Amount(n) => format!("{:.2}", n),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Count(_) | Cell::Number(_) | Cell::Amount(_))
    }
}

/// Summed quantity and amounts for a group, or for the whole report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Group key the totals belong to (empty for the grand total)
    pub label: String,
    pub quantity: u64,
    pub gross: f64,
    pub net: f64,
    pub fee: f64,
}

impl Totals {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            quantity: 0,
            gross: 0.0,
            net: 0.0,
            fee: 0.0,
        }
    }

    pub fn add(&mut self, tx: &CardTransaction) {
        self.quantity += u64::from(tx.quantity());
        self.gross += tx.gross_amount();
        self.net += tx.net_amount();
        self.fee += tx.fee();
    }

    /// Fold another group's sums into this one.
    pub fn absorb(&mut self, other: &Totals) {
        self.quantity += other.quantity;
        self.gross += other.gross;
        self.net += other.net;
        self.fee += other.fee;
    }

    fn cells(&self, caption: &str) -> Vec<Cell> {
        vec![
            Cell::Empty,
            Cell::Text(caption.to_string()),
            Cell::Count(self.quantity),
            Cell::Amount(self.gross),
            Cell::Amount(self.net),
            Cell::Amount(self.fee),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "row", rename_all = "snake_case")]
pub enum ReportRow {
    Header,
    Data(CardTransaction),
    Subtotal(Totals),
    Separator,
    GrandTotal(Totals),
}

impl ReportRow {
    /// Render the row into the fixed six columns.
    pub fn cells(&self) -> Vec<Cell> {
        match self {
            ReportRow::Header => COLUMNS.iter().map(|c| Cell::Text(c.to_string())).collect(),
            ReportRow::Data(tx) => vec![
                date_cell(tx.batch_date()),
                Cell::Text(tx.card_type().to_string()),
                Cell::Count(u64::from(tx.quantity())),
                Cell::Number(tx.gross_amount()),
                Cell::Number(tx.net_amount()),
                Cell::Number(tx.fee()),
            ],
            ReportRow::Subtotal(t) => t.cells(SUBTOTAL_LABEL),
            ReportRow::Separator => vec![Cell::Empty; COLUMNS.len()],
            ReportRow::GrandTotal(t) => t.cells(GRAND_TOTAL_LABEL),
        }
    }
}

fn date_cell(date: &BatchDate) -> Cell {
    match date {
        BatchDate::Day(d) => Cell::Date(*d),
        BatchDate::Raw(s) => Cell::Text(s.clone()),
    }
}

/// Ordered report rows. Always starts with a single header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    rows: Vec<ReportRow>,
}

impl Report {
    /// A report with only the header row.
    pub fn empty() -> Self {
        Self {
            rows: vec![ReportRow::Header],
        }
    }

    pub(crate) fn push(&mut self, row: ReportRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// False for the degenerate header-only report.
    pub fn has_data(&self) -> bool {
        self.rows.len() > 1
    }

    pub fn grand_total(&self) -> Option<&Totals> {
        self.rows.iter().rev().find_map(|r| match r {
            ReportRow::GrandTotal(t) => Some(t),
            _ => None,
        })
    }

    pub fn subtotals(&self) -> impl Iterator<Item = &Totals> {
        self.rows.iter().filter_map(|r| match r {
            ReportRow::Subtotal(t) => Some(t),
            _ => None,
        })
    }

    /// Every row rendered into cells, header first.
    pub fn table(&self) -> Vec<Vec<Cell>> {
        self.rows.iter().map(ReportRow::cells).collect()
    }

    /// Rendered rows without the header; paginating adapters repeat the header themselves.
    pub fn body(&self) -> Vec<Vec<Cell>> {
        self.rows
            .iter()
            .filter(|r| !matches!(r, ReportRow::Header))
            .map(ReportRow::cells)
            .collect()
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::empty()
    }
}
