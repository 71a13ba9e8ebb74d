//! cardbatch-core: card transaction records, the report row model, and the
//! grouping/summary aggregator.

pub mod aggregate;
pub mod batch_date;
pub mod report;
pub mod transaction;

pub use aggregate::{
    GroupBy, SortDirection, build_report, group_by_card_type, group_by_date_with_summary,
};
pub use batch_date::BatchDate;
pub use report::{COLUMNS, Cell, Report, ReportRow, Totals};
pub use transaction::CardTransaction;
