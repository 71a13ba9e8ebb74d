//! Report aggregation: group card transactions, sort groups and their members,
//! and emit subtotals plus a grand total.
//!
//! Both groupings are pure: same input, same rows, no I/O.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::batch_date::BatchDate;
use crate::report::{Report, ReportRow, Totals};
use crate::transaction::CardTransaction;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

/// How transactions are grouped into a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    /// One group per batch date, ordered by date in the given direction
    Date(SortDirection),
    /// One group per card type, ordered case-insensitively
    CardType,
}

impl Default for GroupBy {
    fn default() -> Self {
        GroupBy::Date(SortDirection::Ascending)
    }
}

pub fn build_report(txns: &[CardTransaction], group_by: GroupBy) -> Report {
    match group_by {
        GroupBy::Date(direction) => group_by_date_with_summary(txns, direction),
        GroupBy::CardType => group_by_card_type(txns),
    }
}

/// Group by batch date; members ordered by card type (case-sensitive).
pub fn group_by_date_with_summary(txns: &[CardTransaction], direction: SortDirection) -> Report {
    let mut by_date: BTreeMap<&BatchDate, Vec<&CardTransaction>> = BTreeMap::new();
    for tx in txns {
        by_date.entry(tx.batch_date()).or_default().push(tx);
    }

    let mut groups: Vec<(String, Vec<&CardTransaction>)> = by_date
        .into_iter()
        .map(|(date, members)| (date.to_string(), members))
        .collect();
    if direction == SortDirection::Descending {
        groups.reverse();
    }

    for (_, members) in &mut groups {
        // stable: equal card types keep input order
        members.sort_by(|a, b| a.card_type().cmp(b.card_type()));
    }

    emit(groups)
}

/// Group by card type; members ordered by batch date ascending.
pub fn group_by_card_type(txns: &[CardTransaction]) -> Report {
    let mut grouped: HashMap<&str, Vec<&CardTransaction>> = HashMap::new();
    for tx in txns {
        grouped.entry(tx.card_type()).or_default().push(tx);
    }

    let mut groups: Vec<(String, Vec<&CardTransaction>)> = grouped
        .into_iter()
        .map(|(card_type, members)| (card_type.to_string(), members))
        .collect();
    groups.sort_by(|(a, _), (b, _)| compare_ignore_case(a, b));

    for (_, members) in &mut groups {
        members.sort_by(|a, b| a.batch_date().cmp(b.batch_date()));
    }

    emit(groups)
}

/// Case-insensitive order; keys equal ignoring case fall back to case-sensitive order.
fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Lay out already-ordered groups as data rows, a subtotal and a separator each,
/// then the grand total. No groups means a header-only report.
fn emit(groups: Vec<(String, Vec<&CardTransaction>)>) -> Report {
    let mut report = Report::empty();
    if groups.is_empty() {
        return report;
    }

    let mut grand = Totals::new("");
    for (label, members) in groups {
        let mut subtotal = Totals::new(label);
        for tx in members {
            report.push(ReportRow::Data(tx.clone()));
            subtotal.add(tx);
        }
        grand.absorb(&subtotal);
        report.push(ReportRow::Subtotal(subtotal));
        report.push(ReportRow::Separator);
    }
    report.push(ReportRow::GrandTotal(grand));
    report
}
