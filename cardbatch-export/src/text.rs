//! Plain-text table for terminal display.

use cardbatch_core::{Cell, Report};

/// A report laid out as aligned text columns.
#[derive(Debug, Clone)]
pub struct TextTable {
    rows: Vec<Vec<Cell>>,
    widths: Vec<usize>,
}

impl TextTable {
    pub fn new(report: &Report) -> Self {
        let rows = report.table();
        let widths = column_widths(&rows);
        Self { rows, widths }
    }

    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    /// Header, a rule line, then one line per row. Numbers are right-aligned.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, row) in self.rows.iter().enumerate() {
            let line: Vec<String> = row
                .iter()
                .zip(&self.widths)
                .map(|(cell, &w)| {
                    let s = cell.display();
                    if cell.is_numeric() {
                        format!("{:>w$}", s)
                    } else {
                        format!("{:<w$}", s)
                    }
                })
                .collect();
            out.push_str(line.join("  ").trim_end());
            out.push('\n');

            if i == 0 {
                let rule: Vec<String> = self.widths.iter().map(|&w| "-".repeat(w)).collect();
                out.push_str(&rule.join("  "));
                out.push('\n');
            }
        }
        out
    }
}

/// Widest rendered value per column, in characters.
pub fn column_widths(rows: &[Vec<Cell>]) -> Vec<usize> {
    let mut widths: Vec<usize> = Vec::new();
    for row in rows {
        if widths.len() < row.len() {
            widths.resize(row.len(), 0);
        }
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.display().chars().count());
        }
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardbatch_core::{CardTransaction, SortDirection, group_by_date_with_summary};

    #[test]
    fn test_header_only_table() {
        let text = TextTable::new(&Report::empty()).render();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Date"));
        assert!(lines[1].starts_with("----"));
    }

    #[test]
    fn test_amounts_are_right_aligned() {
        let txns = vec![
            CardTransaction::new("2024-01-02", "VISA", 3, 100.0, 97.0, 3.0),
            CardTransaction::new("2024-01-02", "MC", 12, 5.5, 5.0, 0.5),
        ];
        let table = TextTable::new(&group_by_date_with_summary(&txns, SortDirection::Ascending));
        let text = table.render();

        // "Grand Total" is the widest value in the card type column
        assert_eq!(table.widths()[1], "Grand Total".len());
        let grand = text.lines().last().unwrap();
        assert!(grand.contains("Grand Total"));
        assert!(grand.ends_with("3.50"));
        // header + rule + 2 data + subtotal + blank + grand total
        assert_eq!(text.lines().count(), 7);
    }
}
