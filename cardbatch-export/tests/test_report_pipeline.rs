use std::fs;
use std::path::Path;

use cardbatch_core::{GroupBy, ReportRow, SortDirection, build_report};
use cardbatch_export::{ExportFormat, ExportOptions, PdfOptions, TextTable, export};
use cardbatch_ingest::{Selector, TransactionStore, import_file, scan_xml_files};

const JAN_02: &str = r#"<?xml version="1.0"?>
<Settlement>
  <Batch>
    <BatchDate>2024-01-02</BatchDate>
    <CardType identType="VISA" quantity="3" grossAmount="100.00" netAmount="97.00">
      <ChargeAmt>3.00</ChargeAmt>
    </CardType>
    <CardType identType="MC" quantity="2" grossAmount="50.00" netAmount="48.50">
      <ChargeAmt>1.50</ChargeAmt>
    </CardType>
  </Batch>
</Settlement>"#;

const JAN_01: &str = r#"<Settlement>
  <Batch>
    <BatchDate>01/01/2024</BatchDate>
    <CardType identType="VISA" quantity="1" grossAmount="20.00" netAmount="19.00">
      <ChargeAmt>1.00</ChargeAmt>
    </CardType>
  </Batch>
</Settlement>"#;

fn seed(dir: &Path) {
    fs::write(dir.join("b_jan02.xml"), JAN_02).unwrap();
    fs::write(dir.join("a_jan01.xml"), JAN_01).unwrap();
    fs::write(dir.join("c_broken.xml"), "<Batch><CardType identType=\"VISA\"").unwrap();
}

fn loaded_store(dir: &Path) -> TransactionStore {
    let store = TransactionStore::new();
    store.load(scan_xml_files(dir).unwrap());
    store
}

/// Folder scan -> store -> grouped report: the broken file loads as empty and the
/// totals match the hand-computed figures.
#[test]
fn test_folder_to_report_totals() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let store = loaded_store(dir.path());

    assert_eq!(store.file_names(), ["a_jan01.xml", "b_jan02.xml", "c_broken.xml"]);
    assert!(store.get(&Selector::from("c_broken.xml")).is_empty());

    let txns = store.get(&Selector::AllFiles);
    let report = build_report(&txns, GroupBy::Date(SortDirection::Ascending));
    let labels: Vec<_> = report.subtotals().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, ["2024-01-01", "2024-01-02"]);

    let grand = report.grand_total().unwrap();
    assert_eq!(grand.quantity, 6);
    assert_eq!(format!("{:.2}", grand.gross), "170.00");
    assert_eq!(format!("{:.2}", grand.net), "164.50");
    assert_eq!(format!("{:.2}", grand.fee), "5.50");
}

/// Re-importing an already-loaded file name leaves every report unchanged.
#[test]
fn test_reimport_does_not_change_reports() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let store = loaded_store(dir.path());
    let before = build_report(&store.get(&Selector::AllFiles), GroupBy::CardType);

    let outside = tempfile::tempdir().unwrap();
    let source = outside.path().join("a_jan01.xml");
    fs::write(&source, JAN_02).unwrap();
    let outcome = import_file(&store, dir.path(), &source).unwrap();

    assert!(!outcome.added);
    let after = build_report(&store.get(&Selector::AllFiles), GroupBy::CardType);
    assert_eq!(before, after);
}

/// A single-file selection exports to every format, and the PDF repeats its header.
#[test]
fn test_selected_file_exports() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let store = loaded_store(dir.path());

    let report = build_report(
        &store.get(&Selector::from("b_jan02.xml")),
        GroupBy::Date(SortDirection::Descending),
    );
    assert!(matches!(report.rows()[1], ReportRow::Data(_)));
    assert!(TextTable::new(&report).render().contains("145.50"));

    let out = tempfile::tempdir().unwrap();
    let opts = ExportOptions {
        pdf: PdfOptions {
            rows_per_page: 3,
            ..PdfOptions::default()
        },
        ..ExportOptions::default()
    };

    // 2 data + subtotal + separator + grand total = 5 body rows, 2 per page
    let pdf = export(&report, ExportFormat::Pdf, &out.path().join("r.pdf"), &opts).unwrap();
    assert_eq!(pdf.pages, Some(3));

    let csv_path = out.path().join("r.csv");
    export(&report, ExportFormat::Csv, &csv_path, &opts).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), report.len());

    let xlsx = export(&report, ExportFormat::Xlsx, &out.path().join("r.xlsx"), &opts).unwrap();
    assert_eq!(xlsx.rows, 6);
}

/// An empty selection is not an error: header-only report, still exportable.
#[test]
fn test_empty_selection_exports_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let store = loaded_store(dir.path());
    let report = build_report(&store.get(&Selector::AllFiles), GroupBy::CardType);
    assert!(!report.has_data());

    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("empty.csv");
    export(&report, ExportFormat::Csv, &path, &ExportOptions::default()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);
}
