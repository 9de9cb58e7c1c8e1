mod common;

use std::str::FromStr;

use nfe_core::export::{export_view, read_table};
use nfe_core::models::config::NfeConfig;
use nfe_core::{
    process_directory, BatchCounts, BatchError, DatasetView, ExportKind, FailureKind, Field,
    OperationType,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use common::{access_key, nfe_xml, write};

#[test]
fn test_three_valid_and_one_missing_grand_total() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "nota_1.xml", &nfe_xml(1, 1, Some("100.00")));
    write(dir.path(), "nota_2.xml", &nfe_xml(2, 0, Some("150.00")));
    write(dir.path(), "nota_3.xml", &nfe_xml(3, 1, Some("200.00")));
    write(dir.path(), "nota_4.xml", &nfe_xml(4, 1, None));

    let dataset = process_directory(dir.path(), &NfeConfig::default()).unwrap();

    assert_eq!(
        dataset.counts(),
        BatchCounts {
            seen: 4,
            parsed: 3,
            failed: 1
        }
    );

    let numbers: Vec<_> = dataset
        .records()
        .iter()
        .map(|r| r.header.invoice_number.as_str())
        .collect();
    assert_eq!(numbers, vec!["1", "2", "3"]);
    assert_eq!(dataset.records()[0].header.access_key, access_key(1));
    assert_eq!(dataset.records()[1].header.operation_type, OperationType::Entrada);
    assert_eq!(
        dataset.records()[2].totals.grand_total,
        Decimal::from_str("200.00").unwrap()
    );
    assert_eq!(dataset.records_with_warnings().count(), 0);

    let failure = &dataset.failures()[0];
    assert_eq!(failure.file, "nota_4.xml");
    assert_eq!(failure.kind, FailureKind::MissingMandatoryField);
    assert_eq!(failure.field, Some(Field::GrandTotal));
    assert!(failure.detail.contains("grand total"));
}

#[test]
fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "readme.txt", "not a document");

    let err = process_directory(dir.path(), &NfeConfig::default()).unwrap_err();
    assert!(matches!(err, BatchError::NoDocumentsFound { .. }));
}

#[test]
fn test_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let err = process_directory(&dir.path().join("nope"), &NfeConfig::default()).unwrap_err();
    assert!(matches!(err, BatchError::DirectoryNotFound(_)));
}

#[test]
fn test_processing_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    for n in 1..=5 {
        write(dir.path(), &format!("{}.xml", n), &nfe_xml(n, (n % 2) as u8, Some("100.00")));
    }
    write(dir.path(), "broken.xml", "<nfeProc>");
    write(dir.path(), "other.xml", "<CTe/>");

    let first = process_directory(dir.path(), &NfeConfig::default()).unwrap();
    let second = process_directory(dir.path(), &NfeConfig::default()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.counts().failed, 2);
    let kinds: Vec<_> = first.failures().iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![FailureKind::MalformedStructure, FailureKind::UnexpectedSchema]
    );
}

#[test]
fn test_deeply_nested_file_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "1.xml", &nfe_xml(1, 1, Some("100.00")));
    let deep = format!("{}{}", "<a>".repeat(100_000), "</a>".repeat(100_000));
    write(dir.path(), "2.xml", &deep);

    let dataset = process_directory(dir.path(), &NfeConfig::default()).unwrap();
    assert_eq!(dataset.counts().parsed, 1);
    assert_eq!(dataset.failures()[0].file, "2.xml");
    assert_eq!(dataset.failures()[0].kind, FailureKind::MalformedStructure);
}

#[test]
fn test_filter_hundred_records_by_operation_type() {
    let dir = tempfile::tempdir().unwrap();
    let mut incoming = 0;
    for n in 1..=100u32 {
        let operation = u8::from(n % 3 != 0);
        if operation == 0 {
            incoming += 1;
        }
        write(dir.path(), &format!("{:03}.xml", n), &nfe_xml(n, operation, Some("10.00")));
    }

    let dataset = process_directory(dir.path(), &NfeConfig::default()).unwrap();
    assert_eq!(dataset.records().len(), 100);

    let view = DatasetView::new(&dataset).filter_operation_type(OperationType::Entrada);
    assert_eq!(view.len(), incoming);
    assert!(view
        .records()
        .iter()
        .all(|r| r.header.operation_type == OperationType::Entrada));

    let stats = view.statistics().unwrap();
    assert_eq!(stats.count, incoming);
    assert_eq!(stats.outgoing_count, 0);
}

#[test]
fn test_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "1.xml", &nfe_xml(1, 1, Some("1234.56")));
    write(dir.path(), "2.xml", &nfe_xml(2, 0, Some("0.10")));
    write(dir.path(), "3.xml", "garbage");

    let config = NfeConfig::default();
    let dataset = process_directory(dir.path(), &config).unwrap();
    let view = DatasetView::new(&dataset).select(&Field::ALL);

    let out = tempfile::tempdir().unwrap();
    for kind in [ExportKind::Csv, ExportKind::Spreadsheet] {
        let path = out.path().join(format!("export.{}", kind.extension()));
        export_view(&view, kind, &path, &config.export).unwrap();

        let table = read_table(kind, &path).unwrap();
        assert_eq!(table, view.table(), "{:?}", kind);
    }
}
