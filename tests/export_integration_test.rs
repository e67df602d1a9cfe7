//! Integration tests for chunking, archiving and the terminal operations

use serde_json::{json, Value};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tabex::core::export::{
    CsvExporter, ExcelExporter, ExportContext, ExportOptions, Exporter,
};
use tabex::core::provider::{FnPageQuery, PageDataProvider, SliceDataProvider};
use tabex::domain::{ExportError, Header, Headers};
use tempfile::TempDir;
use tokio::sync::watch;

fn headers() -> Headers {
    vec![Header::new("id", "ID"), Header::new("name", "Name")]
}

fn rows(n: usize) -> SliceDataProvider {
    SliceDataProvider::new((1..=n).map(|i| json!({"id": i, "name": format!("row{i}")})))
}

fn options(dir: &TempDir, name: &str) -> ExportOptions {
    ExportOptions::new().filename(dir.path().join(name).to_string_lossy())
}

fn csv_text(range: std::ops::RangeInclusive<usize>) -> String {
    let mut out = String::from("ID,Name\n");
    for i in range {
        out.push_str(&format!("{i},row{i}\n"));
    }
    out
}

/// Entry names and contents in archive order
fn read_zip(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).unwrap();
            (entry.name().to_string(), bytes)
        })
        .collect()
}

fn sheet_xml(xlsx: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(xlsx)).unwrap();
    let mut sheet = archive.by_name("xl/worksheets/sheet1.xml").unwrap();
    let mut xml = String::new();
    sheet.read_to_string(&mut xml).unwrap();
    xml
}

#[tokio::test]
async fn test_exactly_cap_rows_is_single_file() {
    let dir = TempDir::new().unwrap();
    let mut exporter = CsvExporter::new(
        headers(),
        rows(3),
        options(&dir, "exact").single_file_max_rows(3),
    )
    .unwrap();

    let path = exporter.export(&ExportContext::background()).await.unwrap();

    assert_eq!(path, dir.path().join("exact_0.csv"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), csv_text(1..=3));
    assert!(!dir.path().join("exact_0.zip").exists());
}

#[tokio::test]
async fn test_one_row_over_cap_splits_into_archive() {
    let dir = TempDir::new().unwrap();
    let mut exporter = CsvExporter::new(
        headers(),
        rows(4),
        options(&dir, "split").single_file_max_rows(3),
    )
    .unwrap();

    let path = exporter.export(&ExportContext::background()).await.unwrap();
    assert_eq!(path, dir.path().join("split_0.zip"));

    let entries = read_zip(&path);
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["split_0.csv", "split_1.csv"]);
    assert_eq!(String::from_utf8(entries[0].1.clone()).unwrap(), csv_text(1..=3));
    assert_eq!(String::from_utf8(entries[1].1.clone()).unwrap(), csv_text(4..=4));

    // the standalone first chunk is superseded by the archive
    assert!(!dir.path().join("split_0.csv").exists());
    assert_eq!(exporter.total_rows(), 4);
}

#[tokio::test]
async fn test_many_chunks_keep_row_order() {
    let dir = TempDir::new().unwrap();
    let mut exporter = CsvExporter::new(
        headers(),
        rows(10),
        options(&dir, "many").single_file_max_rows(3),
    )
    .unwrap();

    let path = exporter.export(&ExportContext::background()).await.unwrap();
    let entries = read_zip(&path);

    assert_eq!(entries.len(), 4);
    assert_eq!(String::from_utf8(entries[3].1.clone()).unwrap(), csv_text(10..=10));

    let mut ids = Vec::new();
    for (_, bytes) in &entries {
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        for record in reader.records() {
            ids.push(record.unwrap()[0].parse::<usize>().unwrap());
        }
    }
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_force_single_file_never_splits() {
    let dir = TempDir::new().unwrap();
    let mut exporter = CsvExporter::new(
        headers(),
        rows(30),
        options(&dir, "single")
            .single_file_max_rows(3)
            .force_single_file(true),
    )
    .unwrap();

    let path = exporter.export(&ExportContext::background()).await.unwrap();
    assert_eq!(path, dir.path().join("single_0.csv"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), csv_text(1..=30));
}

#[tokio::test]
async fn test_force_zip_wraps_single_chunk() {
    let dir = TempDir::new().unwrap();
    let mut exporter =
        CsvExporter::new(headers(), rows(2), options(&dir, "zipped").force_zip(true)).unwrap();

    let path = exporter.export(&ExportContext::background()).await.unwrap();
    let entries = read_zip(&path);

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "zipped_0.csv");
    assert_eq!(String::from_utf8(entries[0].1.clone()).unwrap(), csv_text(1..=2));
}

#[tokio::test]
async fn test_total_cap_fails_single_file_export() {
    let dir = TempDir::new().unwrap();
    let mut exporter =
        CsvExporter::new(headers(), rows(10), options(&dir, "capped").max_rows(5)).unwrap();

    let err = exporter
        .export(&ExportContext::background())
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::MaximumLimit { limit: 5 }));
    assert!(!dir.path().join("capped_0.csv").exists());
}

#[tokio::test]
async fn test_total_cap_fails_archived_export_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let mut exporter = CsvExporter::new(
        headers(),
        rows(10),
        options(&dir, "capped").single_file_max_rows(2).max_rows(5),
    )
    .unwrap();

    let err = exporter
        .export(&ExportContext::background())
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::MaximumLimit { limit: 5 }));
    assert!(!dir.path().join("capped_0.csv").exists());
    assert!(!dir.path().join("capped_0.zip").exists());
}

#[tokio::test]
async fn test_rows_at_total_cap_succeed() {
    let dir = TempDir::new().unwrap();
    let mut exporter =
        CsvExporter::new(headers(), rows(5), options(&dir, "limit").max_rows(5)).unwrap();

    let path = exporter.export(&ExportContext::background()).await.unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), csv_text(1..=5));
}

#[tokio::test]
async fn test_cancelled_export_returns_cancellation() {
    let dir = TempDir::new().unwrap();
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();
    let ctx = ExportContext::background().with_shutdown(rx);

    let mut exporter = CsvExporter::new(headers(), rows(3), options(&dir, "stop")).unwrap();
    let err = exporter.export(&ctx).await.unwrap_err();

    assert!(err.is_cancellation());
    assert!(!dir.path().join("stop_0.csv").exists());
}

#[tokio::test]
async fn test_export_to_writer_removes_temporary_file() {
    let dir = TempDir::new().unwrap();
    let mut exporter = CsvExporter::new(headers(), rows(2), options(&dir, "stream")).unwrap();

    let mut out: Vec<u8> = Vec::new();
    let bytes = exporter
        .export_to(&ExportContext::background(), &mut out)
        .await
        .unwrap();

    assert_eq!(bytes as usize, out.len());
    assert_eq!(String::from_utf8(out).unwrap(), csv_text(1..=2));
    assert!(!dir.path().join("stream_0.csv").exists());
}

#[tokio::test]
async fn test_render_receives_chunk_row_and_column() {
    let dir = TempDir::new().unwrap();
    let headers = vec![
        Header::new("id", "ID"),
        Header::new("name", "Name").with_render(|_row, value, row, col| {
            json!(format!("{row}:{col}:{}", value.as_str().unwrap_or("-")))
        }),
    ];
    let source = SliceDataProvider::new(vec![json!({"id": 1, "name": "a"}), json!({"id": 2})]);
    let mut exporter = CsvExporter::new(headers, source, options(&dir, "render")).unwrap();

    let path = exporter.export(&ExportContext::background()).await.unwrap();
    assert_eq!(
        std::fs::read_to_string(path).unwrap(),
        "ID,Name\n1,1:2:a\n2,2:2:-\n"
    );
}

#[tokio::test]
async fn test_mixed_row_shapes_project_to_same_width() {
    let dir = TempDir::new().unwrap();
    let source = SliceDataProvider::new(vec![
        json!({"name": "map", "id": 1}),
        json!([2, "list", "ignored"]),
        json!([3]),
        json!("not a row"),
    ]);
    let mut exporter = CsvExporter::new(headers(), source, options(&dir, "shapes")).unwrap();

    let path = exporter.export(&ExportContext::background()).await.unwrap();
    assert_eq!(
        std::fs::read_to_string(path).unwrap(),
        "ID,Name\n1,map\n2,list\n3,\n,\n"
    );
}

#[tokio::test]
async fn test_source_failure_truncates_by_default() {
    let dir = TempDir::new().unwrap();
    let provider = PageDataProvider::new(FnPageQuery::new(|offset: usize, _limit: usize| async move {
        if offset == 0 {
            Ok(vec![json!({"id": 1, "name": "row1"})])
        } else {
            Err(ExportError::Other("database unavailable".to_string()))
        }
    }));

    let mut exporter = CsvExporter::new(headers(), provider, options(&dir, "partial")).unwrap();
    let path = exporter.export(&ExportContext::background()).await.unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), csv_text(1..=1));
}

#[tokio::test]
async fn test_source_failure_can_fail_the_export() {
    let dir = TempDir::new().unwrap();
    let provider = PageDataProvider::new(FnPageQuery::new(|offset: usize, _limit: usize| async move {
        if offset == 0 {
            Ok(vec![json!({"id": 1, "name": "row1"})])
        } else {
            Err(ExportError::Other("database unavailable".to_string()))
        }
    }));

    let mut exporter = CsvExporter::new(
        headers(),
        provider,
        options(&dir, "strict").fail_on_source_error(true),
    )
    .unwrap();
    let err = exporter
        .export(&ExportContext::background())
        .await
        .unwrap_err();

    match err {
        ExportError::SourceFailed(reason) => assert!(reason.contains("database unavailable")),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!dir.path().join("strict_0.csv").exists());
}

#[tokio::test]
async fn test_excel_grid_offsets_shift_every_cell() {
    let dir = TempDir::new().unwrap();
    let mut exporter = ExcelExporter::new(
        headers(),
        rows(2),
        options(&dir, "grid").row_start(2).col_start(1),
    )
    .unwrap();

    let path = exporter.export(&ExportContext::background()).await.unwrap();
    assert_eq!(path, dir.path().join("grid_0.xlsx"));

    let xml = sheet_xml(&std::fs::read(&path).unwrap());
    // titles on row 3 from column B, data below
    assert!(xml.contains(r#"r="B3""#));
    assert!(xml.contains(r#"r="C3""#));
    assert!(xml.contains(r#"r="B4""#));
    assert!(xml.contains(r#"r="C5""#));
    assert!(!xml.contains(r#"r="A1""#));
}

#[tokio::test]
async fn test_excel_split_into_workbook_archive() {
    let dir = TempDir::new().unwrap();
    let mut exporter = ExcelExporter::new(
        headers(),
        rows(3),
        options(&dir, "books").single_file_max_rows(2),
    )
    .unwrap();

    let path = exporter.export(&ExportContext::background()).await.unwrap();
    assert_eq!(path, dir.path().join("books_0.zip"));

    let entries = read_zip(&path);
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["books_0.xlsx", "books_1.xlsx"]);

    // second workbook holds the title row and one data row
    let xml = sheet_xml(&entries[1].1);
    assert!(xml.contains(r#"r="A2""#));
    assert!(!xml.contains(r#"r="A3""#));
}

#[tokio::test]
async fn test_excel_render_sees_sheet_coordinates() {
    let dir = TempDir::new().unwrap();
    let source = SliceDataProvider::new(vec![json!({"id": 7})]);
    let headers = vec![Header::new("id", "ID").with_render(|_row, _value, row, col| {
        Value::String(format!("{row}:{col}"))
    })];
    let mut exporter = ExcelExporter::new(
        headers,
        source,
        options(&dir, "coords").row_start(1).col_start(2),
    )
    .unwrap();

    let mut out: Vec<u8> = Vec::new();
    exporter
        .export_to(&ExportContext::background(), &mut out)
        .await
        .unwrap();

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(out)).unwrap();
    let mut shared = String::new();
    archive
        .by_name("xl/sharedStrings.xml")
        .unwrap()
        .read_to_string(&mut shared)
        .unwrap();
    // data row lands on sheet row 3, column C
    assert!(shared.contains("3:3"));
}
