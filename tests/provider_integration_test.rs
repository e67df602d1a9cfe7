//! Integration tests for the row source family

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tabex::core::export::{CsvExporter, ExportContext, ExportOptions, Exporter};
use tabex::config::ProviderConfig;
use tabex::core::provider::{
    DataProvider, FnPageQuery, FnWatermarkQuery, JsonLinesDataProvider, PageDataProvider,
    SqlDataProvider, SqlExecutor, WatermarkDataProvider,
};
use tabex::domain::{ExportError, Header, IntoRow, Result, RowValue};
use tempfile::{NamedTempFile, TempDir};

fn id_of(row: RowValue) -> i64 {
    match row {
        RowValue::Mapping(map) => map.get("id").and_then(Value::as_i64).unwrap(),
        other => panic!("unexpected row {other:?}"),
    }
}

async fn drain_ids(dp: &mut impl DataProvider) -> Vec<i64> {
    let ctx = ExportContext::background();
    let mut ids = Vec::new();
    while dp.next(&ctx).await {
        ids.push(id_of(dp.value()));
    }
    ids
}

#[tokio::test]
async fn test_watermark_source_yields_pages_in_order_then_stops() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let seen = calls.clone();
    let query = FnWatermarkQuery::new(move |last_id: i64, last_ts: i64, _limit: usize| {
        seen.lock().unwrap().push((last_id, last_ts));
        async move {
            let page = match last_id {
                0 => vec![json!({"id": 1, "ts": 10}), json!({"id": 2, "ts": 20})],
                2 => vec![json!({"id": 3, "ts": 30})],
                _ => Vec::new(),
            };
            Ok::<_, ExportError>(page)
        }
    });
    let mut dp = WatermarkDataProvider::new(query);

    assert_eq!(drain_ids(&mut dp).await, vec![1, 2, 3]);
    let ctx = ExportContext::background();
    assert!(!dp.next(&ctx).await);
    assert!(!dp.next(&ctx).await);
    assert_eq!(dp.watermark(), (3, 30));
    assert!(dp.source_error().is_none());

    // the exhausted source never queries again
    assert_eq!(*calls.lock().unwrap(), vec![(0, 0), (2, 20), (3, 30)]);
}

#[tokio::test]
async fn test_watermark_callback_sees_raw_page() {
    let query = FnWatermarkQuery::new(|last_id: i64, _ts: i64, _limit: usize| async move {
        let page = if last_id == 0 {
            vec![json!({"id": 5, "ts": 1}), json!({"id": 9, "ts": 2})]
        } else {
            Vec::new()
        };
        Ok::<_, ExportError>(page)
    });
    // keep only the first record of each page
    let mut dp = WatermarkDataProvider::new(query).with_callback(|items: Vec<Value>| {
        items.into_iter().take(1).map(IntoRow::into_row).collect()
    });

    assert_eq!(drain_ids(&mut dp).await, vec![5]);
    assert_eq!(dp.watermark(), (9, 2));
}

#[tokio::test]
async fn test_offset_source_advances_by_limit() {
    let query = FnPageQuery::new(|offset: usize, limit: usize| async move {
        let page: Vec<Value> = (offset..(offset + limit).min(7))
            .map(|i| json!({"id": i}))
            .collect();
        Ok::<_, ExportError>(page)
    });
    let mut dp = PageDataProvider::new(query).with_limit(3);

    assert_eq!(drain_ids(&mut dp).await, vec![0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(dp.offset(), 9);
    assert_eq!(dp.limit(), 3);
}

#[tokio::test]
async fn test_slow_page_ends_source_with_error() {
    let query = FnPageQuery::new(|_offset: usize, _limit: usize| async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<_, ExportError>(vec![json!({"id": 1})])
    });
    let mut dp = PageDataProvider::new(query).with_query_timeout(Duration::from_millis(20));

    assert!(!dp.next(&ExportContext::background()).await);
    assert!(dp.source_error().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_shutdown_cancels_export_blocked_in_page_query() {
    let query = FnPageQuery::new(|_offset: usize, _limit: usize| async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        Ok::<_, ExportError>(vec![json!({"id": 1})])
    });
    let dir = TempDir::new().unwrap();
    let mut exporter = CsvExporter::new(
        vec![Header::new("id", "ID")],
        PageDataProvider::new(query),
        ExportOptions::new().filename(dir.path().join("stalled").to_string_lossy()),
    )
    .unwrap();

    let (tx, rx) = tokio::sync::watch::channel(false);
    let ctx = ExportContext::background().with_shutdown(rx);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = tx.send(true);
    });

    let started = std::time::Instant::now();
    let err = exporter.export(&ctx).await.unwrap_err();

    assert!(matches!(err, ExportError::Cancelled(_)));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!dir.path().join("stalled_0.csv").exists());
}

#[tokio::test]
async fn test_deadline_cancels_export_blocked_in_page_query() {
    let query = FnPageQuery::new(|_offset: usize, _limit: usize| async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        Ok::<_, ExportError>(vec![json!({"id": 1})])
    });
    let dir = TempDir::new().unwrap();
    let mut exporter = CsvExporter::new(
        vec![Header::new("id", "ID")],
        PageDataProvider::new(query),
        ExportOptions::new().filename(dir.path().join("late").to_string_lossy()),
    )
    .unwrap();

    let ctx = ExportContext::background().with_timeout(Duration::from_millis(50));
    let started = std::time::Instant::now();
    let err = exporter.export(&ctx).await.unwrap_err();

    assert!(matches!(err, ExportError::DeadlineExceeded));
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_provider_config_sets_page_size_and_timeout() {
    let config = ProviderConfig {
        page_size: 2,
        query_timeout_secs: 1,
    };
    let limits = Arc::new(Mutex::new(Vec::new()));
    let seen = limits.clone();
    let query = FnPageQuery::new(move |offset: usize, limit: usize| {
        seen.lock().unwrap().push(limit);
        async move {
            if offset >= 4 {
                // longer than the configured one second bound
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
            Ok::<_, ExportError>((offset..offset + limit).map(|i| json!({"id": i})).collect())
        }
    });
    let mut dp = config.apply(PageDataProvider::new(query));

    assert_eq!(dp.limit(), 2);
    assert_eq!(drain_ids(&mut dp).await, vec![0, 1, 2, 3]);
    assert!(dp.source_error().unwrap().contains("timed out after 1s"));
    assert_eq!(*limits.lock().unwrap(), vec![2, 2, 2]);
}

/// Serves a fixed table and records every statement it ran
struct TableExecutor {
    rows: Vec<Map<String, Value>>,
    statements: Mutex<Vec<String>>,
}

#[async_trait]
impl SqlExecutor for TableExecutor {
    async fn query(&self, _ctx: &ExportContext, sql: &str) -> Result<Vec<Map<String, Value>>> {
        self.statements.lock().unwrap().push(sql.to_string());
        let (limit, offset) = parse_window(sql);
        Ok(self.rows.iter().skip(offset).take(limit).cloned().collect())
    }
}

fn parse_window(sql: &str) -> (usize, usize) {
    let words: Vec<&str> = sql.split_whitespace().collect();
    let after = |kw: &str| {
        let pos = words.iter().position(|w| *w == kw).unwrap();
        words[pos + 1].parse::<usize>().unwrap()
    };
    (after("LIMIT"), after("OFFSET"))
}

#[tokio::test]
async fn test_sql_source_pages_literal_query() {
    let rows = (1..=5)
        .map(|i| {
            let mut m = Map::new();
            m.insert("id".to_string(), json!(i));
            m
        })
        .collect();
    let executor = Arc::new(TableExecutor {
        rows,
        statements: Mutex::new(Vec::new()),
    });

    let mut dp = ProviderConfig {
        page_size: 2,
        ..ProviderConfig::default()
    }
    .apply(SqlDataProvider::new(executor.clone(), "SELECT id FROM orders;"));
    assert_eq!(drain_ids(&mut dp).await, vec![1, 2, 3, 4, 5]);

    let statements = executor.statements.lock().unwrap();
    assert_eq!(statements.len(), 4);
    assert_eq!(
        statements[0],
        "SELECT * FROM (SELECT id FROM orders) AS export_page LIMIT 2 OFFSET 0"
    );
    assert!(statements[3].ends_with("LIMIT 2 OFFSET 6"));
}

#[tokio::test]
async fn test_json_lines_source_feeds_an_export() {
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, r#"{{"id": 1, "name": "ada"}}"#).unwrap();
    writeln!(input).unwrap();
    writeln!(input, r#"[2, "grace"]"#).unwrap();
    input.flush().unwrap();

    let dir = TempDir::new().unwrap();
    let provider = JsonLinesDataProvider::open(input.path()).await.unwrap();
    let mut exporter = CsvExporter::new(
        vec![Header::new("id", "ID"), Header::new("name", "Name")],
        provider,
        ExportOptions::new().filename(dir.path().join("people").to_string_lossy()),
    )
    .unwrap();

    let path = exporter.export(&ExportContext::background()).await.unwrap();
    assert_eq!(
        std::fs::read_to_string(path).unwrap(),
        "ID,Name\n1,ada\n2,grace\n"
    );
}

#[tokio::test]
async fn test_json_lines_stops_at_malformed_line() {
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, r#"{{"id": 1}}"#).unwrap();
    writeln!(input, "{{not json").unwrap();
    writeln!(input, r#"{{"id": 3}}"#).unwrap();
    input.flush().unwrap();

    let mut dp = JsonLinesDataProvider::open(input.path()).await.unwrap();
    assert_eq!(drain_ids(&mut dp).await, vec![1]);
    assert!(dp.source_error().unwrap().contains("line 2"));
}
