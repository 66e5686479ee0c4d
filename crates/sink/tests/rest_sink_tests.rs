use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use invsim_core::common::AssetCategory;
use invsim_core::config::BackendConfig;
use invsim_core::sink::error::SinkError;
use invsim_core::sink::port::UpsertSink;
use invsim_sink::rest::RestSink;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const KEY: &str = "test-service-key";

#[derive(Debug, Clone)]
struct Captured {
    table: String,
    query: HashMap<String, String>,
    apikey: Option<String>,
    authorization: Option<String>,
    prefer: Option<String>,
    body: Value,
}

type Log = Arc<Mutex<Vec<Captured>>>;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn record_upsert(
    State(log): State<Log>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let reject = body
        .as_array()
        .is_some_and(|rows| rows.iter().any(|r| r["code"] == "BAD"));
    log.lock().unwrap().push(Captured {
        table,
        query,
        apikey: header(&headers, "apikey"),
        authorization: header(&headers, "authorization"),
        prefer: header(&headers, "prefer"),
        body,
    });
    if reject {
        (
            StatusCode::CONFLICT,
            r#"{"code":"21000","message":"ON CONFLICT DO UPDATE command cannot affect row a second time"}"#.to_string(),
        )
    } else {
        (StatusCode::CREATED, String::new())
    }
}

async fn list_assets(
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    assert_eq!(table, "assets");
    assert_eq!(query.get("category").map(String::as_str), Some("in.(us_stock,us_etf)"));
    assert!(query.get("select").is_some_and(|s| s.contains("websocket_provider")));
    Json(json!([
        {"code": "AAPL", "name": "Apple Inc.", "symbol": "AAPL", "category": "us_stock", "provider": "alpaca", "is_websocket": true, "websocket_provider": "alpaca"},
        {"code": "SPY", "name": null, "symbol": null, "category": "us_etf", "provider": "alpaca", "is_websocket": null, "websocket_provider": null},
        {"code": "VNQ", "name": "Vanguard Real Estate ETF", "symbol": "VNQ", "category": "us_reit_etf", "provider": "alpaca"}
    ]))
}

// 帮助函数：启动模拟的 REST 表接口
async fn spawn_backend() -> (String, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/rest/v1/{table}", get(list_assets).post(record_upsert))
        .with_state(log.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (url, log)
}

fn sink_for(url: &str) -> RestSink {
    RestSink::new(&BackendConfig {
        url: format!("{}/", url),
        service_key: KEY.to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

/// # Summary
/// 批量写入携带凭据头、on_conflict 参数与合并写入声明。
#[tokio::test]
async fn test_upsert_request_shape() {
    let (url, log) = spawn_backend().await;
    let sink = sink_for(&url);

    let rows = vec![
        json!({"asset_code": "AAPL", "date": "2025-01-02", "close": 243.85}),
        json!({"asset_code": "AAPL", "date": "2025-01-03", "close": 243.36}),
    ];
    let written = sink
        .upsert("historical_prices", "asset_code,date", &rows)
        .await
        .unwrap();
    assert_eq!(written, 2);

    let captured = log.lock().unwrap().clone();
    assert_eq!(captured.len(), 1);
    let call = &captured[0];
    assert_eq!(call.table, "historical_prices");
    assert_eq!(call.query.get("on_conflict").map(String::as_str), Some("asset_code,date"));
    assert_eq!(call.apikey.as_deref(), Some(KEY));
    assert_eq!(call.authorization.as_deref(), Some("Bearer test-service-key"));
    assert_eq!(
        call.prefer.as_deref(),
        Some("resolution=merge-duplicates,return=minimal")
    );
    assert_eq!(call.body.as_array().map(Vec::len), Some(2));
}

/// # Summary
/// 后端拒绝时返回状态码与错误主体。
#[tokio::test]
async fn test_rejected_batch_carries_body() {
    let (url, _log) = spawn_backend().await;
    let sink = sink_for(&url);

    let result = sink
        .upsert("assets", "code", &[json!({"code": "BAD"})])
        .await;
    match result {
        Err(SinkError::Rejected { status, body }) => {
            assert_eq!(status, 409);
            assert!(body.contains("21000"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

/// # Summary
/// 空批次不发请求。
#[tokio::test]
async fn test_empty_batch_is_noop() {
    let (url, log) = spawn_backend().await;
    let sink = sink_for(&url);
    assert_eq!(sink.upsert("assets", "code", &[]).await.unwrap(), 0);
    assert!(log.lock().unwrap().is_empty());
}

/// # Summary
/// 按分类读取资产，宽松处理 null 列并跳过未知分类。
#[tokio::test]
async fn test_select_assets() {
    let (url, _log) = spawn_backend().await;
    let sink = sink_for(&url);

    let assets = sink
        .select_assets(&[AssetCategory::UsStock, AssetCategory::UsEtf])
        .await
        .unwrap();
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[1].code, "SPY");
    assert_eq!(assets[1].symbol, "SPY");
    assert!(!assets[1].is_websocket);
}

/// # Summary
/// 后端不可达时返回网络错误。
#[tokio::test]
async fn test_unreachable_backend() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let sink = sink_for(&url);
    let result = sink.upsert("assets", "code", &[json!({"code": "X"})]).await;
    assert!(matches!(result, Err(SinkError::Network(_))));
}
