use async_trait::async_trait;
use invsim_core::asset::entity::AssetRecord;
use invsim_core::common::AssetCategory;
use invsim_core::sink::error::SinkError;
use invsim_core::sink::port::{UpsertSink, Upsertable};
use invsim_ingest::writer::{FallbackPolicy, SinkWriter};
use invsim_sink::memory::MemorySink;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn forex(code: &str, name: &str) -> AssetRecord {
    AssetRecord::new(code, name, AssetCategory::Forex, "tiingo").streaming("tiingo")
}

/// # Summary
/// 三个货币对、批大小 2：恰好两次写入 (2 条 + 1 条)，结果 3/3。
#[tokio::test]
async fn test_three_pairs_two_batches() {
    let sink = Arc::new(MemorySink::new());
    let writer = SinkWriter::new(sink.clone(), 2);

    let assets = vec![
        forex("EURUSD", "Euro / US Dollar"),
        forex("GBPUSD", "British Pound / US Dollar"),
        forex("USDTRY", "US Dollar / Turkish Lira"),
    ];
    let report = writer.write(&assets).await;

    assert_eq!(
        sink.calls(),
        vec![("assets".to_string(), 2), ("assets".to_string(), 1)]
    );
    assert_eq!(report.to_string(), "3/3");
    assert_eq!(report.batches, 2);
    assert_eq!(sink.len("assets"), 3);
}

/// 可以缺少冲突键的测试记录，用于制造写入失败。
#[derive(Serialize)]
struct LooseRow {
    code: Option<String>,
    value: i32,
}

impl Upsertable for LooseRow {
    const TABLE: &'static str = "assets";
    const ON_CONFLICT: &'static str = "code";

    fn conflict_key(&self) -> String {
        self.code.clone().unwrap_or_default()
    }
}

fn loose(code: Option<&str>, value: i32) -> LooseRow {
    LooseRow {
        code: code.map(str::to_string),
        value,
    }
}

/// # Summary
/// 逐条兜底：一批 K 条中有 1 条坏数据，其余 K-1 条仍被写入。
#[tokio::test]
async fn test_per_record_fallback_saves_the_rest() {
    let sink = Arc::new(MemorySink::new());
    let writer = SinkWriter::new(sink.clone(), 4).with_policy(FallbackPolicy::PerRecord);

    let rows = vec![
        loose(Some("A"), 1),
        loose(Some("B"), 2),
        loose(None, 3),
        loose(Some("C"), 4),
        loose(Some("D"), 5),
    ];
    let report = writer.write(&rows).await;

    assert_eq!(report.attempted, 5);
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed_batches, 1);
    assert_eq!(report.rescued, 3);
    assert_eq!(report.to_string(), "4/5");
    assert_eq!(sink.len("assets"), 4);
    // 1 次整批 + 4 次逐条 + 1 次末批
    assert_eq!(sink.calls().len(), 6);
}

/// # Summary
/// 跳过策略：失败批次不重试，后续批次照常写入。
#[tokio::test]
async fn test_skip_batch_continues() {
    let sink = Arc::new(MemorySink::new());
    let writer = SinkWriter::new(sink.clone(), 2);

    let rows = vec![
        loose(Some("A"), 1),
        loose(None, 2),
        loose(Some("B"), 3),
        loose(Some("C"), 4),
    ];
    let report = writer.write(&rows).await;

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed_batches, 1);
    assert_eq!(report.rescued, 0);
    assert!(sink.get("assets", "A").is_none());
    assert!(sink.get("assets", "C").is_some());
}

/// # Summary
/// 重复写入同一 code：只保留一行且为最新值。
#[tokio::test]
async fn test_rewrite_overwrites() {
    let sink = Arc::new(MemorySink::new());
    let writer = SinkWriter::new(sink.clone(), 10);

    writer.write(&[loose(Some("A"), 1)]).await;
    let report = writer.write(&[loose(Some("A"), 2)]).await;

    assert!(report.is_complete());
    assert_eq!(sink.len("assets"), 1);
    assert_eq!(sink.get("assets", "A").unwrap()["value"], 2);
}

/// 前 N 次调用返回网络错误的写入端。
struct FlakySink {
    failures_left: AtomicUsize,
    inner: MemorySink,
}

#[async_trait]
impl UpsertSink for FlakySink {
    async fn upsert(
        &self,
        table: &str,
        on_conflict: &str,
        rows: &[Value],
    ) -> Result<usize, SinkError> {
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(SinkError::Network("connection reset by peer".into()));
        }
        self.inner.upsert(table, on_conflict, rows).await
    }

    async fn select_assets(
        &self,
        categories: &[AssetCategory],
    ) -> Result<Vec<AssetRecord>, SinkError> {
        self.inner.select_assets(categories).await
    }
}

/// # Summary
/// 瞬时网络错误：逐条重试时连接恢复，整批记录全部挽回。
#[tokio::test]
async fn test_transient_failure_rescued_per_record() {
    let sink = Arc::new(FlakySink {
        failures_left: AtomicUsize::new(1),
        inner: MemorySink::new(),
    });
    let writer = SinkWriter::new(sink.clone(), 3).with_policy(FallbackPolicy::PerRecord);

    let assets = vec![
        forex("EURUSD", "Euro / US Dollar"),
        forex("GBPUSD", "British Pound / US Dollar"),
        forex("USDTRY", "US Dollar / Turkish Lira"),
    ];
    let report = writer.write(&assets).await;

    assert_eq!(report.to_string(), "3/3");
    assert_eq!(report.failed_batches, 1);
    assert_eq!(report.rescued, 3);
}

/// # Summary
/// 批间停顿：暂停时钟下 3 批只停顿 2 次。
#[tokio::test(start_paused = true)]
async fn test_pause_between_batches() {
    let sink = Arc::new(MemorySink::new());
    let writer = SinkWriter::new(sink.clone(), 1).with_pause(Duration::from_millis(100));

    let started = tokio::time::Instant::now();
    let rows = vec![loose(Some("A"), 1), loose(Some("B"), 2), loose(Some("C"), 3)];
    writer.write(&rows).await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(200) && elapsed < Duration::from_millis(300));
}

/// # Summary
/// 空输入不调用写入端。
#[tokio::test]
async fn test_empty_input() {
    let sink = Arc::new(MemorySink::new());
    let writer = SinkWriter::new(sink.clone(), 0);
    let report = writer.write::<AssetRecord>(&[]).await;

    assert_eq!(report.to_string(), "0/0");
    assert_eq!(report.batches, 0);
    assert!(sink.calls().is_empty());
    assert_eq!(writer.batch_size(), 1);
}
