use crate::batch::{batch_count, chunks};
use crate::report::IngestReport;
use invsim_core::sink::port::{UpsertSink, Upsertable, conflict_key_of};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// 整批写入失败后的处理方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// 记为失败批次，继续下一批
    #[default]
    SkipBatch,
    /// 对该批逐条重试，统计成功条数
    PerRecord,
}

/// # Summary
/// 批量写入器：分批调用写入端，容忍单批失败。
///
/// # Invariants
/// - 每批恰好调用一次 `UpsertSink::upsert` (逐条重试除外)。
/// - 任何写入错误都不会中止整次写入。
/// - 每批之后固定停顿 `pause`，最后一批之后不停顿。
pub struct SinkWriter {
    sink: Arc<dyn UpsertSink>,
    batch_size: usize,
    pause: Duration,
    policy: FallbackPolicy,
}

impl SinkWriter {
    /// # Summary
    /// 创建写入器，默认无停顿、失败跳过整批。
    ///
    /// # Arguments
    /// * `sink`: 写入端。
    /// * `batch_size`: 每批条数，0 按 1 处理。
    pub fn new(sink: Arc<dyn UpsertSink>, batch_size: usize) -> Self {
        Self {
            sink,
            batch_size: batch_size.max(1),
            pause: Duration::ZERO,
            policy: FallbackPolicy::default(),
        }
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn sink(&self) -> &Arc<dyn UpsertSink> {
        &self.sink
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// # Summary
    /// 将记录分批写入 `T::TABLE`。
    ///
    /// # Logic
    /// 1. 把记录序列化为 JSON 行，无法序列化的记录记为失败。
    /// 2. 按 `batch_size` 分批，每批调用一次 upsert。
    /// 3. 整批失败时记录错误，按策略跳过或逐条重试。
    /// 4. 批与批之间固定停顿。
    ///
    /// # Returns
    /// 返回写入统计，从不返回错误。
    pub async fn write<T: Upsertable>(&self, records: &[T]) -> IngestReport {
        let mut report = IngestReport {
            attempted: records.len(),
            ..Default::default()
        };

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::to_value(record) {
                Ok(row) => rows.push(row),
                Err(e) => error!(table = T::TABLE, key = %record.conflict_key(), error = %e, "Failed to serialize record"),
            }
        }

        let total = batch_count(rows.len(), self.batch_size);
        report.batches = total;
        if total > 0 {
            info!(table = T::TABLE, records = rows.len(), batches = total, "Starting upsert");
        }

        for (index, chunk) in chunks(&rows, self.batch_size).enumerate() {
            let number = index + 1;
            match self.sink.upsert(T::TABLE, T::ON_CONFLICT, chunk).await {
                Ok(_) => {
                    report.succeeded += chunk.len();
                    info!(
                        table = T::TABLE,
                        "Batch {}/{} processed ({} records)",
                        number,
                        total,
                        chunk.len()
                    );
                }
                Err(e) => {
                    report.failed_batches += 1;
                    error!(table = T::TABLE, error = %e, "Batch {}/{} failed", number, total);
                    if self.policy == FallbackPolicy::PerRecord {
                        let saved = self.retry_each::<T>(chunk).await;
                        report.succeeded += saved;
                        report.rescued += saved;
                        info!(
                            table = T::TABLE,
                            "Batch {}/{} rescued {}/{} records individually",
                            number,
                            total,
                            saved,
                            chunk.len()
                        );
                    }
                }
            }

            if number < total && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
        }

        report
    }

    /// 逐条写入一批记录，返回成功条数。
    async fn retry_each<T: Upsertable>(&self, chunk: &[Value]) -> usize {
        let mut saved = 0;
        for row in chunk {
            match self
                .sink
                .upsert(T::TABLE, T::ON_CONFLICT, std::slice::from_ref(row))
                .await
            {
                Ok(_) => saved += 1,
                Err(e) => {
                    let key = conflict_key_of(row, T::ON_CONFLICT).unwrap_or_else(|_| "<no key>".to_string());
                    warn!(table = T::TABLE, key = %key, error = %e, "Record rejected");
                }
            }
        }
        saved
    }
}
