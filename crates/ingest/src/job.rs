use crate::report::RunSummary;
use crate::writer::SinkWriter;
use invsim_core::common::AssetCategory;
use invsim_core::common::time::{DateWindow, TimeProvider};
use invsim_core::source::port::{AssetSource, HistorySource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// # Summary
/// 资产种子任务：从资产数据源拉取清单并写入 `assets` 表。
///
/// # Invariants
/// - 数据源失败时记录错误并以空清单完成，不中止。
pub struct SeedJob {
    name: String,
    source: Arc<dyn AssetSource>,
    writer: SinkWriter,
}

impl SeedJob {
    pub fn new(name: impl Into<String>, source: Arc<dyn AssetSource>, writer: SinkWriter) -> Self {
        Self {
            name: name.into(),
            source,
            writer,
        }
    }

    /// # Summary
    /// 执行种子任务。
    ///
    /// # Logic
    /// 1. 拉取资产清单，失败按空清单处理。
    /// 2. 交给写入器分批写入。
    ///
    /// # Returns
    /// 返回运行汇总。
    pub async fn run(&self) -> RunSummary {
        info!(job = %self.name, source = self.source.name(), "Fetching assets");

        let assets = match self.source.fetch_assets().await {
            Ok(assets) => assets,
            Err(e) => {
                error!(job = %self.name, source = self.source.name(), error = %e, "Asset source failed");
                Vec::new()
            }
        };
        if assets.is_empty() {
            warn!(job = %self.name, "No assets to write");
        }

        let write = self.writer.write(&assets).await;
        RunSummary {
            job: self.name.clone(),
            items: assets.len(),
            items_with_data: assets.len(),
            write,
        }
    }
}

/// # Summary
/// 回填任务的参数。
#[derive(Debug, Clone)]
pub struct BackfillPlan {
    // 从写入端读取资产时的分类过滤
    pub categories: Vec<AssetCategory>,
    // 回溯天数
    pub days: u32,
    // 两次上游请求之间的停顿
    pub request_pause: Duration,
}

/// # Summary
/// 历史价格回填任务。
///
/// # Invariants
/// - 上游请求严格顺序执行，每次请求之间固定停顿。
/// - 单个资产失败只记录日志，不影响其它资产。
/// - 时间窗口以注入时钟的当前 UTC 时刻为终点。
pub struct BackfillJob {
    name: String,
    plan: BackfillPlan,
    source: Arc<dyn HistorySource>,
    writer: SinkWriter,
    clock: Arc<dyn TimeProvider>,
}

impl BackfillJob {
    pub fn new(
        name: impl Into<String>,
        plan: BackfillPlan,
        source: Arc<dyn HistorySource>,
        writer: SinkWriter,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            plan,
            source,
            writer,
            clock,
        }
    }

    /// # Summary
    /// 执行回填任务。
    ///
    /// # Logic
    /// 1. 计算 `[now - days, now]` 窗口。
    /// 2. 从写入端读取指定分类的资产，失败时以空列表完成。
    /// 3. 逐个资产拉取历史，失败或无数据时记录日志并继续。
    /// 4. 汇总全部价格后交给写入器分批写入 `historical_prices`。
    ///
    /// # Returns
    /// 返回运行汇总。
    pub async fn run(&self) -> RunSummary {
        let window = DateWindow::ending_now(self.clock.as_ref(), self.plan.days);
        info!(
            job = %self.name,
            start = %window.start_date(),
            end = %window.end_date(),
            days = self.plan.days,
            "Backfill window"
        );

        let assets = match self.writer.sink().select_assets(&self.plan.categories).await {
            Ok(assets) => assets,
            Err(e) => {
                error!(job = %self.name, error = %e, "Failed to load assets");
                Vec::new()
            }
        };
        info!(job = %self.name, assets = assets.len(), "Loaded assets");

        let total = assets.len();
        let mut prices = Vec::new();
        let mut with_data = 0usize;

        for (index, asset) in assets.iter().enumerate() {
            let number = index + 1;
            match self.source.fetch_history(asset, &window).await {
                Ok(rows) if !rows.is_empty() => {
                    info!(job = %self.name, "[{}/{}] {}: {} days", number, total, asset.symbol, rows.len());
                    with_data += 1;
                    prices.extend(rows);
                }
                Ok(_) => warn!(job = %self.name, "[{}/{}] No data for {}", number, total, asset.symbol),
                Err(e) => warn!(job = %self.name, error = %e, "[{}/{}] Failed to fetch {}", number, total, asset.symbol),
            }

            if number < total && !self.plan.request_pause.is_zero() {
                tokio::time::sleep(self.plan.request_pause).await;
            }
        }

        info!(job = %self.name, records = prices.len(), "Fetched data for {}/{} assets", with_data, total);

        let write = self.writer.write(&prices).await;
        RunSummary {
            job: self.name.clone(),
            items: total,
            items_with_data: with_data,
            write,
        }
    }
}
