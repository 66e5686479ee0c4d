use crate::asset::entity::{AssetRecord, HistoricalPrice};
use crate::common::time::DateWindow;
use crate::source::error::SourceError;
use async_trait::async_trait;

/// # Summary
/// 资产清单数据源接口，负责从上游拉取标的列表并归一化为 `AssetRecord`。
///
/// # Invariants
/// - 实现者只做读取与形状转换，不写入任何存储。
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// 数据源名称，用于日志。
    fn name(&self) -> &str;

    /// # Summary
    /// 拉取完整的资产清单。
    ///
    /// # Logic
    /// 1. 构建上游请求并执行。
    /// 2. 过滤无效条目并转换为 `AssetRecord`。
    ///
    /// # Returns
    /// 成功返回资产列表，失败返回 `SourceError`。
    async fn fetch_assets(&self) -> Result<Vec<AssetRecord>, SourceError>;
}

/// # Summary
/// 历史价格数据源接口，按单个资产拉取日线数据。
///
/// # Invariants
/// - 返回的记录 `asset_code` 必须等于入参资产的 `code`。
/// - 同一交易日最多一条记录。
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// 数据源名称，用于日志。
    fn name(&self) -> &str;

    /// # Summary
    /// 拉取指定资产在时间窗口内的日线历史。
    ///
    /// # Logic
    /// 1. 将资产的 `symbol` 映射为上游识别的代码。
    /// 2. 按上游限制分段请求并合并结果。
    ///
    /// # Arguments
    /// * `asset`: 目标资产。
    /// * `window`: 回溯时间窗口。
    ///
    /// # Returns
    /// 成功返回按日期升序的历史价格列表。
    async fn fetch_history(
        &self,
        asset: &AssetRecord,
        window: &DateWindow,
    ) -> Result<Vec<HistoricalPrice>, SourceError>;
}
