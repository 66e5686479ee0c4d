use serde::Serialize;
use std::fmt;

/// # Summary
/// 一次批量写入的统计结果。
///
/// # Invariants
/// - `succeeded <= attempted`。
/// - `rescued` 为整批失败后经逐条重试保存下来的记录数，已计入 `succeeded`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    // 尝试写入的记录数
    pub attempted: usize,
    // 成功写入的记录数
    pub succeeded: usize,
    // 批次总数
    pub batches: usize,
    // 整批写入失败的批次数
    pub failed_batches: usize,
    // 逐条重试挽回的记录数
    pub rescued: usize,
}

impl IngestReport {
    pub fn failed(&self) -> usize {
        self.attempted.saturating_sub(self.succeeded)
    }

    pub fn is_complete(&self) -> bool {
        self.succeeded == self.attempted
    }
}

/// 形如 `3/3`：成功数 / 尝试数。
impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.succeeded, self.attempted)
    }
}

/// # Summary
/// 一次任务运行的汇总。
///
/// # Invariants
/// - `items` 为任务处理的资产数；种子任务中等于拉取到的资产数。
/// - `items_with_data <= items`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub job: String,
    pub items: usize,
    pub items_with_data: usize,
    pub write: IngestReport,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} items with data, {} records written ({} failed batches, {} rescued)",
            self.job,
            self.items_with_data,
            self.items,
            self.write,
            self.write.failed_batches,
            self.write.rescued
        )
    }
}
