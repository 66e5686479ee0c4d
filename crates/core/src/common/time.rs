use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::RwLock;

/// # Summary
/// 时间供给器接口，用于隔离物理系统时钟。
/// 回填任务通过此接口计算回溯窗口，测试可注入固定时间。
pub trait TimeProvider: Send + Sync {
    /// 获取当前时间
    fn now(&self) -> DateTime<Utc>;
}

/// # Summary
/// 真实时钟，直接返回操作系统当前时间。
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// # Summary
/// 测试用固定时钟，允许手动拨动时间。
///
/// # Invariants
/// - 内部利用 `RwLock` 保证多线程读写安全。
pub struct FakeClockProvider {
    current_time: RwLock<DateTime<Utc>>,
}

impl FakeClockProvider {
    /// 使用指定的初始时间创建虚拟时钟
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: RwLock::new(initial_time),
        }
    }

    /// 强制修改时钟的当前时间
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        let mut time = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *time = new_time;
    }
}

impl TimeProvider for FakeClockProvider {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current_time
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// # Summary
/// 回填任务的时间窗口 `[start, end]`。
///
/// # Invariants
/// - `start <= end`。
/// - 所有运算基于 UTC 时刻，`lookback(end, n)` 的跨度恒为 `n * 86400` 秒，
///   不受本地时区夏令时切换影响。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// # Summary
    /// 以 `end` 为终点向前回溯 `days` 天构建窗口。
    ///
    /// # Arguments
    /// * `end`: 窗口终点。
    /// * `days`: 回溯天数。
    ///
    /// # Returns
    /// 返回 `[end - days, end]` 窗口。
    pub fn lookback(end: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    /// 以时钟的当前时刻为终点构建回溯窗口。
    pub fn ending_now(clock: &dyn TimeProvider, days: u32) -> Self {
        Self::lookback(clock.now(), days)
    }

    /// 窗口跨度 (秒)。
    pub fn span_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }

    /// # Summary
    /// 将窗口按自然日切分为若干闭区间，每段最多 `max_days` 天。
    ///
    /// # Logic
    /// 1. 从起始日开始，段尾取 `min(段首 + max_days - 1, 结束日)`。
    /// 2. 下一段从段尾的次日开始，直到覆盖结束日。
    ///
    /// # Arguments
    /// * `max_days`: 单段最大天数，0 按 1 处理。
    ///
    /// # Returns
    /// 按时间升序排列的 `(段首, 段尾)` 列表。
    pub fn day_chunks(&self, max_days: u32) -> Vec<(NaiveDate, NaiveDate)> {
        let span = Duration::days(i64::from(max_days.max(1)) - 1);
        let last = self.end_date();
        let mut chunks = Vec::new();
        let mut cursor = self.start_date();

        while cursor <= last {
            let chunk_end = std::cmp::min(cursor + span, last);
            chunks.push((cursor, chunk_end));
            cursor = chunk_end + Duration::days(1);
        }

        chunks
    }
}
