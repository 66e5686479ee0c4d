use crate::asset::entity::AssetRecord;
use crate::common::AssetCategory;
use crate::sink::error::SinkError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// # Summary
/// 可被幂等写入的实体，声明目标表与冲突键列。
///
/// # Invariants
/// - `ON_CONFLICT` 为逗号分隔的列名，且每一列都出现在序列化结果中。
/// - 相同 `conflict_key` 的两次写入，后者覆盖前者。
pub trait Upsertable: Serialize + Send + Sync {
    /// 目标表名
    const TABLE: &'static str;
    /// 冲突键列 (例如 `code` 或 `asset_code,date`)
    const ON_CONFLICT: &'static str;

    /// 记录的自然键，用于日志与诊断。
    fn conflict_key(&self) -> String;
}

/// # Summary
/// 写入端接口 (Port)，对应托管后端的表级批量 upsert 能力。
///
/// # Invariants
/// - `upsert` 对同一批次是原子的：要么整批成功，要么返回错误。
/// - 实现必须是 `Send` 和 `Sync`，以便通过 `Arc<dyn UpsertSink>` 注入。
#[async_trait]
pub trait UpsertSink: Send + Sync {
    /// # Summary
    /// 批量插入或更新记录。
    ///
    /// # Logic
    /// 1. 将整批记录提交到 `table`。
    /// 2. 按 `on_conflict` 列判定冲突，冲突时以新值覆盖可变列。
    ///
    /// # Arguments
    /// * `table`: 目标表名。
    /// * `on_conflict`: 逗号分隔的冲突键列。
    /// * `rows`: 已序列化的 JSON 对象列表。
    ///
    /// # Returns
    /// 成功返回写入的行数，失败返回 `SinkError`。
    async fn upsert(
        &self,
        table: &str,
        on_conflict: &str,
        rows: &[Value],
    ) -> Result<usize, SinkError>;

    /// # Summary
    /// 按分类读取已登记的资产。
    ///
    /// # Arguments
    /// * `categories`: 分类过滤条件，为空表示不过滤。
    ///
    /// # Returns
    /// 返回资产列表或 `SinkError`。
    async fn select_assets(
        &self,
        categories: &[AssetCategory],
    ) -> Result<Vec<AssetRecord>, SinkError>;
}

/// # Summary
/// 从 JSON 行中提取冲突键的取值，按列顺序以 `|` 拼接。
///
/// # Logic
/// 1. 拆分 `on_conflict` 得到列名。
/// 2. 逐列读取行中的字段，字符串取原值，其它类型取 JSON 文本。
///
/// # Returns
/// 任一列缺失或为 null 时返回 `SinkError::InvalidRecord`。
pub fn conflict_key_of(row: &Value, on_conflict: &str) -> Result<String, SinkError> {
    let mut parts = Vec::new();
    for column in on_conflict.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let part = match row.get(column) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => {
                return Err(SinkError::InvalidRecord(format!(
                    "missing conflict column `{}`",
                    column
                )));
            }
            Some(other) => other.to_string(),
        };
        parts.push(part);
    }
    Ok(parts.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conflict_key_composite() {
        let row = json!({"asset_code": "AAPL", "date": "2025-01-02", "close": 1.0});
        assert_eq!(conflict_key_of(&row, "asset_code,date").unwrap(), "AAPL|2025-01-02");
    }

    #[test]
    fn test_conflict_key_missing_column() {
        let row = json!({"name": "no code"});
        assert!(matches!(
            conflict_key_of(&row, "code"),
            Err(SinkError::InvalidRecord(_))
        ));
    }
}
