use crate::row::asset_from_row;
use async_trait::async_trait;
use dashmap::DashMap;
use invsim_core::asset::entity::AssetRecord;
use invsim_core::common::AssetCategory;
use invsim_core::sink::error::SinkError;
use invsim_core::sink::port::{UpsertSink, conflict_key_of};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Mutex;

/// # Summary
/// 基于 DashMap 的内存表写入端，语义与后端的合并写入一致。
///
/// # Invariants
/// - 每张表以冲突键取值为索引，同一键最多一行，后写覆盖先写。
/// - 批次是原子的：任一行缺少冲突键或批内键重复时，整批拒绝且不写入任何行。
/// - 覆盖时按列合并，新行未提供的列保留旧值。
pub struct MemorySink {
    // 表名 -> (冲突键 -> 行)
    tables: DashMap<String, DashMap<String, Value>>,
    // 每次 upsert 调用的 (表名, 行数)，用于诊断与测试
    calls: Mutex<Vec<(String, usize)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 指定表当前的行数。
    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// 按冲突键取值读取一行 (多列键以 `|` 连接，例如 `AAPL|2025-01-02`)。
    pub fn get(&self, table: &str, key: &str) -> Option<Value> {
        self.tables
            .get(table)
            .and_then(|t| t.get(key).map(|row| row.value().clone()))
    }

    /// 指定表的全部行，按冲突键排序。
    pub fn rows(&self, table: &str) -> Vec<Value> {
        let Some(t) = self.tables.get(table) else {
            return Vec::new();
        };
        let mut entries: Vec<(String, Value)> = t
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().map(|(_, v)| v).collect()
    }

    /// 已发生的 upsert 调用记录。
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record_call(&self, table: &str, rows: usize) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((table.to_string(), rows));
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

/// 列级合并：新行的每一列覆盖旧行的同名列。
fn merge_row(existing: &mut Value, incoming: &Value) {
    match (existing.as_object_mut(), incoming.as_object()) {
        (Some(old), Some(new)) => {
            for (column, value) in new {
                old.insert(column.clone(), value.clone());
            }
        }
        _ => *existing = incoming.clone(),
    }
}

#[async_trait]
impl UpsertSink for MemorySink {
    /// # Summary
    /// 原子地写入一批记录。
    ///
    /// # Logic
    /// 1. 先为每一行计算冲突键，缺列或批内重复则整批拒绝。
    /// 2. 全部校验通过后逐行插入或按列合并。
    async fn upsert(
        &self,
        table: &str,
        on_conflict: &str,
        rows: &[Value],
    ) -> Result<usize, SinkError> {
        self.record_call(table, rows.len());

        let mut keyed = Vec::with_capacity(rows.len());
        let mut seen = HashSet::with_capacity(rows.len());
        for row in rows {
            let key = conflict_key_of(row, on_conflict)?;
            if !seen.insert(key.clone()) {
                return Err(SinkError::InvalidRecord(format!(
                    "conflict key `{}` appears twice in one batch",
                    key
                )));
            }
            keyed.push((key, row));
        }

        let target = self.tables.entry(table.to_string()).or_default();
        for (key, row) in keyed {
            target
                .entry(key)
                .and_modify(|existing| merge_row(existing, row))
                .or_insert_with(|| row.clone());
        }

        Ok(rows.len())
    }

    async fn select_assets(
        &self,
        categories: &[AssetCategory],
    ) -> Result<Vec<AssetRecord>, SinkError> {
        let mut assets: Vec<AssetRecord> = self
            .rows("assets")
            .iter()
            .filter_map(asset_from_row)
            .filter(|a| categories.is_empty() || categories.contains(&a.category))
            .collect();
        assets.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(assets)
    }
}
