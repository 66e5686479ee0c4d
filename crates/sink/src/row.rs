use invsim_core::asset::entity::AssetRecord;
use invsim_core::common::AssetCategory;
use serde::Deserialize;
use serde_json::Value;

/// 后端 `assets` 行的宽松形态，历史数据中部分列可能为 null。
#[derive(Deserialize, Debug)]
struct AssetRow {
    code: String,
    name: Option<String>,
    symbol: Option<String>,
    category: AssetCategory,
    provider: Option<String>,
    is_websocket: Option<bool>,
    websocket_provider: Option<String>,
}

/// # Summary
/// 将后端返回的一行转换为 `AssetRecord`。
///
/// # Logic
/// 1. 缺失的 `symbol` 与 `name` 以 `code` 代替。
/// 2. `is_websocket` 为 null 视为 false。
///
/// # Returns
/// 分类未知或缺少 `code` 时返回 None。
pub(crate) fn asset_from_row(row: &Value) -> Option<AssetRecord> {
    let row = AssetRow::deserialize(row).ok()?;
    Some(AssetRecord {
        symbol: row.symbol.unwrap_or_else(|| row.code.clone()),
        name: row.name.unwrap_or_else(|| row.code.clone()),
        code: row.code,
        category: row.category,
        provider: row.provider.unwrap_or_default(),
        is_websocket: row.is_websocket.unwrap_or(false),
        websocket_provider: row.websocket_provider,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_row() {
        let asset = asset_from_row(&json!({
            "code": "AAPL",
            "name": null,
            "symbol": null,
            "category": "us_stock",
            "provider": "alpaca",
            "is_websocket": null
        }))
        .unwrap();
        assert_eq!(asset.symbol, "AAPL");
        assert_eq!(asset.name, "AAPL");
        assert!(!asset.is_websocket);
    }

    #[test]
    fn test_unknown_category_is_skipped() {
        assert!(asset_from_row(&json!({"code": "VNQ", "category": "us_reit_etf"})).is_none());
    }
}
