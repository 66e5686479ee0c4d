use crate::common::AssetCategory;
use crate::sink::port::Upsertable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// # Summary
/// 资产实体，代表一个可交易或参考用的金融标的。
///
/// # Invariants
/// - `code` 是后端 `assets` 表的自然主键，全局唯一。
/// - `symbol` 为数据提供者使用的交易代码，多数情况下与 `code` 相同。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetRecord {
    // 唯一代码 (例如: BTCUSDT, EURUSD, AAPL)
    pub code: String,
    // 展示名称
    pub name: String,
    // 提供者交易代码 (例如: XAU/USD, CL=F)
    pub symbol: String,
    // 资产分类
    pub category: AssetCategory,
    // 负责后续价格更新的上游数据源
    pub provider: String,
    // 是否支持实时推送
    #[serde(default)]
    pub is_websocket: bool,
    // 实时推送的数据源
    #[serde(default)]
    pub websocket_provider: Option<String>,
}

impl AssetRecord {
    /// # Summary
    /// 创建一个不支持实时推送、`symbol` 与 `code` 相同的资产。
    ///
    /// # Arguments
    /// * `code`: 唯一代码。
    /// * `name`: 展示名称。
    /// * `category`: 资产分类。
    /// * `provider`: 价格数据源。
    ///
    /// # Returns
    /// 返回新的资产实体。
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        category: AssetCategory,
        provider: impl Into<String>,
    ) -> Self {
        let code = code.into();
        Self {
            symbol: code.clone(),
            code,
            name: name.into(),
            category,
            provider: provider.into(),
            is_websocket: false,
            websocket_provider: None,
        }
    }

    /// 覆盖提供者交易代码。
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// 标记为支持实时推送，并记录推送数据源。
    pub fn streaming(mut self, websocket_provider: impl Into<String>) -> Self {
        self.is_websocket = true;
        self.websocket_provider = Some(websocket_provider.into());
        self
    }
}

impl Upsertable for AssetRecord {
    const TABLE: &'static str = "assets";
    const ON_CONFLICT: &'static str = "code";

    fn conflict_key(&self) -> String {
        self.code.clone()
    }
}

/// # Summary
/// 历史价格实体，记录某资产在某一自然日的 OHLCV 数据。
///
/// # Invariants
/// - `(asset_code, date)` 唯一；重复写入覆盖旧值而非新增。
/// - `date` 序列化为 `YYYY-MM-DD`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoricalPrice {
    // 资产代码 (对应 AssetRecord.code)
    pub asset_code: String,
    // 交易日
    pub date: NaiveDate,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
    // 成交量 (外汇等无成交量的数据为空)
    pub volume: Option<f64>,
    // 资产分类
    pub category: AssetCategory,
    // 数据来源
    pub provider: String,
}

impl HistoricalPrice {
    /// # Summary
    /// 构造单一价格的日线记录 (OHLC 均为同一值，无成交量)。
    ///
    /// # Logic
    /// 汇率表一类数据源只提供每日一个价格，四个价位取同一值。
    pub fn flat(
        asset_code: impl Into<String>,
        date: NaiveDate,
        price: f64,
        category: AssetCategory,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            asset_code: asset_code.into(),
            date,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: None,
            category,
            provider: provider.into(),
        }
    }
}

impl Upsertable for HistoricalPrice {
    const TABLE: &'static str = "historical_prices";
    const ON_CONFLICT: &'static str = "asset_code,date";

    fn conflict_key(&self) -> String {
        format!("{}@{}", self.asset_code, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_serializes_backend_columns() {
        let asset = AssetRecord::new("XAUUSD", "Gold / US Dollar", AssetCategory::Commodity, "goldapi")
            .with_symbol("XAU/USD")
            .streaming("goldapi");

        let value = serde_json::to_value(&asset).unwrap();
        assert_eq!(value["code"], "XAUUSD");
        assert_eq!(value["symbol"], "XAU/USD");
        assert_eq!(value["category"], "commodity");
        assert_eq!(value["is_websocket"], true);
        assert_eq!(value["websocket_provider"], "goldapi");
    }

    #[test]
    fn test_non_streaming_asset_keeps_null_provider_column() {
        let asset = AssetRecord::new("VFIAX", "Vanguard 500 Index Admiral", AssetCategory::UsMutualFund, "yahoo");
        let value = serde_json::to_value(&asset).unwrap();
        assert_eq!(value["is_websocket"], false);
        assert!(value["websocket_provider"].is_null());
    }

    #[test]
    fn test_price_date_format_and_key() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 3).unwrap();
        let price = HistoricalPrice::flat("USDTRY", date, 42.1, AssetCategory::Forex, "frankfurter");

        let value = serde_json::to_value(&price).unwrap();
        assert_eq!(value["date"], "2025-11-03");
        assert!(value["volume"].is_null());
        assert_eq!(price.conflict_key(), "USDTRY@2025-11-03");
        assert_eq!(HistoricalPrice::ON_CONFLICT, "asset_code,date");
    }
}
