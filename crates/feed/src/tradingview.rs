use crate::http::{build_client, decode_json, join_url, request_error};
use async_trait::async_trait;
use invsim_core::asset::entity::AssetRecord;
use invsim_core::common::AssetCategory;
use invsim_core::config::FeedConfig;
use invsim_core::source::error::SourceError;
use invsim_core::source::port::AssetSource;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

// 美股资产的实时推送与价格更新数据源
const PROVIDER: &str = "alpaca";

/// 扫描器查询的标的类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    /// 个股，按市值取前 100
    Stocks,
    /// 基金 (ETF)，按市值取前 500
    Etfs,
}

impl ScanKind {
    fn type_filter(self) -> &'static str {
        match self {
            ScanKind::Stocks => "stock",
            ScanKind::Etfs => "fund",
        }
    }

    fn limit(self) -> u32 {
        match self {
            ScanKind::Stocks => 100,
            ScanKind::Etfs => 500,
        }
    }

    pub fn category(self) -> AssetCategory {
        match self {
            ScanKind::Stocks => AssetCategory::UsStock,
            ScanKind::Etfs => AssetCategory::UsEtf,
        }
    }

    /// # Summary
    /// 构建扫描请求体。
    ///
    /// # Logic
    /// 过滤类型与交易所 (AMEX/NASDAQ/NYSE)，仅保留活跃标的，按市值降序取前 N 条。
    pub fn payload(self) -> Value {
        json!({
            "filter": [
                {"left": "type", "operation": "equal", "right": self.type_filter()},
                {"left": "exchange", "operation": "in_range", "right": ["AMEX", "NASDAQ", "NYSE"]},
                {"left": "active_symbol", "operation": "equal", "right": true}
            ],
            "options": {"lang": "en"},
            "symbols": {"query": {"types": []}},
            "columns": ["name", "description", "close", "type"],
            "sort": {"sortBy": "capitalization", "sortOrder": "desc"},
            "range": [0, self.limit()]
        })
    }
}

#[derive(Deserialize, Debug)]
struct ScanResponse {
    #[serde(default)]
    data: Vec<ScanRow>,
}

#[derive(Deserialize, Debug)]
struct ScanRow {
    // 与请求中的 columns 顺序一致
    #[serde(default)]
    d: Vec<Value>,
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// # Summary
/// TradingView 美股扫描器，按市值拉取美股个股或 ETF 清单。
pub struct TradingViewSource {
    client: Client,
    base_url: String,
    kind: ScanKind,
}

impl TradingViewSource {
    pub fn new(config: &FeedConfig, kind: ScanKind) -> Result<Self, SourceError> {
        Self::with_base_url(
            config.tradingview_url.clone(),
            Duration::from_secs(config.http_timeout_secs),
            kind,
        )
    }

    pub fn with_base_url(
        base_url: String,
        timeout: Duration,
        kind: ScanKind,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(timeout, false)?,
            base_url,
            kind,
        })
    }
}

#[async_trait]
impl AssetSource for TradingViewSource {
    fn name(&self) -> &str {
        match self.kind {
            ScanKind::Stocks => "tradingview:stocks",
            ScanKind::Etfs => "tradingview:etfs",
        }
    }

    /// # Summary
    /// 执行扫描并转换为资产记录。
    ///
    /// # Logic
    /// 1. POST `/america/scan`。
    /// 2. 每行 `d[0]` 为代码、`d[1]` 为名称，任一为空则丢弃。
    async fn fetch_assets(&self) -> Result<Vec<AssetRecord>, SourceError> {
        let url = join_url(&self.base_url, "america/scan");
        let resp = self
            .client
            .post(&url)
            .json(&self.kind.payload())
            .send()
            .await
            .map_err(request_error)?;
        let scan: ScanResponse = decode_json(resp).await?;

        let category = self.kind.category();
        let assets: Vec<AssetRecord> = scan
            .data
            .iter()
            .filter_map(|row| {
                let ticker = non_empty_str(row.d.first())?;
                let name = non_empty_str(row.d.get(1))?;
                Some(AssetRecord::new(ticker, name, category, PROVIDER).streaming(PROVIDER))
            })
            .collect();

        info!(kind = ?self.kind, count = assets.len(), "Fetched TradingView scan");
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let stocks = ScanKind::Stocks.payload();
        assert_eq!(stocks["filter"][0]["right"], "stock");
        assert_eq!(stocks["range"][1], 100);

        let etfs = ScanKind::Etfs.payload();
        assert_eq!(etfs["filter"][0]["right"], "fund");
        assert_eq!(etfs["range"][1], 500);
        assert_eq!(etfs["sort"]["sortBy"], "capitalization");
    }
}
