use crate::http::{build_client, decode_json, join_url, request_error};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use invsim_core::asset::entity::{AssetRecord, HistoricalPrice};
use invsim_core::common::time::DateWindow;
use invsim_core::config::FeedConfig;
use invsim_core::source::error::SourceError;
use invsim_core::source::port::HistorySource;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

const PROVIDER: &str = "yahoo_finance";

/// # Summary
/// Yahoo Finance 日线历史数据源。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯，带浏览器 User-Agent。
#[derive(Clone)]
pub struct YahooSource {
    /// 内部使用的 HTTP 客户端
    client: Client,
    base_url: String,
}

impl YahooSource {
    /// # Summary
    /// 创建一个新的 YahooSource 实例。
    ///
    /// # Logic
    /// 1. 按配置设置请求超时。
    /// 2. 使用共享客户端工厂 (伪装浏览器 Header)。
    ///
    /// # Arguments
    /// * `config`: 上游配置。
    ///
    /// # Returns
    /// 返回初始化后的 YahooSource。
    pub fn new(config: &FeedConfig) -> Result<Self, SourceError> {
        Self::with_base_url(
            config.yahoo_url.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(timeout, false)?,
            base_url,
        })
    }
}

/// # Summary
/// Yahoo API 响应顶层结构。
///
/// # Invariants
/// - 映射自 Yahoo v8 chart 接口。
#[derive(Deserialize, Debug)]
struct YahooResponse {
    chart: YahooChart,
}

#[derive(Deserialize, Debug)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Deserialize, Debug)]
struct YahooError {
    description: String,
}

/// # Summary
/// Yahoo API 单个时间序列结果。
///
/// # Invariants
/// - 无数据的区间不返回 `timestamp` 字段。
#[derive(Deserialize, Debug)]
struct YahooResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

#[derive(Deserialize, Debug)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooQuote>,
}

/// # Summary
/// Yahoo API 原始报价数据，各列表与 `timestamp` 按下标对齐。
#[derive(Deserialize, Debug, Default)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn at(list: &[Option<f64>], i: usize) -> Option<f64> {
    list.get(i).copied().flatten()
}

/// # Summary
/// 将对齐的时间戳与报价列表转换为日线记录。
///
/// # Logic
/// 1. 缺少收盘价的行直接跳过。
/// 2. 开盘、最高、最低缺失时以收盘价代替，成交量缺失记为 0。
/// 3. 日期取时间戳对应的 UTC 自然日，同一日期保留最后一条。
fn build_rows(asset: &AssetRecord, timestamps: &[i64], quote: &YahooQuote) -> Vec<HistoricalPrice> {
    let mut by_date: BTreeMap<NaiveDate, HistoricalPrice> = BTreeMap::new();

    for (i, &ts) in timestamps.iter().enumerate() {
        let Some(close) = at(&quote.close, i) else {
            continue;
        };
        let Some(time) = DateTime::from_timestamp(ts, 0) else {
            continue;
        };
        let date = time.date_naive();

        by_date.insert(
            date,
            HistoricalPrice {
                asset_code: asset.code.clone(),
                date,
                open: at(&quote.open, i).unwrap_or(close),
                high: at(&quote.high, i).unwrap_or(close),
                low: at(&quote.low, i).unwrap_or(close),
                close,
                volume: Some(at(&quote.volume, i).unwrap_or(0.0)),
                category: asset.category,
                provider: PROVIDER.to_string(),
            },
        );
    }

    by_date.into_values().collect()
}

#[async_trait]
impl HistorySource for YahooSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    /// # Summary
    /// 从 Yahoo Finance 抓取日线历史数据。
    ///
    /// # Logic
    /// 1. 构建包含 period1, period2 的 chart 接口 URL，周期固定为 1d。
    /// 2. 发起异步请求并解析嵌套的 JSON 数据。
    /// 3. 接口返回 error 对象时视为该代码不可用。
    ///
    /// # Arguments
    /// * `asset`: 目标资产，使用其 `symbol` 查询。
    /// * `window`: 回溯时间窗口。
    ///
    /// # Returns
    /// 成功返回按日期升序的日线列表，失败返回 SourceError。
    async fn fetch_history(
        &self,
        asset: &AssetRecord,
        window: &DateWindow,
    ) -> Result<Vec<HistoricalPrice>, SourceError> {
        let url = join_url(
            &self.base_url,
            &format!("v8/finance/chart/{}", asset.symbol),
        );

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", window.start.timestamp().to_string()),
                ("period2", window.end.timestamp().to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .map_err(request_error)?;

        let json: YahooResponse = decode_json(resp).await?;

        if let Some(err) = json.chart.error {
            return Err(SourceError::Unsupported(format!(
                "{}: {}",
                asset.symbol, err.description
            )));
        }

        let Some(result) = json.chart.result.and_then(|mut r| r.pop()) else {
            return Ok(Vec::new());
        };
        let quote = result.indicators.quote.first().ok_or_else(|| {
            SourceError::Parse(format!("No quote data for {}", asset.symbol))
        })?;

        Ok(build_rows(asset, &result.timestamp, quote))
    }
}
