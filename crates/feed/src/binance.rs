use crate::http::{build_client, decode_json, join_url, request_error};
use async_trait::async_trait;
use chrono::DateTime;
use invsim_core::asset::entity::{AssetRecord, HistoricalPrice};
use invsim_core::common::AssetCategory;
use invsim_core::common::time::DateWindow;
use invsim_core::config::FeedConfig;
use invsim_core::source::error::SourceError;
use invsim_core::source::port::{AssetSource, HistorySource};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

const PROVIDER: &str = "binance";
// 单次 K 线请求的最大条数
const KLINE_LIMIT: usize = 1000;
const DAY_MS: i64 = 86_400_000;

/// # Summary
/// `exchangeInfo` 中的单个交易对描述。
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    pub base_asset: String,
    pub quote_asset: String,
}

#[derive(Deserialize, Debug)]
struct ExchangeInfo {
    #[serde(default)]
    symbols: Vec<SymbolInfo>,
}

impl SymbolInfo {
    /// 是否为正在交易的 USDT 计价交易对。
    pub fn is_active_usdt(&self) -> bool {
        self.status == "TRADING" && self.quote_asset == "USDT"
    }

    /// 转换为资产记录，名称形如 `BTC/USDT`。
    pub fn to_asset(&self) -> AssetRecord {
        AssetRecord::new(
            self.symbol.clone(),
            format!("{}/{}", self.base_asset, self.quote_asset),
            AssetCategory::Crypto,
            PROVIDER,
        )
        .streaming(PROVIDER)
    }
}

/// 过滤出正在交易的 USDT 交易对并转换为资产记录。
pub fn usdt_pairs(symbols: &[SymbolInfo]) -> Vec<AssetRecord> {
    symbols
        .iter()
        .filter(|s| s.is_active_usdt())
        .map(SymbolInfo::to_asset)
        .collect()
}

/// # Summary
/// Binance 现货数据源：交易对清单与日 K 线。
///
/// # Invariants
/// - `endpoints` 按优先级排列，主站在前，镜像在后。
/// - `insecure` 仅在开启 TLS 失败重试时存在，每个端点最多重试一次。
/// - K 线翻页时相邻两页请求之间固定停顿 `page_pause`。
pub struct BinanceSource {
    client: Client,
    insecure: Option<Client>,
    endpoints: Vec<String>,
    page_pause: Duration,
}

impl BinanceSource {
    /// # Summary
    /// 按配置创建数据源 (主站 + 镜像)。
    ///
    /// # Arguments
    /// * `config`: 上游配置。
    ///
    /// # Returns
    /// 返回初始化后的数据源，HTTP 客户端构建失败时返回错误。
    pub fn new(config: &FeedConfig) -> Result<Self, SourceError> {
        Ok(Self::with_endpoints(
            vec![
                config.binance_url.clone(),
                config.binance_mirror_url.clone(),
            ],
            Duration::from_secs(config.http_timeout_secs),
            config.binance_insecure_retry,
        )?
        .with_page_pause(Duration::from_millis(config.page_pause_ms)))
    }

    /// 使用自定义端点列表创建数据源，默认翻页之间不停顿。
    pub fn with_endpoints(
        endpoints: Vec<String>,
        timeout: Duration,
        insecure_retry: bool,
    ) -> Result<Self, SourceError> {
        let insecure = if insecure_retry {
            Some(build_client(timeout, true)?)
        } else {
            None
        };
        Ok(Self {
            client: build_client(timeout, false)?,
            insecure,
            endpoints,
            page_pause: Duration::ZERO,
        })
    }

    pub fn with_page_pause(mut self, pause: Duration) -> Self {
        self.page_pause = pause;
        self
    }

    async fn get_once<T: DeserializeOwned>(
        client: &Client,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let resp = client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(request_error)?;
        decode_json(resp).await
    }

    /// 沿端点链请求同一路径，返回第一个成功的结果。
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let client = &self.client;
        let insecure = self.insecure.as_ref();

        walk_endpoints(&self.endpoints, path, insecure.is_some(), move |url, skip_verify| {
            let chosen = match (skip_verify, insecure) {
                (true, Some(insecure)) => insecure,
                _ => client,
            };
            async move { Self::get_once(chosen, &url, query).await }
        })
        .await
    }
}

/// # Summary
/// 端点链的重试策略。
///
/// # Logic
/// 1. 依次请求每个端点 (`attempt(url, false)`)。
/// 2. 某端点 TLS 失败且允许重试时，跳过证书校验再请求一次 (`attempt(url, true)`)，并记录 warn 日志。
/// 3. 所有端点都失败时返回最后一个错误。
async fn walk_endpoints<T, F, Fut>(
    endpoints: &[String],
    path: &str,
    allow_insecure: bool,
    mut attempt: F,
) -> Result<T, SourceError>
where
    F: FnMut(String, bool) -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut last_err = SourceError::NotFound;

    for base in endpoints {
        let url = join_url(base, path);
        debug!(url = %url, "Requesting Binance endpoint");

        match attempt(url.clone(), false).await {
            Ok(value) => return Ok(value),
            Err(SourceError::Tls(reason)) if allow_insecure => {
                warn!(url = %url, reason = %reason, "TLS failure, retrying without certificate verification");
                match attempt(url.clone(), true).await {
                    Ok(value) => return Ok(value),
                    Err(e) => {
                        warn!(url = %url, error = %e, "Insecure retry failed");
                        last_err = e;
                    }
                }
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Binance endpoint failed");
                last_err = e;
            }
        }
    }

    Err(last_err)
}

#[async_trait]
impl AssetSource for BinanceSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    /// # Summary
    /// 拉取 Binance 上全部正在交易的 USDT 交易对。
    ///
    /// # Logic
    /// 1. 沿端点链请求 `/api/v3/exchangeInfo`。
    /// 2. 保留 `status == TRADING` 且 `quoteAsset == USDT` 的交易对。
    async fn fetch_assets(&self) -> Result<Vec<AssetRecord>, SourceError> {
        let info: ExchangeInfo = self.get_json("/api/v3/exchangeInfo", &[]).await?;
        let assets = usdt_pairs(&info.symbols);
        info!(
            total = info.symbols.len(),
            usdt_pairs = assets.len(),
            "Fetched Binance exchange info"
        );
        Ok(assets)
    }
}

/// 从单行 K 线数组中解析数值字段，Binance 以字符串返回价格。
fn kline_number(row: &[Value], index: usize) -> Option<f64> {
    match row.get(index)? {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// # Summary
/// 将一行 `[openTime, open, high, low, close, volume, ...]` 解析为日线记录。
///
/// # Returns
/// 任一价格字段缺失或非法时返回 None。
fn parse_kline(row: &[Value], asset: &AssetRecord) -> Option<HistoricalPrice> {
    let open_time = row.first()?.as_i64()?;
    let date = DateTime::from_timestamp_millis(open_time)?.date_naive();
    Some(HistoricalPrice {
        asset_code: asset.code.clone(),
        date,
        open: kline_number(row, 1)?,
        high: kline_number(row, 2)?,
        low: kline_number(row, 3)?,
        close: kline_number(row, 4)?,
        volume: kline_number(row, 5),
        category: asset.category,
        provider: PROVIDER.to_string(),
    })
}

#[async_trait]
impl HistorySource for BinanceSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    /// # Summary
    /// 分页拉取日 K 线直到覆盖整个窗口。
    ///
    /// # Logic
    /// 1. 以窗口起点为 `startTime` 请求最多 1000 根日 K 线。
    /// 2. 本页不足 1000 根时结束，否则停顿 `page_pause` 后从最后一根的次日继续。
    async fn fetch_history(
        &self,
        asset: &AssetRecord,
        window: &DateWindow,
    ) -> Result<Vec<HistoricalPrice>, SourceError> {
        let end_ms = window.end.timestamp_millis();
        let mut start_ms = window.start.timestamp_millis();
        let mut prices = Vec::new();

        while start_ms <= end_ms {
            let rows: Vec<Vec<Value>> = self
                .get_json(
                    "/api/v3/klines",
                    &[
                        ("symbol", asset.symbol.clone()),
                        ("interval", "1d".to_string()),
                        ("startTime", start_ms.to_string()),
                        ("endTime", end_ms.to_string()),
                        ("limit", KLINE_LIMIT.to_string()),
                    ],
                )
                .await?;

            let page_len = rows.len();
            let Some(last_open) = rows.last().and_then(|r| r.first()).and_then(Value::as_i64)
            else {
                break;
            };

            prices.extend(rows.iter().filter_map(|row| parse_kline(row, asset)));

            if page_len < KLINE_LIMIT {
                break;
            }
            start_ms = last_open + DAY_MS;
            if start_ms <= end_ms && !self.page_pause.is_zero() {
                tokio::time::sleep(self.page_pause).await;
            }
        }

        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    const ENDPOINTS: [&str; 2] = ["https://primary.test", "https://mirror.test"];

    fn endpoints() -> Vec<String> {
        ENDPOINTS.iter().map(|e| e.to_string()).collect()
    }

    #[tokio::test]
    async fn test_tls_failure_retried_insecurely() {
        let calls = Mutex::new(Vec::new());
        let result: Result<u32, SourceError> =
            walk_endpoints(&endpoints(), "/api/v3/ping", true, |url, skip_verify| {
                calls.lock().unwrap().push((url, skip_verify));
                let outcome = if skip_verify {
                    Ok(7)
                } else {
                    Err(SourceError::Tls("invalid peer certificate: UnknownIssuer".into()))
                };
                async move { outcome }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(
            calls.into_inner().unwrap(),
            vec![
                ("https://primary.test/api/v3/ping".to_string(), false),
                ("https://primary.test/api/v3/ping".to_string(), true),
            ]
        );
    }

    #[tokio::test]
    async fn test_tls_failure_without_insecure_moves_to_mirror() {
        let calls = Mutex::new(Vec::new());
        let result: Result<u32, SourceError> =
            walk_endpoints(&endpoints(), "/api/v3/ping", false, |url, skip_verify| {
                let outcome = if url.starts_with("https://primary.test") {
                    Err(SourceError::Tls("handshake failure".into()))
                } else {
                    Ok(1)
                };
                calls.lock().unwrap().push((url, skip_verify));
                async move { outcome }
            })
            .await;

        assert_eq!(result.unwrap(), 1);
        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, skip_verify)| !skip_verify));
    }

    #[tokio::test]
    async fn test_failed_insecure_retry_continues_chain() {
        let calls = Mutex::new(Vec::new());
        let result: Result<u32, SourceError> =
            walk_endpoints(&endpoints(), "/api/v3/ping", true, |url, skip_verify| {
                calls.lock().unwrap().push((url, skip_verify));
                let outcome = if skip_verify {
                    Err(SourceError::Network("connection reset".into()))
                } else {
                    Err(SourceError::Tls("handshake failure".into()))
                };
                async move { outcome }
            })
            .await;

        assert!(matches!(result, Err(SourceError::Network(_))));
        assert_eq!(calls.into_inner().unwrap().len(), 4);
    }

    #[test]
    fn test_usdt_filter_and_naming() {
        let symbols = vec![
            SymbolInfo {
                symbol: "BTCUSDT".into(),
                status: "TRADING".into(),
                base_asset: "BTC".into(),
                quote_asset: "USDT".into(),
            },
            SymbolInfo {
                symbol: "ETHBTC".into(),
                status: "TRADING".into(),
                base_asset: "ETH".into(),
                quote_asset: "BTC".into(),
            },
            SymbolInfo {
                symbol: "LUNAUSDT".into(),
                status: "BREAK".into(),
                base_asset: "LUNA".into(),
                quote_asset: "USDT".into(),
            },
        ];

        let assets = usdt_pairs(&symbols);
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].code, "BTCUSDT");
        assert_eq!(assets[0].name, "BTC/USDT");
        assert_eq!(assets[0].websocket_provider.as_deref(), Some("binance"));
    }

    #[test]
    fn test_parse_kline_row() {
        let asset = AssetRecord::new("BTCUSDT", "BTC/USDT", AssetCategory::Crypto, "binance");
        let row = vec![
            json!(1_735_689_600_000_i64),
            json!("93576.00"),
            json!("95151.15"),
            json!("92888.00"),
            json!("94591.79"),
            json!("10373.32"),
            json!(1_735_775_999_999_i64),
        ];
        let price = parse_kline(&row, &asset).unwrap();
        assert_eq!(price.date.to_string(), "2025-01-01");
        assert_eq!(price.close, 94591.79);
        assert_eq!(price.volume, Some(10373.32));

        let broken = vec![json!(1_735_689_600_000_i64), json!("abc")];
        assert!(parse_kline(&broken, &asset).is_none());
    }
}
