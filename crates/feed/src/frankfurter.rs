use crate::http::{build_client, decode_json, join_url, request_error};
use async_trait::async_trait;
use chrono::NaiveDate;
use invsim_core::asset::entity::{AssetRecord, HistoricalPrice};
use invsim_core::common::time::DateWindow;
use invsim_core::config::FeedConfig;
use invsim_core::source::error::SourceError;
use invsim_core::source::port::HistorySource;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, warn};

const PROVIDER: &str = "frankfurter";
// 汇率表只支持以 EUR 为基准
const ANCHOR: &str = "EUR";
// 单次请求允许的最大天数
const MAX_CHUNK_DAYS: u32 = 90;

/// # Summary
/// 拆分六字母货币对代码，例如 `USDTRY` -> (`USD`, `TRY`)。
///
/// # Logic
/// 允许带 `/` 的写法 (`USD/TRY`)，去掉分隔符后必须恰好为 6 个 ASCII 字母。
///
/// # Returns
/// 成功返回大写的 (基准货币, 计价货币)，否则返回 `SourceError::Unsupported`。
pub fn split_pair(code: &str) -> Result<(String, String), SourceError> {
    let compact: String = code.chars().filter(|c| *c != '/').collect();
    if compact.len() != 6 || !compact.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(SourceError::Unsupported(format!(
            "{} is not a six-letter currency pair",
            code
        )));
    }
    let upper = compact.to_ascii_uppercase();
    let (base, quote) = upper.split_at(3);
    Ok((base.to_string(), quote.to_string()))
}

/// # Summary
/// 由 EUR 基准汇率计算交叉汇率 `BASE/QUOTE = rate(QUOTE) / rate(BASE)`。
///
/// # Returns
/// 任一货币缺失或基准汇率非正时返回 None。
pub fn cross_rate(eur_rates: &HashMap<String, f64>, base: &str, quote: &str) -> Option<f64> {
    let lookup = |currency: &str| {
        if currency == ANCHOR {
            Some(1.0)
        } else {
            eur_rates.get(currency).copied()
        }
    };
    let base_rate = lookup(base)?;
    let quote_rate = lookup(quote)?;
    if base_rate <= 0.0 {
        return None;
    }
    Some(quote_rate / base_rate)
}

#[derive(Deserialize, Debug)]
struct RatesResponse {
    // 日期 -> (货币 -> EUR 汇率)
    #[serde(default)]
    rates: BTreeMap<String, HashMap<String, f64>>,
}

/// # Summary
/// Frankfurter 外汇历史数据源。
///
/// # Invariants
/// - 每次请求的日期跨度不超过 90 天。
/// - 每日只有一个价格，OHLC 取同一值，成交量为空。
/// - 结果中同一日期最多一条；上游把周末起点回退到前一交易日时，相邻分段会重叠。
/// - 相邻两次分段请求之间固定停顿 `page_pause`。
pub struct FrankfurterSource {
    client: Client,
    base_url: String,
    page_pause: Duration,
}

impl FrankfurterSource {
    pub fn new(config: &FeedConfig) -> Result<Self, SourceError> {
        Ok(Self::with_base_url(
            config.frankfurter_url.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )?
        .with_page_pause(Duration::from_millis(config.page_pause_ms)))
    }

    /// 指定上游地址创建数据源，默认分段之间不停顿。
    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(timeout, false)?,
            base_url,
            page_pause: Duration::ZERO,
        })
    }

    pub fn with_page_pause(mut self, pause: Duration) -> Self {
        self.page_pause = pause;
        self
    }

    async fn fetch_chunk(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        targets: &str,
    ) -> Result<RatesResponse, SourceError> {
        let url = join_url(&self.base_url, &format!("{}..{}", start, end));
        let mut query = vec![("from", ANCHOR.to_string())];
        if !targets.is_empty() {
            query.push(("to", targets.to_string()));
        }

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(request_error)?;
        decode_json(resp).await
    }
}

#[async_trait]
impl HistorySource for FrankfurterSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    /// # Summary
    /// 按 90 天分段拉取 EUR 基准汇率并换算为货币对的交叉汇率。
    ///
    /// # Logic
    /// 1. 拆分货币对，去掉 EUR 后得到需要请求的货币列表。
    /// 2. 窗口按自然日切分为不超过 90 天的闭区间，逐段请求。
    /// 3. 单段失败只记录日志并跳过；全部分段失败时返回最后一个错误。
    /// 4. 按日期去重后按日期升序返回。
    async fn fetch_history(
        &self,
        asset: &AssetRecord,
        window: &DateWindow,
    ) -> Result<Vec<HistoricalPrice>, SourceError> {
        let (base, quote) = split_pair(&asset.code)?;

        let mut currencies: Vec<&str> = [base.as_str(), quote.as_str()]
            .into_iter()
            .filter(|c| *c != ANCHOR)
            .collect();
        currencies.dedup();
        let targets = currencies.join(",");

        let chunks = window.day_chunks(MAX_CHUNK_DAYS);
        let mut by_date: BTreeMap<NaiveDate, HistoricalPrice> = BTreeMap::new();
        let mut failed = 0usize;
        let mut last_err = None;

        for (index, (start, end)) in chunks.iter().enumerate() {
            if index > 0 && !self.page_pause.is_zero() {
                tokio::time::sleep(self.page_pause).await;
            }
            debug!(pair = %asset.code, start = %start, end = %end, "Fetching Frankfurter chunk");
            let table = match self.fetch_chunk(*start, *end, &targets).await {
                Ok(table) => table,
                Err(e) => {
                    warn!(pair = %asset.code, start = %start, end = %end, error = %e, "Frankfurter chunk failed, skipping");
                    failed += 1;
                    last_err = Some(e);
                    continue;
                }
            };

            for (day, rates) in &table.rates {
                let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") else {
                    warn!(pair = %asset.code, day = %day, "Skipping unparseable date");
                    continue;
                };
                if let Some(rate) = cross_rate(rates, &base, &quote) {
                    by_date.insert(
                        date,
                        HistoricalPrice::flat(
                            asset.code.clone(),
                            date,
                            rate,
                            asset.category,
                            PROVIDER,
                        ),
                    );
                }
            }
        }

        if let Some(e) = last_err.filter(|_| failed == chunks.len()) {
            return Err(e);
        }

        Ok(by_date.into_values().collect())
    }
}
