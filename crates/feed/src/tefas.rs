use crate::http::{build_client, decode_json, join_url, request_error};
use async_trait::async_trait;
use invsim_core::asset::entity::AssetRecord;
use invsim_core::common::AssetCategory;
use invsim_core::common::time::TimeProvider;
use invsim_core::config::FeedConfig;
use invsim_core::source::error::SourceError;
use invsim_core::source::port::AssetSource;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const PROVIDER: &str = "tefas";

fn first_str<'a>(fund: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| fund.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// # Summary
/// 将 TEFAS 返回的基金列表转换为资产记录。
///
/// # Logic
/// 1. 响应可能是数组，也可能是 `{ "data": [...] }`。
/// 2. 代码取 `FONKODU` / `fonKodu` / `code`，名称取 `FONUNVAN` / `fonUnvan` / `name`，缺失时用代码。
/// 3. 没有代码的条目丢弃。
pub fn parse_funds(body: &Value) -> Vec<AssetRecord> {
    let funds = match body {
        Value::Array(items) => items.as_slice(),
        other => other
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
    };

    funds
        .iter()
        .filter_map(|fund| {
            let code = first_str(fund, &["FONKODU", "fonKodu", "code"])?;
            let name = first_str(fund, &["FONUNVAN", "fonUnvan", "name"]).unwrap_or(code);
            Some(AssetRecord::new(code, name, AssetCategory::Fund, PROVIDER))
        })
        .collect()
}

/// # Summary
/// TEFAS (Takasbank) 投资基金清单数据源。
///
/// # Invariants
/// - 查询日期取注入时钟的当天 (UTC)，起止日相同。
pub struct TefasSource {
    client: Client,
    base_url: String,
    clock: Arc<dyn TimeProvider>,
}

impl TefasSource {
    pub fn new(config: &FeedConfig, clock: Arc<dyn TimeProvider>) -> Result<Self, SourceError> {
        Self::with_base_url(
            config.tefas_url.clone(),
            Duration::from_secs(config.http_timeout_secs),
            clock,
        )
    }

    pub fn with_base_url(
        base_url: String,
        timeout: Duration,
        clock: Arc<dyn TimeProvider>,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(timeout, false)?,
            base_url,
            clock,
        })
    }
}

#[async_trait]
impl AssetSource for TefasSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_assets(&self) -> Result<Vec<AssetRecord>, SourceError> {
        let today = self.clock.now().date_naive().to_string();
        let url = join_url(&self.base_url, "api/DB/BindHistoryInfo");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("fontip", "YAT"),
                ("bastarih", today.as_str()),
                ("bittarih", today.as_str()),
                ("fonkod", ""),
                ("fongrubu", ""),
            ])
            .send()
            .await
            .map_err(request_error)?;
        let body: Value = decode_json(resp).await?;

        let funds = parse_funds(&body);
        if funds.is_empty() {
            return Err(SourceError::NotFound);
        }
        info!(date = %today, count = funds.len(), "Fetched TEFAS funds");
        Ok(funds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_funds_accepts_both_shapes() {
        let bare = json!([
            {"FONKODU": "AAK", "FONUNVAN": "ATA PORTFÖY ÇOKLU VARLIK DEĞİŞKEN FON"},
            {"fonKodu": "TCD", "fonUnvan": "TACİRLER PORTFÖY DEĞİŞKEN FON"},
            {"FONUNVAN": "NO CODE"}
        ]);
        let wrapped = json!({"data": [{"code": "IPB"}]});

        let funds = parse_funds(&bare);
        assert_eq!(funds.len(), 2);
        assert_eq!(funds[0].code, "AAK");
        assert_eq!(funds[1].name, "TACİRLER PORTFÖY DEĞİŞKEN FON");
        assert!(!funds[0].is_websocket);

        let funds = parse_funds(&wrapped);
        assert_eq!(funds.len(), 1);
        assert_eq!(funds[0].name, "IPB");
        assert_eq!(funds[0].category, AssetCategory::Fund);
    }

    #[test]
    fn test_parse_funds_unknown_shape_is_empty() {
        assert!(parse_funds(&json!({"error": "maintenance"})).is_empty());
    }
}
