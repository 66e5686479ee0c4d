use crate::row::asset_from_row;
use async_trait::async_trait;
use invsim_core::asset::entity::AssetRecord;
use invsim_core::common::AssetCategory;
use invsim_core::config::BackendConfig;
use invsim_core::sink::error::SinkError;
use invsim_core::sink::port::UpsertSink;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

// 冲突时合并更新，且不回传写入的行
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=minimal";
const ASSET_COLUMNS: &str = "code,name,symbol,category,provider,is_websocket,websocket_provider";

/// # Summary
/// 托管后端 REST 表接口 (PostgREST 风格) 的写入端。
///
/// # Invariants
/// - 每次请求都携带 `apikey` 与 `Authorization: Bearer` 两个凭据头。
/// - 密钥不会出现在日志或错误信息中。
pub struct RestSink {
    client: Client,
    base_url: String,
    service_key: String,
}

impl RestSink {
    /// # Summary
    /// 按后端配置创建写入端。
    ///
    /// # Logic
    /// 1. 安装 rustls 加密后端 (已安装则跳过)。
    /// 2. 以配置的超时构建 HTTP 客户端。
    ///
    /// # Arguments
    /// * `config`: 后端地址、服务密钥与超时。
    ///
    /// # Returns
    /// 成功返回写入端，客户端构建失败返回 `SinkError::Network`。
    pub fn new(config: &BackendConfig) -> Result<Self, SinkError> {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            debug!("rustls crypto provider already installed");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SinkError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// 非 2xx 响应转换为 `SinkError::Rejected`，并带上后端返回的错误主体。
    async fn ensure_success(resp: Response) -> Result<Response, SinkError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl UpsertSink for RestSink {
    /// # Summary
    /// 以一次 POST 批量写入整批记录。
    ///
    /// # Logic
    /// 1. 空批次直接返回 0，不发请求。
    /// 2. `POST /rest/v1/{table}?on_conflict={cols}`，声明合并更新。
    /// 3. 非 2xx 视为整批失败。
    async fn upsert(
        &self,
        table: &str,
        on_conflict: &str,
        rows: &[Value],
    ) -> Result<usize, SinkError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let request = self
            .client
            .post(self.table_url(table))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", PREFER_UPSERT)
            .json(rows);

        let resp = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;
        Self::ensure_success(resp).await?;

        debug!(table, rows = rows.len(), "Upserted batch");
        Ok(rows.len())
    }

    /// # Summary
    /// 读取指定分类的资产。
    ///
    /// # Logic
    /// 1. `GET /rest/v1/assets?select=...&category=in.(a,b)`，分类为空时不加过滤。
    /// 2. 无法识别的行 (例如未知分类) 记录日志后跳过。
    async fn select_assets(
        &self,
        categories: &[AssetCategory],
    ) -> Result<Vec<AssetRecord>, SinkError> {
        let mut query = vec![
            ("select", ASSET_COLUMNS.to_string()),
            ("order", "code.asc".to_string()),
        ];
        if !categories.is_empty() {
            let list: Vec<&str> = categories.iter().map(AssetCategory::as_str).collect();
            query.push(("category", format!("in.({})", list.join(","))));
        }

        let request = self.client.get(self.table_url("assets")).query(&query);
        let resp = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;
        let rows: Vec<Value> = Self::ensure_success(resp)
            .await?
            .json()
            .await
            .map_err(|e| SinkError::Parse(e.to_string()))?;

        let total = rows.len();
        let assets: Vec<AssetRecord> = rows.iter().filter_map(asset_from_row).collect();
        if assets.len() < total {
            warn!(
                skipped = total - assets.len(),
                "Skipped asset rows that could not be parsed"
            );
        }
        Ok(assets)
    }
}
