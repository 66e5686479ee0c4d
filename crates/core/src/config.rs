use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub ingest: IngestConfig,
    pub feeds: FeedConfig,
    pub logging: LoggingConfig,
}

/// 托管后端 (REST 表接口) 连接配置。
///
/// # Invariants
/// - `service_key` 只能来自外部注入 (环境变量或配置文件)，源码中不提供默认值。
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub service_key: String,
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field(
                "service_key",
                &if self.service_key.is_empty() { "<unset>" } else { "<redacted>" },
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// 批量写入与限速配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    // 资产清单每批条数
    pub asset_batch_size: usize,
    // 历史价格每批条数
    pub history_batch_size: usize,
    // 每批写入后的停顿 (毫秒)
    pub batch_pause_ms: u64,
    // 回填任务两次上游请求之间的停顿 (毫秒)
    pub request_pause_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            asset_batch_size: 100,
            history_batch_size: 1000,
            batch_pause_ms: 100,
            request_pause_ms: 500,
        }
    }
}

/// 上游数据源地址与 HTTP 行为配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub http_timeout_secs: u64,
    pub binance_url: String,
    pub binance_mirror_url: String,
    // TLS 失败时是否允许跳过证书校验重试一次
    pub binance_insecure_retry: bool,
    // 同一资产分段 / 翻页请求之间的停顿 (毫秒)
    pub page_pause_ms: u64,
    pub yahoo_url: String,
    pub frankfurter_url: String,
    pub tradingview_url: String,
    pub tefas_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: 10,
            binance_url: "https://api.binance.com".to_string(),
            binance_mirror_url: "https://data-api.binance.vision".to_string(),
            binance_insecure_retry: true,
            page_pause_ms: 100,
            yahoo_url: "https://query1.finance.yahoo.com".to_string(),
            frankfurter_url: "https://api.frankfurter.app".to_string(),
            tradingview_url: "https://scanner.tradingview.com".to_string(),
            tefas_url: "https://www.tefas.gov.tr".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    // 设置后额外写入按天滚动的日志文件
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
        }
    }
}

/// # Summary
/// 配置错误枚举。
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 缺少必须由外部注入的密钥或地址
    #[error("Missing required setting `{0}` (set it in the environment)")]
    MissingSecret(&'static str),
    /// 取值非法
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// # Summary
    /// 校验配置的完整性。
    ///
    /// # Logic
    /// 1. 批量大小必须大于 0。
    /// 2. 需要真实后端时，`backend.url` 与 `backend.service_key` 必须非空。
    ///
    /// # Arguments
    /// * `require_backend`: 是否要求后端凭据 (dry-run 时为 false)。
    ///
    /// # Returns
    /// 合法返回 Ok，否则返回 `ConfigError`。
    pub fn validate(&self, require_backend: bool) -> Result<(), ConfigError> {
        if self.ingest.asset_batch_size == 0 || self.ingest.history_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "batch sizes must be greater than zero".to_string(),
            ));
        }
        if require_backend {
            if self.backend.url.trim().is_empty() {
                return Err(ConfigError::MissingSecret("SUPABASE_URL"));
            }
            if self.backend.service_key.trim().is_empty() {
                return Err(ConfigError::MissingSecret("SUPABASE_SERVICE_ROLE_KEY"));
            }
        }
        Ok(())
    }
}
