use config::{Config, Environment, File};
use invsim_core::config::AppConfig;
use std::path::Path;

/// 未指定 `--config` 时尝试读取的文件 (扩展名由 config crate 推断)。
pub const DEFAULT_CONFIG_FILE: &str = "config/invsim";

pub const ENV_BACKEND_URL: &str = "SUPABASE_URL";
pub const ENV_BACKEND_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// # Summary
/// 加载应用配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 为底。
/// 2. 叠加配置文件：显式路径必须存在，默认路径可缺省。
/// 3. 叠加 `INVSIM__SECTION__KEY` 环境变量。
/// 4. 用 `SUPABASE_URL` / `SUPABASE_SERVICE_ROLE_KEY` 覆盖后端凭据。
///
/// # Arguments
/// * `path`: `--config` 指定的文件路径。
///
/// # Returns
/// 合并后的配置，尚未校验。
pub fn load(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let env = Environment::with_prefix("INVSIM")
        .separator("__")
        .try_parsing(true);
    let config = build(path, env)?;
    Ok(apply_secrets(config, |key| std::env::var(key).ok()))
}

fn build(path: Option<&Path>, env: Environment) -> Result<AppConfig, config::ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    Config::builder()
        .add_source(file)
        .add_source(env)
        .build()?
        .try_deserialize()
}

/// 凭据只从外部注入；空值不覆盖已有配置。
fn apply_secrets(mut config: AppConfig, lookup: impl Fn(&str) -> Option<String>) -> AppConfig {
    if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
        config.backend.url = url;
    }
    if let Some(key) = lookup(ENV_BACKEND_KEY).filter(|v| !v.trim().is_empty()) {
        config.backend.service_key = key;
    }
    config
}

/// `--batch-size` 同时覆盖资产与价格的批大小。
pub fn apply_batch_size(config: &mut AppConfig, batch_size: Option<usize>) {
    if let Some(size) = batch_size {
        config.ingest.asset_batch_size = size;
        config.ingest.history_batch_size = size;
    }
}
