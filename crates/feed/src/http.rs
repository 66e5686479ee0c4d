use invsim_core::source::error::SourceError;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::error::Error as StdError;
use std::time::Duration;
use tracing::debug;

/// 伪装浏览器 User-Agent，部分上游会拒绝默认的客户端标识。
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// # Summary
/// 安装进程级 rustls 加密后端 (ring)。
///
/// # Logic
/// reqwest 以 `rustls-no-provider` 编译，构建客户端前必须存在默认 provider。
/// 重复安装会返回错误，此时说明已安装，忽略即可。
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

/// # Summary
/// 构建所有适配器共用的 HTTP 客户端。
///
/// # Logic
/// 1. 确保 rustls provider 已安装。
/// 2. 设置固定超时、浏览器 User-Agent 与 JSON Accept 头。
/// 3. `accept_invalid_certs` 为真时跳过证书校验 (仅用于 TLS 失败后的重试)。
///
/// # Arguments
/// * `timeout`: 单次请求超时。
/// * `accept_invalid_certs`: 是否跳过证书校验。
///
/// # Returns
/// 成功返回客户端，失败返回 `SourceError::Network`。
pub fn build_client(timeout: Duration, accept_invalid_certs: bool) -> Result<Client, SourceError> {
    install_crypto_provider();

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(|e| SourceError::Network(format!("failed to build HTTP client: {}", e)))
}

/// # Summary
/// 将请求阶段的 reqwest 错误归类为 `SourceError`。
///
/// # Logic
/// 沿错误链查找 TLS 失败，命中则归为 `Tls`，否则归为 `Network`。
pub fn request_error(err: reqwest::Error) -> SourceError {
    if is_tls_failure(&err) {
        SourceError::Tls(err.to_string())
    } else {
        SourceError::Network(err.to_string())
    }
}

/// # Summary
/// 判断错误链中是否包含 TLS 握手或证书校验失败。
///
/// # Logic
/// 1. 逐级遍历 `source()`。
/// 2. 直接是 `rustls::Error`，或 `io::Error` 内部包裹了 `rustls::Error`，视为 TLS 失败。
/// 3. 其它层级的错误消息中出现证书相关字样时同样视为 TLS 失败。
pub fn is_tls_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if e.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        let wraps_rustls = e
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
            .is_some_and(|inner| inner.downcast_ref::<rustls::Error>().is_some());
        if wraps_rustls {
            return true;
        }
        let message = e.to_string().to_ascii_lowercase();
        if message.contains("certificate") || message.contains("tls handshake") {
            return true;
        }
        current = e.source();
    }
    false
}

/// # Summary
/// 校验响应状态码并解析 JSON 主体。
///
/// # Returns
/// 非 2xx 返回 `SourceError::Status`，主体无法解析返回 `SourceError::Parse`。
pub async fn decode_json<T: DeserializeOwned>(resp: Response) -> Result<T, SourceError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: resp.url().to_string(),
        });
    }
    resp.json::<T>()
        .await
        .map_err(|e| SourceError::Parse(e.to_string()))
}

/// 拼接基础地址与路径，去掉多余的斜杠。
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_normalizes_slashes() {
        assert_eq!(
            join_url("https://api.binance.com/", "/api/v3/exchangeInfo"),
            "https://api.binance.com/api/v3/exchangeInfo"
        );
        assert_eq!(join_url("http://127.0.0.1:9", "scan"), "http://127.0.0.1:9/scan");
    }

    #[test]
    fn test_tls_failure_detected_through_io_wrapper() {
        let inner = rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer);
        let wrapped = std::io::Error::other(inner);
        assert!(is_tls_failure(&wrapped));
    }

    #[test]
    fn test_plain_io_error_is_not_tls() {
        let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        assert!(!is_tls_failure(&err));
    }
}
