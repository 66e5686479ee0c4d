use thiserror::Error;

/// # Summary
/// 数据源域错误枚举，处理网络、解析及数据缺失等问题。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 任何变体都不应导致整个任务中止，由任务层记录后按“无数据”处理。
#[derive(Error, Debug)]
pub enum SourceError {
    // 网络层错误，包含底层 HTTP 客户端错误信息
    #[error("Network error: {0}")]
    Network(String),
    // TLS 握手或证书校验失败
    #[error("TLS error: {0}")]
    Tls(String),
    // 上游返回非成功状态码
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    // 数据解析错误，如 JSON 格式不匹配或缺少预期字段
    #[error("Parse error: {0}")]
    Parse(String),
    // 请求的数据未找到 (空结果)
    #[error("Data not found")]
    NotFound,
    // 资产不被该数据源支持
    #[error("Unsupported asset: {0}")]
    Unsupported(String),
}
