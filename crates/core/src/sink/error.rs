use thiserror::Error;

/// # Summary
/// 写入端错误枚举，处理后端连接、拒绝写入等问题。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug)]
pub enum SinkError {
    /// 网络或传输失败
    #[error("Network error: {0}")]
    Network(String),
    /// 后端拒绝请求 (非 2xx)
    #[error("Backend rejected request with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    /// 记录无法序列化或缺少冲突键字段
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// 响应无法解析
    #[error("Parse error: {0}")]
    Parse(String),
}
