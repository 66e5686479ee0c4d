//! # `invsim-core` - 领域核心
//!
//! 资产元数据与历史价格的实体、数据源 / 写入端的端口 (Port) 定义，
//! 以及各领域的错误类型与全局配置。本 crate 不包含任何网络实现。

pub mod asset;
pub mod common;
pub mod config;
pub mod sink;
pub mod source;
