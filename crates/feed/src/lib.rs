//! 上游数据源适配器。
//!
//! 每个模块负责一个外部接口：发起请求、过滤无效条目，并把响应归一化为
//! `invsim_core` 中的 `AssetRecord` / `HistoricalPrice`。适配器本身不写入任何存储。

pub mod binance;
pub mod catalog;
pub mod fallback;
pub mod frankfurter;
pub mod http;
pub mod tefas;
pub mod tradingview;
pub mod yahoo;
