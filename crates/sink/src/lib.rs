//! 写入端实现：托管后端的 REST 表接口，以及用于试运行和测试的内存表。

pub mod memory;
pub mod rest;
mod row;
