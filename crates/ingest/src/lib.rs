//! 批量写入流水线：分批、写入端调用、失败兜底，以及种子/回填任务。

pub mod batch;
pub mod job;
pub mod report;
pub mod writer;
