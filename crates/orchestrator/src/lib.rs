//! 任务编排
//!
//! [`TaskOrchestrator`] 是 [`TaskService`](task_service_core::TaskService) 的实现，
//! 只依赖记录存储与通知通道两个抽象。

pub mod orchestrator;

pub use orchestrator::TaskOrchestrator;
