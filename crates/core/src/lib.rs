//! # 任务服务核心库
//!
//! 定义任务服务各组件共享的基础设施无关部分：
//!
//! - [`errors`] - 统一错误类型 [`TaskServiceError`]
//! - [`models`] - 任务实体、通知消息与请求/响应DTO
//! - [`traits`] - 记录存储、通知通道与任务服务的抽象接口
//! - [`config`] - 分层配置加载与校验
//! - [`logging`] - 显式构造的日志组件（初始化 → 使用 → 关闭时刷新）
//!
//! 具体实现（PostgreSQL、RabbitMQ、内存实现）位于 `task-service-infrastructure`，
//! 编排逻辑位于 `task-service-orchestrator`。

pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod traits;

pub use errors::*;
pub use models::{
    CreateTaskRequest, NewTask, Notification, Task, TaskListResponse, TaskResponse, TaskStatus,
    UpdateTaskRequest,
};
pub use traits::{
    NotificationChannel, NotificationHandler, TaskService, TaskStore, TaskTransaction,
    TransactionState,
};
