//! 任务服务HTTP接口
//!
//! 路由、处理函数与错误到状态码的映射。处理函数只依赖
//! [`TaskService`](task_service_core::TaskService) 抽象。

pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::{create_routes, AppState};
