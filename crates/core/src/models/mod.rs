//! # 数据模型
//!
//! - [`Task`] - 唯一的持久化实体
//! - [`Notification`] - 创建后发布到通知通道的瞬时消息，只携带任务ID
//! - DTO - HTTP层与编排器之间传递的请求/响应结构
//!
//! ## 任务状态流转
//!
//! ```text
//! (create) → created → done
//!               ↑        │
//!               └────────┘  (update 可以整体替换状态)
//! ```

pub mod dto;
pub mod notification;
pub mod task;

pub use dto::*;
pub use notification::*;
pub use task::*;
