//! 任务服务基础设施
//!
//! [`TaskStore`](task_service_core::TaskStore) 与
//! [`NotificationChannel`](task_service_core::NotificationChannel) 的具体实现：
//! PostgreSQL/内存存储，RabbitMQ/内存通知通道。

pub mod database;
pub mod in_memory_queue;
pub mod message_queue;
pub mod message_queue_factory;
pub mod timeout_handler;

pub use database::*;
pub use in_memory_queue::InMemoryNotificationChannel;
pub use message_queue::RabbitMqNotificationChannel;
pub use message_queue_factory::NotificationChannelFactory;
pub use timeout_handler::{TimeoutConfig, TimeoutHandler};
