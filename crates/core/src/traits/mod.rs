pub mod notification_channel;
pub mod task_service;
pub mod task_store;

pub use notification_channel::*;
pub use task_service::*;
pub use task_store::*;
