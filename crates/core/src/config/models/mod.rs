pub mod api_worker;
pub mod app_config;
pub mod database;
pub mod logging;
pub mod notification;

// Re-export main types for easier imports
pub use api_worker::{ApiConfig, WorkerConfig};
pub use app_config::{AppConfig, ENV_PREFIX};
pub use database::DatabaseConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use notification::{NotificationChannelType, NotificationConfig};
