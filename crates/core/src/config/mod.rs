//! 分层配置
//!
//! 加载顺序：内置默认值 → TOML配置文件 → `TASK_SERVICE_` 前缀的环境变量，
//! 每个配置段在加载后各自校验。

pub mod models;

pub use models::{
    ApiConfig, AppConfig, DatabaseConfig, LogFormat, LoggingConfig, NotificationChannelType,
    NotificationConfig, WorkerConfig, ENV_PREFIX,
};
