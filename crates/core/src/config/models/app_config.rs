use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    api_worker::{ApiConfig, WorkerConfig},
    database::DatabaseConfig,
    logging::LoggingConfig,
    notification::NotificationConfig,
};

/// 环境变量前缀，嵌套字段用双下划线分隔，例如 `TASK_SERVICE_WORKER__POOL_SIZE`
pub const ENV_PREFIX: &str = "TASK_SERVICE";

const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/task-service.toml",
    "task-service.toml",
    "/etc/task-service/config.toml",
];

/// Service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub notification: NotificationConfig,
    pub api: ApiConfig,
    pub worker: WorkerConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: TASK_SERVICE_)
    ///
    /// 显式指定的配置文件不存在时返回错误；未指定时依次尝试默认路径，均不存在则仅使用默认值。
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_with_env(config_path, None)
    }

    /// 与 [`AppConfig::load`] 相同，但环境变量来源可替换
    ///
    /// `env` 为 `None` 时读取进程环境变量。
    pub fn load_with_env(
        config_path: Option<&str>,
        env: Option<Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = ConfigBuilder::builder().add_source(
            ConfigBuilder::try_from(&AppConfig::default()).context("构建默认配置失败")?,
        );

        // 1. Load config file if provided
        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        // 2. Environment variable overrides - highest priority
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        let config = config.normalized();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;
        let config = config.normalized();

        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    /// Validate configuration effectiveness
    pub fn validate(&self) -> Result<()> {
        self.database.validate().context("数据库配置验证失败")?;

        self.notification
            .validate()
            .context("通知通道配置验证失败")?;

        self.api.validate().context("API配置验证失败")?;

        self.worker.validate().context("Worker配置验证失败")?;

        self.logging.validate().context("日志配置验证失败")?;

        Ok(())
    }

    fn normalized(mut self) -> Self {
        self.logging = self.logging.with_defaults();
        self
    }
}
