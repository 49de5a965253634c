use serde::{Deserialize, Serialize};

/// 控制台输出格式，文件输出始终为JSON
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!("Invalid log format: {s}. Valid formats: json, pretty")),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    pub filename: String,
    /// 无法识别的级别按 debug 处理
    pub level: String,
    pub format: LogFormat,
    /// 按天滚动后保留的文件数量
    pub max_files: usize,
    pub duplicate_to_stdout: bool,
    pub service_name: String,
}

impl LoggingConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_files == 0 {
            return Err(anyhow::anyhow!("日志保留文件数必须大于0"));
        }

        Ok(())
    }

    /// 用默认值补齐空字段
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();

        if self.dir.is_empty() {
            self.dir = defaults.dir;
        }

        if self.filename.is_empty() {
            self.filename = defaults.filename;
        }

        if self.level.is_empty() {
            self.level = defaults.level;
        }

        if self.service_name.is_empty() {
            self.service_name = defaults.service_name;
        }

        self
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            filename: "task-service.log".to_string(),
            level: "info".to_string(),
            format: LogFormat::default(),
            max_files: 10,
            duplicate_to_stdout: true,
            service_name: "task-service".to_string(),
        }
    }
}
