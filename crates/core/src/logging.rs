//! 日志组件
//!
//! 由调用方显式构造：启动时 [`init`] 安装全局订阅者并返回 [`LoggingGuard`]，
//! 关闭时调用 [`LoggingGuard::flush`] 把缓冲中的日志写入文件。
//!
//! 文件输出为按天滚动的JSON行，可选地同时输出到标准输出（json 或 pretty）。
//! `RUST_LOG` 存在时覆盖配置中的级别。

use std::path::{Path, PathBuf};

use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::{Result, TaskServiceError};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// 持有后台写线程，释放时刷新剩余日志
#[must_use = "dropping the guard stops the background log writer"]
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    log_dir: PathBuf,
}

impl LoggingGuard {
    /// 日志文件所在目录
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Flush buffered records and stop the writer
    pub fn flush(self) {
        drop(self);
    }
}

/// 解析日志级别，大小写不敏感
///
/// `warning` 等价于 `warn`，`fatal`/`panic` 归入 `error`，无法识别时回退到 `debug`。
pub fn parse_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" | "fatal" | "panic" => Level::ERROR,
        _ => Level::DEBUG,
    }
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

/// 初始化全局日志订阅者
///
/// 同一进程内只能成功一次，重复调用返回配置错误。
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let config = config.clone().with_defaults();
    let level = parse_level(&config.level);
    let log_dir = PathBuf::from(&config.dir);

    std::fs::create_dir_all(&log_dir).map_err(|e| {
        TaskServiceError::Configuration(format!(
            "创建日志目录失败 {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.filename)
        .max_log_files(config.max_files)
        .build(&log_dir)
        .map_err(|e| TaskServiceError::Configuration(format!("创建日志文件失败: {e}")))?;
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let mut layers: Vec<BoxedLayer> = Vec::new();
    layers.push(
        fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_target(true)
            .with_current_span(true)
            .with_filter(env_filter(level))
            .boxed(),
    );

    if config.duplicate_to_stdout {
        let stdout_layer = match config.format {
            LogFormat::Json => fmt::layer()
                .json()
                .with_target(true)
                .with_filter(env_filter(level))
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .pretty()
                .with_target(true)
                .with_filter(env_filter(level))
                .boxed(),
        };
        layers.push(stdout_layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| TaskServiceError::Configuration(format!("初始化日志订阅者失败: {e}")))?;

    tracing::info!(
        service = %config.service_name,
        level = %level,
        dir = %log_dir.display(),
        "logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_dir,
    })
}

/// 组件级 span，组件内的日志都会带上 `component` 字段
pub fn component_span(component: &'static str) -> tracing::Span {
    tracing::info_span!("component", component = component)
}
