use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Arg, Command};
use task_service::app::Application;
use task_service::shutdown::{self, ShutdownManager};
use task_service_core::config::{AppConfig, LogFormat};
use task_service_core::logging;
use tracing::{error, info, warn};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("task-service")
        .version(env!("CARGO_PKG_VERSION"))
        .about("任务服务：事务写入、异步通知与状态对账")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径（缺省时依次查找默认位置）"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别，覆盖配置文件"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("控制台日志格式，覆盖配置文件")
                .value_parser(["json", "pretty"]),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").map(String::as_str);
    let mut config = AppConfig::load(config_path).context("加载配置失败")?;

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }
    if let Some(format) = matches.get_one::<String>("log-format") {
        config.logging.format = format.parse::<LogFormat>().map_err(|e| anyhow!(e))?;
    }

    let guard = logging::init(&config.logging).context("初始化日志系统失败")?;
    info!("启动任务服务");
    info!("日志目录: {}", guard.log_dir().display());

    let app = Arc::new(Application::new(config).await?);
    let shutdown_manager = ShutdownManager::new();

    let mut app_handle = {
        let app = Arc::clone(&app);
        let shutdown_rx = shutdown_manager.subscribe().await;
        tokio::spawn(async move { app.run(shutdown_rx).await })
    };
    let abort_handle = app_handle.abort_handle();

    let server_exited = tokio::select! {
        _ = shutdown::wait_for_signal() => {
            info!("收到关闭信号，开始优雅关闭...");
            false
        }
        result = &mut app_handle => {
            log_server_exit(result);
            true
        }
    };

    shutdown_manager.shutdown().await;

    let graceful = async {
        if !server_exited {
            log_server_exit(app_handle.await);
        }
        app.shutdown().await;
    };
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, graceful).await.is_err() {
        warn!("应用关闭超时，强制退出");
        abort_handle.abort();
    }

    info!("任务服务已退出");
    guard.flush();
    Ok(())
}

fn log_server_exit(result: std::result::Result<Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => info!("API服务器已退出"),
        Ok(Err(e)) => error!("应用运行失败: {e:#}"),
        Err(e) => error!("应用任务异常退出: {e}"),
    }
}
