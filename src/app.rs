use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use task_service_api::{create_routes, AppState};
use task_service_core::{config::AppConfig, NotificationChannel, TaskService, TaskStore};
use task_service_infrastructure::{
    DatabaseManager, NotificationChannelFactory, PgTaskStore, TimeoutHandler,
};
use task_service_orchestrator::TaskOrchestrator;
use task_service_worker::ReconciliationWorker;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info};

/// 应用装配：存储 → 通知通道 → 编排器 → 对账worker → HTTP服务
pub struct Application {
    config: AppConfig,
    service: Arc<dyn TaskService>,
    channel: Arc<dyn NotificationChannel>,
    worker: Option<Arc<ReconciliationWorker>>,
    database: Option<DatabaseManager>,
}

impl Application {
    /// 连接PostgreSQL与通知通道并构建各组件
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("连接数据库: {}", mask_url(&config.database.url));
        let database = DatabaseManager::connect(&config.database)
            .await
            .context("连接数据库失败")?;
        database
            .health_check()
            .await
            .context("数据库健康检查失败")?;

        let timeouts = TimeoutHandler::with_database_timeout(Duration::from_secs(
            config.database.query_timeout_seconds,
        ));
        let store: Arc<dyn TaskStore> = Arc::new(PgTaskStore::new(database.pool().clone(), timeouts));

        info!(
            "连接通知通道: {:?} {}",
            config.notification.r#type,
            mask_url(&config.notification.url)
        );
        let channel = NotificationChannelFactory::create(&config.notification)
            .await
            .context("创建通知通道失败")?;

        let mut app = Self::from_parts(config, store, channel);
        app.database = Some(database);
        Ok(app)
    }

    /// 使用给定的存储和通道构建应用
    pub fn from_parts(
        config: AppConfig,
        store: Arc<dyn TaskStore>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        let service: Arc<dyn TaskService> =
            Arc::new(TaskOrchestrator::new(store, Arc::clone(&channel)));

        let worker = config.worker.enabled.then(|| {
            Arc::new(ReconciliationWorker::new(
                Arc::clone(&service),
                Arc::clone(&channel),
                &config.worker,
            ))
        });

        Self {
            config,
            service,
            channel,
            worker,
            database: None,
        }
    }

    pub fn service(&self) -> Arc<dyn TaskService> {
        Arc::clone(&self.service)
    }

    /// 在配置的地址上启动服务，直到收到关闭信号
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let bind_address = &self.config.api.bind_address;
        let listener = TcpListener::bind(bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {bind_address}"))?;

        self.serve(listener, shutdown_rx).await
    }

    /// 启动对账worker并在给定的监听器上提供HTTP服务
    pub async fn serve(
        &self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        match &self.worker {
            Some(worker) => {
                worker.process_tasks();
            }
            None => info!("对账worker已禁用"),
        }

        let state = AppState::new(
            Arc::clone(&self.service),
            Duration::from_secs(self.config.api.request_timeout_seconds),
        );
        let router = create_routes(state);

        info!("API服务器监听: {}", listener.local_addr()?);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API服务器收到关闭信号");
            })
            .await
            .context("API服务器运行失败")?;

        info!("API服务器已停止");
        Ok(())
    }

    /// 关闭通知通道、工作池和数据库连接池
    ///
    /// 通道关闭失败只记录日志，其余资源照常释放。
    pub async fn shutdown(&self) {
        if let Err(e) = self.channel.close().await {
            error!("关闭通知通道失败: {e}");
        }

        if let Some(worker) = &self.worker {
            worker.shutdown().await;
        }

        if let Some(database) = &self.database {
            database.close().await;
        }

        info!("应用资源已释放");
    }
}

/// 屏蔽URL中的密码
fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if url[colon_pos..].starts_with("://") {
                return url.to_string();
            }
            let mut masked = url.to_string();
            masked.replace_range(colon_pos + 1..at_pos, "***");
            return masked;
        }
    }
    url.to_string()
}
