use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use task_service_core::{
    config::WorkerConfig,
    logging::component_span,
    models::{Notification, UpdateTaskRequest},
    traits::{NotificationChannel, NotificationHandler, TaskService},
    Result, TaskServiceError,
};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument, Span};

use crate::pool::WorkerPool;

/// 后台对账Worker
///
/// 订阅任务创建通知，把对应任务从 `created` 推进到 `done`。
/// 每条通知在工作池中执行并受处理超时约束；任何失败只记录日志，不重试。
/// 重复投递同一ID的结果相同。
pub struct ReconciliationWorker {
    service: Arc<dyn TaskService>,
    channel: Arc<dyn NotificationChannel>,
    pool: WorkerPool,
    process_timeout: Duration,
    span: Span,
}

impl ReconciliationWorker {
    pub fn new(
        service: Arc<dyn TaskService>,
        channel: Arc<dyn NotificationChannel>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            service,
            channel,
            pool: WorkerPool::new(config.pool_size, config.queue_capacity),
            process_timeout: Duration::from_secs(config.process_timeout_seconds),
            span: component_span("reconciliation_worker"),
        }
    }

    /// 在后台启动订阅，立即返回
    ///
    /// 订阅失败只记录日志。
    pub fn process_tasks(self: &Arc<Self>) -> JoinHandle<()> {
        let worker = Arc::clone(self);
        let span = self.span.clone();

        tokio::spawn(
            async move {
                let handler: Arc<dyn NotificationHandler> = worker.clone();
                match worker.channel.subscribe(handler).await {
                    Ok(()) => info!(
                        "Reconciliation worker subscribed ({} pool workers)",
                        worker.pool.size()
                    ),
                    Err(e) => error!("订阅任务通知失败: {}", e),
                }
            }
            .instrument(span),
        )
    }

    /// 停止工作池，等待已提交的对账完成
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

/// 处理单条通知，返回被推进的任务ID
async fn reconcile(service: &dyn TaskService, payload: &[u8]) -> Result<i64> {
    let notification = Notification::decode(payload)?;
    let task = service.get(notification.task_id).await?;

    let id = task.id;
    service.update(UpdateTaskRequest::mark_done(task)).await?;
    Ok(id)
}

#[async_trait]
impl NotificationHandler for ReconciliationWorker {
    async fn handle(&self, payload: &[u8]) {
        let service = Arc::clone(&self.service);
        let payload = payload.to_vec();
        let process_timeout = self.process_timeout;

        let job = async move {
            match tokio::time::timeout(process_timeout, reconcile(service.as_ref(), &payload)).await
            {
                Ok(Ok(id)) => info!("任务 {} 已推进到 done", id),
                Ok(Err(TaskServiceError::Serialization(e))) => {
                    warn!("丢弃格式错误的通知: {}", e)
                }
                Ok(Err(e)) if e.is_not_found() => warn!("通知对应的任务不存在: {}", e),
                Ok(Err(e)) => error!("处理通知失败: {}", e),
                Err(_) => error!("处理通知超时 ({:?})", process_timeout),
            }
        }
        .instrument(self.span.clone());

        if let Err(e) = self.pool.run(job).await {
            warn!("对账任务未能执行: {}", e);
        }
        debug!("notification handled");
    }
}
