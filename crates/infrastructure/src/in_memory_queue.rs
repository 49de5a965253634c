use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use task_service_core::{
    traits::{NotificationChannel, NotificationHandler},
    Result, TaskServiceError,
};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, Instrument};

/// 内存通知通道
///
/// 使用 Tokio channels 实现，适用于嵌入式部署和测试。每个分区是一个独立的
/// 无界队列，订阅前发布的消息会被缓存，订阅后按发布顺序逐条交给处理函数。
/// 关闭时停止接收新消息，并等待已缓存的消息处理完毕。
pub struct InMemoryNotificationChannel {
    senders: Mutex<Vec<mpsc::UnboundedSender<Vec<u8>>>>,
    receivers: Mutex<Vec<mpsc::UnboundedReceiver<Vec<u8>>>>,
    partitions: usize,
    next_partition: AtomicUsize,
    consumers: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl InMemoryNotificationChannel {
    pub fn new(partitions: u16) -> Self {
        let partitions = usize::from(partitions.max(1));
        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..partitions).map(|_| mpsc::unbounded_channel()).unzip();

        info!("Creating in-memory notification channel with {} partitions", partitions);

        Self {
            senders: Mutex::new(senders),
            receivers: Mutex::new(receivers),
            partitions,
            next_partition: AtomicUsize::new(0),
            consumers: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }
}

impl Default for InMemoryNotificationChannel {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl NotificationChannel for InMemoryNotificationChannel {
    async fn publish(&self, payload: &[u8]) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TaskServiceError::MessageQueue(
                "notification channel is closed".to_string(),
            ));
        }

        let partition = self.next_partition.fetch_add(1, Ordering::Relaxed) % self.partitions;
        let senders = self.senders.lock().await;
        let sender = senders.get(partition).ok_or_else(|| {
            TaskServiceError::MessageQueue("notification channel is closed".to_string())
        })?;

        sender.send(payload.to_vec()).map_err(|e| {
            TaskServiceError::MessageQueue(format!("发送到分区 {partition} 失败: {e}"))
        })?;

        debug!("消息已发布到分区: {}", partition);
        Ok(())
    }

    async fn subscribe(&self, handler: Arc<dyn NotificationHandler>) -> Result<()> {
        let receivers = std::mem::take(&mut *self.receivers.lock().await);
        if receivers.is_empty() {
            return Err(TaskServiceError::MessageQueue(
                "notification channel already has a subscriber".to_string(),
            ));
        }

        let mut consumers = self.consumers.lock().await;
        for (partition, mut receiver) in receivers.into_iter().enumerate() {
            let handler = Arc::clone(&handler);
            let span = tracing::info_span!("partition_consumer", partition);
            consumers.push(tokio::spawn(
                async move {
                    while let Some(payload) = receiver.recv().await {
                        handler.handle(&payload).await;
                    }
                    debug!("partition drained");
                }
                .instrument(span),
            ));
        }

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.senders.lock().await.clear();

        let mut errors = Vec::new();
        let consumers = std::mem::take(&mut *self.consumers.lock().await);
        for consumer in consumers {
            if let Err(e) = consumer.await {
                errors.push(format!("消费者任务异常退出: {e}"));
            }
        }

        if errors.is_empty() {
            info!("内存通知通道已关闭");
            Ok(())
        } else {
            Err(TaskServiceError::MessageQueue(errors.join("; ")))
        }
    }
}
