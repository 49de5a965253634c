use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use lapin::{
    options::*, types::FieldTable, BasicProperties, Channel, Connection, ConnectionProperties,
    Consumer, Queue,
};
use task_service_core::{
    config::NotificationConfig,
    traits::{NotificationChannel, NotificationHandler},
    Result, TaskServiceError,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use crate::timeout_handler::TimeoutHandler;

const CONSUMER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

struct PartitionConsumer {
    partition: u16,
    channel: Channel,
    task: JoinHandle<()>,
}

/// RabbitMQ通知通道
///
/// 每个分区对应一个持久化队列 `<topic>.<n>`，发布时轮询选择分区。
/// 发布使用publisher confirms与持久化投递，失败后按配置重试。
/// 每个分区由独立的消费者顺序处理，处理函数返回后才确认消息。
pub struct RabbitMqNotificationChannel {
    connection: Connection,
    publish_channel: Mutex<Channel>,
    config: NotificationConfig,
    timeouts: TimeoutHandler,
    next_partition: AtomicUsize,
    consumers: Mutex<Vec<PartitionConsumer>>,
    closed: AtomicBool,
}

impl RabbitMqNotificationChannel {
    /// 连接RabbitMQ并声明所有分区队列
    pub async fn new(config: NotificationConfig) -> Result<Self> {
        let connection = Connection::connect(&config.url, ConnectionProperties::default())
            .await
            .map_err(|e| TaskServiceError::MessageQueue(format!("连接RabbitMQ失败: {e}")))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| TaskServiceError::MessageQueue(format!("创建通道失败: {e}")))?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| TaskServiceError::MessageQueue(format!("启用发布确认失败: {e}")))?;

        info!("成功连接到RabbitMQ, topic: {}", config.topic);

        let queue = Self {
            connection,
            publish_channel: Mutex::new(channel),
            config,
            timeouts: TimeoutHandler::default(),
            next_partition: AtomicUsize::new(0),
            consumers: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        };

        queue.initialize_queues().await?;

        Ok(queue)
    }

    async fn initialize_queues(&self) -> Result<()> {
        let channel = self.publish_channel.lock().await;

        for partition in 0..self.config.partitions {
            let queue_name = self.config.partition_queue(partition);
            declare_queue(&channel, &queue_name).await?;
        }

        info!("{} 个分区队列初始化完成", self.config.partitions);
        Ok(())
    }

    fn pick_partition(&self) -> u16 {
        let partitions = usize::from(self.config.partitions.max(1));
        (self.next_partition.fetch_add(1, Ordering::Relaxed) % partitions) as u16
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TaskServiceError::MessageQueue(
                "notification channel is closed".to_string(),
            ));
        }
        Ok(())
    }

    async fn publish_once(&self, queue: &str, payload: &[u8]) -> Result<()> {
        let channel = self.publish_channel.lock().await;

        let confirm = channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default().with_delivery_mode(2), // 2 = persistent
            )
            .await
            .map_err(|e| {
                TaskServiceError::MessageQueue(format!("发布消息到队列 {queue} 失败: {e}"))
            })?;

        let confirmation = confirm
            .await
            .map_err(|e| TaskServiceError::MessageQueue(format!("消息发布确认失败: {e}")))?;

        if confirmation.is_nack() {
            return Err(TaskServiceError::MessageQueue(format!(
                "队列 {queue} 拒绝了消息"
            )));
        }

        Ok(())
    }

    async fn start_consumer(
        &self,
        partition: u16,
        handler: Arc<dyn NotificationHandler>,
    ) -> Result<PartitionConsumer> {
        let queue_name = self.config.partition_queue(partition);
        let channel = self
            .connection
            .create_channel()
            .await
            .map_err(|e| TaskServiceError::MessageQueue(format!("创建消费通道失败: {e}")))?;

        channel
            .basic_qos(1, BasicQosOptions::default())
            .await
            .map_err(|e| TaskServiceError::MessageQueue(format!("设置预取数量失败: {e}")))?;

        let consumer_tag = format!("{}-{}-{}", self.config.consumer_tag, host_name(), partition);
        let consumer = channel
            .basic_consume(
                &queue_name,
                &consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| TaskServiceError::MessageQueue(format!("创建消费者失败: {e}")))?;

        debug!("为队列 {} 创建消费者: {}", queue_name, consumer_tag);

        let span = tracing::info_span!("partition_consumer", queue = %queue_name);
        let task = tokio::spawn(consume(consumer, handler).instrument(span));

        Ok(PartitionConsumer {
            partition,
            channel,
            task,
        })
    }

    /// 获取连接状态
    pub fn is_connected(&self) -> bool {
        self.connection.status().connected()
    }
}

async fn declare_queue(channel: &Channel, queue_name: &str) -> Result<Queue> {
    let queue = channel
        .queue_declare(
            queue_name,
            QueueDeclareOptions {
                durable: true,
                exclusive: false,
                auto_delete: false,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| TaskServiceError::MessageQueue(format!("声明队列 {queue_name} 失败: {e}")))?;

    debug!("队列 {} 声明成功", queue_name);
    Ok(queue)
}

async fn consume(mut consumer: Consumer, handler: Arc<dyn NotificationHandler>) {
    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                handler.handle(&delivery.data).await;

                if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
                    warn!("确认消息失败: {}", e);
                }
            }
            Err(e) => {
                error!("消费消息失败: {}", e);
                break;
            }
        }
    }

    debug!("consumer stream ended");
}

fn host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown-host".to_string())
}

#[async_trait]
impl NotificationChannel for RabbitMqNotificationChannel {
    async fn publish(&self, payload: &[u8]) -> Result<()> {
        self.ensure_open()?;

        let partition = self.pick_partition();
        let queue = self.config.partition_queue(partition);
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);

        let mut attempt = 0;
        loop {
            let result = self
                .timeouts
                .message_queue_operation(self.publish_once(&queue, payload), "publish")
                .await;

            match result {
                Ok(()) => {
                    debug!("消息已发布到队列: {}", queue);
                    return Ok(());
                }
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "发布到队列 {} 失败，第 {} 次重试: {}",
                        queue, attempt, e
                    );
                    tokio::time::sleep(retry_delay).await;
                }
                Err(e) => {
                    error!("发布到队列 {} 失败，已放弃: {}", queue, e);
                    return Err(e);
                }
            }
        }
    }

    async fn subscribe(&self, handler: Arc<dyn NotificationHandler>) -> Result<()> {
        self.ensure_open()?;

        let mut consumers = self.consumers.lock().await;
        if !consumers.is_empty() {
            return Err(TaskServiceError::MessageQueue(
                "notification channel already has a subscriber".to_string(),
            ));
        }

        for partition in 0..self.config.partitions {
            let consumer = self.start_consumer(partition, Arc::clone(&handler)).await?;
            consumers.push(consumer);
        }

        info!("已订阅 {} 个分区", self.config.partitions);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut errors = Vec::new();
        let consumers = std::mem::take(&mut *self.consumers.lock().await);

        for consumer in consumers {
            if let Err(e) = consumer.channel.close(200, "正常关闭").await {
                errors.push(format!("关闭分区 {} 消费通道失败: {e}", consumer.partition));
            }

            let mut task = consumer.task;
            if tokio::time::timeout(CONSUMER_STOP_TIMEOUT, &mut task)
                .await
                .is_err()
            {
                task.abort();
                errors.push(format!("分区 {} 消费者停止超时", consumer.partition));
            }
        }

        if let Err(e) = self.publish_channel.lock().await.close(200, "正常关闭").await {
            errors.push(format!("关闭发布通道失败: {e}"));
        }

        if let Err(e) = self.connection.close(200, "正常关闭").await {
            errors.push(format!("关闭连接失败: {e}"));
        }

        if errors.is_empty() {
            info!("RabbitMQ连接已关闭");
            Ok(())
        } else {
            Err(TaskServiceError::MessageQueue(errors.join("; ")))
        }
    }
}
