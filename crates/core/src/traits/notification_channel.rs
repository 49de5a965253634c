use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

/// 通知处理器
///
/// 每个分区各有一条调用流，不同分区的调用可能并发发生，
/// 实现必须能安全地被并发调用，且不能假设跨分区的全局顺序。
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    /// 处理一条投递的消息。返回后消息才会向传输层确认
    async fn handle(&self, payload: &[u8]);
}

/// 通知通道抽象接口
///
/// 至少一次投递：同一条消息可能被投递多次，消费者必须幂等。
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// 同步发布消息，阻塞直到传输层确认持久化或在有限次重试后报告失败
    async fn publish(&self, payload: &[u8]) -> Result<()>;

    /// 注册处理器并为每个分区启动消费流，立即返回
    async fn subscribe(&self, handler: Arc<dyn NotificationHandler>) -> Result<()>;

    /// 释放所有生产者/消费者资源，汇总每个资源的释放错误
    async fn close(&self) -> Result<()>;
}
