//! Timeout handling for store and channel operations

use std::future::Future;
use std::time::Duration;

use task_service_core::{Result, TaskServiceError};
use tokio::time::timeout;
use tracing::error;

/// 各类操作的超时上限
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// 单条数据库语句
    pub database_timeout: Duration,
    /// 单次发布（含确认等待）
    pub message_queue_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            database_timeout: Duration::from_secs(30),
            message_queue_timeout: Duration::from_secs(10),
        }
    }
}

/// Timeout handler utility for async operations
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutHandler {
    config: TimeoutConfig,
}

impl TimeoutHandler {
    pub fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    /// 仅覆盖数据库超时
    pub fn with_database_timeout(database_timeout: Duration) -> Self {
        Self::new(TimeoutConfig {
            database_timeout,
            ..TimeoutConfig::default()
        })
    }

    /// Execute database operation with timeout
    pub async fn database_operation<F, T>(&self, operation: F, operation_name: &str) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        execute_with_timeout(
            operation,
            self.config.database_timeout,
            "数据库",
            operation_name,
        )
        .await
    }

    /// Execute message queue operation with timeout
    pub async fn message_queue_operation<F, T>(
        &self,
        operation: F,
        operation_name: &str,
    ) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        execute_with_timeout(
            operation,
            self.config.message_queue_timeout,
            "消息队列",
            operation_name,
        )
        .await
    }
}

async fn execute_with_timeout<F, T>(
    operation: F,
    timeout_duration: Duration,
    operation_type: &str,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(timeout_duration, operation).await {
        Ok(result) => result,
        Err(_) => {
            let error_msg = format!(
                "{operation_type}操作 '{operation_name}' 超时 (超时时间: {timeout_duration:?})"
            );
            error!("{}", error_msg);
            Err(TaskServiceError::Timeout(error_msg))
        }
    }
}
