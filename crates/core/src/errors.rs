use thiserror::Error;

/// 任务服务错误类型定义
#[derive(Debug, Error)]
pub enum TaskServiceError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("任务未找到: {id}")]
    TaskNotFound { id: i64 },

    #[error("无效的任务状态: {0}")]
    InvalidStatus(String),

    #[error("无效的任务参数: {0}")]
    InvalidTaskParams(String),

    #[error("事务错误: {0}")]
    Transaction(String),

    #[error("消息队列错误: {0}")]
    MessageQueue(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("操作超时: {0}")]
    Timeout(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl TaskServiceError {
    /// 是否为记录不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskServiceError::TaskNotFound { .. })
    }

    /// 是否为调用方输入错误（在任何I/O之前检测到）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TaskServiceError::InvalidStatus(_) | TaskServiceError::InvalidTaskParams(_)
        )
    }
}

impl From<serde_json::Error> for TaskServiceError {
    fn from(e: serde_json::Error) -> Self {
        TaskServiceError::Serialization(e.to_string())
    }
}

/// 统一的Result类型
pub type Result<T> = std::result::Result<T, TaskServiceError>;
