use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::TaskServiceError;

/// 任务记录
///
/// 系统中唯一的实体。记录存储是持久化状态的唯一拥有者，
/// 编排器和后台Worker只持有按值复制的临时副本。
///
/// # 不变量
///
/// - `id` 由存储在插入时分配，之后永不改变
/// - `title` 永不为空
/// - `status` 创建后始终为 `created` 或 `done`
///
/// # 使用示例
///
/// ```rust
/// use task_service_core::models::{Task, TaskStatus};
///
/// let task = Task {
///     id: 1,
///     title: "Buy milk".to_string(),
///     description: "2%".to_string(),
///     status: TaskStatus::Created,
/// };
/// assert_eq!(task.status.as_str(), "created");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
}

/// 待插入的任务（尚未分配ID）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
}

impl NewTask {
    /// 创建新任务，状态固定为 `created`
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Created,
        }
    }
}

/// 任务状态
///
/// 状态域封闭为 `created` 与 `done`，其他取值在编排层被拒绝。
/// 数据库列是自由文本，校验只发生在编排层。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Created,
    Done,
}

impl TaskStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Created => "created",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(TaskStatus::Created),
            "done" => Ok(TaskStatus::Done),
            other => Err(TaskServiceError::InvalidStatus(other.to_string())),
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for TaskStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for TaskStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

/// 校验状态字符串，返回对应的枚举值
pub fn validate_status(status: &str) -> Result<TaskStatus, TaskServiceError> {
    status.parse()
}
