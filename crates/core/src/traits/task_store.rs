//! 记录存储接口定义
//!
//! 存储是任务状态的唯一拥有者。写入分为两条路径：
//!
//! - 事务路径：[`TaskStore::begin_tx`] 取得 [`TaskTransaction`]，插入与更新都在
//!   调用方持有的事务内完成，存储自身从不提交或回滚
//! - 直接路径：[`TaskStore::update`] 在单条语句的隐式事务中完成整体替换
//!
//! ## 事务状态
//!
//! 每个事务句柄显式跟踪自身状态（[`TransactionState`]）：
//!
//! ```text
//! Active ──commit──▶ Committed ──rollback──▶ Committed (no-op)
//!   │
//!   └──rollback──▶ RolledBack ──rollback──▶ RolledBack (no-op)
//! ```
//!
//! 提交后的回滚是无害的空操作，编排器依赖这一点在任何提前返回路径上
//! 无条件地尝试回滚。丢弃一个仍处于 `Active` 的句柄等同于回滚。

use async_trait::async_trait;

use crate::{
    models::{NewTask, Task},
    Result, TaskServiceError,
};

/// 记录存储
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// 按ID读取已提交的任务，不存在时返回 [`TaskServiceError::TaskNotFound`]
    async fn get(&self, id: i64) -> Result<Task>;

    /// 读取全部已提交的任务，无记录时返回空集合
    async fn get_list(&self) -> Result<Vec<Task>>;

    /// 开启事务
    async fn begin_tx(&self) -> Result<Box<dyn TaskTransaction>>;

    /// 在事务之外整体替换任务内容，ID不存在时返回 [`TaskServiceError::TaskNotFound`]
    async fn update(&self, task: &Task) -> Result<()>;
}

/// 存储事务句柄
#[async_trait]
pub trait TaskTransaction: Send {
    /// 在事务内插入任务，返回存储分配的ID
    async fn create(&mut self, task: &NewTask) -> Result<i64>;

    /// 在事务内整体替换任务内容
    async fn update(&mut self, task: &Task) -> Result<()>;

    /// 提交事务；对已回滚的事务提交会失败
    async fn commit(&mut self) -> Result<()>;

    /// 回滚事务；事务已结束时为空操作
    async fn rollback(&mut self) -> Result<()>;

    /// 当前状态
    fn state(&self) -> TransactionState;
}

/// 事务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

impl TransactionState {
    /// 检查事务仍可执行语句或提交
    pub fn ensure_active(self, operation: &str) -> Result<()> {
        match self {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(TaskServiceError::Transaction(format!(
                "cannot {operation}: transaction already committed"
            ))),
            TransactionState::RolledBack => Err(TaskServiceError::Transaction(format!(
                "cannot {operation}: transaction already rolled back"
            ))),
        }
    }

    pub fn is_finished(self) -> bool {
        self != TransactionState::Active
    }
}
