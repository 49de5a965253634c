use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use task_service_core::{
    models::{NewTask, Task},
    traits::{TaskStore, TaskTransaction, TransactionState},
    Result, TaskServiceError,
};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct StoreState {
    tasks: BTreeMap<i64, Task>,
    last_id: i64,
}

impl StoreState {
    fn allocate_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// 内存任务存储
///
/// 用于嵌入式运行与测试。事务内的写入在提交前对其他读者不可见，
/// 回滚后已分配的ID不会被复用。
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已提交的任务数量
    pub async fn len(&self) -> usize {
        self.state.read().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn get(&self, id: i64) -> Result<Task> {
        self.state
            .read()
            .await
            .tasks
            .get(&id)
            .cloned()
            .ok_or(TaskServiceError::TaskNotFound { id })
    }

    async fn get_list(&self) -> Result<Vec<Task>> {
        Ok(self.state.read().await.tasks.values().cloned().collect())
    }

    async fn begin_tx(&self) -> Result<Box<dyn TaskTransaction>> {
        Ok(Box::new(InMemoryTaskTransaction {
            state: Arc::clone(&self.state),
            staged: BTreeMap::new(),
            tx_state: TransactionState::Active,
        }))
    }

    async fn update(&self, task: &Task) -> Result<()> {
        let mut state = self.state.write().await;
        match state.tasks.get_mut(&task.id) {
            Some(existing) => {
                *existing = task.clone();
                debug!("Updated task {} to {}", task.id, task.status);
                Ok(())
            }
            None => Err(TaskServiceError::TaskNotFound { id: task.id }),
        }
    }
}

/// 内存事务：暂存写入，提交时一次性应用
pub struct InMemoryTaskTransaction {
    state: Arc<RwLock<StoreState>>,
    staged: BTreeMap<i64, Task>,
    tx_state: TransactionState,
}

#[async_trait]
impl TaskTransaction for InMemoryTaskTransaction {
    async fn create(&mut self, task: &NewTask) -> Result<i64> {
        self.tx_state.ensure_active("create")?;

        let id = self.state.write().await.allocate_id();
        self.staged.insert(
            id,
            Task {
                id,
                title: task.title.clone(),
                description: task.description.clone(),
                status: task.status,
            },
        );
        Ok(id)
    }

    async fn update(&mut self, task: &Task) -> Result<()> {
        self.tx_state.ensure_active("update")?;

        let visible = self.staged.contains_key(&task.id)
            || self.state.read().await.tasks.contains_key(&task.id);
        if !visible {
            return Err(TaskServiceError::TaskNotFound { id: task.id });
        }

        self.staged.insert(task.id, task.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.tx_state.ensure_active("commit")?;

        let mut state = self.state.write().await;
        state.tasks.append(&mut self.staged);
        self.tx_state = TransactionState::Committed;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.tx_state.is_finished() {
            return Ok(());
        }

        self.staged.clear();
        self.tx_state = TransactionState::RolledBack;
        Ok(())
    }

    fn state(&self) -> TransactionState {
        self.tx_state
    }
}
