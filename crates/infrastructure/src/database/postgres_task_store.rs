use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Postgres, Row, Transaction};
use task_service_core::{
    models::{NewTask, Task, TaskStatus},
    traits::{TaskStore, TaskTransaction, TransactionState},
    Result, TaskServiceError,
};
use tracing::{debug, instrument, warn};

use crate::timeout_handler::TimeoutHandler;

const GET_TASK_SQL: &str = "SELECT id, title, description, status FROM tasks WHERE id = $1";
const LIST_TASKS_SQL: &str = "SELECT id, title, description, status FROM tasks ORDER BY id";
const INSERT_TASK_SQL: &str =
    "INSERT INTO tasks (title, description, status) VALUES ($1, $2, $3) RETURNING id";
const UPDATE_TASK_SQL: &str =
    "UPDATE tasks SET title = $1, description = $2, status = $3 WHERE id = $4";

fn row_to_task(row: &PgRow) -> Result<Task> {
    let id: i64 = row.try_get("id")?;
    let status: String = row.try_get("status")?;

    Ok(Task {
        id,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: decode_status(id, &status)?,
    })
}

/// 状态列是自由文本，其他写入方可能写入状态域之外的值
fn decode_status(id: i64, raw: &str) -> Result<TaskStatus> {
    raw.parse().map_err(|_| {
        warn!(task_id = id, status = %raw, "存储中的任务状态不合法");
        TaskServiceError::Internal(format!("任务 {id} 的存储状态不合法: {raw:?}"))
    })
}

/// PostgreSQL任务存储
///
/// 每条语句都受 `query_timeout` 限制，超时返回 [`TaskServiceError::Timeout`]。
#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
    timeouts: TimeoutHandler,
}

impl PgTaskStore {
    pub fn new(pool: PgPool, timeouts: TimeoutHandler) -> Self {
        Self { pool, timeouts }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    #[instrument(skip(self))]
    async fn get(&self, id: i64) -> Result<Task> {
        let row = self
            .timeouts
            .database_operation(
                async {
                    sqlx::query(GET_TASK_SQL)
                        .bind(id)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(TaskServiceError::from)
                },
                "get_task",
            )
            .await?;

        match row {
            Some(row) => row_to_task(&row),
            None => Err(TaskServiceError::TaskNotFound { id }),
        }
    }

    #[instrument(skip(self))]
    async fn get_list(&self) -> Result<Vec<Task>> {
        let rows = self
            .timeouts
            .database_operation(
                async {
                    sqlx::query(LIST_TASKS_SQL)
                        .fetch_all(&self.pool)
                        .await
                        .map_err(TaskServiceError::from)
                },
                "list_tasks",
            )
            .await?;

        debug!("查询到 {} 个任务", rows.len());
        rows.iter().map(row_to_task).collect()
    }

    async fn begin_tx(&self) -> Result<Box<dyn TaskTransaction>> {
        let tx = self
            .timeouts
            .database_operation(
                async { self.pool.begin().await.map_err(TaskServiceError::from) },
                "begin_transaction",
            )
            .await?;

        Ok(Box::new(PgTaskTransaction {
            tx: Some(tx),
            state: TransactionState::Active,
            timeouts: self.timeouts,
        }))
    }

    #[instrument(skip(self, task), fields(task_id = %task.id, status = %task.status))]
    async fn update(&self, task: &Task) -> Result<()> {
        let result = self
            .timeouts
            .database_operation(
                async {
                    update_query(task)
                        .execute(&self.pool)
                        .await
                        .map_err(TaskServiceError::from)
                },
                "update_task",
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(TaskServiceError::TaskNotFound { id: task.id });
        }

        debug!("Updated task {}", task.id);
        Ok(())
    }
}

fn update_query(task: &Task) -> sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(UPDATE_TASK_SQL)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.id)
}

/// 数据库事务句柄
///
/// 未提交即被丢弃时由sqlx回滚。
pub struct PgTaskTransaction {
    tx: Option<Transaction<'static, Postgres>>,
    state: TransactionState,
    timeouts: TimeoutHandler,
}

impl PgTaskTransaction {
    fn active_tx(&mut self, operation: &str) -> Result<&mut Transaction<'static, Postgres>> {
        self.state.ensure_active(operation)?;
        self.tx.as_mut().ok_or_else(|| {
            TaskServiceError::Transaction(format!("cannot {operation}: no open transaction"))
        })
    }
}

#[async_trait]
impl TaskTransaction for PgTaskTransaction {
    #[instrument(skip(self, task), fields(title = %task.title))]
    async fn create(&mut self, task: &NewTask) -> Result<i64> {
        let timeouts = self.timeouts;
        let tx = self.active_tx("create")?;

        let id: i64 = timeouts
            .database_operation(
                async {
                    sqlx::query_scalar(INSERT_TASK_SQL)
                        .bind(&task.title)
                        .bind(&task.description)
                        .bind(task.status)
                        .fetch_one(&mut **tx)
                        .await
                        .map_err(TaskServiceError::from)
                },
                "insert_task",
            )
            .await?;

        debug!("Inserted task {} in transaction", id);
        Ok(id)
    }

    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn update(&mut self, task: &Task) -> Result<()> {
        let timeouts = self.timeouts;
        let tx = self.active_tx("update")?;

        let result = timeouts
            .database_operation(
                async {
                    update_query(task)
                        .execute(&mut **tx)
                        .await
                        .map_err(TaskServiceError::from)
                },
                "update_task",
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(TaskServiceError::TaskNotFound { id: task.id });
        }

        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.state.ensure_active("commit")?;
        let tx = self.tx.take().ok_or_else(|| {
            TaskServiceError::Transaction("cannot commit: no open transaction".to_string())
        })?;

        // 提交请求发出后无论结果如何，句柄都不再可用
        self.state = TransactionState::Committed;
        self.timeouts
            .database_operation(
                async {
                    tx.commit()
                        .await
                        .map_err(|e| TaskServiceError::Transaction(format!("提交事务失败: {e}")))
                },
                "commit_transaction",
            )
            .await
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.state.is_finished() {
            return Ok(());
        }

        self.state = TransactionState::RolledBack;
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };

        self.timeouts
            .database_operation(
                async {
                    tx.rollback()
                        .await
                        .map_err(|e| TaskServiceError::Transaction(format!("回滚事务失败: {e}")))
                },
                "rollback_transaction",
            )
            .await
    }

    fn state(&self) -> TransactionState {
        self.state
    }
}
