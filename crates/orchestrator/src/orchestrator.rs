use std::sync::Arc;

use async_trait::async_trait;
use task_service_core::{
    logging::component_span,
    models::{
        validate_status, CreateTaskRequest, NewTask, Notification, Task, TaskListResponse,
        TaskResponse, UpdateTaskRequest,
    },
    traits::{NotificationChannel, TaskService, TaskStore, TaskTransaction},
    Result, TaskServiceError,
};
use tracing::{debug, error, info, warn, Instrument, Span};

/// 任务编排器
///
/// 负责事务写入与状态推进。创建任务时，插入与通知发布在同一个事务内完成：
/// 发布失败则回滚，任务对读者不可见；发布成功后才提交。
pub struct TaskOrchestrator {
    store: Arc<dyn TaskStore>,
    channel: Arc<dyn NotificationChannel>,
    span: Span,
}

impl TaskOrchestrator {
    /// 创建新的任务编排器实例
    pub fn new(store: Arc<dyn TaskStore>, channel: Arc<dyn NotificationChannel>) -> Self {
        Self {
            store,
            channel,
            span: component_span("orchestrator"),
        }
    }

    async fn insert_and_notify(
        &self,
        tx: &mut dyn TaskTransaction,
        task: &NewTask,
    ) -> Result<i64> {
        let id = tx.create(task).await.map_err(|e| {
            error!("插入任务失败: {}", e);
            e
        })?;

        let payload = Notification::new(id).encode()?;
        self.channel.publish(&payload).await.map_err(|e| {
            error!("发布任务 {} 的通知失败: {}", id, e);
            e
        })?;

        tx.commit().await.map_err(|e| {
            error!("提交任务 {} 的事务失败: {}", id, e);
            e
        })?;

        Ok(id)
    }
}

fn require_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(TaskServiceError::InvalidTaskParams(
            "title must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl TaskService for TaskOrchestrator {
    async fn get(&self, id: i64) -> Result<TaskResponse> {
        async {
            match self.store.get(id).await {
                Ok(task) => Ok(TaskResponse::from(task)),
                Err(e) if e.is_not_found() => {
                    debug!("任务 {} 不存在", id);
                    Err(e)
                }
                Err(e) => {
                    error!("获取任务 {} 失败: {}", id, e);
                    Err(e)
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    async fn get_list(&self) -> Result<TaskListResponse> {
        async {
            let tasks = self.store.get_list().await.map_err(|e| {
                error!("获取任务列表失败: {}", e);
                e
            })?;
            Ok(TaskListResponse::from(tasks))
        }
        .instrument(self.span.clone())
        .await
    }

    async fn create(&self, request: CreateTaskRequest) -> Result<i64> {
        async {
            require_title(&request.title)?;

            let task = NewTask::new(request.title, request.description);
            let mut tx = self.store.begin_tx().await.map_err(|e| {
                error!("开启事务失败: {}", e);
                e
            })?;

            let result = self.insert_and_notify(tx.as_mut(), &task).await;

            // 提交后回滚为空操作
            if let Err(e) = tx.rollback().await {
                warn!("回滚事务失败: {}", e);
            }

            if let Ok(id) = &result {
                info!("任务已创建: {}", id);
            }
            result
        }
        .instrument(self.span.clone())
        .await
    }

    async fn update(&self, request: UpdateTaskRequest) -> Result<()> {
        async {
            let status = validate_status(&request.status)?;
            require_title(&request.title)?;

            let task = Task {
                id: request.id,
                title: request.title,
                description: request.description,
                status,
            };

            self.store.update(&task).await.map_err(|e| {
                if e.is_not_found() {
                    debug!("更新的任务 {} 不存在", task.id);
                } else {
                    error!("更新任务 {} 失败: {}", task.id, e);
                }
                e
            })?;

            info!("任务 {} 已更新为 {}", task.id, task.status);
            Ok(())
        }
        .instrument(self.span.clone())
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use task_service_core::{NotificationHandler, TaskStatus, TransactionState};
    use task_service_infrastructure::{InMemoryNotificationChannel, InMemoryTaskStore};

    mock! {
        pub Channel {}

        #[async_trait]
        impl NotificationChannel for Channel {
            async fn publish(&self, payload: &[u8]) -> Result<()>;
            async fn subscribe(&self, handler: Arc<dyn NotificationHandler>) -> Result<()>;
            async fn close(&self) -> Result<()>;
        }
    }

    mock! {
        pub Store {}

        #[async_trait]
        impl TaskStore for Store {
            async fn get(&self, id: i64) -> Result<Task>;
            async fn get_list(&self) -> Result<Vec<Task>>;
            async fn begin_tx(&self) -> Result<Box<dyn TaskTransaction>>;
            async fn update(&self, task: &Task) -> Result<()>;
        }
    }

    mock! {
        pub Tx {}

        #[async_trait]
        impl TaskTransaction for Tx {
            async fn create(&mut self, task: &NewTask) -> Result<i64>;
            async fn update(&mut self, task: &Task) -> Result<()>;
            async fn commit(&mut self) -> Result<()>;
            async fn rollback(&mut self) -> Result<()>;
            fn state(&self) -> TransactionState;
        }
    }

    fn create_request(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: "details".to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_failure_rolls_back_create() {
        let store = Arc::new(InMemoryTaskStore::new());
        let mut channel = MockChannel::new();
        channel.expect_publish().times(1).returning(|_| {
            Err(TaskServiceError::MessageQueue("broker unavailable".to_string()))
        });

        let orchestrator = TaskOrchestrator::new(store.clone(), Arc::new(channel));
        let err = orchestrator.create(create_request("Buy milk")).await.unwrap_err();

        assert!(matches!(err, TaskServiceError::MessageQueue(_)));
        assert!(store.get_list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_payload_is_the_new_id() {
        let store = Arc::new(InMemoryTaskStore::new());
        let mut channel = MockChannel::new();
        channel
            .expect_publish()
            .withf(|payload| payload == b"1")
            .times(1)
            .returning(|_| Ok(()));

        let orchestrator = TaskOrchestrator::new(store.clone(), Arc::new(channel));
        let id = orchestrator.create(create_request("Buy milk")).await.unwrap();

        assert_eq!(id, 1);
        assert_eq!(store.get(id).await.unwrap().status, TaskStatus::Created);
    }

    #[tokio::test]
    async fn test_insert_failure_skips_publish() {
        let mut tx = MockTx::new();
        tx.expect_create()
            .returning(|_| Err(TaskServiceError::Internal("disk full".to_string())));
        tx.expect_commit().never();
        tx.expect_rollback().times(1).returning(|| Ok(()));

        let mut store = MockStore::new();
        store
            .expect_begin_tx()
            .return_once(move || Ok(Box::new(tx) as Box<dyn TaskTransaction>));

        let mut channel = MockChannel::new();
        channel.expect_publish().never();

        let orchestrator = TaskOrchestrator::new(Arc::new(store), Arc::new(channel));
        let err = orchestrator.create(create_request("Buy milk")).await.unwrap_err();
        assert!(matches!(err, TaskServiceError::Internal(_)));
    }

    #[tokio::test]
    async fn test_rollback_failure_does_not_mask_success() {
        let mut tx = MockTx::new();
        tx.expect_create().returning(|_| Ok(7));
        tx.expect_commit().times(1).returning(|| Ok(()));
        tx.expect_rollback()
            .times(1)
            .returning(|| Err(TaskServiceError::Transaction("connection reset".to_string())));

        let mut store = MockStore::new();
        store
            .expect_begin_tx()
            .return_once(move || Ok(Box::new(tx) as Box<dyn TaskTransaction>));

        let mut channel = MockChannel::new();
        channel.expect_publish().returning(|_| Ok(()));

        let orchestrator = TaskOrchestrator::new(Arc::new(store), Arc::new(channel));
        assert_eq!(orchestrator.create(create_request("Buy milk")).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_empty_title_is_rejected_before_io() {
        let mut store = MockStore::new();
        store.expect_begin_tx().never();
        store.expect_update().never();

        let orchestrator =
            TaskOrchestrator::new(Arc::new(store), Arc::new(InMemoryNotificationChannel::default()));

        let err = orchestrator.create(create_request("   ")).await.unwrap_err();
        assert!(err.is_client_error());

        let err = orchestrator
            .update(UpdateTaskRequest {
                id: 1,
                title: String::new(),
                description: String::new(),
                status: "done".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_invalid_status_leaves_record_unchanged() {
        let store = Arc::new(InMemoryTaskStore::new());
        let orchestrator =
            TaskOrchestrator::new(store.clone(), Arc::new(InMemoryNotificationChannel::default()));

        let id = orchestrator.create(create_request("Buy milk")).await.unwrap();
        let err = orchestrator
            .update(UpdateTaskRequest {
                id,
                title: "Buy milk".to_string(),
                description: "details".to_string(),
                status: "archived".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, TaskServiceError::InvalidStatus(ref s) if s == "archived"));
        assert_eq!(store.get(id).await.unwrap().status, TaskStatus::Created);
    }

    #[tokio::test]
    async fn test_update_store_failure_is_propagated() {
        let mut store = MockStore::new();
        store
            .expect_update()
            .returning(|task| Err(TaskServiceError::TaskNotFound { id: task.id }));

        let orchestrator =
            TaskOrchestrator::new(Arc::new(store), Arc::new(InMemoryNotificationChannel::default()));
        let err = orchestrator
            .update(UpdateTaskRequest {
                id: 42,
                title: "t".to_string(),
                description: String::new(),
                status: "done".to_string(),
            })
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }
}
