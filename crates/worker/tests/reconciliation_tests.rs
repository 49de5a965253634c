use std::sync::Arc;
use std::time::Duration;

use task_service_core::{
    config::WorkerConfig, CreateTaskRequest, NotificationChannel, NotificationHandler,
    TaskService,
};
use task_service_infrastructure::{InMemoryNotificationChannel, InMemoryTaskStore};
use task_service_orchestrator::TaskOrchestrator;
use task_service_worker::ReconciliationWorker;

struct Harness {
    service: Arc<TaskOrchestrator>,
    channel: Arc<InMemoryNotificationChannel>,
    worker: Arc<ReconciliationWorker>,
}

fn harness() -> Harness {
    let channel = Arc::new(InMemoryNotificationChannel::new(2));
    let service = Arc::new(TaskOrchestrator::new(
        Arc::new(InMemoryTaskStore::new()),
        channel.clone(),
    ));
    let config = WorkerConfig {
        pool_size: 4,
        queue_capacity: 8,
        process_timeout_seconds: 5,
        ..Default::default()
    };
    let worker = Arc::new(ReconciliationWorker::new(
        service.clone(),
        channel.clone(),
        &config,
    ));

    Harness {
        service,
        channel,
        worker,
    }
}

async fn wait_for_status(service: &TaskOrchestrator, id: i64, status: &str) -> bool {
    for _ in 0..100 {
        if service.get(id).await.map(|t| t.status == status).unwrap_or(false) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_happy_path_reaches_done() {
    let h = harness();
    h.worker.process_tasks().await.unwrap();

    let id = h
        .service
        .create(CreateTaskRequest {
            title: "Buy milk".to_string(),
            description: "2%".to_string(),
        })
        .await
        .unwrap();

    let list = h.service.get_list().await.unwrap();
    assert_eq!(list.tasks.len(), 1);

    assert!(wait_for_status(&h.service, id, "done").await);
    let task = h.service.get(id).await.unwrap();
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.description, "2%");

    h.channel.close().await.unwrap();
    h.worker.shutdown().await;
}

#[tokio::test]
async fn test_redelivery_is_idempotent() {
    let h = harness();
    let id = h
        .service
        .create(CreateTaskRequest {
            title: "Write report".to_string(),
            description: String::new(),
        })
        .await
        .unwrap();

    for _ in 0..3 {
        h.worker.handle(id.to_string().as_bytes()).await;
        assert_eq!(h.service.get(id).await.unwrap().status, "done");
    }

    h.worker.shutdown().await;
}

#[tokio::test]
async fn test_malformed_and_unknown_notifications_are_discarded() {
    let h = harness();
    let id = h
        .service
        .create(CreateTaskRequest {
            title: "untouched".to_string(),
            description: String::new(),
        })
        .await
        .unwrap();

    h.worker.handle(b"not-a-number").await;
    h.worker.handle(b"999999").await;

    assert_eq!(h.service.get(id).await.unwrap().status, "created");
    h.worker.shutdown().await;
}

#[tokio::test]
async fn test_notifications_published_before_subscribe_are_processed() {
    let h = harness();
    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(
            h.service
                .create(CreateTaskRequest {
                    title: format!("task {i}"),
                    description: String::new(),
                })
                .await
                .unwrap(),
        );
    }

    h.worker.process_tasks().await.unwrap();
    h.channel.close().await.unwrap();

    for id in ids {
        assert_eq!(h.service.get(id).await.unwrap().status, "done");
    }
    h.worker.shutdown().await;
}
