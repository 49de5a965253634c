use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use task_service_core::TaskService;
use tower_http::trace::TraceLayer;

use crate::{
    error::ApiError,
    handlers::{
        health::health_check,
        tasks::{create_task, get_task, list_tasks, update_task},
    },
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn TaskService>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(service: Arc<dyn TaskService>, request_timeout: Duration) -> Self {
        Self {
            service,
            request_timeout,
        }
    }
}

/// 每个请求都受 `request_timeout` 约束，超时返回 504
async fn request_timeout(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(state.request_timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => ApiError::Timeout.into_response(),
    }
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/tasks", get(list_tasks).post(create_task).put(update_task))
        .route("/tasks/{id}", get(get_task))
        .layer(middleware::from_fn_with_state(state.clone(), request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
