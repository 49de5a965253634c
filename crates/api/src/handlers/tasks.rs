use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use task_service_core::{CreateTaskRequest, TaskListResponse, TaskResponse, UpdateTaskRequest};

use crate::{
    error::{ApiError, ApiResult},
    response::{CreatedResponse, MessageResponse},
    routes::AppState,
};

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::InvalidId(raw.to_string()))
}

/// 获取单个任务
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let id = parse_id(&id)?;
    let task = state.service.get(id).await?;
    Ok(Json(task))
}

/// 获取任务列表
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Json<TaskListResponse>> {
    let tasks = state.service.get_list().await?;
    Ok(Json(tasks))
}

/// 创建任务
pub async fn create_task(
    State(state): State<AppState>,
    request: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let Json(request) = request?;
    let id = state.service.create(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Task created successfully".to_string(),
            id,
        }),
    ))
}

/// 更新任务（整体替换）
pub async fn update_task(
    State(state): State<AppState>,
    request: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = request?;
    if request.id == 0 {
        return Err(ApiError::InvalidId("0".to_string()));
    }

    state.service.update(request).await?;
    Ok(Json(MessageResponse::new("Task updated successfully")))
}
