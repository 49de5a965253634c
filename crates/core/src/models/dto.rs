use serde::{Deserialize, Serialize};

use super::{Task, TaskStatus};

/// 任务创建请求
///
/// 调用方提供的状态在创建时被忽略，新任务总是 `created`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// 任务更新请求（整体替换）
///
/// `status` 保留为字符串，使非法取值能够到达编排层的校验步骤。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
}

impl UpdateTaskRequest {
    /// 复制标题与描述，构造推进到 `done` 的更新请求
    pub fn mark_done(task: TaskResponse) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: TaskStatus::Done.to_string(),
        }
    }
}

/// 单个任务响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status.to_string(),
        }
    }
}

/// 任务列表响应，`tasks` 字段始终存在
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskResponse>,
}

impl From<Vec<Task>> for TaskListResponse {
    fn from(tasks: Vec<Task>) -> Self {
        Self {
            tasks: tasks.into_iter().map(TaskResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_description_is_optional() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"title":"Buy milk"}"#).unwrap();
        assert_eq!(req.title, "Buy milk");
        assert_eq!(req.description, "");
    }

    #[test]
    fn test_update_request_defaults_missing_fields() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"title":"T"}"#).unwrap();
        assert_eq!(req.id, 0);
        assert_eq!(req.status, "");
    }

    #[test]
    fn test_empty_list_serializes_as_array() {
        let json = serde_json::to_string(&TaskListResponse::default()).unwrap();
        assert_eq!(json, r#"{"tasks":[]}"#);
    }

    #[test]
    fn test_task_response_from_task() {
        let task = Task {
            id: 3,
            title: "T".to_string(),
            description: "D".to_string(),
            status: TaskStatus::Done,
        };
        let resp = TaskResponse::from(task);
        assert_eq!(resp.id, 3);
        assert_eq!(resp.status, "done");
    }

    #[test]
    fn test_mark_done_keeps_content() {
        let resp = TaskResponse {
            id: 5,
            title: "T".to_string(),
            description: "D".to_string(),
            status: "created".to_string(),
        };
        let update = UpdateTaskRequest::mark_done(resp);
        assert_eq!(update.id, 5);
        assert_eq!(update.title, "T");
        assert_eq!(update.description, "D");
        assert_eq!(update.status, "done");
    }
}
