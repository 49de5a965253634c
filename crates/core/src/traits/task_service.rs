use async_trait::async_trait;

use crate::{
    models::{CreateTaskRequest, TaskListResponse, TaskResponse, UpdateTaskRequest},
    Result,
};

/// 任务服务接口
///
/// HTTP层和对账Worker都只依赖此接口，而不依赖具体的编排器实现。
#[async_trait]
pub trait TaskService: Send + Sync {
    /// 获取单个任务
    async fn get(&self, id: i64) -> Result<TaskResponse>;

    /// 获取任务列表
    async fn get_list(&self) -> Result<TaskListResponse>;

    /// 创建任务并发布通知，返回新任务ID
    async fn create(&self, request: CreateTaskRequest) -> Result<i64>;

    /// 校验状态后整体更新任务
    async fn update(&self, request: UpdateTaskRequest) -> Result<()>;
}
