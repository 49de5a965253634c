//! 后台对账
//!
//! [`ReconciliationWorker`] 消费任务创建通知并把任务推进到终态，
//! 单条通知的处理由固定大小的 [`WorkerPool`] 执行。

pub mod pool;
pub mod reconciler;

pub use pool::WorkerPool;
pub use reconciler::ReconciliationWorker;
