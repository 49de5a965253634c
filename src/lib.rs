//! 任务服务应用外壳：组件装配与优雅关闭

pub mod app;
pub mod shutdown;
