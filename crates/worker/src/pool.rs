use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use task_service_core::{Result, TaskServiceError};
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// 固定大小的工作池
///
/// `size` 个工作者从容量为 `capacity` 的有界队列中取任务执行。
/// 队列已满时 [`WorkerPool::submit`] 等待空位，[`WorkerPool::try_submit`] 直接拒绝。
pub struct WorkerPool {
    sender: RwLock<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize, capacity: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel::<Job>(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|index| {
                let receiver = Arc::clone(&receiver);
                tokio::spawn(async move {
                    loop {
                        let job = receiver.lock().await.recv().await;
                        match job {
                            Some(job) => job.await,
                            None => break,
                        }
                    }
                    debug!("worker {} stopped", index);
                })
            })
            .collect();

        info!("Worker pool started with {} workers, queue capacity {}", size, capacity);

        Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    async fn sender(&self) -> Result<mpsc::Sender<Job>> {
        self.sender
            .read()
            .await
            .clone()
            .ok_or_else(|| TaskServiceError::Internal("worker pool is shut down".to_string()))
    }

    /// 提交任务，队列已满时等待
    pub async fn submit<F>(&self, job: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.sender()
            .await?
            .send(Box::pin(job))
            .await
            .map_err(|_| TaskServiceError::Internal("worker pool is shut down".to_string()))
    }

    /// 提交任务，队列已满时立即返回错误
    pub async fn try_submit<F>(&self, job: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.sender().await?.try_send(Box::pin(job)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                TaskServiceError::Internal("worker pool queue is full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                TaskServiceError::Internal("worker pool is shut down".to_string())
            }
        })
    }

    /// 提交任务并等待其执行完毕
    pub async fn run<F>(&self, job: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        self.submit(async move {
            job.await;
            let _ = done_tx.send(());
        })
        .await?;

        done_rx
            .await
            .map_err(|_| TaskServiceError::Internal("worker pool job was dropped".to_string()))
    }

    /// 停止接收新任务，等待队列中的任务执行完毕
    pub async fn shutdown(&self) {
        if self.sender.write().await.take().is_none() {
            return;
        }

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for worker in workers {
            if let Err(e) = worker.await {
                warn!("worker task ended abnormally: {}", e);
            }
        }

        info!("Worker pool stopped");
    }
}
