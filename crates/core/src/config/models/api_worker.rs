use serde::{Deserialize, Serialize};

/// HTTP API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_address: String,
    pub request_timeout_seconds: u64,
}

impl ApiConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_address.is_empty() {
            return Err(anyhow::anyhow!("API绑定地址不能为空"));
        }

        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(anyhow::anyhow!(
                "API绑定地址格式无效: {}",
                self.bind_address
            ));
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("请求超时时间必须大于0"));
        }

        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

/// Reconciliation worker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub enabled: bool,
    /// 单条通知的处理超时上限
    pub process_timeout_seconds: u64,
    /// 固定的并发处理者数量
    pub pool_size: usize,
    /// 有界队列容量，满时提交方阻塞
    pub queue_capacity: usize,
}

impl WorkerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.process_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("处理超时时间必须大于0"));
        }

        if self.pool_size == 0 {
            return Err(anyhow::anyhow!("工作池大小必须大于0"));
        }

        if self.queue_capacity == 0 {
            return Err(anyhow::anyhow!("工作池队列容量必须大于0"));
        }

        Ok(())
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            process_timeout_seconds: 30,
            pool_size: 100,
            queue_capacity: 1000,
        }
    }
}
