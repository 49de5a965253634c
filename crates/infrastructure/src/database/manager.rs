use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use task_service_core::{config::DatabaseConfig, Result, TaskServiceError};
use tracing::info;

/// PostgreSQL连接池的创建与生命周期管理
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// 按配置建立连接池，`run_migrations` 为真时执行内嵌迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(TaskServiceError::Database)?;

        info!(
            "数据库连接池已建立 (max_connections: {})",
            config.max_connections
        );

        let manager = Self { pool };
        if config.run_migrations {
            manager.migrate().await?;
        }

        Ok(manager)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| TaskServiceError::Database(e.into()))?;

        info!("数据库迁移完成");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(TaskServiceError::Database)?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("数据库连接池已关闭");
    }
}
