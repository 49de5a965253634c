use std::sync::Arc;

use task_service_core::{
    config::{NotificationChannelType, NotificationConfig},
    traits::NotificationChannel,
    Result,
};
use tracing::{debug, info};

use crate::{InMemoryNotificationChannel, RabbitMqNotificationChannel};

pub struct NotificationChannelFactory;

impl NotificationChannelFactory {
    pub async fn create(config: &NotificationConfig) -> Result<Arc<dyn NotificationChannel>> {
        debug!("Creating notification channel with type: {:?}", config.r#type);

        match config.r#type {
            NotificationChannelType::Rabbitmq => {
                info!("Initializing RabbitMQ notification channel");
                let rabbitmq = RabbitMqNotificationChannel::new(config.clone()).await?;
                Ok(Arc::new(rabbitmq))
            }
            NotificationChannelType::InMemory => {
                info!("Initializing in-memory notification channel");
                Ok(Arc::new(InMemoryNotificationChannel::new(config.partitions)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_in_memory_channel_without_broker() {
        let config = NotificationConfig {
            r#type: NotificationChannelType::InMemory,
            partitions: 2,
            ..Default::default()
        };

        let channel = NotificationChannelFactory::create(&config).await.unwrap();
        channel.publish(b"1").await.unwrap();
        channel.close().await.unwrap();
    }
}
