pub mod manager;
pub mod memory_task_store;
pub mod postgres_task_store;

pub use manager::DatabaseManager;
pub use memory_task_store::{InMemoryTaskStore, InMemoryTaskTransaction};
pub use postgres_task_store::{PgTaskStore, PgTaskTransaction};
