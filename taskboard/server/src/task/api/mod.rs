use super::TaskEvents;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod v1;

/// Shared state for the task endpoints.
#[derive(Clone)]
pub struct TaskState {
    pub db: Arc<DatabaseConnection>,
    pub events: TaskEvents,
}

impl TaskState {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db: Arc::new(db),
            events: TaskEvents::new(),
        }
    }
}
