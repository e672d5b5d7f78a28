use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use sealworks_application::{ProductionQueueFilter, ProductionQueueRepository};
use sealworks_core::{AppError, AppResult};
use sealworks_domain::{CursorPage, ProductionQueue};

use crate::page_cursor::paginate;

/// In-memory production queue configuration store.
#[derive(Debug, Default)]
pub struct InMemoryProductionQueueRepository {
    queues: RwLock<HashMap<String, ProductionQueue>>,
}

impl InMemoryProductionQueueRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductionQueueRepository for InMemoryProductionQueueRepository {
    async fn list_queues(
        &self,
        filter: &ProductionQueueFilter,
    ) -> AppResult<CursorPage<ProductionQueue>> {
        let mut matching: Vec<ProductionQueue> = self
            .queues
            .read()
            .await
            .values()
            .filter(|queue| filter.matches(queue))
            .cloned()
            .collect();
        matching.sort_by(|left, right| {
            left.name
                .to_lowercase()
                .cmp(&right.name.to_lowercase())
                .then_with(|| left.id.cmp(&right.id))
        });

        paginate(matching, &filter.page)
    }

    async fn find_queue(&self, queue_id: &str) -> AppResult<Option<ProductionQueue>> {
        Ok(self.queues.read().await.get(queue_id).cloned())
    }

    async fn insert_queue(&self, queue: ProductionQueue) -> AppResult<ProductionQueue> {
        let mut queues = self.queues.write().await;
        if queues.contains_key(&queue.id) {
            return Err(AppError::Conflict(format!(
                "production queue '{}' already exists",
                queue.id
            )));
        }

        queues.insert(queue.id.clone(), queue.clone());
        Ok(queue)
    }

    async fn update_queue(&self, queue: ProductionQueue) -> AppResult<ProductionQueue> {
        let mut queues = self.queues.write().await;
        let Some(stored) = queues.get_mut(&queue.id) else {
            return Err(AppError::NotFound(format!(
                "production queue '{}' not found",
                queue.id
            )));
        };

        *stored = queue.clone();
        Ok(queue)
    }

    async fn delete_queue(&self, queue_id: &str) -> AppResult<()> {
        self.queues
            .write()
            .await
            .remove(queue_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("production queue '{queue_id}' not found")))
    }
}
