use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use sealworks_core::AppResult;
use sealworks_domain::{
    CursorPage, OrderStatus, PageRequest, ProductionQueue, ProductionQueuePriority,
    ProductionQueueStatus,
};

/// Repository port for production queue configuration.
#[async_trait]
pub trait ProductionQueueRepository: Send + Sync {
    /// Lists queues matching `filter`, ordered by name.
    async fn list_queues(
        &self,
        filter: &ProductionQueueFilter,
    ) -> AppResult<CursorPage<ProductionQueue>>;

    /// Loads one queue.
    async fn find_queue(&self, queue_id: &str) -> AppResult<Option<ProductionQueue>>;

    /// Stores a new queue; an existing id is a conflict.
    async fn insert_queue(&self, queue: ProductionQueue) -> AppResult<ProductionQueue>;

    /// Replaces an existing queue.
    async fn update_queue(&self, queue: ProductionQueue) -> AppResult<ProductionQueue>;

    /// Removes a queue.
    async fn delete_queue(&self, queue_id: &str) -> AppResult<()>;
}

/// Port for an external queue-depth metric sink.
#[async_trait]
pub trait QueueDepthRecorder: Send + Sync {
    /// Records the current depth of one queue.
    async fn record_queue_depth(
        &self,
        queue_id: &str,
        total: i64,
        status_counts: &BTreeMap<String, i64>,
    ) -> AppResult<()>;
}

/// Queue listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionQueueFilter {
    /// Accepted statuses; empty accepts all.
    pub statuses: Vec<ProductionQueueStatus>,
    /// Accepted priorities; empty accepts all.
    pub priorities: Vec<ProductionQueuePriority>,
    /// Page size and cursor.
    pub page: PageRequest,
}

impl ProductionQueueFilter {
    /// Returns whether `queue` passes the status and priority filters.
    #[must_use]
    pub fn matches(&self, queue: &ProductionQueue) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&queue.status))
            && (self.priorities.is_empty() || self.priorities.contains(&queue.priority))
    }
}

/// Queue document supplied on create or update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionQueueInput {
    /// Caller-chosen id, create only.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Concurrent order limit, 0 for unlimited.
    pub capacity: Option<i64>,
    /// Work centers served.
    pub work_centers: Vec<String>,
    /// Priority label.
    pub priority: Option<String>,
    /// Status label.
    pub status: Option<String>,
    /// Staff notes.
    pub notes: Option<String>,
    /// Free-form metadata.
    pub metadata: Map<String, Value>,
}

/// Request to place an order in a queue, with optional preconditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueAssignment {
    /// Destination queue.
    pub queue_id: String,
    /// Order to assign.
    pub order_id: String,
    /// Status the order must currently be in.
    pub expected_status: Option<OrderStatus>,
    /// Queue the order must currently be assigned to.
    pub expected_queue_id: Option<String>,
    /// The order must not have changed after this instant.
    pub if_unmodified_since: Option<DateTime<Utc>>,
}
