//! Production queue configuration, WIP reporting, and order assignment.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};

use sealworks_core::{AppError, AppResult};
use sealworks_domain::{
    CursorPage, Order, ProductionQueue, ProductionQueuePriority, ProductionQueueStatus,
    ProductionQueueWip, normalize_work_centers,
};

use crate::id_generator::{IdGenerator, PrefixedIdGenerator, UuidV7Generator};
use crate::order_ports::OrderRepository;
use crate::order_service::load_order;

mod ports;
mod wip;

pub use ports::{
    ProductionQueueFilter, ProductionQueueInput, ProductionQueueRepository, QueueAssignment,
    QueueDepthRecorder,
};

/// SLA threshold used when none is configured.
pub const DEFAULT_QUEUE_SLA_HOURS: i64 = 48;

/// Application service for production queues.
#[derive(Clone)]
pub struct ProductionQueueService {
    queues: Arc<dyn ProductionQueueRepository>,
    orders: Arc<dyn OrderRepository>,
    ids: Arc<dyn IdGenerator>,
    sla: Duration,
    depth_recorder: Option<Arc<dyn QueueDepthRecorder>>,
}

impl ProductionQueueService {
    /// Creates a service with a 48 hour SLA and `pqu_` identifiers.
    #[must_use]
    pub fn new(
        queues: Arc<dyn ProductionQueueRepository>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            queues,
            orders,
            ids: Arc::new(PrefixedIdGenerator::new("pqu_", UuidV7Generator)),
            sla: Duration::hours(DEFAULT_QUEUE_SLA_HOURS),
            depth_recorder: None,
        }
    }

    /// Sets the age after which a WIP order breaches the SLA.
    #[must_use]
    pub fn with_sla(mut self, sla: Duration) -> Self {
        self.sla = sla;
        self
    }

    /// Replaces the identifier generator.
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Emits queue-depth metrics on every WIP read.
    #[must_use]
    pub fn with_depth_recorder(mut self, recorder: Arc<dyn QueueDepthRecorder>) -> Self {
        self.depth_recorder = Some(recorder);
        self
    }

    /// Returns whether WIP reads already emit queue-depth metrics.
    #[must_use]
    pub fn emits_queue_depth(&self) -> bool {
        self.depth_recorder.is_some()
    }

    /// Lists queues.
    pub async fn list_queues(
        &self,
        filter: ProductionQueueFilter,
    ) -> AppResult<CursorPage<ProductionQueue>> {
        self.queues.list_queues(&filter).await
    }

    /// Loads one queue.
    pub async fn get_queue(&self, queue_id: &str) -> AppResult<ProductionQueue> {
        let queue_id = queue_id.trim();
        if queue_id.is_empty() {
            return Err(AppError::Validation("queue id is required".to_owned()));
        }

        self.queues
            .find_queue(queue_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("production queue '{queue_id}' not found")))
    }

    /// Creates a queue.
    pub async fn create_queue(&self, input: ProductionQueueInput) -> AppResult<ProductionQueue> {
        let id = input
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(|| self.ids.generate(), str::to_owned);
        let now = Utc::now();
        let queue = build_queue(id, input, now, now)?;
        self.queues.insert_queue(queue).await
    }

    /// Replaces the configuration of an existing queue.
    pub async fn update_queue(
        &self,
        queue_id: &str,
        input: ProductionQueueInput,
    ) -> AppResult<ProductionQueue> {
        let existing = self.get_queue(queue_id).await?;
        if let Some(body_id) = input.id.as_deref().map(str::trim)
            && !body_id.is_empty()
            && body_id != existing.id
        {
            return Err(AppError::Validation(format!(
                "body id '{body_id}' does not match path id '{}'",
                existing.id
            )));
        }

        let queue = build_queue(existing.id, input, existing.created_at, Utc::now())?;
        self.queues.update_queue(queue).await
    }

    /// Deletes a queue that has no work-in-progress orders.
    pub async fn delete_queue(&self, queue_id: &str) -> AppResult<ProductionQueue> {
        let queue = self.get_queue(queue_id).await?;
        let assigned = self.orders.list_queue_orders(&queue.id).await?;
        if assigned
            .iter()
            .any(|order| order.status.is_work_in_progress())
        {
            return Err(AppError::InUse(format!(
                "production queue '{}' still has assigned orders",
                queue.id
            )));
        }

        self.queues.delete_queue(&queue.id).await?;
        Ok(queue)
    }

    /// Computes the WIP summary of a queue.
    pub async fn wip_summary(&self, queue_id: &str) -> AppResult<ProductionQueueWip> {
        let queue = self.get_queue(queue_id).await?;
        let orders = self.orders.list_queue_orders(&queue.id).await?;
        let summary = wip::summarize(&queue.id, &orders, self.sla, Utc::now());

        if let Some(recorder) = &self.depth_recorder
            && let Err(error) = recorder
                .record_queue_depth(&summary.queue_id, summary.total, &summary.status_counts)
                .await
        {
            tracing::warn!(
                queue_id = %summary.queue_id,
                error = %error,
                "failed to record queue depth"
            );
        }

        Ok(summary)
    }

    /// Assigns an order to a queue after checking preconditions and capacity.
    ///
    /// Precondition failures, capacity exhaustion, and non-active queues are conflicts.
    pub async fn assign_order(&self, assignment: QueueAssignment) -> AppResult<Order> {
        let queue = self.get_queue(&assignment.queue_id).await?;
        let mut order = load_order(self.orders.as_ref(), &assignment.order_id).await?;

        if queue.status != ProductionQueueStatus::Active {
            return Err(AppError::Conflict(format!(
                "production queue '{}' is {}",
                queue.id, queue.status
            )));
        }
        if let Some(expected) = assignment.expected_status
            && expected != order.status
        {
            return Err(AppError::Conflict(format!(
                "order '{}' is {}, expected {expected}",
                order.id, order.status
            )));
        }
        if let Some(expected) = assignment.expected_queue_id.as_deref()
            && order.production_queue.as_deref() != Some(expected)
        {
            return Err(AppError::Conflict(format!(
                "order '{}' is not assigned to queue '{expected}'",
                order.id
            )));
        }
        if let Some(since) = assignment.if_unmodified_since
            && order.updated_at > since
        {
            return Err(AppError::Conflict(format!(
                "order '{}' was modified after {since}",
                order.id
            )));
        }
        if !order.status.is_work_in_progress() {
            return Err(AppError::InvalidState(format!(
                "order '{}' in status {} cannot be queued for production",
                order.id, order.status
            )));
        }
        if order.production_queue.as_deref() == Some(queue.id.as_str()) {
            return Ok(order);
        }

        let expected_updated_at = order.updated_at;
        let now = Utc::now();
        order.production_queue = Some(queue.id.clone());
        order.updated_at = now;
        order.last_event_type = Some("production_queue.assigned".to_owned());
        order.last_event_at = Some(now);

        self.orders
            .save_queue_assignment(order, expected_updated_at, queue.capacity)
            .await
    }
}

fn build_queue(
    id: String,
    input: ProductionQueueInput,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
) -> AppResult<ProductionQueue> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_owned()));
    }

    let capacity = match input.capacity {
        None => 0,
        Some(capacity) => u32::try_from(capacity).map_err(|_| {
            AppError::Validation("capacity must be between 0 and 4294967295".to_owned())
        })?,
    };

    let priority = match input.priority.as_deref().map(str::trim) {
        Some("") | None => ProductionQueuePriority::default(),
        Some(priority) => ProductionQueuePriority::from_str(priority)?,
    };
    let status = match input.status.as_deref().map(str::trim) {
        Some("") | None => ProductionQueueStatus::default(),
        Some(status) => ProductionQueueStatus::from_str(status)?,
    };

    Ok(ProductionQueue {
        id,
        name: name.to_owned(),
        capacity,
        work_centers: normalize_work_centers(&input.work_centers),
        priority,
        status,
        notes: input
            .notes
            .map(|notes| notes.trim().to_owned())
            .filter(|notes| !notes.is_empty()),
        metadata: input.metadata,
        created_at,
        updated_at,
    })
}
