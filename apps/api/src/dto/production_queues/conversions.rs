use sealworks_application::ProductionQueueInput;
use sealworks_domain::{ProductionQueue, ProductionQueueWip};

use super::types::{ProductionQueueRequest, ProductionQueueResponse, ProductionQueueWipResponse};
use crate::dto::common::format_timestamp;

impl From<ProductionQueueRequest> for ProductionQueueInput {
    fn from(request: ProductionQueueRequest) -> Self {
        Self {
            id: request.id,
            name: request.name,
            capacity: request.capacity,
            work_centers: request.work_centers,
            priority: request.priority,
            status: request.status,
            notes: request.notes,
            metadata: request.metadata,
        }
    }
}

impl From<ProductionQueue> for ProductionQueueResponse {
    fn from(queue: ProductionQueue) -> Self {
        Self {
            id: queue.id,
            name: queue.name,
            capacity: queue.capacity,
            work_centers: queue.work_centers,
            priority: queue.priority.as_str().to_owned(),
            status: queue.status.as_str().to_owned(),
            notes: queue.notes,
            metadata: Some(queue.metadata).filter(|metadata| !metadata.is_empty()),
            created_at: format_timestamp(queue.created_at),
            updated_at: format_timestamp(queue.updated_at),
        }
    }
}

impl From<ProductionQueueWip> for ProductionQueueWipResponse {
    fn from(wip: ProductionQueueWip) -> Self {
        Self {
            queue_id: wip.queue_id,
            total: wip.total,
            counts: wip.status_counts,
            average_age_seconds: wip.average_age.num_seconds(),
            oldest_age_seconds: wip.oldest_age.num_seconds(),
            sla_breach_count: wip.sla_breach_count,
            generated_at: format_timestamp(wip.generated_at),
        }
    }
}
