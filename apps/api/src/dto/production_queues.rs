mod conversions;
mod types;

pub use types::{
    ProductionQueueListResponse, ProductionQueueRequest, ProductionQueueResponse,
    ProductionQueueWipResponse, QueueAssignmentRequest, QueueAssignmentResponse,
};
