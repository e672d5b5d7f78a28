mod audit_logs;
pub(crate) mod common;
mod counters;
mod orders;
mod production_queues;
mod webhooks;

pub use audit_logs::{
    AuditDiffValueDto, AuditLogEntryResponse, AuditLogListResponse, AuditLogWriteRequest,
    AuditLogWriteResponse,
};
pub use common::HealthResponse;
pub use counters::{CounterNextRequest, CounterNextResponse};
pub use orders::{
    OrderListResponse, OrderStatusTransitionRequest, OrderStatusTransitionResponse,
    OrderSummaryResponse, PaymentActionRequest, PaymentActionResponse, PaymentResponse,
    PaymentSummaryResponse, ShipmentCreateRequest, ShipmentEnvelopeResponse,
    ShipmentEventResponse, ShipmentItemDto, ShipmentPackageDto, ShipmentResponse,
    ShipmentUpdateRequest,
};
pub use production_queues::{
    ProductionQueueListResponse, ProductionQueueRequest, ProductionQueueResponse,
    ProductionQueueWipResponse, QueueAssignmentRequest, QueueAssignmentResponse,
};
pub use webhooks::{AiWorkerCallbackRequest, AiWorkerErrorDto, AiWorkerSuggestionDto};
