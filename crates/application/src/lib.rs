//! Application services and ports.

#![forbid(unsafe_code)]

mod ai_job_service;
mod audit_log_service;
mod auth_ports;
mod counter_service;
mod id_generator;
mod order_ports;
mod order_service;
mod payment_service;
mod production_queue_service;
mod shipment_service;
#[cfg(test)]
mod test_support;
mod webhook_security_service;

pub use ai_job_service::{
    AiJobRepository, AiJobService, AiSuggestionNotifier, DEFAULT_SUGGESTION_STATUS,
};
pub use audit_log_service::{AuditLogRepository, AuditLogService, hash_ip};
pub use auth_ports::Authenticator;
pub use counter_service::{CounterRepository, CounterService};
pub use id_generator::{IdGenerator, PrefixedIdGenerator, UuidV7Generator};
pub use order_ports::{
    OrderFilter, OrderRepository, OrderSortField, SortDirection, check_queue_capacity,
};
pub use order_service::{OrderService, OrderStatusChange, OrderStatusCommand};
pub use payment_service::{
    PaymentAdjustment, PaymentChange, PaymentEventLedger, PaymentService, PaymentWebhookEvent,
    STRIPE_EVENT_ID_HEADER, STRIPE_EVENT_TYPE_HEADER, STRIPE_SIGNATURE_HEADER,
    StripeSecretFetcher,
};
pub use production_queue_service::{
    DEFAULT_QUEUE_SLA_HOURS, ProductionQueueFilter, ProductionQueueInput,
    ProductionQueueRepository, ProductionQueueService, QueueAssignment, QueueDepthRecorder,
};
pub use shipment_service::{ShipmentChange, ShipmentDraft, ShipmentService, ShipmentUpdate};
pub use webhook_security_service::{
    DEFAULT_REPLAY_TTL_SECONDS, SignedDelivery, WebhookMetricsRecorder, WebhookReplayGuard,
    WebhookReplayStore,
};
