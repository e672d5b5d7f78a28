//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod ai;
mod audit;
mod counter;
mod order;
mod pagination;
mod payment;
mod production_queue;
mod redaction;
mod shipment;

pub use ai::{
    AiCompletionResult, AiJob, AiJobCompletion, AiJobError, AiJobStatus, AiSuggestion,
    SuggestionReadyNotification,
};
pub use audit::{
    AuditDiff, AuditDiffValue, AuditLogEntry, AuditLogFilter, AuditLogRecord,
    normalize_sensitive_keys, split_sensitive,
};
pub use counter::{
    CounterName, CounterOptions, CounterOptionsInput, CounterValue, DEFAULT_COUNTER_SEGMENT,
    MAX_COUNTER_PAD_LENGTH, counter_key, is_counter_scope_token, is_counter_segment_token,
    parse_counter_name, segment_from_scope,
};
pub use order::{
    ADMIN_STATUS_TRANSITIONS, ADMIN_TARGET_STATUSES, Order, OrderStatus, check_admin_transition,
    dedupe_preserving_order,
};
pub use pagination::{CursorPage, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageRequest, clamp_page_size};
pub use payment::{Payment, PaymentStatus};
pub use production_queue::{
    ProductionQueue, ProductionQueuePriority, ProductionQueueStatus, ProductionQueueWip,
    normalize_status_count_key, normalize_work_centers,
};
pub use redaction::{actor_type, mask_email, mask_phone};
pub use shipment::{
    CarrierShipmentEvent, SHIPMENT_STATUS_ARRIVED_HUB, SHIPMENT_STATUS_CANCELED,
    SHIPMENT_STATUS_DELIVERED, SHIPMENT_STATUS_EXCEPTION, SHIPMENT_STATUS_IN_TRANSIT,
    SHIPMENT_STATUS_LABEL_CREATED, SHIPMENT_STATUS_OUT_FOR_DELIVERY, SHIPMENT_STATUS_PICKED_UP,
    SHIPMENT_STATUS_RETURN_TO_SENDER, SHIPMENT_STATUSES, Shipment, ShipmentEvent, ShipmentItem,
    ShipmentPackage, is_known_shipment_status,
};
