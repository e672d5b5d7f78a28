use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

/// Order row in admin listings.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/order-summary-response.ts"
)]
pub struct OrderSummaryResponse {
    pub id: String,
    pub order_number: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    pub currency: String,
    #[ts(type = "number")]
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_queue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outstanding_tasks: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub on_hold: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,
}

/// Page of orders.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/order-list-response.ts"
)]
pub struct OrderListResponse {
    pub items: Vec<OrderSummaryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Admin status transition payload.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/order-status-transition-request.ts"
)]
pub struct OrderStatusTransitionRequest {
    #[serde(default)]
    pub target_status: Option<String>,
    #[serde(default)]
    pub expected_status: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[ts(type = "Record<string, unknown>")]
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Order after a status transition.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/order-status-transition-response.ts"
)]
pub struct OrderStatusTransitionResponse {
    pub order: OrderSummaryResponse,
}

/// Line item allocated to a shipment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/shipment-item-dto.ts"
)]
pub struct ShipmentItemDto {
    pub sku: String,
    pub quantity: u32,
}

/// Package dimensions for a shipment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/shipment-package-dto.ts"
)]
pub struct ShipmentPackageDto {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/shipment-create-request.ts"
)]
pub struct ShipmentCreateRequest {
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub service_level: Option<String>,
    #[serde(default)]
    pub manual_tracking_code: Option<String>,
    #[serde(default)]
    pub expected_delivery: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub package: Option<ShipmentPackageDto>,
    #[serde(default)]
    pub items: Vec<ShipmentItemDto>,
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/shipment-update-request.ts"
)]
pub struct ShipmentUpdateRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tracking_code: Option<String>,
    #[serde(default)]
    pub expected_delivery: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub if_unmodified_since: Option<String>,
}

/// Tracking event recorded against a shipment.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/shipment-event-response.ts"
)]
pub struct ShipmentEventResponse {
    pub status: String,
    pub occurred_at: String,
    #[ts(type = "Record<string, unknown>")]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/shipment-response.ts"
)]
pub struct ShipmentResponse {
    pub id: String,
    pub carrier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_level: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_delivery: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub items: Vec<ShipmentItemDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<ShipmentPackageDto>,
    pub events: Vec<ShipmentEventResponse>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/shipment-envelope-response.ts"
)]
pub struct ShipmentEnvelopeResponse {
    pub shipment: ShipmentResponse,
}

/// Manual capture or refund request.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/payment-action-request.ts"
)]
pub struct PaymentActionRequest {
    #[serde(default)]
    pub payment_id: String,
    #[ts(type = "number | null")]
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
    #[ts(type = "Record<string, unknown>")]
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/payment-response.ts"
)]
pub struct PaymentResponse {
    pub id: String,
    pub provider: String,
    pub status: String,
    #[ts(type = "number")]
    pub amount: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub captured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refunded_at: Option<String>,
    #[ts(type = "number")]
    pub refunded_amount: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Order-level payment totals after an adjustment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/payment-summary-response.ts"
)]
pub struct PaymentSummaryResponse {
    pub status: String,
    #[ts(type = "number")]
    pub captured_amount: i64,
    #[ts(type = "number")]
    pub refunded_amount: i64,
    #[ts(type = "number")]
    pub balance_due: i64,
    pub updated_at: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/payment-action-response.ts"
)]
pub struct PaymentActionResponse {
    pub payment: PaymentResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_summary: Option<PaymentSummaryResponse>,
}
