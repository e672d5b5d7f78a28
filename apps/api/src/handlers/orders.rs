use std::str::FromStr;

use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use sealworks_application::{
    OrderFilter, OrderSortField, OrderStatusCommand, PaymentAdjustment, ShipmentDraft,
    ShipmentUpdate, SortDirection,
};
use sealworks_core::{AppError, Identity};
use sealworks_domain::{AuditDiffValue, AuditLogRecord, OrderStatus, PageRequest, Shipment, actor_type};
use serde_json::{Map, Value, json};

use super::audit_trail::record_audit;
use crate::dto::common::format_optional_timestamp;
use crate::dto::{
    OrderListResponse, OrderStatusTransitionRequest, OrderStatusTransitionResponse,
    OrderSummaryResponse, PaymentActionRequest, PaymentActionResponse, PaymentSummaryResponse,
    ShipmentCreateRequest, ShipmentEnvelopeResponse, ShipmentUpdateRequest,
};
use crate::error::{ApiError, ApiResult, error_detail};
use crate::request::{
    ADMIN_OR_STAFF, QueryParams, decode_json, optional_timestamp, parse_page_size,
    read_required_body, require_roles, strip_action, trimmed,
};
use crate::state::AppState;

mod list;
mod payments;
mod shipments;
mod status;

pub use list::{get_order_handler, list_orders_handler};
pub use payments::{manual_capture_handler, refund_payment_handler};
pub use shipments::{create_shipment_handler, update_shipment_handler};
pub use status::update_order_status_handler;

const STATUS_BODY_LIMIT: usize = 4 * 1024;
const SHIPMENT_BODY_LIMIT: usize = 6 * 1024;
const PAYMENT_BODY_LIMIT: usize = 8 * 1024;

fn order_actor(identity: &Identity) -> String {
    actor_type(identity, "staff")
}

fn required_order_id(raw: &str) -> ApiResult<&str> {
    let order_id = raw.trim();
    if order_id.is_empty() {
        return Err(ApiError::invalid_request("order id is required"));
    }
    Ok(order_id)
}
