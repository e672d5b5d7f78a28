use std::str::FromStr;

use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use sealworks_application::{ProductionQueueFilter, ProductionQueueService, QueueAssignment};
use sealworks_core::{AppError, Identity};
use sealworks_domain::{
    AuditDiffValue, AuditLogRecord, OrderStatus, PageRequest, ProductionQueue,
    ProductionQueuePriority, ProductionQueueStatus, actor_type,
};
use serde_json::json;

use super::audit_trail::record_audit;
use crate::dto::{
    ProductionQueueListResponse, ProductionQueueRequest, ProductionQueueResponse,
    ProductionQueueWipResponse, QueueAssignmentRequest, QueueAssignmentResponse,
};
use crate::error::{ApiError, ApiResult, error_detail};
use crate::request::{
    ADMIN_OR_STAFF, QueryParams, decode_json, optional_timestamp, parse_page_size,
    read_required_body, require_roles, strip_action, trimmed,
};
use crate::state::AppState;

mod assign;
mod crud;
mod wip;

pub use assign::assign_order_handler;
pub use crud::{
    create_queue_handler, delete_queue_handler, get_queue_handler, list_queues_handler,
    update_queue_handler,
};
pub use wip::queue_wip_handler;

const QUEUE_BODY_LIMIT: usize = 32 * 1024;
const ASSIGNMENT_BODY_LIMIT: usize = 4 * 1024;

fn queue_service(state: &AppState) -> ApiResult<&ProductionQueueService> {
    state.production_queue_service.as_ref().ok_or_else(|| {
        ApiError::unavailable(
            "queue_service_unavailable",
            "production queue service unavailable",
        )
    })
}

fn map_queue_error(error: AppError) -> ApiError {
    let detail = error_detail(&error);
    match error {
        AppError::Validation(_) => ApiError::bad_request("invalid_queue", detail),
        AppError::NotFound(_) => ApiError::not_found("queue_not_found", detail),
        AppError::Conflict(_) | AppError::InvalidState(_) => {
            ApiError::conflict("queue_conflict", detail)
        }
        AppError::InUse(_) => ApiError::conflict("queue_has_assignments", detail),
        AppError::Unavailable(_) => {
            ApiError::unavailable("queue_repository_unavailable", detail)
        }
        other => {
            tracing::error!(error = %other, "production queue operation failed");
            ApiError::internal("queue_operation_failed", "production queue operation failed")
        }
    }
}

fn queue_audit(identity: &Identity, action: &str, queue_id: &str) -> AuditLogRecord {
    AuditLogRecord::new(
        identity.subject(),
        actor_type(identity, "staff"),
        action,
        format!("/production-queues/{queue_id}"),
    )
}
