use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sealworks_core::{AppError, Identity, Role, ServiceIdentity};
use sealworks_domain::{AuditLogFilter, AuditLogRecord, PageRequest};

use crate::dto::{
    AuditLogEntryResponse, AuditLogListResponse, AuditLogWriteRequest, AuditLogWriteResponse,
};
use crate::error::{ApiError, ApiResult, error_detail};
use crate::request::{
    ADMIN_OR_STAFF, QueryParams, decode_json, optional_timestamp, parse_page_size,
    read_required_body, require_roles, trimmed,
};
use crate::state::AppState;

mod csv_export;
mod internal;
mod list;

pub use internal::write_internal_audit_log_handler;
pub use list::list_audit_logs_handler;
