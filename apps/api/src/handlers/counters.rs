use std::collections::BTreeMap;

use axum::Json;
use axum::body::Body;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use sealworks_core::{AppError, Identity};
use sealworks_domain::{
    AuditLogRecord, CounterName, CounterOptions, CounterOptionsInput, DEFAULT_COUNTER_SEGMENT,
    actor_type, is_counter_scope_token, parse_counter_name, segment_from_scope,
};
use serde_json::{Map, Value, json};

use super::audit_trail::record_audit;
use crate::dto::{CounterNextRequest, CounterNextResponse};
use crate::error::{ApiError, ApiResult, error_detail};
use crate::request::{ADMIN_OR_STAFF, decode_optional_json, read_body, require_roles, strip_action};
use crate::state::AppState;

const COUNTER_BODY_LIMIT: usize = 2 * 1024;

/// `POST /admin/counters/{name}:next`
pub async fn next_counter_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(counter): Path<String>,
    body: Body,
) -> ApiResult<Json<CounterNextResponse>> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let service = state.counter_service.as_ref().ok_or_else(|| {
        ApiError::unavailable("counter_service_unavailable", "counter service unavailable")
    })?;

    let name = strip_action(&counter, "next")
        .ok_or_else(|| ApiError::not_found("not_found", "route not found"))?;
    let CounterName { scope, segment } = parse_counter_name(name)
        .map_err(|error| ApiError::bad_request("invalid_counter", error_detail(&error)))?;

    if !scope_allowed(&state, &scope) {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "counter_not_allowed",
            format!("counter scope '{scope}' is not allowed"),
        ));
    }

    let bytes = read_body(body, COUNTER_BODY_LIMIT).await?;
    let payload: CounterNextRequest = decode_optional_json(&bytes, "invalid_json")?;

    let segment = match payload.scope.as_ref() {
        Some(value) => scope_segment(value)?.or(segment),
        None => segment,
    }
    .unwrap_or_else(|| DEFAULT_COUNTER_SEGMENT.to_owned());

    let requested_step = payload.step;
    let options = CounterOptions::from_input(CounterOptionsInput {
        step: payload.step,
        max_value: payload.max_value,
        initial_value: payload.initial_value,
        prefix: payload.prefix,
        suffix: payload.suffix,
        pad_length: payload.pad_length,
    })
    .map_err(|error| ApiError::bad_request("invalid_counter_options", error_detail(&error)))?;

    let value = service
        .next(&scope, Some(&segment), &options)
        .await
        .map_err(|error| match error {
            AppError::Validation(_) => {
                ApiError::bad_request("invalid_counter_request", error_detail(&error))
            }
            AppError::Exhausted(_) => ApiError::conflict("counter_exhausted", error_detail(&error)),
            other => {
                tracing::error!(scope = %scope, segment = %segment, error = %other, "counter next failed");
                ApiError::internal("counter_next_failed", "failed to advance counter")
            }
        })?;

    let mut metadata = Map::new();
    metadata.insert("scope".to_owned(), json!(scope));
    metadata.insert("segment".to_owned(), json!(segment));
    metadata.insert("value".to_owned(), json!(value.value));
    metadata.insert("formatted".to_owned(), json!(value.formatted));
    if let Some(step) = requested_step.filter(|step| *step > 0) {
        metadata.insert("step".to_owned(), json!(step));
    }

    let mut record = AuditLogRecord::new(
        identity.subject(),
        actor_type(&identity, "user"),
        "counter.next",
        format!("/counters/{scope}:{segment}"),
    );
    record.metadata = metadata;
    record_audit(&state, record).await;

    Ok(Json(CounterNextResponse {
        number: value.formatted,
    }))
}

fn scope_allowed(state: &AppState, scope: &str) -> bool {
    let allowed = state.counter_allowed_scopes.as_ref();
    allowed.is_empty() || allowed.contains(&scope.to_ascii_lowercase())
}

/// Derives a segment from a body `scope` object of scalar values.
fn scope_segment(value: &Value) -> ApiResult<Option<String>> {
    let invalid = || ApiError::bad_request("invalid_scope", "scope must be an object of scalar values");
    let object = match value {
        Value::Null => return Ok(None),
        Value::Object(object) => object,
        _ => return Err(invalid()),
    };

    let mut pairs = BTreeMap::new();
    for (key, value) in object {
        let rendered = match value {
            Value::String(text) => text.trim().to_owned(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => return Err(invalid()),
        };
        let key = key.trim();
        if rendered.is_empty() || key.is_empty() {
            return Err(ApiError::bad_request(
                "invalid_scope",
                format!("scope entry '{key}' must have a non-blank key and value"),
            ));
        }
        if !is_counter_scope_token(key) || !is_counter_scope_token(&rendered) {
            return Err(ApiError::bad_request(
                "invalid_scope",
                format!("scope entry '{key}' has invalid characters"),
            ));
        }
        pairs.insert(key.to_owned(), rendered);
    }

    Ok(segment_from_scope(&pairs))
}
