use super::*;

const AUDIT_WRITE_BODY_LIMIT: usize = 16 * 1024;

pub async fn write_internal_audit_log_handler(
    State(state): State<AppState>,
    Extension(service_identity): Extension<ServiceIdentity>,
    body: Body,
) -> ApiResult<(StatusCode, Json<AuditLogWriteResponse>)> {
    let service = state.audit_log_service.as_ref().ok_or_else(|| {
        ApiError::unavailable("service_unavailable", "audit log service unavailable")
    })?;

    let bytes = read_required_body(body, AUDIT_WRITE_BODY_LIMIT).await?;
    let payload: AuditLogWriteRequest = decode_json(&bytes, "invalid_request")?;
    let record = build_record(payload)?;
    let action = record.action.clone();

    let entry = service.record(record).await.map_err(|error| match error {
        AppError::Validation(_) => ApiError::invalid_request(error_detail(&error)),
        other => {
            tracing::error!(
                service = service_identity.name(),
                action = %action,
                error = %other,
                "failed to append audit log"
            );
            ApiError::internal("audit_log_failed", "failed to record audit log")
        }
    })?;

    tracing::debug!(
        service = service_identity.name(),
        id = %entry.id,
        action = %entry.action,
        "internal audit log appended"
    );
    Ok((
        StatusCode::CREATED,
        Json(AuditLogWriteResponse { id: entry.id }),
    ))
}

fn build_record(payload: AuditLogWriteRequest) -> ApiResult<AuditLogRecord> {
    let actor = payload.actor.trim();
    let action = payload.action.trim();
    let target_ref = payload.target_ref.trim();
    if actor.is_empty() || action.is_empty() || target_ref.is_empty() {
        return Err(ApiError::invalid_request(
            "actor, action, and targetRef are required",
        ));
    }

    let occurred_at = optional_timestamp(
        trimmed(payload.occurred_at).as_deref(),
        "invalid_request",
        "occurredAt",
    )?;
    let actor_type = trimmed(payload.actor_type).unwrap_or_else(|| "service".to_owned());

    let mut record = AuditLogRecord::new(actor, actor_type, action, target_ref);
    record.severity = trimmed(payload.severity);
    record.request_id = trimmed(payload.request_id);
    record.occurred_at = occurred_at;
    record.metadata = payload.metadata;
    record.diff = payload
        .diff
        .into_iter()
        .map(|(key, value)| (key, value.into()))
        .collect();
    record.sensitive_metadata_keys = payload.sensitive_metadata_keys;
    record.sensitive_diff_keys = payload.sensitive_diff_keys;
    record.ip_address = trimmed(payload.ip_address);
    record.user_agent = trimmed(payload.user_agent);
    Ok(record)
}
