use super::*;

/// `PUT /admin/orders/{id}:status`
pub async fn update_order_status_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(segment): Path<String>,
    body: Body,
) -> ApiResult<Json<OrderStatusTransitionResponse>> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let service = state.order_service.as_ref().ok_or_else(|| {
        ApiError::unavailable("order_service_unavailable", "order service unavailable")
    })?;
    let order_id = strip_action(&segment, "status")
        .ok_or_else(|| ApiError::not_found("not_found", "route not found"))?;

    let bytes = read_required_body(body, STATUS_BODY_LIMIT).await?;
    let request: OrderStatusTransitionRequest = decode_json(&bytes, "invalid_request")?;

    let target_status = parse_target(request.target_status)?;
    let expected_status = trimmed(request.expected_status)
        .map(|raw| OrderStatus::from_str(&raw))
        .transpose()
        .map_err(|error| ApiError::invalid_request(error_detail(&error)))?;

    let change = service
        .transition_status(OrderStatusCommand {
            order_id: order_id.to_owned(),
            target_status,
            expected_status,
        })
        .await
        .map_err(|error| {
            let detail = error_detail(&error);
            match error {
                AppError::Validation(_) => ApiError::invalid_request(detail),
                AppError::NotFound(_) => ApiError::not_found("order_not_found", detail),
                AppError::InvalidState(_) => ApiError::conflict("order_invalid_state", detail),
                AppError::Conflict(_) => ApiError::conflict("order_conflict", detail),
                other => ApiError::from(other),
            }
        })?;

    let record = status_audit(
        &identity,
        &change.order.id,
        change.previous_status,
        change.order.status,
        trimmed(request.reason),
        request.metadata,
    );
    record_audit(&state, record).await;

    tracing::info!(
        order_id = %change.order.id,
        from = %change.previous_status,
        to = %change.order.status,
        "order status transitioned"
    );
    Ok(Json(OrderStatusTransitionResponse {
        order: change.order.into(),
    }))
}

fn parse_target(raw: Option<String>) -> ApiResult<OrderStatus> {
    let raw = trimmed(raw).ok_or_else(|| ApiError::invalid_request("target_status is required"))?;
    let status = OrderStatus::from_str(&raw)
        .map_err(|error| ApiError::invalid_request(error_detail(&error)))?;
    if !status.is_admin_target() {
        return Err(ApiError::invalid_request(format!(
            "target_status {status} is not supported"
        )));
    }
    Ok(status)
}

fn status_audit(
    identity: &Identity,
    order_id: &str,
    before: OrderStatus,
    after: OrderStatus,
    reason: Option<String>,
    extra: Map<String, Value>,
) -> AuditLogRecord {
    let mut record = AuditLogRecord::new(
        identity.subject(),
        order_actor(identity),
        "order.status.transition",
        format!("/orders/{order_id}"),
    );
    record
        .diff
        .insert("status".to_owned(), AuditDiffValue::new(before.as_str(), after.as_str()));
    record.metadata.insert("fromStatus".to_owned(), json!(before.as_str()));
    record.metadata.insert("toStatus".to_owned(), json!(after.as_str()));
    if let Some(reason) = reason {
        record.metadata.insert("reason".to_owned(), json!(reason));
    }
    for (key, value) in extra {
        record.metadata.entry(key).or_insert(value);
    }
    record
}
