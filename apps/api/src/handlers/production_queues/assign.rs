use super::*;

/// `POST /admin/production-queues/{id}:assign-order`
pub async fn assign_order_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(segment): Path<String>,
    body: Body,
) -> ApiResult<Json<QueueAssignmentResponse>> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let service = queue_service(&state)?;
    let queue_id = strip_action(&segment, "assign-order")
        .ok_or_else(|| ApiError::not_found("not_found", "route not found"))?;

    let bytes = read_required_body(body, ASSIGNMENT_BODY_LIMIT).await?;
    let request: QueueAssignmentRequest = decode_json(&bytes, "invalid_request")?;
    let assignment = build_assignment(queue_id, request)?;

    let order = match service.assign_order(assignment).await {
        Ok(order) => order,
        Err(error @ AppError::NotFound(_)) => {
            // The queue is resolved first, so a missing queue surfaces here too.
            service.get_queue(queue_id).await.map_err(map_queue_error)?;
            return Err(ApiError::not_found("order_not_found", error_detail(&error)));
        }
        Err(other) => return Err(map_queue_error(other)),
    };

    tracing::info!(queue_id = %queue_id, order_id = %order.id, "order assigned to production queue");
    Ok(Json(QueueAssignmentResponse {
        order: order.into(),
    }))
}

fn build_assignment(queue_id: &str, request: QueueAssignmentRequest) -> ApiResult<QueueAssignment> {
    let order_id = request.order_id.trim();
    if order_id.is_empty() {
        return Err(ApiError::invalid_request("order_id is required"));
    }

    let expected_status = trimmed(request.expected_status)
        .map(|raw| OrderStatus::from_str(&raw))
        .transpose()
        .map_err(|error| ApiError::invalid_request(error_detail(&error)))?;
    let if_unmodified_since = optional_timestamp(
        request.if_unmodified_since.as_deref(),
        "invalid_request",
        "if_unmodified_since",
    )?;

    Ok(QueueAssignment {
        queue_id: queue_id.to_owned(),
        order_id: order_id.to_owned(),
        expected_status,
        expected_queue_id: trimmed(request.expected_queue_id),
        if_unmodified_since,
    })
}
