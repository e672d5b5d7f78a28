use super::*;

#[derive(Clone, Copy)]
enum PaymentAction {
    Capture,
    Refund,
}

/// `POST /admin/orders/{id}/payments:manual-capture`
pub async fn manual_capture_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(order_id): Path<String>,
    body: Body,
) -> ApiResult<Json<PaymentActionResponse>> {
    handle_payment_action(&state, &identity, &order_id, body, PaymentAction::Capture).await
}

/// `POST /admin/orders/{id}/payments:refund`
pub async fn refund_payment_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(order_id): Path<String>,
    body: Body,
) -> ApiResult<Json<PaymentActionResponse>> {
    handle_payment_action(&state, &identity, &order_id, body, PaymentAction::Refund).await
}

async fn handle_payment_action(
    state: &AppState,
    identity: &Identity,
    order_id: &str,
    body: Body,
    action: PaymentAction,
) -> ApiResult<Json<PaymentActionResponse>> {
    let service = state.payment_service.as_ref().ok_or_else(payment_unavailable)?;
    require_roles(identity, ADMIN_OR_STAFF)?;
    let order_id = required_order_id(order_id)?;

    let bytes = read_required_body(body, PAYMENT_BODY_LIMIT).await?;
    let request: PaymentActionRequest = decode_json(&bytes, "invalid_request")?;
    let payment_id = request.payment_id.trim();
    if payment_id.is_empty() {
        return Err(ApiError::invalid_request("payment_id is required"));
    }
    if request.amount.is_some_and(|amount| amount <= 0) {
        return Err(ApiError::invalid_request("amount must be positive"));
    }

    let adjustment = PaymentAdjustment {
        order_id: order_id.to_owned(),
        payment_id: payment_id.to_owned(),
        amount: request.amount,
        reason: trimmed(request.reason),
        idempotency_key: trimmed(request.idempotency_key),
        metadata: request.metadata,
    };
    let change = match action {
        PaymentAction::Capture => service.manual_capture(adjustment).await,
        PaymentAction::Refund => service.refund(adjustment).await,
    }
    .map_err(map_payment_error)?;

    tracing::info!(
        order_id = %order_id,
        payment_id = %change.payment.id,
        status = %change.payment.status,
        actor = identity.subject(),
        "payment adjusted"
    );
    Ok(Json(PaymentActionResponse {
        payment: change.payment.into(),
        payment_summary: payment_summary(state, order_id).await,
    }))
}

async fn payment_summary(state: &AppState, order_id: &str) -> Option<PaymentSummaryResponse> {
    let service = state.order_service.as_ref()?;
    match service.get_order(order_id).await {
        Ok(order) => Some(PaymentSummaryResponse::from_order(&order)),
        Err(error) => {
            tracing::warn!(order_id = %order_id, error = %error, "failed to load payment summary");
            None
        }
    }
}

fn payment_unavailable() -> ApiError {
    ApiError::unavailable("payment_service_unavailable", "payment service unavailable")
}

fn map_payment_error(error: AppError) -> ApiError {
    let detail = error_detail(&error);
    match error {
        AppError::Validation(_) => ApiError::invalid_request(detail),
        AppError::NotFound(_) => ApiError::not_found("payment_not_found", "payment not found"),
        AppError::InvalidState(_) => ApiError::conflict("payment_invalid_state", detail),
        AppError::Conflict(_) => ApiError::conflict("payment_conflict", detail),
        AppError::Unavailable(_) => payment_unavailable(),
        other => {
            tracing::error!(error = %other, "payment operation failed");
            ApiError::internal("payment_error", "failed to process payment request")
        }
    }
}
