use super::*;

pub async fn create_shipment_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(order_id): Path<String>,
    body: Body,
) -> ApiResult<(StatusCode, Json<ShipmentEnvelopeResponse>)> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let service = state.shipment_service.as_ref().ok_or_else(shipment_unavailable)?;
    let order_id = required_order_id(&order_id)?;

    let bytes = read_required_body(body, SHIPMENT_BODY_LIMIT).await?;
    let request: ShipmentCreateRequest = decode_json(&bytes, "invalid_request")?;
    if request.carrier.trim().is_empty() {
        return Err(ApiError::invalid_request("carrier is required"));
    }
    let eta = optional_timestamp(
        request.expected_delivery.as_deref(),
        "invalid_expected_delivery",
        "expected_delivery",
    )?;

    let (_, shipment) = service
        .create_shipment(ShipmentDraft {
            order_id: order_id.to_owned(),
            carrier: request.carrier,
            service_level: request.service_level,
            tracking_code: request.manual_tracking_code,
            eta,
            notes: request.notes,
            items: request.items.into_iter().map(Into::into).collect(),
            package: request.package.map(Into::into),
        })
        .await
        .map_err(map_shipment_error)?;

    tracing::info!(order_id = %order_id, shipment_id = %shipment.id, "shipment created");
    Ok((
        StatusCode::CREATED,
        Json(ShipmentEnvelopeResponse {
            shipment: shipment.into(),
        }),
    ))
}

pub async fn update_shipment_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((order_id, shipment_id)): Path<(String, String)>,
    body: Body,
) -> ApiResult<Json<ShipmentEnvelopeResponse>> {
    require_roles(&identity, ADMIN_OR_STAFF)?;
    let service = state.shipment_service.as_ref().ok_or_else(shipment_unavailable)?;
    let order_id = required_order_id(&order_id)?;
    let shipment_id = shipment_id.trim();
    if shipment_id.is_empty() {
        return Err(ApiError::invalid_request("shipment id is required"));
    }

    let bytes = read_required_body(body, SHIPMENT_BODY_LIMIT).await?;
    let request: ShipmentUpdateRequest = decode_json(&bytes, "invalid_request")?;
    let status = trimmed(request.status)
        .ok_or_else(|| ApiError::bad_request("invalid_status", "status is required"))?;
    let eta = optional_timestamp(
        request.expected_delivery.as_deref(),
        "invalid_expected_delivery",
        "expected_delivery",
    )?;
    let if_unmodified_since = optional_timestamp(
        request.if_unmodified_since.as_deref(),
        "invalid_if_unmodified_since",
        "if_unmodified_since",
    )?;

    let change = service
        .update_shipment(ShipmentUpdate {
            order_id: order_id.to_owned(),
            shipment_id: shipment_id.to_owned(),
            status: Some(status),
            tracking_code: request.tracking_code,
            eta,
            notes: request.notes,
            if_unmodified_since,
        })
        .await
        .map_err(map_shipment_error)?;

    if change.is_effective()
        && let Some(record) = shipment_audit(&identity, order_id, &change.previous, &change.shipment)
    {
        record_audit(&state, record).await;
    }

    Ok(Json(ShipmentEnvelopeResponse {
        shipment: change.shipment.into(),
    }))
}

fn shipment_unavailable() -> ApiError {
    ApiError::unavailable("shipment_service_unavailable", "shipment service unavailable")
}

fn map_shipment_error(error: AppError) -> ApiError {
    let detail = error_detail(&error);
    match error {
        AppError::Validation(_) => ApiError::invalid_request(detail),
        AppError::NotFound(_) => ApiError::not_found("shipment_not_found", detail),
        AppError::Conflict(_) => ApiError::conflict("shipment_conflict", detail),
        AppError::InvalidState(_) => ApiError::conflict("shipment_invalid_state", detail),
        AppError::Unavailable(_) => shipment_unavailable(),
        other => {
            tracing::error!(error = %other, "shipment operation failed");
            ApiError::internal("shipment_error", "failed to process shipment request")
        }
    }
}

/// Builds the audit entry for the tracked fields that changed, if any did.
fn shipment_audit(
    identity: &Identity,
    order_id: &str,
    before: &Shipment,
    after: &Shipment,
) -> Option<AuditLogRecord> {
    let tracked = |shipment: &Shipment| {
        [
            ("status", shipment.status.clone()),
            ("tracking_code", shipment.tracking_code.clone().unwrap_or_default()),
            (
                "expected_delivery",
                format_optional_timestamp(shipment.eta).unwrap_or_default(),
            ),
            ("note", shipment.notes.clone().unwrap_or_default()),
        ]
    };

    let current = tracked(after);
    let mut record = AuditLogRecord::new(
        identity.subject(),
        order_actor(identity),
        "order.shipment.update",
        format!("/orders/{order_id}/shipments/{}", after.id),
    );
    for ((field, old), (_, new)) in tracked(before).into_iter().zip(current.iter()) {
        if old != *new {
            record
                .diff
                .insert(field.to_owned(), AuditDiffValue::new(old, new.clone()));
        }
    }
    if record.diff.is_empty() {
        return None;
    }

    record.metadata.insert("shipmentId".to_owned(), json!(after.id));
    record.metadata.insert("status".to_owned(), json!(after.status));
    let [_, (_, tracking), (_, expected), (_, note)] = current;
    for (key, value) in [
        ("trackingNumber", tracking),
        ("expectedDelivery", expected),
        ("note", note),
    ] {
        if !value.is_empty() {
            record.metadata.insert(key.to_owned(), json!(value));
        }
    }
    Some(record)
}
