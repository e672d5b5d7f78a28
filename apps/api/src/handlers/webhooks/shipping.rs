use std::net::SocketAddr;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use sealworks_application::SignedDelivery;
use sealworks_core::AppError;

use super::{WEBHOOK_BODY_LIMIT, admit_signed_delivery, record_outcome};
use crate::error::{ApiError, ApiResult, error_detail};
use crate::request::{RemoteAddr, read_body};
use crate::state::AppState;

mod auth;
mod carriers;
mod parsers;

use auth::authenticate_carrier;
use carriers::Carrier;
use parsers::parse_carrier_event;

/// `POST /webhooks/shipping/{carrier}`
///
/// Events for shipments this system does not know are acknowledged with 202
/// so carrier retry loops stop.
pub async fn shipping_webhook_handler(
    State(state): State<AppState>,
    Path(carrier): Path<String>,
    RemoteAddr(remote): RemoteAddr,
    headers: HeaderMap,
    body: Body,
) -> ApiResult<StatusCode> {
    let started = Instant::now();
    let result = process_carrier_webhook(&state, &carrier, remote, &headers, body).await;
    record_outcome(&state, "shipping", started, &result).await;
    result
}

async fn process_carrier_webhook(
    state: &AppState,
    carrier: &str,
    remote: Option<SocketAddr>,
    headers: &HeaderMap,
    body: Body,
) -> ApiResult<StatusCode> {
    let service = state.shipment_service.as_ref().ok_or_else(|| {
        ApiError::unavailable(
            "shipment_service_unavailable",
            "shipment service unavailable",
        )
    })?;
    let carrier = Carrier::from_path(carrier).ok_or_else(|| {
        ApiError::not_found(
            "unsupported_carrier",
            format!("carrier '{}' is not supported", carriers::normalize_carrier_key(carrier)),
        )
    })?;

    let body = read_body(body, WEBHOOK_BODY_LIMIT).await?;
    let signature =
        authenticate_carrier(carrier, &state.shipping_webhooks, headers, remote, &body)
            .inspect_err(|error| {
                tracing::warn!(
                    carrier = carrier.key(),
                    code = error.code(),
                    "carrier webhook rejected"
                );
            })?;
    if let Some(signature) = signature {
        admit_signed_delivery(
            state,
            SignedDelivery {
                signature,
                signed_at: DateTime::<Utc>::UNIX_EPOCH,
                path: format!("/webhooks/shipping/{}", carrier.key()),
            },
        )
        .await?;
    }
    let event = parse_carrier_event(carrier, &body, Utc::now())?;

    let tracking_code = event.tracking_code.clone();
    match service.record_carrier_event(event).await {
        Ok(shipment) => {
            tracing::info!(
                carrier = carrier.key(),
                tracking_code = %tracking_code,
                shipment_id = %shipment.id,
                status = %shipment.status,
                "recorded carrier shipment event"
            );
            Ok(StatusCode::OK)
        }
        Err(AppError::NotFound(detail)) => {
            tracing::info!(
                carrier = carrier.key(),
                tracking_code = %tracking_code,
                detail = %detail,
                "acknowledged carrier event for unknown shipment"
            );
            Ok(StatusCode::ACCEPTED)
        }
        Err(error) => Err(map_shipment_event_error(&error)),
    }
}

fn map_shipment_event_error(error: &AppError) -> ApiError {
    match error {
        AppError::Validation(_) => ApiError::invalid_request(error_detail(error)),
        AppError::Conflict(_) | AppError::InvalidState(_) => {
            ApiError::conflict("shipment_conflict", error_detail(error))
        }
        _ => {
            tracing::error!(error = %error, "failed to record shipment event");
            ApiError::internal("shipment_event_failed", "failed to record shipment event")
        }
    }
}
