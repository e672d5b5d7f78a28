use std::collections::BTreeMap;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Duration, Utc};
use sealworks_application::{
    PaymentWebhookEvent, STRIPE_EVENT_ID_HEADER, STRIPE_EVENT_TYPE_HEADER,
    STRIPE_SIGNATURE_HEADER, SignedDelivery,
};
use sealworks_core::AppError;
use serde::Deserialize;

use super::{WEBHOOK_BODY_LIMIT, admit_signed_delivery, hmac_sha256_matches, record_outcome};
use crate::error::{ApiError, ApiResult, error_detail};
use crate::request::read_body;
use crate::state::AppState;

const STRIPE_PROVIDER: &str = "stripe";
const STRIPE_WEBHOOK_PATH: &str = "/webhooks/payments/stripe";

/// Fields read from a verified event envelope.
#[derive(Debug, Default, Deserialize)]
struct StripeEnvelope {
    #[serde(default)]
    id: String,
    #[serde(default, rename = "type")]
    kind: String,
}

/// An envelope whose signature matched, with the signature that matched it.
#[derive(Debug)]
struct VerifiedEvent {
    envelope: StripeEnvelope,
    signature: String,
    signed_at: DateTime<Utc>,
}

/// `POST /webhooks/payments/stripe`
pub async fn stripe_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> ApiResult<StatusCode> {
    let started = Instant::now();
    let result = process_stripe_webhook(&state, &headers, body).await;
    record_outcome(&state, STRIPE_PROVIDER, started, &result).await;
    result
}

async fn process_stripe_webhook(
    state: &AppState,
    headers: &HeaderMap,
    body: Body,
) -> ApiResult<StatusCode> {
    let service = state.payment_service.as_ref().ok_or_else(|| {
        ApiError::unavailable("payment_service_unavailable", "payment service unavailable")
    })?;
    let Some(fetcher) = state.stripe_secret_fetcher.as_ref() else {
        return Err(secret_unavailable());
    };

    let body = read_body(body, WEBHOOK_BODY_LIMIT).await?;
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            ApiError::bad_request("missing_signature", "Stripe-Signature header is required")
        })?;

    let secret = fetcher.signing_secret().await.map_err(|error| {
        tracing::error!(error = %error, "failed to resolve stripe webhook secret");
        ApiError::unavailable(
            "secret_resolve_failed",
            "unable to resolve stripe webhook secret",
        )
    })?;
    let secret = secret.trim();
    if secret.is_empty() {
        return Err(secret_unavailable());
    }

    let VerifiedEvent {
        envelope,
        signature: matched,
        signed_at,
    } = verify_event(&body, signature, secret, state.stripe_tolerance, Utc::now())
        .map_err(|message| ApiError::bad_request("invalid_signature", message))?;
    admit_signed_delivery(
        state,
        SignedDelivery {
            signature: matched,
            signed_at,
            path: STRIPE_WEBHOOK_PATH.to_owned(),
        },
    )
    .await?;

    let mut forwarded =
        BTreeMap::from([(STRIPE_SIGNATURE_HEADER.to_owned(), signature.to_owned())]);
    if !envelope.id.is_empty() {
        forwarded.insert(STRIPE_EVENT_ID_HEADER.to_owned(), envelope.id.clone());
    }
    if !envelope.kind.is_empty() {
        forwarded.insert(STRIPE_EVENT_TYPE_HEADER.to_owned(), envelope.kind.clone());
    }

    let event = PaymentWebhookEvent {
        provider: STRIPE_PROVIDER.to_owned(),
        payload: body.to_vec(),
        headers: forwarded,
    };
    match service.record_webhook_event(event).await {
        Ok(()) => {
            tracing::info!(
                event_id = %envelope.id,
                event_type = %envelope.kind,
                "processed stripe webhook"
            );
            Ok(StatusCode::OK)
        }
        Err(AppError::NotFound(detail)) => {
            tracing::info!(
                event_id = %envelope.id,
                detail = %detail,
                "stripe event references an unknown payment"
            );
            Ok(StatusCode::ACCEPTED)
        }
        Err(error) => Err(map_payment_webhook_error(&error)),
    }
}

fn secret_unavailable() -> ApiError {
    ApiError::unavailable(
        "webhook_secret_unavailable",
        "stripe webhook secret is not configured",
    )
}

/// Checks a `t=<unix>,v1=<hex>[,v1=...]` header and returns the decoded envelope.
///
/// Any `v1` entry may match. Events older than `tolerance` are rejected; the
/// event's API version is not inspected.
fn verify_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<VerifiedEvent, String> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.trim().parse::<i64>().ok(),
            Some(("v1", value)) => {
                let value = value.trim();
                if let Ok(decoded) = hex::decode(value) {
                    signatures.push((value, decoded));
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| "signature header has no timestamp".to_owned())?;
    if signatures.is_empty() {
        return Err("signature header has no v1 signature".to_owned());
    }

    let signed_prefix = format!("{timestamp}.");
    let matched = signatures
        .iter()
        .find(|(_, decoded)| {
            hmac_sha256_matches(secret.as_bytes(), &[signed_prefix.as_bytes(), payload], decoded)
        })
        .map(|(raw, _)| raw.to_ascii_lowercase())
        .ok_or_else(|| {
            "no signatures found matching the expected signature for payload".to_owned()
        })?;

    let signed_at = DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| "signature timestamp is out of range".to_owned())?;
    if now - signed_at > tolerance {
        return Err("timestamp wasn't within tolerance".to_owned());
    }

    let envelope = serde_json::from_slice(payload)
        .map_err(|error| format!("failed to parse event: {error}"))?;
    Ok(VerifiedEvent {
        envelope,
        signature: matched,
        signed_at,
    })
}

fn map_payment_webhook_error(error: &AppError) -> ApiError {
    match error {
        AppError::Validation(_) => ApiError::invalid_request(error_detail(error)),
        AppError::Conflict(_) | AppError::InvalidState(_) => {
            ApiError::conflict("payment_conflict", error_detail(error))
        }
        AppError::Unavailable(_) => {
            ApiError::unavailable("payment_service_unavailable", "payment service unavailable")
        }
        _ => {
            tracing::error!(error = %error, "failed to process stripe webhook");
            ApiError::internal("payment_error", "failed to process webhook")
        }
    }
}

#[cfg(test)]
pub(super) fn sign_for_test(payload: &[u8], secret: &str, timestamp: i64) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac accepts any key length"));
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}
