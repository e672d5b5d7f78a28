//! Inbound webhooks. None of these routes run the bearer-token gate; each
//! sender proves itself with its own credential.

use std::time::Instant;

use axum::http::StatusCode;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sealworks_application::SignedDelivery;
use sealworks_core::AppError;
use sha2::Sha256;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

mod ai_worker;
mod shipping;
mod stripe;

pub use ai_worker::ai_worker_callback_handler;
pub use shipping::shipping_webhook_handler;
pub use stripe::stripe_webhook_handler;

const WEBHOOK_BODY_LIMIT: usize = 64 * 1024;

type HmacSha256 = Hmac<Sha256>;

/// Constant-time check of `expected` against HMAC-SHA256 over the concatenated parts.
pub(crate) fn hmac_sha256_matches(secret: &[u8], parts: &[&[u8]], expected: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    for part in parts {
        mac.update(part);
    }
    mac.verify_slice(expected).is_ok()
}

/// Refuses a verified delivery that was already accepted.
///
/// Deployments without a replay guard admit everything.
async fn admit_signed_delivery(state: &AppState, delivery: SignedDelivery) -> ApiResult<()> {
    let Some(guard) = state.webhook_replay.as_ref() else {
        return Ok(());
    };

    guard
        .admit(&delivery, Utc::now())
        .await
        .map_err(|error| match error {
            AppError::Conflict(_) => {
                tracing::warn!(
                    path = %delivery.path,
                    signature_hash = %delivery.signature_hash(),
                    "webhook replay detected"
                );
                ApiError::conflict("webhook_replay_detected", "duplicate webhook detected")
            }
            other => {
                tracing::error!(path = %delivery.path, error = %other, "webhook replay store error");
                ApiError::unavailable(
                    "webhook_replay_unavailable",
                    "webhook replay protection unavailable",
                )
            }
        })
}

/// Reports how a webhook request ended. Failures use the error code as outcome.
async fn record_outcome(
    state: &AppState,
    source: &'static str,
    started: Instant,
    result: &ApiResult<StatusCode>,
) {
    let Some(recorder) = state.webhook_metrics.as_ref() else {
        return;
    };
    let outcome = match result {
        Ok(status) if *status == StatusCode::ACCEPTED => "acknowledged",
        Ok(_) => "allowed",
        Err(error) => error.code(),
    };

    if let Err(error) = recorder
        .record_webhook_outcome(source, outcome, started.elapsed())
        .await
    {
        tracing::warn!(source, error = %error, "failed to record webhook metrics");
    }
}

#[cfg(test)]
mod tests;
