use axum::Json;
use axum::extract::State;

use crate::dto::HealthResponse;
use crate::state::AppState;

/// `GET /health`
///
/// Always answers 200. The body lists capabilities that are not wired.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let unavailable = missing_capabilities(&state);
    Json(HealthResponse {
        status: if unavailable.is_empty() { "ok" } else { "degraded" },
        unavailable: unavailable.into_iter().map(str::to_owned).collect(),
    })
}

fn missing_capabilities(state: &AppState) -> Vec<&'static str> {
    let shipping = state.shipping_webhooks.as_ref();
    [
        ("audit_logs", state.audit_log_service.is_some()),
        ("counters", state.counter_service.is_some()),
        ("orders", state.order_service.is_some()),
        ("shipments", state.shipment_service.is_some()),
        ("payments", state.payment_service.is_some()),
        ("production_queues", state.production_queue_service.is_some()),
        ("ai_jobs", state.ai_job_service.is_some()),
        ("stripe_webhook", state.stripe_secret_fetcher.is_some()),
        ("dhl_webhook", shipping.dhl_hmac_secret.is_some()),
        ("ups_webhook", shipping.ups_hmac_secret.is_some()),
        ("yamato_webhook", shipping.yamato_token.is_some()),
        ("fedex_webhook", shipping.fedex_token.is_some()),
        ("webhook_replay", state.webhook_replay.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, wired)| (!wired).then_some(name))
    .collect()
}
