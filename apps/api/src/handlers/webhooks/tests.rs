use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sealworks_application::{
    AiJobService, AiSuggestionNotifier, StripeSecretFetcher, WebhookMetricsRecorder,
    WebhookReplayGuard,
};
use sealworks_core::{AppError, AppResult};
use sealworks_domain::{
    AiJob, AiJobStatus, Order, OrderStatus, PaymentStatus, Shipment, SuggestionReadyNotification,
};
use sealworks_infrastructure::{
    EnvStripeSecretFetcher, InMemoryAiJobRepository, InMemoryWebhookReplayStore,
};
use serde_json::{Map, Value, json};
use sha2::Sha256;
use tokio::sync::Mutex;

use super::stripe::sign_for_test;
use crate::api_config::ShippingWebhookSettings;
use crate::handlers::test_support::{
    authorized_payment, base_time, json_request, order, router, send, test_state,
};
use crate::state::AppState;

const DHL_SECRET: &str = "dhl-secret";
const UPS_SECRET: &str = "ups-secret";
const YAMATO_TOKEN: &str = "yamato-token";
const FEDEX_TOKEN: &str = "fedex-token";
const STRIPE_SECRET: &str = "whsec_test";

fn shipment(id: &str, tracking_code: &str) -> Shipment {
    Shipment {
        id: id.to_owned(),
        carrier: "DHL".to_owned(),
        service_level: None,
        status: "in_transit".to_owned(),
        tracking_code: Some(tracking_code.to_owned()),
        eta: None,
        notes: None,
        items: Vec::new(),
        package: None,
        events: Vec::new(),
        created_at: base_time(),
        updated_at: base_time(),
    }
}

fn shipped_order(id: &str, tracking_code: &str) -> Order {
    let mut order = order(id, OrderStatus::Shipped);
    order.shipments.push(shipment(&format!("shp-{id}"), tracking_code));
    order
}

fn shipping_state(orders: Vec<Order>) -> AppState {
    let mut state = test_state(orders);
    state.shipping_webhooks = Arc::new(ShippingWebhookSettings {
        dhl_hmac_secret: Some(DHL_SECRET.to_owned()),
        ups_hmac_secret: Some(UPS_SECRET.to_owned()),
        yamato_token: Some(YAMATO_TOKEN.to_owned()),
        fedex_token: Some(FEDEX_TOKEN.to_owned()),
        jppost_allowed_cidrs: vec!["203.0.113.0/24".parse().unwrap_or_else(|_| unreachable!())],
    });
    state
}

fn hex_hmac(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac accepts any key length"));
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn webhook_request(uri: &str, headers: &[(&str, &str)], body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder
        .body(Body::from(body.to_owned()))
        .unwrap_or_else(|_| unreachable!("valid test request"))
}

async fn stored_order(state: &AppState, order_id: &str) -> Option<Order> {
    let service = state.order_service.as_ref()?;
    service.get_order(order_id).await.ok()
}

#[tokio::test]
async fn dhl_event_with_valid_signature_updates_shipment() {
    let state = shipping_state(vec![shipped_order("ord-1", "DHL123456789")]);
    let app = router(state.clone());
    let body = json!({
        "trackingNumber": "dhl123456789",
        "status": "Delivered",
        "timestamp": "2024-11-03T09:00:00Z",
        "location": "Tokyo"
    })
    .to_string();
    let signature = hex_hmac(DHL_SECRET, body.as_bytes());

    let response = send(
        &app,
        webhook_request(
            "/webhooks/shipping/dhl",
            &[("X-DHL-Signature", &signature)],
            &body,
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());

    let order = stored_order(&state, "ord-1").await.unwrap_or_else(|| unreachable!());
    assert_eq!(order.status, OrderStatus::Delivered);
    let shipment = &order.shipments[0];
    assert_eq!(shipment.status, "delivered");
    let event = &shipment.events[0];
    assert_eq!(
        event.occurred_at,
        Utc.with_ymd_and_hms(2024, 11, 3, 9, 0, 0).single().unwrap_or_default()
    );
    assert_eq!(event.details["location"], json!("Tokyo"));
    assert_eq!(event.details["carrier"], json!("DHL"));
    assert_eq!(event.details["carrierStatus"], json!("Delivered"));
}

#[tokio::test]
async fn jp_post_caller_outside_allow_list_is_forbidden() {
    let state = shipping_state(vec![shipped_order("ord-1", "JP0001")]);
    let app = router(state.clone());
    let body = json!({"mail": {"tracking_no": "JP0001", "event": {"code": "delivered"}}}).to_string();

    let response = send(
        &app,
        webhook_request(
            "/webhooks/shipping/jppost",
            &[("X-Forwarded-For", "198.51.100.10")],
            &body,
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "forbidden");

    let order = stored_order(&state, "ord-1").await.unwrap_or_else(|| unreachable!());
    assert!(order.shipments[0].events.is_empty());

    let allowed = send(
        &app,
        webhook_request(
            "/webhooks/shipping/jp_post",
            &[("X-Forwarded-For", "203.0.113.5")],
            &body,
        ),
    )
    .await;
    assert_eq!(allowed.status, StatusCode::OK);
}

#[tokio::test]
async fn carrier_credentials_are_enforced() {
    let app = router(shipping_state(vec![shipped_order("ord-1", "YT1")]));
    let yamato = json!({"tracking_code": "YT1", "status": "delivered"}).to_string();
    let ups = json!({"trackingNumber": "YT1", "event": {"code": "D"}}).to_string();

    let cases = [
        (
            "/webhooks/shipping/yamato",
            vec![],
            yamato.as_str(),
            StatusCode::UNAUTHORIZED,
            "missing_auth",
        ),
        (
            "/webhooks/shipping/yamato",
            vec![("Authorization", "Token yamato-token")],
            yamato.as_str(),
            StatusCode::UNAUTHORIZED,
            "invalid_auth",
        ),
        (
            "/webhooks/shipping/ups",
            vec![("X-UPS-Signature", "deadbeef")],
            ups.as_str(),
            StatusCode::UNAUTHORIZED,
            "invalid_signature",
        ),
        (
            "/webhooks/shipping/ups",
            vec![],
            ups.as_str(),
            StatusCode::BAD_REQUEST,
            "missing_signature",
        ),
        (
            "/webhooks/shipping/fedex",
            vec![("X-FedEx-Webhook-Token", "nope")],
            "{}",
            StatusCode::UNAUTHORIZED,
            "invalid_auth",
        ),
    ];

    for (uri, headers, body, status, code) in cases {
        let response = send(&app, webhook_request(uri, &headers, body)).await;
        assert_eq!(response.status, status, "{uri} {headers:?}");
        assert_eq!(response.error_code(), code, "{uri} {headers:?}");
    }

    let accepted = send(
        &app,
        webhook_request(
            "/webhooks/shipping/yamato",
            &[("Authorization", "Bearer yamato-token")],
            &yamato,
        ),
    )
    .await;
    assert_eq!(accepted.status, StatusCode::OK);
}

#[tokio::test]
async fn fedex_delivered_code_translates_and_missing_tracking_is_rejected() {
    let state = shipping_state(vec![shipped_order("ord-1", "FX1")]);
    let app = router(state.clone());
    let token = [("X-FedEx-Webhook-Token", FEDEX_TOKEN)];

    let missing = send(
        &app,
        webhook_request("/webhooks/shipping/fedex", &token, r#"{"event_status":"DL"}"#),
    )
    .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.error_code(), "missing_tracking");

    let body = json!({"tracking_number": "fx1", "event_status": "DL", "status_text": "Delivered"})
        .to_string();
    let response = send(&app, webhook_request("/webhooks/shipping/fedex", &token, &body)).await;
    assert_eq!(response.status, StatusCode::OK);

    let order = stored_order(&state, "ord-1").await.unwrap_or_else(|| unreachable!());
    assert_eq!(order.shipments[0].status, "delivered");
    assert_eq!(order.shipments[0].events[0].details["carrier"], json!("FEDEX"));
}

#[tokio::test]
async fn unknown_references_and_carriers() {
    let mut state = shipping_state(vec![shipped_order("ord-1", "FX1")]);
    let app = router(state.clone());
    let token = [("X-FedEx-Webhook-Token", FEDEX_TOKEN)];
    let body = json!({"tracking_number": "FX-UNKNOWN", "event_status": "IT"}).to_string();

    let unknown = send(&app, webhook_request("/webhooks/shipping/fedex", &token, &body)).await;
    assert_eq!(unknown.status, StatusCode::ACCEPTED);

    let unsupported = send(&app, webhook_request("/webhooks/shipping/sagawa", &[], "{}")).await;
    assert_eq!(unsupported.status, StatusCode::NOT_FOUND);
    assert_eq!(unsupported.error_code(), "unsupported_carrier");

    state.shipment_service = None;
    let unavailable = send(
        &router(state),
        webhook_request("/webhooks/shipping/fedex", &token, &body),
    )
    .await;
    assert_eq!(unavailable.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(unavailable.error_code(), "shipment_service_unavailable");
}

#[tokio::test]
async fn unconfigured_carrier_secret_is_unavailable() {
    let app = router(test_state(Vec::new()));
    let response = send(
        &app,
        webhook_request("/webhooks/shipping/dhl", &[("X-DHL-Signature", "00")], "{}"),
    )
    .await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.error_code(), "webhook_secret_unavailable");
}

struct FailingSecretFetcher;

#[async_trait]
impl StripeSecretFetcher for FailingSecretFetcher {
    async fn signing_secret(&self) -> AppResult<String> {
        Err(AppError::Unavailable("secret store offline".to_owned()))
    }
}

fn stripe_state(orders: Vec<Order>) -> AppState {
    let mut state = test_state(orders);
    state.stripe_secret_fetcher = Some(Arc::new(EnvStripeSecretFetcher::new(STRIPE_SECRET)));
    state
}

fn pending_order_with_payment() -> Order {
    let mut order = order("ord-2", OrderStatus::PendingPayment);
    order.payments.push(authorized_payment("pay-1", 12_000));
    order
}

fn stripe_request(signature: Option<&str>, body: &str) -> Request<Body> {
    let headers: Vec<(&str, &str)> = signature
        .map(|signature| vec![("Stripe-Signature", signature)])
        .unwrap_or_default();
    webhook_request("/webhooks/payments/stripe", &headers, body)
}

#[tokio::test]
async fn stripe_signature_and_secret_failures() {
    let body = json!({"id": "evt_1", "type": "payment_intent.succeeded"}).to_string();
    let signature = sign_for_test(body.as_bytes(), STRIPE_SECRET, Utc::now().timestamp());

    let app = router(stripe_state(Vec::new()));
    let missing = send(&app, stripe_request(None, &body)).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.error_code(), "missing_signature");

    let forged = send(&app, stripe_request(Some("t=1,v1=deadbeef"), &body)).await;
    assert_eq!(forged.status, StatusCode::BAD_REQUEST);
    assert_eq!(forged.error_code(), "invalid_signature");

    let mut failing = test_state(Vec::new());
    failing.stripe_secret_fetcher = Some(Arc::new(FailingSecretFetcher));
    let resolve = send(&router(failing), stripe_request(Some(&signature), &body)).await;
    assert_eq!(resolve.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resolve.error_code(), "secret_resolve_failed");

    let unconfigured = send(
        &router(test_state(Vec::new())),
        stripe_request(Some(&signature), &body),
    )
    .await;
    assert_eq!(unconfigured.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(unconfigured.error_code(), "webhook_secret_unavailable");
}

#[tokio::test]
async fn verified_stripe_event_captures_payment() {
    let state = stripe_state(vec![pending_order_with_payment()]);
    let app = router(state.clone());
    let body = json!({
        "id": "evt_capture",
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": "pi_pay-1", "amount_received": 12_000}}
    })
    .to_string();
    let signature = sign_for_test(body.as_bytes(), STRIPE_SECRET, Utc::now().timestamp());

    let response = send(&app, stripe_request(Some(&signature), &body)).await;
    assert_eq!(response.status, StatusCode::OK);

    let order = stored_order(&state, "ord-2").await.unwrap_or_else(|| unreachable!());
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.payments[0].status, PaymentStatus::Captured);
    assert_eq!(order.payments[0].captured_amount, 12_000);

    let unknown_body = json!({
        "id": "evt_other",
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": "pi_missing"}}
    })
    .to_string();
    let signature = sign_for_test(unknown_body.as_bytes(), STRIPE_SECRET, Utc::now().timestamp());
    let unknown = send(&app, stripe_request(Some(&signature), &unknown_body)).await;
    assert_eq!(unknown.status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn stale_stripe_signature_is_rejected() {
    let app = router(stripe_state(Vec::new()));
    let body = json!({"id": "evt_1", "type": "charge.refunded"}).to_string();
    let stale = (Utc::now() - Duration::minutes(10)).timestamp();
    let signature = sign_for_test(body.as_bytes(), STRIPE_SECRET, stale);

    let response = send(&app, stripe_request(Some(&signature), &body)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "invalid_signature");
}

#[derive(Default)]
struct RecordingNotifier {
    notifications: Mutex<Vec<SuggestionReadyNotification>>,
    fail: bool,
}

#[async_trait]
impl AiSuggestionNotifier for RecordingNotifier {
    async fn notify_suggestion_ready(
        &self,
        notification: SuggestionReadyNotification,
    ) -> AppResult<()> {
        self.notifications.lock().await.push(notification);
        if self.fail {
            return Err(AppError::Unavailable("queue offline".to_owned()));
        }
        Ok(())
    }
}

fn queued_job() -> AiJob {
    let mut payload = Map::new();
    payload.insert("designId".to_owned(), Value::from("dsg_1"));
    payload.insert("requestedBy".to_owned(), Value::from("user_1"));
    payload.insert("method".to_owned(), Value::from("palette"));
    AiJob {
        id: "aij_1".to_owned(),
        kind: "ai_suggestion".to_owned(),
        status: AiJobStatus::Queued,
        payload,
        outputs: Map::new(),
        metadata: Map::new(),
        error: None,
        suggestion_id: Some("sug_1".to_owned()),
        created_at: base_time(),
        updated_at: base_time(),
        completed_at: None,
    }
}

async fn ai_state(notifier: Arc<RecordingNotifier>) -> AppState {
    let repository = Arc::new(InMemoryAiJobRepository::new());
    repository.insert_job(queued_job()).await;
    let mut state = test_state(Vec::new());
    state.ai_job_service = Some(AiJobService::new(repository).with_notifier(notifier));
    state
}

#[tokio::test]
async fn failed_callback_requires_error_details() {
    let app = router(ai_state(Arc::new(RecordingNotifier::default())).await);
    let cases = [
        (json!({"job_id": "aij_1", "status": "failed"}), "error details are required when status is failed"),
        (
            json!({"job_id": "aij_1", "status": "errored", "error": {"code": " ", "message": ""}}),
            "error.code or error.message is required",
        ),
        (json!({"status": "succeeded"}), "jobId is required"),
        (json!({"job_id": "aij_1", "status": "pending"}), "status must be succeeded or failed"),
    ];

    for (body, message) in cases {
        let response = send(&app, json_request("POST", "/webhooks/ai/worker", None, Some(body))).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error_code(), "invalid_request");
        assert_eq!(response.json()["message"], json!(message));
    }
}

#[tokio::test]
async fn succeeded_callback_notifies_with_preview() {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = router(ai_state(notifier.clone()).await);
    let body = json!({
        "jobId": "aij_1",
        "status": "ok",
        "model": "gpt-design",
        "metadata": {"latencyMs": 812},
        "suggestion": {"payload": {"preview": {"previewUrl": "https://cdn.example/p.png"}}}
    });

    let response = send(&app, json_request("POST", "/webhooks/ai/worker", None, Some(body))).await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    let notifications = notifier.notifications.lock().await;
    assert_eq!(notifications.len(), 1);
    let notification = &notifications[0];
    assert_eq!(notification.job_id, "aij_1");
    assert_eq!(notification.design_id, "dsg_1");
    assert_eq!(notification.suggestion_id, "sug_1");
    assert_eq!(notification.user_id.as_deref(), Some("user_1"));
    assert_eq!(
        notification.suggestion.payload["preview"]["previewUrl"],
        json!("https://cdn.example/p.png")
    );
    assert_eq!(notification.metadata["worker"]["latencyMs"], json!(812));
    assert!(notification.ready_at >= base_time());
}

#[tokio::test]
async fn notifier_failure_and_unknown_job_still_accept() {
    let notifier = Arc::new(RecordingNotifier {
        fail: true,
        ..RecordingNotifier::default()
    });
    let app = router(ai_state(notifier.clone()).await);

    let response = send(
        &app,
        json_request(
            "POST",
            "/webhooks/ai/worker",
            None,
            Some(json!({"job_id": "aij_1", "status": "succeeded"})),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(notifier.notifications.lock().await.len(), 1);

    let unknown = send(
        &app,
        json_request(
            "POST",
            "/webhooks/ai/worker",
            None,
            Some(json!({"job_id": "aij_404", "status": "failed", "error": {"message": "boom"}})),
        ),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::ACCEPTED);
}

fn with_replay_guard(mut state: AppState) -> AppState {
    state.webhook_replay = Some(WebhookReplayGuard::new(Arc::new(
        InMemoryWebhookReplayStore::new(),
    )));
    state
}

#[tokio::test]
async fn repeated_stripe_delivery_is_a_replay() {
    let app = router(with_replay_guard(stripe_state(Vec::new())));
    let body = json!({
        "id": "evt_replay",
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": "pi_missing"}}
    })
    .to_string();
    let signature = sign_for_test(body.as_bytes(), STRIPE_SECRET, Utc::now().timestamp());

    let first = send(&app, stripe_request(Some(&signature), &body)).await;
    assert_eq!(first.status, StatusCode::ACCEPTED);

    let replay = send(&app, stripe_request(Some(&signature), &body)).await;
    assert_eq!(replay.status, StatusCode::CONFLICT);
    assert_eq!(replay.error_code(), "webhook_replay_detected");
    assert_eq!(replay.json()["message"], "duplicate webhook detected");

    let forged = send(&app, stripe_request(Some("t=1,v1=deadbeef"), &body)).await;
    assert_eq!(forged.error_code(), "invalid_signature");
}

#[tokio::test]
async fn repeated_dhl_delivery_is_a_replay() {
    let state = with_replay_guard(shipping_state(vec![shipped_order("ord-1", "DHL123456789")]));
    let app = router(state);
    let body = json!({
        "trackingNumber": "DHL123456789",
        "status": "Delivered",
        "timestamp": "2024-11-03T09:00:00Z"
    })
    .to_string();
    let signature = hex_hmac(DHL_SECRET, body.as_bytes());
    let request = || {
        webhook_request(
            "/webhooks/shipping/dhl",
            &[("X-DHL-Signature", &signature)],
            &body,
        )
    };

    let first = send(&app, request()).await;
    assert_eq!(first.status, StatusCode::OK);

    let replay = send(&app, request()).await;
    assert_eq!(replay.status, StatusCode::CONFLICT);
    assert_eq!(replay.error_code(), "webhook_replay_detected");
}

#[derive(Default)]
struct RecordingMetrics {
    outcomes: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl WebhookMetricsRecorder for RecordingMetrics {
    async fn record_webhook_outcome(
        &self,
        source: &str,
        outcome: &str,
        _elapsed: std::time::Duration,
    ) -> AppResult<()> {
        self.outcomes
            .lock()
            .await
            .push((source.to_owned(), outcome.to_owned()));
        Ok(())
    }
}

#[tokio::test]
async fn webhook_outcomes_are_recorded_per_source() {
    let metrics = Arc::new(RecordingMetrics::default());
    let mut state = with_replay_guard(stripe_state(Vec::new()));
    state.webhook_metrics = Some(metrics.clone());
    let app = router(state);
    let body = json!({
        "id": "evt_metrics",
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": "pi_missing"}}
    })
    .to_string();
    let signature = sign_for_test(body.as_bytes(), STRIPE_SECRET, Utc::now().timestamp());

    send(&app, stripe_request(Some(&signature), &body)).await;
    send(&app, stripe_request(Some(&signature), &body)).await;
    send(&app, stripe_request(None, &body)).await;
    send(&app, webhook_request("/webhooks/shipping/pigeon", &[], "{}")).await;

    let outcomes = metrics.outcomes.lock().await;
    let recorded: Vec<(&str, &str)> = outcomes
        .iter()
        .map(|(source, outcome)| (source.as_str(), outcome.as_str()))
        .collect();
    assert_eq!(
        recorded,
        vec![
            ("stripe", "acknowledged"),
            ("stripe", "webhook_replay_detected"),
            ("stripe", "missing_signature"),
            ("shipping", "unsupported_carrier"),
        ]
    );
}
