use std::collections::BTreeSet;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::{DateTime, TimeZone, Utc};
use sealworks_application::{
    AiJobService, AuditLogService, CounterService, OrderService, PaymentService,
    ProductionQueueService, ShipmentService,
};
use sealworks_domain::{
    AuditLogEntry, AuditLogFilter, Order, OrderStatus, PageRequest, Payment, PaymentStatus,
};
use sealworks_infrastructure::{
    InMemoryAiJobRepository, InMemoryAuditLogRepository, InMemoryCounterRepository,
    InMemoryOrderRepository, InMemoryPaymentEventLedger, InMemoryProductionQueueRepository,
    StaticTokenAuthenticator,
};
use serde_json::{Map, Value};
use tower::ServiceExt;

use crate::api_router::build_router;
use crate::state::AppState;

pub(crate) const ADMIN_TOKEN: &str = "admin-token";
pub(crate) const STAFF_TOKEN: &str = "staff-token";
pub(crate) const USER_TOKEN: &str = "user-token";
pub(crate) const SERVICE_TOKEN: &str = "svc-token";

const ADMIN_TOKENS: &str = "admin-token=admin-1:admin:ops@example.com,\
staff-token=staff-1:staff,user-token=user-1:user";
const SERVICE_TOKENS: &str = "svc-token=audit-writer";

pub(crate) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// State with every service wired over in-memory adapters.
pub(crate) fn test_state(orders: Vec<Order>) -> AppState {
    let authenticator = StaticTokenAuthenticator::from_config(ADMIN_TOKENS, SERVICE_TOKENS)
        .unwrap_or_else(|_| unreachable!("static test tokens parse"));
    let orders_repository = Arc::new(InMemoryOrderRepository::with_orders(orders));

    let mut state = AppState::new(Arc::new(authenticator));
    state.audit_log_service = Some(AuditLogService::new(Arc::new(
        InMemoryAuditLogRepository::new(),
    )));
    state.counter_service = Some(CounterService::new(Arc::new(
        InMemoryCounterRepository::new(),
    )));
    state.counter_allowed_scopes = Arc::new(BTreeSet::from([
        "invoice".to_owned(),
        "order".to_owned(),
    ]));
    state.order_service = Some(OrderService::new(orders_repository.clone()));
    state.shipment_service = Some(ShipmentService::new(orders_repository.clone()));
    state.payment_service = Some(PaymentService::new(
        orders_repository.clone(),
        Arc::new(InMemoryPaymentEventLedger::new()),
    ));
    state.production_queue_service = Some(ProductionQueueService::new(
        Arc::new(InMemoryProductionQueueRepository::new()),
        orders_repository,
    ));
    state.ai_job_service = Some(AiJobService::new(Arc::new(InMemoryAiJobRepository::new())));
    state
}

pub(crate) fn router(state: AppState) -> Router {
    build_router(state, "http://localhost:3000")
        .unwrap_or_else(|_| unreachable!("test router builds"))
}

pub(crate) fn order(id: &str, status: OrderStatus) -> Order {
    let created_at = base_time();
    Order {
        id: id.to_owned(),
        order_number: format!("SW-{id}"),
        status,
        payment_status: None,
        currency: "JPY".to_owned(),
        total: 12_000,
        customer_email: Some("buyer@example.com".to_owned()),
        promotion_code: None,
        channel: Some("web".to_owned()),
        production_queue: None,
        production_stage: None,
        last_event_type: None,
        last_event_at: None,
        outstanding_tasks: Vec::new(),
        on_hold: false,
        shipments: Vec::new(),
        payments: Vec::new(),
        metadata: Map::new(),
        created_at,
        updated_at: created_at,
        placed_at: Some(created_at),
        paid_at: None,
        shipped_at: None,
        delivered_at: None,
        completed_at: None,
    }
}

pub(crate) fn authorized_payment(id: &str, amount: i64) -> Payment {
    Payment {
        id: id.to_owned(),
        provider: "stripe".to_owned(),
        intent_id: format!("pi_{id}"),
        status: PaymentStatus::Authorized,
        currency: "JPY".to_owned(),
        amount,
        captured_amount: 0,
        refunded_amount: 0,
        created_at: base_time(),
        updated_at: base_time(),
        captured_at: None,
        refunded_at: None,
    }
}

pub(crate) fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder
        .body(body)
        .unwrap_or_else(|_| unreachable!("valid test request"))
}

pub(crate) struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub(crate) fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub(crate) fn error_code(&self) -> String {
        self.json()["error"].as_str().unwrap_or_default().to_owned()
    }

    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub(crate) async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|_| unreachable!("router is infallible"));
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default()
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub(crate) async fn audit_entries(state: &AppState, target_ref: &str) -> Vec<AuditLogEntry> {
    let Some(service) = state.audit_log_service.as_ref() else {
        return Vec::new();
    };
    service
        .list(AuditLogFilter {
            target_ref: target_ref.to_owned(),
            page: PageRequest::new(Some(100), None),
            ..AuditLogFilter::default()
        })
        .await
        .map(|page| page.items)
        .unwrap_or_default()
}
