use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};

use sealworks_core::{AppError, AppResult};
use sealworks_domain::{Order, OrderStatus, Payment, PaymentStatus};

use crate::order_ports::OrderRepository;
use crate::order_service::load_order;

/// Port remembering processed idempotency keys and PSP event ids.
#[async_trait]
pub trait PaymentEventLedger: Send + Sync {
    /// Records `key`; returns `false` when it was already present.
    async fn remember(&self, key: &str) -> AppResult<bool>;

    /// Forgets `key` so a failed operation can be retried.
    async fn release(&self, key: &str) -> AppResult<()>;
}

/// Port resolving the PSP webhook signing secret.
#[async_trait]
pub trait StripeSecretFetcher: Send + Sync {
    /// Returns the current signing secret.
    async fn signing_secret(&self) -> AppResult<String>;
}

/// Staff request to capture or refund a payment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentAdjustment {
    /// Owning order.
    pub order_id: String,
    /// Payment to adjust.
    pub payment_id: String,
    /// Amount in minor units; defaults to the full eligible amount.
    pub amount: Option<i64>,
    /// Staff-supplied reason.
    pub reason: Option<String>,
    /// Caller key making the request safe to retry.
    pub idempotency_key: Option<String>,
    /// Caller metadata.
    pub metadata: Map<String, Value>,
}

/// Payment before and after an adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentChange {
    /// State before the adjustment.
    pub previous: Payment,
    /// State after the adjustment.
    pub payment: Payment,
}

/// Verified PSP webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentWebhookEvent {
    /// PSP name, e.g. `stripe`.
    pub provider: String,
    /// Raw request body.
    pub payload: Vec<u8>,
    /// Forwarded PSP headers.
    pub headers: BTreeMap<String, String>,
}

/// Header carrying the PSP event identifier.
pub const STRIPE_EVENT_ID_HEADER: &str = "Stripe-Event-ID";
/// Header carrying the PSP event type.
pub const STRIPE_EVENT_TYPE_HEADER: &str = "Stripe-Event-Type";
/// Header carrying the PSP signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

#[derive(Debug, Clone, Copy)]
enum AdjustmentKind {
    Capture,
    Refund,
}

/// Application service for admin payment adjustments and PSP events.
#[derive(Clone)]
pub struct PaymentService {
    orders: Arc<dyn OrderRepository>,
    ledger: Arc<dyn PaymentEventLedger>,
}

impl PaymentService {
    /// Creates a service from its ports.
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepository>, ledger: Arc<dyn PaymentEventLedger>) -> Self {
        Self { orders, ledger }
    }

    /// Captures an authorised payment.
    pub async fn manual_capture(&self, adjustment: PaymentAdjustment) -> AppResult<PaymentChange> {
        self.adjust(adjustment, AdjustmentKind::Capture).await
    }

    /// Refunds part or all of a captured payment.
    pub async fn refund(&self, adjustment: PaymentAdjustment) -> AppResult<PaymentChange> {
        self.adjust(adjustment, AdjustmentKind::Refund).await
    }

    async fn adjust(
        &self,
        adjustment: PaymentAdjustment,
        kind: AdjustmentKind,
    ) -> AppResult<PaymentChange> {
        let payment_id = adjustment.payment_id.trim().to_owned();
        if payment_id.is_empty() {
            return Err(AppError::Validation("payment_id is required".to_owned()));
        }
        if adjustment.amount.is_some_and(|amount| amount <= 0) {
            return Err(AppError::Validation("amount must be positive".to_owned()));
        }

        let ledger_key = adjustment
            .idempotency_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| format!("{}:{payment_id}:{key}", adjustment.order_id.trim()));
        if let Some(key) = &ledger_key
            && !self.ledger.remember(key).await?
        {
            return Err(AppError::Conflict(format!(
                "payment '{payment_id}' already processed this idempotency key"
            )));
        }

        let result = self.apply_adjustment(&adjustment, &payment_id, kind).await;
        if result.is_err()
            && let Some(key) = &ledger_key
        {
            self.ledger.release(key).await?;
        }
        result
    }

    async fn apply_adjustment(
        &self,
        adjustment: &PaymentAdjustment,
        payment_id: &str,
        kind: AdjustmentKind,
    ) -> AppResult<PaymentChange> {
        let mut order = load_order(self.orders.as_ref(), &adjustment.order_id).await?;
        let expected_updated_at = order.updated_at;
        let now = Utc::now();

        let payment = order
            .payments
            .iter_mut()
            .find(|payment| payment.id == payment_id)
            .ok_or_else(|| AppError::NotFound(format!("payment '{payment_id}' not found")))?;
        let previous = payment.clone();

        match kind {
            AdjustmentKind::Capture => {
                if payment.status != PaymentStatus::Authorized {
                    return Err(AppError::InvalidState(format!(
                        "payment '{payment_id}' is {}, only authorized payments can be captured",
                        payment.status
                    )));
                }
                let amount = adjustment.amount.unwrap_or(payment.amount);
                if amount > payment.amount {
                    return Err(AppError::Validation(format!(
                        "capture amount {amount} exceeds authorized amount {}",
                        payment.amount
                    )));
                }
                payment.captured_amount = amount;
                payment.status = PaymentStatus::Captured;
                payment.captured_at = Some(now);
            }
            AdjustmentKind::Refund => {
                if !matches!(
                    payment.status,
                    PaymentStatus::Captured | PaymentStatus::PartiallyRefunded
                ) {
                    return Err(AppError::InvalidState(format!(
                        "payment '{payment_id}' is {}, only captured payments can be refunded",
                        payment.status
                    )));
                }
                let refundable = payment.refundable_amount();
                let amount = adjustment.amount.unwrap_or(refundable);
                if amount > refundable {
                    return Err(AppError::Validation(format!(
                        "refund amount {amount} exceeds refundable amount {refundable}"
                    )));
                }
                payment.refunded_amount += amount;
                payment.status = if payment.refundable_amount() == 0 {
                    PaymentStatus::Refunded
                } else {
                    PaymentStatus::PartiallyRefunded
                };
                payment.refunded_at = Some(now);
            }
        }
        payment.updated_at = now;
        let payment = payment.clone();

        record_payment_on_order(&mut order, &payment, now);
        self.orders.save_order(order, expected_updated_at).await?;

        Ok(PaymentChange { previous, payment })
    }

    /// Applies a verified PSP webhook event.
    ///
    /// Events are deduplicated by id; unsupported event types are ignored.
    pub async fn record_webhook_event(&self, event: PaymentWebhookEvent) -> AppResult<()> {
        let payload: Value = serde_json::from_slice(&event.payload)
            .map_err(|error| AppError::Validation(format!("invalid event payload: {error}")))?;

        let event_id = header(&event.headers, STRIPE_EVENT_ID_HEADER)
            .or_else(|| string_at(&payload, &["id"]))
            .ok_or_else(|| AppError::Validation("event id is required".to_owned()))?;
        let event_type = header(&event.headers, STRIPE_EVENT_TYPE_HEADER)
            .or_else(|| string_at(&payload, &["type"]))
            .ok_or_else(|| AppError::Validation("event type is required".to_owned()))?;

        let (intent_field, status) = match event_type.as_str() {
            "payment_intent.succeeded" => ("id", PaymentStatus::Captured),
            "payment_intent.payment_failed" => ("id", PaymentStatus::Failed),
            "charge.refunded" => ("payment_intent", PaymentStatus::Refunded),
            _ => return Ok(()),
        };
        let intent_id = string_at(&payload, &["data", "object", intent_field])
            .ok_or_else(|| AppError::Validation("event has no payment intent".to_owned()))?;

        let ledger_key = format!("{}:{event_id}", event.provider);
        if !self.ledger.remember(&ledger_key).await? {
            return Ok(());
        }

        let result = self.apply_event(&payload, &intent_id, status).await;
        if result.is_err() {
            self.ledger.release(&ledger_key).await?;
        }
        result
    }

    async fn apply_event(
        &self,
        payload: &Value,
        intent_id: &str,
        status: PaymentStatus,
    ) -> AppResult<()> {
        let mut order = self
            .orders
            .find_order_by_payment_intent(intent_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no payment for intent '{intent_id}'")))?;
        let expected_updated_at = order.updated_at;
        let now = Utc::now();

        let payment = order
            .payments
            .iter_mut()
            .find(|payment| payment.intent_id == intent_id)
            .ok_or_else(|| AppError::NotFound(format!("no payment for intent '{intent_id}'")))?;

        let object = &payload["data"]["object"];
        match status {
            PaymentStatus::Captured => {
                payment.captured_amount = object["amount_received"]
                    .as_i64()
                    .unwrap_or(payment.amount);
                payment.captured_at = Some(now);
                payment.status = PaymentStatus::Captured;
            }
            PaymentStatus::Refunded => {
                let refunded = object["amount_refunded"]
                    .as_i64()
                    .unwrap_or(payment.captured_amount);
                payment.refunded_amount = refunded.min(payment.captured_amount);
                payment.refunded_at = Some(now);
                payment.status = if payment.refundable_amount() == 0 {
                    PaymentStatus::Refunded
                } else {
                    PaymentStatus::PartiallyRefunded
                };
            }
            other => payment.status = other,
        }
        payment.updated_at = now;
        let payment = payment.clone();

        record_payment_on_order(&mut order, &payment, now);
        if payment.status == PaymentStatus::Captured
            && order.status == OrderStatus::PendingPayment
        {
            order.apply_status(OrderStatus::Paid, now);
        }

        self.orders.save_order(order, expected_updated_at).await?;
        Ok(())
    }
}

fn record_payment_on_order(order: &mut Order, payment: &Payment, now: chrono::DateTime<Utc>) {
    order.payment_status = Some(payment.status.as_str().to_owned());
    order.updated_at = now;
    order.last_event_type = Some(format!("payment.{}", payment.status));
    order.last_event_at = Some(now);
}

fn header(headers: &BTreeMap<String, String>, name: &str) -> Option<String> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |current, key| current.get(*key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    use sealworks_core::{AppError, AppResult};
    use sealworks_domain::{OrderStatus, PaymentStatus};

    use super::{
        PaymentAdjustment, PaymentEventLedger, PaymentService, PaymentWebhookEvent,
        STRIPE_EVENT_ID_HEADER,
    };
    use crate::test_support::{FakeOrders, order, payment};

    #[derive(Default)]
    struct FakeLedger {
        keys: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl PaymentEventLedger for FakeLedger {
        async fn remember(&self, key: &str) -> AppResult<bool> {
            Ok(self.keys.lock().await.insert(key.to_owned()))
        }

        async fn release(&self, key: &str) -> AppResult<()> {
            self.keys.lock().await.remove(key);
            Ok(())
        }
    }

    fn service_with(
        status: OrderStatus,
        payment_status: PaymentStatus,
    ) -> (Arc<FakeOrders>, PaymentService) {
        let mut stored = order("ord_1", status);
        stored.payments.push(payment("pay_1", "pi_1", payment_status));
        let orders = Arc::new(FakeOrders::with(vec![stored]));
        let service = PaymentService::new(orders.clone(), Arc::new(FakeLedger::default()));
        (orders, service)
    }

    fn adjustment(amount: Option<i64>, key: Option<&str>) -> PaymentAdjustment {
        PaymentAdjustment {
            order_id: "ord_1".to_owned(),
            payment_id: "pay_1".to_owned(),
            amount,
            idempotency_key: key.map(str::to_owned),
            ..PaymentAdjustment::default()
        }
    }

    fn stripe_event(id: &str, event_type: &str, object: serde_json::Value) -> PaymentWebhookEvent {
        PaymentWebhookEvent {
            provider: "stripe".to_owned(),
            payload: json!({"id": id, "type": event_type, "data": {"object": object}})
                .to_string()
                .into_bytes(),
            headers: BTreeMap::from([(STRIPE_EVENT_ID_HEADER.to_owned(), id.to_owned())]),
        }
    }

    #[tokio::test]
    async fn capture_requires_authorized_payment() {
        let (_, service) = service_with(OrderStatus::Paid, PaymentStatus::Captured);
        let result = service.manual_capture(adjustment(None, None)).await;
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn capture_defaults_to_authorized_amount() {
        let (orders, service) = service_with(OrderStatus::Paid, PaymentStatus::Authorized);
        let change = service
            .manual_capture(adjustment(None, None))
            .await
            .unwrap_or_else(|_| unreachable!("authorized payment captures"));

        assert_eq!(change.previous.status, PaymentStatus::Authorized);
        assert_eq!(change.payment.status, PaymentStatus::Captured);
        assert_eq!(change.payment.captured_amount, 12_000);
        assert_eq!(
            orders.stored("ord_1").await.and_then(|o| o.payment_status),
            Some("captured".to_owned())
        );
    }

    #[tokio::test]
    async fn partial_refund_then_duplicate_key_conflicts() {
        let (_, service) = service_with(OrderStatus::Delivered, PaymentStatus::Captured);
        let change = service
            .refund(adjustment(Some(2_000), Some("rf-1")))
            .await
            .unwrap_or_else(|_| unreachable!("captured payment refunds"));
        assert_eq!(change.payment.status, PaymentStatus::PartiallyRefunded);
        assert_eq!(change.payment.refunded_amount, 2_000);

        let duplicate = service.refund(adjustment(Some(2_000), Some("rf-1"))).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn refund_over_refundable_is_rejected_and_key_released() {
        let (_, service) = service_with(OrderStatus::Delivered, PaymentStatus::Captured);
        let too_much = service.refund(adjustment(Some(50_000), Some("rf-2"))).await;
        assert!(matches!(too_much, Err(AppError::Validation(_))));

        assert!(service.refund(adjustment(Some(100), Some("rf-2"))).await.is_ok());
    }

    #[tokio::test]
    async fn succeeded_event_marks_order_paid_once() {
        let (orders, service) =
            service_with(OrderStatus::PendingPayment, PaymentStatus::Authorized);
        let event = stripe_event(
            "evt_1",
            "payment_intent.succeeded",
            json!({"id": "pi_1", "amount_received": 12000}),
        );

        assert!(service.record_webhook_event(event.clone()).await.is_ok());
        assert!(service.record_webhook_event(event).await.is_ok());

        let stored = orders.stored("ord_1").await;
        assert_eq!(stored.as_ref().map(|o| o.status), Some(OrderStatus::Paid));
        assert_eq!(
            stored.and_then(|o| o.payments.first().map(|p| p.status)),
            Some(PaymentStatus::Captured)
        );
    }

    #[tokio::test]
    async fn unknown_intent_is_not_found_and_other_types_ignored() {
        let (_, service) = service_with(OrderStatus::Paid, PaymentStatus::Captured);
        let missing = service
            .record_webhook_event(stripe_event(
                "evt_2",
                "charge.refunded",
                json!({"payment_intent": "pi_missing"}),
            ))
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let ignored = service
            .record_webhook_event(stripe_event("evt_3", "customer.created", json!({})))
            .await;
        assert!(ignored.is_ok());
    }

    #[tokio::test]
    async fn malformed_payload_is_validation_error() {
        let (_, service) = service_with(OrderStatus::Paid, PaymentStatus::Captured);
        let result = service
            .record_webhook_event(PaymentWebhookEvent {
                provider: "stripe".to_owned(),
                payload: b"{not json".to_vec(),
                headers: BTreeMap::new(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
