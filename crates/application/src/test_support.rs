use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Map;
use tokio::sync::Mutex;

use sealworks_core::{AppError, AppResult};
use sealworks_domain::{
    CursorPage, Order, OrderStatus, Payment, PaymentStatus, Shipment,
    SHIPMENT_STATUS_LABEL_CREATED,
};

use crate::order_ports::{OrderFilter, OrderRepository, check_queue_capacity};

pub(crate) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

pub(crate) fn order(id: &str, status: OrderStatus) -> Order {
    Order {
        id: id.to_owned(),
        order_number: format!("HF-{id}"),
        status,
        payment_status: None,
        currency: "JPY".to_owned(),
        total: 12_000,
        customer_email: Some("alice@example.com".to_owned()),
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
        created_at: base_time(),
        updated_at: base_time() + Duration::minutes(5),
        placed_at: Some(base_time() + Duration::minutes(1)),
        paid_at: None,
        shipped_at: None,
        delivered_at: None,
        completed_at: None,
    }
}

pub(crate) fn shipment(id: &str, tracking_code: &str) -> Shipment {
    Shipment {
        id: id.to_owned(),
        carrier: "DHL".to_owned(),
        service_level: None,
        status: SHIPMENT_STATUS_LABEL_CREATED.to_owned(),
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

pub(crate) fn payment(id: &str, intent_id: &str, status: PaymentStatus) -> Payment {
    let captured = matches!(
        status,
        PaymentStatus::Captured | PaymentStatus::PartiallyRefunded | PaymentStatus::Refunded
    );
    Payment {
        id: id.to_owned(),
        provider: "stripe".to_owned(),
        intent_id: intent_id.to_owned(),
        status,
        currency: "JPY".to_owned(),
        amount: 12_000,
        captured_amount: if captured { 12_000 } else { 0 },
        refunded_amount: 0,
        created_at: base_time(),
        updated_at: base_time(),
        captured_at: None,
        refunded_at: None,
    }
}

#[derive(Default)]
pub(crate) struct FakeOrders {
    orders: Mutex<BTreeMap<String, Order>>,
}

impl FakeOrders {
    pub(crate) fn with(orders: Vec<Order>) -> Self {
        Self {
            orders: Mutex::new(
                orders
                    .into_iter()
                    .map(|order| (order.id.clone(), order))
                    .collect(),
            ),
        }
    }

    pub(crate) async fn stored(&self, order_id: &str) -> Option<Order> {
        self.orders.lock().await.get(order_id).cloned()
    }
}

#[async_trait]
impl OrderRepository for FakeOrders {
    async fn list_orders(&self, filter: &OrderFilter) -> AppResult<CursorPage<Order>> {
        let orders = self.orders.lock().await;
        Ok(CursorPage::new(
            orders
                .values()
                .filter(|order| filter.matches(order))
                .cloned()
                .collect(),
            None,
        ))
    }

    async fn find_order(&self, order_id: &str) -> AppResult<Option<Order>> {
        Ok(self.orders.lock().await.get(order_id).cloned())
    }

    async fn find_order_by_tracking_code(&self, tracking_code: &str) -> AppResult<Option<Order>> {
        let orders = self.orders.lock().await;
        Ok(orders
            .values()
            .find(|order| {
                order.shipments.iter().any(|shipment| {
                    shipment
                        .tracking_code
                        .as_deref()
                        .is_some_and(|code| code.eq_ignore_ascii_case(tracking_code))
                })
            })
            .cloned())
    }

    async fn find_order_by_payment_intent(&self, intent_id: &str) -> AppResult<Option<Order>> {
        let orders = self.orders.lock().await;
        Ok(orders
            .values()
            .find(|order| order.payments.iter().any(|p| p.intent_id == intent_id))
            .cloned())
    }

    async fn list_queue_orders(&self, queue_id: &str) -> AppResult<Vec<Order>> {
        let orders = self.orders.lock().await;
        Ok(orders
            .values()
            .filter(|order| order.production_queue.as_deref() == Some(queue_id))
            .cloned()
            .collect())
    }

    async fn save_order(
        &self,
        order: Order,
        expected_updated_at: DateTime<Utc>,
    ) -> AppResult<Order> {
        let mut orders = self.orders.lock().await;
        let stored = orders
            .get(&order.id)
            .ok_or_else(|| AppError::NotFound(format!("order '{}' not found", order.id)))?;
        if stored.updated_at != expected_updated_at {
            return Err(AppError::Conflict(format!(
                "order '{}' was modified concurrently",
                order.id
            )));
        }
        orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn save_queue_assignment(
        &self,
        order: Order,
        expected_updated_at: DateTime<Utc>,
        capacity: u32,
    ) -> AppResult<Order> {
        let mut orders = self.orders.lock().await;
        check_queue_capacity(orders.values(), &order, capacity)?;
        let stored = orders
            .get(&order.id)
            .ok_or_else(|| AppError::NotFound(format!("order '{}' not found", order.id)))?;
        if stored.updated_at != expected_updated_at {
            return Err(AppError::Conflict(format!(
                "order '{}' was modified concurrently",
                order.id
            )));
        }

        orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }
}
