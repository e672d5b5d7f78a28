use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use sealworks_application::{
    OrderFilter, OrderRepository, SortDirection, check_queue_capacity,
};
use sealworks_core::{AppError, AppResult};
use sealworks_domain::{CursorPage, Order};

use crate::page_cursor::paginate;

#[cfg(test)]
mod tests;

/// In-memory order store with optimistic concurrency on `updated_at`.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<BTreeMap<String, Order>>,
}

impl InMemoryOrderRepository {
    /// Creates an empty order store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `orders`.
    #[must_use]
    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        Self {
            orders: RwLock::new(
                orders
                    .into_iter()
                    .map(|order| (order.id.clone(), order))
                    .collect(),
            ),
        }
    }

    /// Inserts or replaces an order without precondition checks.
    pub async fn insert_order(&self, order: Order) {
        self.orders.write().await.insert(order.id.clone(), order);
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn list_orders(&self, filter: &OrderFilter) -> AppResult<CursorPage<Order>> {
        let mut matching: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();

        matching.sort_by(|left, right| {
            let ordering = filter
                .sort
                .key(left)
                .cmp(&filter.sort.key(right))
                .then_with(|| left.id.cmp(&right.id));
            match filter.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        paginate(matching, &filter.page)
    }

    async fn find_order(&self, order_id: &str) -> AppResult<Option<Order>> {
        Ok(self.orders.read().await.get(order_id).cloned())
    }

    async fn find_order_by_tracking_code(&self, tracking_code: &str) -> AppResult<Option<Order>> {
        let tracking_code = tracking_code.trim();
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|order| {
                order.shipments.iter().any(|shipment| {
                    shipment
                        .tracking_code
                        .as_deref()
                        .is_some_and(|code| code.trim().eq_ignore_ascii_case(tracking_code))
                })
            })
            .cloned())
    }

    async fn find_order_by_payment_intent(&self, intent_id: &str) -> AppResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|order| {
                order
                    .payments
                    .iter()
                    .any(|payment| payment.intent_id == intent_id)
            })
            .cloned())
    }

    async fn list_queue_orders(&self, queue_id: &str) -> AppResult<Vec<Order>> {
        Ok(self
            .orders
            .read()
            .await
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
        let mut orders = self.orders.write().await;
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
        let mut orders = self.orders.write().await;
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
