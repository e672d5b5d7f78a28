use std::sync::Arc;

use chrono::Utc;

use sealworks_core::{AppError, AppResult};
use sealworks_domain::{CursorPage, Order, OrderStatus, check_admin_transition};

use crate::order_ports::{OrderFilter, OrderRepository};

/// Admin request to move an order along the status workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStatusCommand {
    /// Order to transition.
    pub order_id: String,
    /// Requested status.
    pub target_status: OrderStatus,
    /// Status the caller believes the order is in.
    pub expected_status: Option<OrderStatus>,
}

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusChange {
    /// Status before the transition.
    pub previous_status: OrderStatus,
    /// Order after the transition.
    pub order: Order,
}

/// Application service for order reads and workflow transitions.
#[derive(Clone)]
pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
}

impl OrderService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self { repository }
    }

    /// Lists orders.
    pub async fn list_orders(&self, filter: OrderFilter) -> AppResult<CursorPage<Order>> {
        if let (Some(after), Some(before)) = (filter.created_after, filter.created_before)
            && after > before
        {
            return Err(AppError::Validation(
                "created_after must not be after created_before".to_owned(),
            ));
        }

        self.repository.list_orders(&filter).await
    }

    /// Loads one order.
    pub async fn get_order(&self, order_id: &str) -> AppResult<Order> {
        load_order(self.repository.as_ref(), order_id).await
    }

    /// Applies one admin workflow step.
    ///
    /// The current status is read first; an `expected_status` mismatch is a
    /// conflict and an edge outside the workflow table is an invalid state.
    pub async fn transition_status(
        &self,
        command: OrderStatusCommand,
    ) -> AppResult<OrderStatusChange> {
        if !command.target_status.is_admin_target() {
            return Err(AppError::Validation(format!(
                "target status {} is not supported",
                command.target_status
            )));
        }

        let mut order = load_order(self.repository.as_ref(), &command.order_id).await?;
        let previous_status = order.status;

        if let Some(expected) = command.expected_status
            && expected != previous_status
        {
            return Err(AppError::Conflict(format!(
                "order '{}' is {previous_status}, expected {expected}",
                order.id
            )));
        }

        check_admin_transition(previous_status, command.target_status)?;

        let expected_updated_at = order.updated_at;
        let now = Utc::now();
        order.apply_status(command.target_status, now);
        order.last_event_type = Some(format!("order.status.{}", command.target_status));
        order.last_event_at = Some(now);

        let order = self.repository.save_order(order, expected_updated_at).await?;
        Ok(OrderStatusChange {
            previous_status,
            order,
        })
    }
}

pub(crate) async fn load_order(
    repository: &dyn OrderRepository,
    order_id: &str,
) -> AppResult<Order> {
    let order_id = order_id.trim();
    if order_id.is_empty() {
        return Err(AppError::Validation("order id is required".to_owned()));
    }

    repository
        .find_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order '{order_id}' not found")))
}
