use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sealworks_core::{AppError, AppResult};

use crate::payment::Payment;
use crate::shipment::Shipment;

/// Lifecycle states of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Cart converted but not submitted.
    Draft,
    /// Waiting for the PSP to confirm payment.
    PendingPayment,
    /// Payment confirmed.
    Paid,
    /// Being produced.
    InProduction,
    /// Produced and packed.
    ReadyToShip,
    /// Handed to the carrier.
    Shipped,
    /// Delivered to the customer.
    Delivered,
    /// Closed out.
    Completed,
    /// Canceled before completion.
    Canceled,
}

/// Single-step transitions accepted by the admin status endpoint.
pub const ADMIN_STATUS_TRANSITIONS: &[(OrderStatus, OrderStatus)] = &[
    (OrderStatus::Paid, OrderStatus::InProduction),
    (OrderStatus::InProduction, OrderStatus::Shipped),
    (OrderStatus::ReadyToShip, OrderStatus::Shipped),
    (OrderStatus::Shipped, OrderStatus::Delivered),
    (OrderStatus::Delivered, OrderStatus::Completed),
];

/// Target statuses the admin status endpoint accepts on the wire.
pub const ADMIN_TARGET_STATUSES: &[OrderStatus] = &[
    OrderStatus::InProduction,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Completed,
];

impl OrderStatus {
    /// Returns the stable transport value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingPayment => "pending_payment",
            Self::Paid => "paid",
            Self::InProduction => "in_production",
            Self::ReadyToShip => "ready_to_ship",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    /// Returns the only status an admin may move this status to, if any.
    #[must_use]
    pub fn admin_successor(&self) -> Option<Self> {
        ADMIN_STATUS_TRANSITIONS
            .iter()
            .find(|(from, _)| from == self)
            .map(|(_, to)| *to)
    }

    /// Returns whether the status is accepted as an admin transition target.
    #[must_use]
    pub fn is_admin_target(&self) -> bool {
        ADMIN_TARGET_STATUSES.contains(self)
    }

    /// Returns whether orders in this status still occupy production capacity.
    #[must_use]
    pub fn is_work_in_progress(&self) -> bool {
        matches!(self, Self::Paid | Self::InProduction | Self::ReadyToShip)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "pending_payment" => Ok(Self::PendingPayment),
            "paid" => Ok(Self::Paid),
            "in_production" => Ok(Self::InProduction),
            "ready_to_ship" => Ok(Self::ReadyToShip),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "completed" => Ok(Self::Completed),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            other => Err(AppError::Validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

/// Checks `current → target` against [`ADMIN_STATUS_TRANSITIONS`].
pub fn check_admin_transition(current: OrderStatus, target: OrderStatus) -> AppResult<()> {
    if current == target {
        return Err(AppError::InvalidState(format!(
            "order is already {current}"
        )));
    }

    match current.admin_successor() {
        Some(successor) if successor == target => Ok(()),
        Some(successor) => Err(AppError::InvalidState(format!(
            "order in status {current} can only move to {successor}, not {target}"
        ))),
        None => Err(AppError::InvalidState(format!(
            "order in status {current} cannot be transitioned"
        ))),
    }
}

/// Order aggregate as stored by the order repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier.
    pub id: String,
    /// Human-facing order number.
    pub order_number: String,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// PSP-level payment status, if any.
    pub payment_status: Option<String>,
    /// ISO currency code.
    pub currency: String,
    /// Grand total in minor units.
    pub total: i64,
    /// Customer contact email.
    pub customer_email: Option<String>,
    /// Applied promotion code.
    pub promotion_code: Option<String>,
    /// Sales channel.
    pub channel: Option<String>,
    /// Production queue the order is assigned to.
    pub production_queue: Option<String>,
    /// Current production stage label.
    pub production_stage: Option<String>,
    /// Type of the last production or fulfilment event.
    pub last_event_type: Option<String>,
    /// Time of the last production or fulfilment event.
    pub last_event_at: Option<DateTime<Utc>>,
    /// Follow-up tasks raised against the order.
    pub outstanding_tasks: Vec<String>,
    /// Whether the order is on hold.
    pub on_hold: bool,
    /// Shipments created for the order.
    pub shipments: Vec<Shipment>,
    /// Payments recorded for the order.
    pub payments: Vec<Payment>,
    /// Free-form metadata.
    pub metadata: Map<String, Value>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Checkout submission time.
    pub placed_at: Option<DateTime<Utc>>,
    /// Payment confirmation time.
    pub paid_at: Option<DateTime<Utc>>,
    /// Hand-over to carrier time.
    pub shipped_at: Option<DateTime<Utc>>,
    /// Delivery time.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Applies `target` and stamps the matching milestone timestamp.
    pub fn apply_status(&mut self, target: OrderStatus, at: DateTime<Utc>) {
        self.status = target;
        self.updated_at = at;
        let milestone = match target {
            OrderStatus::Paid => Some(&mut self.paid_at),
            OrderStatus::Shipped => Some(&mut self.shipped_at),
            OrderStatus::Delivered => Some(&mut self.delivered_at),
            OrderStatus::Completed => Some(&mut self.completed_at),
            _ => None,
        };
        if let Some(slot) = milestone {
            slot.get_or_insert(at);
        }
    }

    /// Returns the reference time used for queue ageing.
    #[must_use]
    pub fn age_reference(&self) -> DateTime<Utc> {
        self.placed_at.unwrap_or(self.created_at)
    }

    /// Finds a shipment by identifier.
    #[must_use]
    pub fn shipment(&self, shipment_id: &str) -> Option<&Shipment> {
        self.shipments
            .iter()
            .find(|shipment| shipment.id == shipment_id)
    }

    /// Finds a payment by identifier.
    #[must_use]
    pub fn payment(&self, payment_id: &str) -> Option<&Payment> {
        self.payments.iter().find(|payment| payment.id == payment_id)
    }
}

/// Trims, drops blanks, and removes duplicates while keeping first-seen order.
#[must_use]
pub fn dedupe_preserving_order(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .filter(|value| seen.insert(value.to_string()))
        .map(str::to_owned)
        .collect()
}
