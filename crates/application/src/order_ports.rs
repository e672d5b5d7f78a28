use std::fmt::{Display, Formatter};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sealworks_core::{AppError, AppResult};
use sealworks_domain::{CursorPage, Order, OrderStatus, PageRequest};

/// Repository port for orders and their embedded shipments and payments.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Lists orders matching `filter` in the requested order.
    async fn list_orders(&self, filter: &OrderFilter) -> AppResult<CursorPage<Order>>;

    /// Loads one order.
    async fn find_order(&self, order_id: &str) -> AppResult<Option<Order>>;

    /// Loads the order owning a shipment with `tracking_code` (case-insensitive).
    async fn find_order_by_tracking_code(&self, tracking_code: &str) -> AppResult<Option<Order>>;

    /// Loads the order owning a payment with PSP reference `intent_id`.
    async fn find_order_by_payment_intent(&self, intent_id: &str) -> AppResult<Option<Order>>;

    /// Lists every order currently assigned to `queue_id`.
    async fn list_queue_orders(&self, queue_id: &str) -> AppResult<Vec<Order>>;

    /// Replaces the stored order.
    ///
    /// Fails with [`AppError::Conflict`] when the stored `updated_at` no longer
    /// equals `expected_updated_at`, and [`AppError::NotFound`] when the order is gone.
    async fn save_order(
        &self,
        order: Order,
        expected_updated_at: DateTime<Utc>,
    ) -> AppResult<Order>;

    /// Saves `order` into its `production_queue` while the queue has room.
    ///
    /// Counting the queue occupancy and writing the order happen under one
    /// lock. A `capacity` of 0 is unlimited. Fails with [`AppError::Conflict`]
    /// when the queue is full or the stored `updated_at` no longer equals
    /// `expected_updated_at`.
    async fn save_queue_assignment(
        &self,
        order: Order,
        expected_updated_at: DateTime<Utc>,
        capacity: u32,
    ) -> AppResult<Order>;
}

/// Checks that `order` fits into its production queue given `stored` orders.
///
/// Only work-in-progress orders other than `order` count towards `capacity`.
pub fn check_queue_capacity<'a>(
    stored: impl IntoIterator<Item = &'a Order>,
    order: &Order,
    capacity: u32,
) -> AppResult<()> {
    let Some(queue_id) = order.production_queue.as_deref() else {
        return Err(AppError::Validation(format!(
            "order '{}' has no production queue",
            order.id
        )));
    };
    if capacity == 0 {
        return Ok(());
    }

    let occupied = stored
        .into_iter()
        .filter(|queued| {
            queued.id != order.id
                && queued.production_queue.as_deref() == Some(queue_id)
                && queued.status.is_work_in_progress()
        })
        .count();
    if occupied >= usize::try_from(capacity).unwrap_or(usize::MAX) {
        return Err(AppError::Conflict(format!(
            "production queue '{queue_id}' is at capacity ({capacity})"
        )));
    }

    Ok(())
}

/// Timestamp an order listing is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderSortField {
    /// Creation time.
    CreatedAt,
    /// Last modification time.
    #[default]
    UpdatedAt,
    /// Checkout time, falling back to creation time.
    PlacedAt,
}

impl OrderSortField {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::PlacedAt => "placed_at",
        }
    }

    /// Returns the timestamp of `order` this field sorts by.
    #[must_use]
    pub fn key(&self, order: &Order) -> DateTime<Utc> {
        match self {
            Self::CreatedAt => order.created_at,
            Self::UpdatedAt => order.updated_at,
            Self::PlacedAt => order.placed_at.unwrap_or(order.created_at),
        }
    }
}

impl Display for OrderSortField {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for OrderSortField {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "created_at" | "createdat" => Ok(Self::CreatedAt),
            "updated_at" | "updatedat" => Ok(Self::UpdatedAt),
            "placed_at" | "placedat" => Ok(Self::PlacedAt),
            other => Err(AppError::Validation(format!("unsupported sort '{other}'"))),
        }
    }
}

/// Listing direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(AppError::Validation(format!(
                "unsupported sort order '{other}'"
            ))),
        }
    }
}

/// Admin order listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Accepted order statuses; empty accepts all.
    pub statuses: Vec<OrderStatus>,
    /// Accepted payment statuses; empty accepts all.
    pub payment_statuses: Vec<String>,
    /// Production queue the order must be assigned to.
    pub production_queue: Option<String>,
    /// Sales channel.
    pub channel: Option<String>,
    /// Customer email, case-insensitive.
    pub customer_email: Option<String>,
    /// Applied promotion code, case-insensitive.
    pub promotion_code: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub created_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub created_before: Option<DateTime<Utc>>,
    /// Sort timestamp.
    pub sort: OrderSortField,
    /// Sort direction.
    pub direction: SortDirection,
    /// Page size and cursor.
    pub page: PageRequest,
}

impl OrderFilter {
    /// Returns whether `order` satisfies every filter except pagination.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&order.status))
            && (self.payment_statuses.is_empty()
                || order.payment_status.as_deref().is_some_and(|status| {
                    self.payment_statuses
                        .iter()
                        .any(|wanted| wanted.eq_ignore_ascii_case(status))
                }))
            && self
                .production_queue
                .as_deref()
                .is_none_or(|queue| order.production_queue.as_deref() == Some(queue))
            && self
                .channel
                .as_deref()
                .is_none_or(|channel| order.channel.as_deref() == Some(channel))
            && self.customer_email.as_deref().is_none_or(|email| {
                order
                    .customer_email
                    .as_deref()
                    .is_some_and(|stored| stored.eq_ignore_ascii_case(email))
            })
            && self.promotion_code.as_deref().is_none_or(|code| {
                order
                    .promotion_code
                    .as_deref()
                    .is_some_and(|stored| stored.eq_ignore_ascii_case(code))
            })
            && self
                .created_after
                .is_none_or(|after| order.created_at >= after)
            && self
                .created_before
                .is_none_or(|before| order.created_at <= before)
    }
}
