use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Map;

use sealworks_core::{AppError, AppResult};
use sealworks_domain::{
    CarrierShipmentEvent, Order, OrderStatus, SHIPMENT_STATUS_CANCELED, SHIPMENT_STATUS_DELIVERED,
    SHIPMENT_STATUS_LABEL_CREATED, Shipment, ShipmentEvent, ShipmentItem, ShipmentPackage,
    is_known_shipment_status,
};

use crate::id_generator::{IdGenerator, PrefixedIdGenerator, UuidV7Generator};
use crate::order_ports::OrderRepository;
use crate::order_service::load_order;

/// Staff request to create a shipment.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentDraft {
    /// Owning order.
    pub order_id: String,
    /// Carrier code.
    pub carrier: String,
    /// Carrier service level.
    pub service_level: Option<String>,
    /// Tracking code, if already issued.
    pub tracking_code: Option<String>,
    /// Estimated delivery.
    pub eta: Option<DateTime<Utc>>,
    /// Staff notes.
    pub notes: Option<String>,
    /// Shipped lines.
    pub items: Vec<ShipmentItem>,
    /// Package details.
    pub package: Option<ShipmentPackage>,
}

/// Staff request to change a shipment; absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipmentUpdate {
    /// Owning order.
    pub order_id: String,
    /// Shipment to change.
    pub shipment_id: String,
    /// New status from the shipment vocabulary.
    pub status: Option<String>,
    /// New tracking code.
    pub tracking_code: Option<String>,
    /// New estimated delivery.
    pub eta: Option<DateTime<Utc>>,
    /// New notes.
    pub notes: Option<String>,
    /// Reject the update if the shipment changed after this instant.
    pub if_unmodified_since: Option<DateTime<Utc>>,
}

/// Shipment before and after an update.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentChange {
    /// State before the update.
    pub previous: Shipment,
    /// State after the update.
    pub shipment: Shipment,
}

impl ShipmentChange {
    /// Returns whether status, tracking code, ETA, or notes changed.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.previous.status != self.shipment.status
            || self.previous.tracking_code != self.shipment.tracking_code
            || self.previous.eta != self.shipment.eta
            || self.previous.notes != self.shipment.notes
    }
}

/// Application service for shipments and carrier tracking events.
#[derive(Clone)]
pub struct ShipmentService {
    orders: Arc<dyn OrderRepository>,
    ids: Arc<dyn IdGenerator>,
}

impl ShipmentService {
    /// Creates a service that issues `shp_` identifiers.
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self {
            orders,
            ids: Arc::new(PrefixedIdGenerator::new("shp_", UuidV7Generator)),
        }
    }

    /// Replaces the identifier generator.
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Creates a shipment in `label_created` status.
    pub async fn create_shipment(&self, draft: ShipmentDraft) -> AppResult<(Order, Shipment)> {
        let carrier = draft.carrier.trim().to_ascii_uppercase();
        if carrier.is_empty() {
            return Err(AppError::Validation("carrier is required".to_owned()));
        }
        if draft.items.iter().any(|item| item.quantity == 0) {
            return Err(AppError::Validation(
                "item quantity must be positive".to_owned(),
            ));
        }

        let mut order = load_order(self.orders.as_ref(), &draft.order_id).await?;
        if !matches!(
            order.status,
            OrderStatus::Paid
                | OrderStatus::InProduction
                | OrderStatus::ReadyToShip
                | OrderStatus::Shipped
        ) {
            return Err(AppError::InvalidState(format!(
                "cannot ship order '{}' in status {}",
                order.id, order.status
            )));
        }

        let now = Utc::now();
        let shipment = Shipment {
            id: self.ids.generate(),
            carrier,
            service_level: non_blank(draft.service_level),
            status: SHIPMENT_STATUS_LABEL_CREATED.to_owned(),
            tracking_code: non_blank(draft.tracking_code).map(|code| code.to_ascii_uppercase()),
            eta: draft.eta,
            notes: non_blank(draft.notes),
            items: draft.items,
            package: draft.package,
            events: vec![ShipmentEvent {
                status: SHIPMENT_STATUS_LABEL_CREATED.to_owned(),
                occurred_at: now,
                details: Map::new(),
            }],
            created_at: now,
            updated_at: now,
        };

        let expected_updated_at = order.updated_at;
        order.shipments.push(shipment.clone());
        order.updated_at = now;
        order.last_event_type = Some("shipment.created".to_owned());
        order.last_event_at = Some(now);

        let order = self.orders.save_order(order, expected_updated_at).await?;
        Ok((order, shipment))
    }

    /// Applies a staff update to a shipment.
    pub async fn update_shipment(&self, update: ShipmentUpdate) -> AppResult<ShipmentChange> {
        let status = match update.status.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(status) => {
                let status = status.to_ascii_lowercase();
                if !is_known_shipment_status(&status) {
                    return Err(AppError::Validation(format!(
                        "unknown shipment status '{status}'"
                    )));
                }
                Some(status)
            }
        };

        let mut order = load_order(self.orders.as_ref(), &update.order_id).await?;
        let expected_updated_at = order.updated_at;
        let shipment_id = update.shipment_id.trim();
        let shipment = order
            .shipments
            .iter_mut()
            .find(|shipment| shipment.id == shipment_id)
            .ok_or_else(|| AppError::NotFound(format!("shipment '{shipment_id}' not found")))?;

        if let Some(since) = update.if_unmodified_since
            && shipment.updated_at > since
        {
            return Err(AppError::Conflict(format!(
                "shipment '{shipment_id}' was modified after {since}"
            )));
        }

        let previous = shipment.clone();
        let now = Utc::now();
        if let Some(status) = status
            && status != shipment.status
        {
            shipment.events.push(ShipmentEvent {
                status: status.clone(),
                occurred_at: now,
                details: Map::new(),
            });
            shipment.status = status;
        }
        if let Some(code) = non_blank(update.tracking_code) {
            shipment.tracking_code = Some(code.to_ascii_uppercase());
        }
        if let Some(eta) = update.eta {
            shipment.eta = Some(eta);
        }
        if let Some(notes) = update.notes {
            shipment.notes = Some(notes.trim().to_owned()).filter(|notes| !notes.is_empty());
        }

        let change = ShipmentChange {
            previous,
            shipment: shipment.clone(),
        };
        if !change.is_effective() {
            return Ok(change);
        }

        shipment.updated_at = now;
        let shipment = shipment.clone();
        order.updated_at = now;
        order.last_event_type = Some(format!("shipment.{}", shipment.status));
        order.last_event_at = Some(now);
        self.orders.save_order(order, expected_updated_at).await?;

        Ok(ShipmentChange {
            previous: change.previous,
            shipment,
        })
    }

    /// Applies a normalized carrier tracking event.
    ///
    /// Replayed events (same status and time) are accepted without changes.
    pub async fn record_carrier_event(&self, event: CarrierShipmentEvent) -> AppResult<Shipment> {
        let tracking_code = event.tracking_code.trim().to_ascii_uppercase();
        if tracking_code.is_empty() {
            return Err(AppError::Validation("tracking code is required".to_owned()));
        }
        if event.event.status.trim().is_empty() {
            return Err(AppError::Validation("event status is required".to_owned()));
        }

        let mut order = match event.order_id.as_deref().map(str::trim) {
            Some(order_id) if !order_id.is_empty() => {
                load_order(self.orders.as_ref(), order_id).await?
            }
            _ => self
                .orders
                .find_order_by_tracking_code(&tracking_code)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("no shipment tracked as '{tracking_code}'"))
                })?,
        };
        let expected_updated_at = order.updated_at;

        let shipment_id = event
            .shipment_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let shipment = order
            .shipments
            .iter_mut()
            .find(|shipment| match shipment_id {
                Some(id) => shipment.id == id,
                None => shipment
                    .tracking_code
                    .as_deref()
                    .is_some_and(|code| code.eq_ignore_ascii_case(&tracking_code)),
            })
            .ok_or_else(|| {
                AppError::NotFound(format!("shipment for '{tracking_code}' not found"))
            })?;

        if shipment.status == SHIPMENT_STATUS_CANCELED {
            return Err(AppError::Conflict(format!(
                "shipment '{}' is canceled",
                shipment.id
            )));
        }
        if shipment.events.iter().any(|existing| {
            existing.status == event.event.status && existing.occurred_at == event.event.occurred_at
        }) {
            return Ok(shipment.clone());
        }

        let now = Utc::now();
        shipment.events.push(event.event);
        shipment.events.sort_by_key(|entry| entry.occurred_at);
        if let Some(latest) = shipment.events.last() {
            shipment.status = latest.status.clone();
        }
        if shipment.tracking_code.is_none() {
            shipment.tracking_code = Some(tracking_code);
        }
        shipment.updated_at = now;
        let shipment = shipment.clone();

        order.updated_at = now;
        order.last_event_type = Some(format!("shipment.{}", shipment.status));
        order.last_event_at = Some(now);
        let all_delivered = order
            .shipments
            .iter()
            .all(|entry| entry.status == SHIPMENT_STATUS_DELIVERED);
        if order.status == OrderStatus::Shipped && all_delivered {
            order.apply_status(OrderStatus::Delivered, now);
        }

        self.orders.save_order(order, expected_updated_at).await?;
        Ok(shipment)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
