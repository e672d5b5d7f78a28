use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Label issued, parcel not yet collected.
pub const SHIPMENT_STATUS_LABEL_CREATED: &str = "label_created";
/// Parcel collected by the carrier.
pub const SHIPMENT_STATUS_PICKED_UP: &str = "picked_up";
/// Parcel moving through the network.
pub const SHIPMENT_STATUS_IN_TRANSIT: &str = "in_transit";
/// Parcel scanned at a hub.
pub const SHIPMENT_STATUS_ARRIVED_HUB: &str = "arrived_hub";
/// Parcel on the last-mile vehicle.
pub const SHIPMENT_STATUS_OUT_FOR_DELIVERY: &str = "out_for_delivery";
/// Parcel delivered.
pub const SHIPMENT_STATUS_DELIVERED: &str = "delivered";
/// Carrier reported a problem.
pub const SHIPMENT_STATUS_EXCEPTION: &str = "exception";
/// Parcel is being returned.
pub const SHIPMENT_STATUS_RETURN_TO_SENDER: &str = "return_to_sender";
/// Shipment voided by staff.
pub const SHIPMENT_STATUS_CANCELED: &str = "canceled";

/// Internal shipment status vocabulary.
pub const SHIPMENT_STATUSES: &[&str] = &[
    SHIPMENT_STATUS_LABEL_CREATED,
    SHIPMENT_STATUS_PICKED_UP,
    SHIPMENT_STATUS_IN_TRANSIT,
    SHIPMENT_STATUS_ARRIVED_HUB,
    SHIPMENT_STATUS_OUT_FOR_DELIVERY,
    SHIPMENT_STATUS_DELIVERED,
    SHIPMENT_STATUS_EXCEPTION,
    SHIPMENT_STATUS_RETURN_TO_SENDER,
    SHIPMENT_STATUS_CANCELED,
];

/// Returns whether `status` belongs to the internal vocabulary.
#[must_use]
pub fn is_known_shipment_status(status: &str) -> bool {
    SHIPMENT_STATUSES.contains(&status)
}

/// One line of a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentItem {
    /// Order line SKU.
    pub sku: String,
    /// Units shipped.
    pub quantity: u32,
}

/// Physical package dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentPackage {
    /// Length.
    pub length: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Weight.
    pub weight: f64,
    /// Unit label.
    pub unit: String,
}

/// Tracking event stored on a shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentEvent {
    /// Normalized status.
    pub status: String,
    /// When the event happened, UTC.
    pub occurred_at: DateTime<Utc>,
    /// Carrier-specific details.
    pub details: Map<String, Value>,
}

/// Shipment belonging to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    /// Shipment identifier.
    pub id: String,
    /// Carrier code, uppercase.
    pub carrier: String,
    /// Carrier service level.
    pub service_level: Option<String>,
    /// Current normalized status.
    pub status: String,
    /// Carrier tracking code, uppercase.
    pub tracking_code: Option<String>,
    /// Estimated delivery time.
    pub eta: Option<DateTime<Utc>>,
    /// Staff notes.
    pub notes: Option<String>,
    /// Shipped lines.
    pub items: Vec<ShipmentItem>,
    /// Package details.
    pub package: Option<ShipmentPackage>,
    /// Tracking history, oldest first.
    pub events: Vec<ShipmentEvent>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Normalized event received from a carrier webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierShipmentEvent {
    /// Order reference supplied by the carrier, if any.
    pub order_id: Option<String>,
    /// Shipment reference supplied by the carrier, if any.
    pub shipment_id: Option<String>,
    /// Carrier display name.
    pub carrier: String,
    /// Tracking code, trimmed and uppercase.
    pub tracking_code: String,
    /// Event with normalized status and UTC time.
    pub event: ShipmentEvent,
}
