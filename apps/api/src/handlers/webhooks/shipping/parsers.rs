//! Carrier payload shapes and their projection onto [`CarrierShipmentEvent`].

use chrono::{DateTime, Utc};
use sealworks_domain::{CarrierShipmentEvent, ShipmentEvent};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::carriers::Carrier;
use crate::dto::common::format_timestamp;
use crate::error::{ApiError, ApiResult};
use crate::request::{parse_flexible_timestamp, parse_rfc3339};

/// Carrier fields before status translation.
#[derive(Debug)]
struct RawCarrierEvent {
    order_id: String,
    shipment_id: String,
    tracking: String,
    tracking_field: &'static str,
    status: String,
    occurred_at: String,
    details: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhlPayload {
    #[serde(default)]
    order_id: String,
    #[serde(default)]
    shipment_id: String,
    #[serde(default)]
    tracking_number: String,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    details: Option<Map<String, Value>>,
    #[serde(default)]
    raw: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct JpPostPayload {
    #[serde(default)]
    mail: JpPostMail,
}

#[derive(Default, Deserialize)]
struct JpPostMail {
    #[serde(default)]
    order_id: String,
    #[serde(default)]
    shipment_id: String,
    #[serde(default)]
    tracking_no: String,
    #[serde(default)]
    event: JpPostEvent,
}

#[derive(Default, Deserialize)]
struct JpPostEvent {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    datetime: String,
}

#[derive(Deserialize)]
struct YamatoPayload {
    #[serde(default)]
    order_id: String,
    #[serde(default)]
    shipment_id: String,
    #[serde(default)]
    tracking_code: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    occurred_at: String,
    #[serde(default)]
    note: String,
    #[serde(default)]
    expected_delivery: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsPayload {
    #[serde(default)]
    order_id: String,
    #[serde(default)]
    shipment_id: String,
    #[serde(default)]
    tracking_number: String,
    #[serde(default)]
    event: UpsEvent,
}

#[derive(Default, Deserialize)]
struct UpsEvent {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    time: String,
    #[serde(default)]
    location: String,
}

#[derive(Deserialize)]
struct FedexPayload {
    #[serde(default)]
    order_id: String,
    #[serde(default)]
    shipment_id: String,
    #[serde(default)]
    tracking_number: String,
    #[serde(default)]
    event_status: String,
    #[serde(default)]
    status_text: String,
    #[serde(default)]
    event_time: String,
    #[serde(default)]
    exception_reason: String,
}

/// Decodes a carrier body into the normalized event.
///
/// `now` stands in for timestamps the carrier omits or sends in an unknown layout.
pub fn parse_carrier_event(
    carrier: Carrier,
    body: &[u8],
    now: DateTime<Utc>,
) -> ApiResult<CarrierShipmentEvent> {
    let raw = match carrier {
        Carrier::Dhl => decode::<DhlPayload>(carrier, body).map(from_dhl)?,
        Carrier::JpPost => decode::<JpPostPayload>(carrier, body).map(from_jp_post)?,
        Carrier::Yamato => decode::<YamatoPayload>(carrier, body).map(from_yamato)?,
        Carrier::Ups => decode::<UpsPayload>(carrier, body).map(from_ups)?,
        Carrier::Fedex => decode::<FedexPayload>(carrier, body).map(from_fedex)?,
    };

    let tracking_code = raw.tracking.trim().to_uppercase();
    if tracking_code.is_empty() {
        return Err(ApiError::bad_request(
            "missing_tracking",
            format!("{} is required", raw.tracking_field),
        ));
    }
    let status = carrier.translate_status(&raw.status)?;
    let occurred_at = parse_flexible_timestamp(&raw.occurred_at).unwrap_or(now);

    let mut details = raw.details;
    details.insert(
        "carrierStatus".to_owned(),
        Value::String(raw.status.trim().to_owned()),
    );
    details.insert(
        "carrier".to_owned(),
        Value::String(carrier.display_name().to_owned()),
    );

    Ok(CarrierShipmentEvent {
        order_id: non_blank(raw.order_id),
        shipment_id: non_blank(raw.shipment_id),
        carrier: carrier.display_name().to_owned(),
        tracking_code,
        event: ShipmentEvent {
            status,
            occurred_at,
            details,
        },
    })
}

fn decode<T: DeserializeOwned>(carrier: Carrier, body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|error| {
        tracing::debug!(carrier = carrier.key(), error = %error, "undecodable carrier payload");
        ApiError::bad_request(
            "invalid_payload",
            format!("invalid {} payload", carrier.display_name()),
        )
    })
}

fn from_dhl(payload: DhlPayload) -> RawCarrierEvent {
    let mut details = payload.details.unwrap_or_default();
    insert_text(&mut details, "description", &payload.description);
    insert_text(&mut details, "location", &payload.location);
    for (key, value) in payload.raw.unwrap_or_default() {
        details.entry(key).or_insert(value);
    }

    RawCarrierEvent {
        order_id: payload.order_id,
        shipment_id: payload.shipment_id,
        tracking: payload.tracking_number,
        tracking_field: "trackingNumber",
        status: payload.status,
        occurred_at: payload.timestamp,
        details,
    }
}

fn from_jp_post(payload: JpPostPayload) -> RawCarrierEvent {
    let mail = payload.mail;
    let mut details = Map::new();
    insert_text(&mut details, "description", mail.event.description.trim());

    RawCarrierEvent {
        order_id: mail.order_id,
        shipment_id: mail.shipment_id,
        tracking: mail.tracking_no,
        tracking_field: "tracking_no",
        status: mail.event.code,
        occurred_at: mail.event.datetime,
        details,
    }
}

fn from_yamato(payload: YamatoPayload) -> RawCarrierEvent {
    let mut details = Map::new();
    insert_text(&mut details, "note", &payload.note);
    if let Some(eta) = parse_rfc3339(&payload.expected_delivery) {
        details.insert(
            "expectedDelivery".to_owned(),
            Value::String(format_timestamp(eta)),
        );
    }

    RawCarrierEvent {
        order_id: payload.order_id,
        shipment_id: payload.shipment_id,
        tracking: payload.tracking_code,
        tracking_field: "tracking_code",
        status: payload.status,
        occurred_at: payload.occurred_at,
        details,
    }
}

fn from_ups(payload: UpsPayload) -> RawCarrierEvent {
    let mut details = Map::new();
    insert_text(&mut details, "description", &payload.event.description);
    insert_text(&mut details, "location", &payload.event.location);

    RawCarrierEvent {
        order_id: payload.order_id,
        shipment_id: payload.shipment_id,
        tracking: payload.tracking_number,
        tracking_field: "trackingNumber",
        status: payload.event.code,
        occurred_at: payload.event.time,
        details,
    }
}

fn from_fedex(payload: FedexPayload) -> RawCarrierEvent {
    let mut details = Map::new();
    insert_text(&mut details, "description", &payload.status_text);
    insert_text(&mut details, "exceptionReason", &payload.exception_reason);

    RawCarrierEvent {
        order_id: payload.order_id,
        shipment_id: payload.shipment_id,
        tracking: payload.tracking_number,
        tracking_field: "tracking_number",
        status: payload.event_status,
        occurred_at: payload.event_time,
        details,
    }
}

fn insert_text(details: &mut Map<String, Value>, key: &str, value: &str) {
    if !value.is_empty() {
        details.insert(key.to_owned(), Value::String(value.to_owned()));
    }
}

fn non_blank(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}
