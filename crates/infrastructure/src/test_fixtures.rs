use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Map;

use sealworks_domain::{Order, OrderStatus, Payment, PaymentStatus, Shipment};

pub(crate) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

pub(crate) fn order(id: &str, status: OrderStatus, created_minutes: i64) -> Order {
    let created_at = base_time() + Duration::minutes(created_minutes);
    Order {
        id: id.to_owned(),
        order_number: format!("HF-{id}"),
        status,
        payment_status: None,
        currency: "JPY".to_owned(),
        total: 8_800,
        customer_email: None,
        promotion_code: None,
        channel: None,
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
        placed_at: None,
        paid_at: None,
        shipped_at: None,
        delivered_at: None,
        completed_at: None,
    }
}

pub(crate) fn shipment(id: &str, tracking_code: &str) -> Shipment {
    Shipment {
        id: id.to_owned(),
        carrier: "UPS".to_owned(),
        service_level: None,
        status: "in_transit".to_owned(),
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

pub(crate) fn payment(id: &str, intent_id: &str) -> Payment {
    Payment {
        id: id.to_owned(),
        provider: "stripe".to_owned(),
        intent_id: intent_id.to_owned(),
        status: PaymentStatus::Authorized,
        currency: "JPY".to_owned(),
        amount: 8_800,
        captured_amount: 0,
        refunded_amount: 0,
        created_at: base_time(),
        updated_at: base_time(),
        captured_at: None,
        refunded_at: None,
    }
}
