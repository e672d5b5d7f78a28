use sealworks_domain::{
    Order, Payment, PaymentStatus, Shipment, ShipmentEvent, ShipmentItem, ShipmentPackage,
};

use super::types::{
    OrderSummaryResponse, PaymentResponse, PaymentSummaryResponse, ShipmentEventResponse,
    ShipmentItemDto, ShipmentPackageDto, ShipmentResponse,
};
use crate::dto::common::{format_optional_timestamp, format_timestamp};

impl From<Order> for OrderSummaryResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            status: order.status.as_str().to_owned(),
            payment_status: order.payment_status,
            currency: order.currency,
            total: order.total,
            customer_email: order.customer_email,
            promotion_code: order.promotion_code,
            channel: order.channel,
            production_queue: order.production_queue,
            production_stage: order.production_stage,
            last_event_type: order.last_event_type,
            last_event_at: format_optional_timestamp(order.last_event_at),
            outstanding_tasks: order.outstanding_tasks,
            on_hold: order.on_hold,
            created_at: format_timestamp(order.created_at),
            updated_at: format_timestamp(order.updated_at),
            placed_at: format_optional_timestamp(order.placed_at),
            paid_at: format_optional_timestamp(order.paid_at),
        }
    }
}

impl From<ShipmentItem> for ShipmentItemDto {
    fn from(item: ShipmentItem) -> Self {
        Self {
            sku: item.sku,
            quantity: item.quantity,
        }
    }
}

impl From<ShipmentItemDto> for ShipmentItem {
    fn from(item: ShipmentItemDto) -> Self {
        Self {
            sku: item.sku.trim().to_owned(),
            quantity: item.quantity,
        }
    }
}

impl From<ShipmentPackage> for ShipmentPackageDto {
    fn from(package: ShipmentPackage) -> Self {
        Self {
            length: package.length,
            width: package.width,
            height: package.height,
            weight: package.weight,
            unit: package.unit,
        }
    }
}

impl From<ShipmentPackageDto> for ShipmentPackage {
    fn from(package: ShipmentPackageDto) -> Self {
        Self {
            length: package.length,
            width: package.width,
            height: package.height,
            weight: package.weight,
            unit: package.unit.trim().to_owned(),
        }
    }
}

impl From<ShipmentEvent> for ShipmentEventResponse {
    fn from(event: ShipmentEvent) -> Self {
        Self {
            status: event.status,
            occurred_at: format_timestamp(event.occurred_at),
            details: event.details,
        }
    }
}

impl From<Shipment> for ShipmentResponse {
    fn from(shipment: Shipment) -> Self {
        Self {
            id: shipment.id,
            carrier: shipment.carrier,
            service_level: shipment.service_level,
            status: shipment.status,
            tracking_code: shipment.tracking_code,
            expected_delivery: format_optional_timestamp(shipment.eta),
            notes: shipment.notes,
            items: shipment.items.into_iter().map(Into::into).collect(),
            package: shipment.package.map(Into::into),
            events: shipment.events.into_iter().map(Into::into).collect(),
            created_at: format_timestamp(shipment.created_at),
            updated_at: format_timestamp(shipment.updated_at),
        }
    }
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        let transaction_id = Some(payment.intent_id.trim().to_owned()).filter(|id| !id.is_empty());
        let captured = payment.captured_amount > 0
            || matches!(
                payment.status,
                PaymentStatus::Captured | PaymentStatus::PartiallyRefunded | PaymentStatus::Refunded
            );

        Self {
            id: payment.id,
            provider: payment.provider,
            status: payment.status.as_str().to_owned(),
            amount: payment.amount,
            currency: payment.currency,
            transaction_id,
            captured,
            captured_at: format_optional_timestamp(payment.captured_at),
            refunded_at: format_optional_timestamp(payment.refunded_at),
            refunded_amount: payment.refunded_amount,
            created_at: format_timestamp(payment.created_at),
            updated_at: format_timestamp(payment.updated_at),
        }
    }
}

impl PaymentSummaryResponse {
    /// Totals across every payment on the order.
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        let captured_amount: i64 = order
            .payments
            .iter()
            .map(|payment| payment.captured_amount)
            .sum();
        let refunded_amount: i64 = order
            .payments
            .iter()
            .map(|payment| payment.refunded_amount)
            .sum();

        Self {
            status: order
                .payment_status
                .clone()
                .unwrap_or_else(|| "pending".to_owned()),
            captured_amount,
            refunded_amount,
            balance_due: (order.total - (captured_amount - refunded_amount)).max(0),
            updated_at: format_timestamp(order.updated_at),
        }
    }
}
