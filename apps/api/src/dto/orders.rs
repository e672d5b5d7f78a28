mod conversions;
mod types;

pub use types::{
    OrderListResponse, OrderStatusTransitionRequest, OrderStatusTransitionResponse,
    OrderSummaryResponse, PaymentActionRequest, PaymentActionResponse, PaymentResponse,
    PaymentSummaryResponse, ShipmentCreateRequest, ShipmentEnvelopeResponse,
    ShipmentEventResponse, ShipmentItemDto, ShipmentPackageDto, ShipmentResponse,
    ShipmentUpdateRequest,
};
