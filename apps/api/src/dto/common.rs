mod conversions;
mod types;

pub(crate) use conversions::{format_optional_timestamp, format_timestamp};
pub use types::HealthResponse;
