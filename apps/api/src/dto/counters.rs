mod types;

pub use types::{CounterNextRequest, CounterNextResponse};
