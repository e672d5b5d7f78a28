mod conversions;
mod types;

pub use types::{AiWorkerCallbackRequest, AiWorkerErrorDto, AiWorkerSuggestionDto};
