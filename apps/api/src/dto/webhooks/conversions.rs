use sealworks_domain::AiSuggestion;

use super::types::AiWorkerCallbackRequest;
use crate::request::{parse_rfc3339, trimmed};

impl AiWorkerCallbackRequest {
    /// Suggestion projection from a successful callback; blank fields are left
    /// for the job service to fill from the job payload.
    #[must_use]
    pub fn suggestion_projection(&self) -> AiSuggestion {
        let mut suggestion = AiSuggestion {
            id: trimmed(self.suggestion_id.clone()).unwrap_or_default(),
            design_id: trimmed(self.design_id.clone()).unwrap_or_default(),
            method: trimmed(self.method.clone()).unwrap_or_default(),
            ..AiSuggestion::default()
        };

        if let Some(details) = &self.suggestion {
            if let Some(status) = trimmed(details.status.clone()) {
                suggestion.status = status;
            }
            suggestion.payload = details.payload.clone();
            if let Some(method) = trimmed(details.method.clone()) {
                suggestion.method = method;
            }
            suggestion.created_at = details.created_at.as_deref().and_then(parse_rfc3339);
            suggestion.updated_at = details.updated_at.as_deref().and_then(parse_rfc3339);
            suggestion.expires_at = details.expires_at.as_deref().and_then(parse_rfc3339);
        }

        suggestion
    }
}
