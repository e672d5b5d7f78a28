use chrono::{DateTime, SecondsFormat, Utc};

/// RFC3339 in UTC with a `Z` suffix and only as much sub-second precision as needed.
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn format_optional_timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(format_timestamp)
}
