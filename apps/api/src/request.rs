//! Shared request plumbing: capped body reads, query aliases, timestamps, and role gates.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, FromRequestParts, Query};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use sealworks_core::{Identity, Role};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ApiResult};

pub const ADMIN_OR_STAFF: &[Role] = &[Role::Admin, Role::Staff];

/// Reads at most `limit` bytes of the request body.
pub async fn read_body(body: Body, limit: usize) -> ApiResult<Bytes> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(error) if error.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ApiError::payload_too_large(limit))
        }
        Err(error) => Err(ApiError::invalid_request(format!(
            "failed to read request body: {error}"
        ))),
    }
}

/// Like [`read_body`], but an empty body is rejected.
pub async fn read_required_body(body: Body, limit: usize) -> ApiResult<Bytes> {
    let bytes = read_body(body, limit).await?;
    if is_blank(&bytes) {
        return Err(ApiError::invalid_request("request body is required"));
    }
    Ok(bytes)
}

pub fn decode_json<T: DeserializeOwned>(bytes: &[u8], code: &'static str) -> ApiResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|error| ApiError::bad_request(code, format!("invalid JSON payload: {error}")))
}

/// Decodes an optional body; empty input decodes as `T::default()`.
pub fn decode_optional_json<T: DeserializeOwned + Default>(
    bytes: &[u8],
    code: &'static str,
) -> ApiResult<T> {
    if is_blank(bytes) {
        return Ok(T::default());
    }
    decode_json(bytes, code)
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Raw query pairs, looked up by a list of accepted aliases.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                .collect(),
        )
    }

    /// First non-empty trimmed value among the aliases, in alias order.
    #[must_use]
    pub fn first(&self, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|alias| {
            self.0
                .iter()
                .filter(|(key, _)| key == alias)
                .map(|(_, value)| value.trim())
                .find(|value| !value.is_empty())
                .map(str::to_owned)
        })
    }

    /// All values for the aliases, split on commas, lowercased, deduplicated in first-seen order.
    #[must_use]
    pub fn all(&self, aliases: &[&str]) -> Vec<String> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .filter(|(key, _)| aliases.contains(&key.as_str()))
            .flat_map(|(_, value)| value.split(','))
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty() && seen.insert(value.clone()))
            .collect()
    }
}

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::invalid_request(rejection.body_text()))?;
        Ok(Self(pairs))
    }
}

/// Peer address when the server runs with connect info; absent in router tests.
#[derive(Debug, Clone, Copy)]
pub struct RemoteAddr(pub Option<SocketAddr>);

impl<S> FromRequestParts<S> for RemoteAddr
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(address)| *address),
        ))
    }
}

/// First valid `X-Forwarded-For` hop, falling back to the peer address.
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<IpAddr> {
    headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|hop| hop.trim().parse::<IpAddr>().ok())
        .or_else(|| remote.map(|address| address.ip()))
}

/// Parses RFC3339 (fractional seconds allowed) and normalizes to UTC.
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Parses RFC3339 plus the `YYYY-MM-DD HH:MM:SS [ZONE]` layouts carriers send.
///
/// Known zone abbreviations apply their offset, unknown ones read as UTC.
pub fn parse_flexible_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(parsed) = parse_rfc3339(value) {
        return Some(parsed);
    }

    let (local, offset) = match value.rsplit_once(' ') {
        Some((local, zone)) if zone.chars().all(|ch| ch.is_ascii_alphabetic()) => {
            (local, zone_offset(zone))
        }
        _ => (value, FixedOffset::east_opt(0)?),
    };
    let naive = NaiveDateTime::parse_from_str(local.trim(), "%Y-%m-%d %H:%M:%S").ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Offsets, in hours east of UTC, for zone abbreviations carriers send.
const ZONE_OFFSETS: &[(&str, i32)] = &[
    ("UTC", 0),
    ("GMT", 0),
    ("Z", 0),
    ("JST", 9),
    ("KST", 9),
    ("HKT", 8),
    ("SGT", 8),
    ("AEST", 10),
    ("AEDT", 11),
    ("CET", 1),
    ("CEST", 2),
    ("BST", 1),
    ("EST", -5),
    ("EDT", -4),
    ("MST", -7),
    ("MDT", -6),
    ("PST", -8),
    ("PDT", -7),
];

/// Resolves a zone abbreviation. Unknown abbreviations read as UTC.
fn zone_offset(zone: &str) -> FixedOffset {
    let hours = ZONE_OFFSETS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(zone))
        .map_or(0, |(_, hours)| *hours);
    FixedOffset::east_opt(hours * 3600).unwrap_or(Utc.fix())
}

/// Optional RFC3339 field; blank means absent, malformed maps to `code`.
pub fn optional_timestamp(
    value: Option<&str>,
    code: &'static str,
    field: &str,
) -> ApiResult<Option<DateTime<Utc>>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_rfc3339(raw)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request(code, format!("{field} must be RFC3339"))),
    }
}

pub fn parse_page_size(raw: Option<String>) -> ApiResult<Option<i64>> {
    raw.map(|value| {
        value
            .parse::<i64>()
            .map_err(|_| ApiError::bad_request("invalid_page_size", "page size must be an integer"))
    })
    .transpose()
}

pub fn require_roles(identity: &Identity, roles: &[Role]) -> ApiResult<()> {
    if !identity.has_any_role(roles) {
        return Err(ApiError::insufficient_role());
    }
    Ok(())
}

/// Splits `"{id}:{action}"` path segments, returning the id when the action matches.
pub fn strip_action<'a>(segment: &'a str, action: &str) -> Option<&'a str> {
    segment
        .rsplit_once(':')
        .filter(|(_, suffix)| *suffix == action)
        .map(|(id, _)| id.trim())
        .filter(|id| !id.is_empty())
}

pub fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::body::Body;
    use axum::http::{HeaderMap, HeaderValue, StatusCode};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use sealworks_core::{Identity, Role};

    use super::{
        QueryParams, client_ip, parse_flexible_timestamp, read_body, read_required_body,
        require_roles, strip_action,
    };

    #[tokio::test]
    async fn body_over_limit_is_payload_too_large() {
        let result = read_body(Body::from(vec![b'x'; 33]), 32).await;
        assert_eq!(
            result.err().map(|error| error.status()),
            Some(StatusCode::PAYLOAD_TOO_LARGE)
        );
    }

    #[tokio::test]
    async fn body_at_limit_is_accepted() {
        let bytes = read_body(Body::from(vec![b'x'; 32]), 32)
            .await
            .unwrap_or_default();
        assert_eq!(bytes.len(), 32);
    }

    #[tokio::test]
    async fn required_body_rejects_whitespace() {
        let result = read_required_body(Body::from("  \n"), 32).await;
        assert_eq!(
            result.err().map(|error| error.code()),
            Some("invalid_request")
        );
    }

    #[test]
    fn first_prefers_alias_order_and_skips_blank_values() {
        let params = QueryParams::from_pairs(&[
            ("page_size", " "),
            ("pageSize", "25"),
            ("page_size", "10"),
        ]);
        assert_eq!(
            params.first(&["pageSize", "page_size"]),
            Some("25".to_owned())
        );
        assert_eq!(params.first(&["page_size"]), Some("10".to_owned()));
        assert_eq!(params.first(&["missing"]), None);
    }

    #[test]
    fn all_splits_and_deduplicates_values() {
        let params = QueryParams::from_pairs(&[
            ("status", "Paid, in_production"),
            ("status", "paid"),
            ("other", "x"),
        ]);
        assert_eq!(
            params.all(&["status"]),
            vec!["paid".to_owned(), "in_production".to_owned()]
        );
    }

    #[test]
    fn client_ip_prefers_first_valid_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("garbage, 198.51.100.10, 10.0.0.1"),
        );
        let remote: SocketAddr = ([127, 0, 0, 1], 9000).into();

        assert_eq!(
            client_ip(&headers, Some(remote)).map(|ip| ip.to_string()),
            Some("198.51.100.10".to_owned())
        );
        assert_eq!(
            client_ip(&HeaderMap::new(), Some(remote)).map(|ip| ip.to_string()),
            Some("127.0.0.1".to_owned())
        );
    }

    #[test]
    fn flexible_timestamps_normalize_to_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 11, 3, 9, 0, 0).single();
        assert_eq!(parse_flexible_timestamp("2024-11-03T09:00:00Z"), expected);
        assert_eq!(
            parse_flexible_timestamp("2024-11-03T18:00:00.000+09:00"),
            expected
        );
        assert_eq!(parse_flexible_timestamp("2024-11-03 09:00:00 UTC"), expected);
        assert_eq!(parse_flexible_timestamp("2024-11-03 09:00:00"), expected);
        assert_eq!(parse_flexible_timestamp("yesterday"), None);
    }

    #[test]
    fn flexible_timestamp_applies_zone_abbreviations() {
        let expected = Utc.with_ymd_and_hms(2024, 11, 3, 9, 0, 0).single();
        assert_eq!(parse_flexible_timestamp("2024-11-03 18:00:00 JST"), expected);
        assert_eq!(parse_flexible_timestamp("2024-11-03 18:00:00 jst"), expected);
        assert_eq!(parse_flexible_timestamp("2024-11-03 04:00:00 EST"), expected);
        assert_eq!(parse_flexible_timestamp("2024-11-03 09:00:00 XYZT"), expected);
        assert_eq!(parse_flexible_timestamp("2024-11-03 18:00:00 +0900"), None);
    }

    #[test]
    fn role_gate_rejects_identities_without_required_role() {
        let staff = Identity::new("staff-1", None, None, [Role::Staff])
            .unwrap_or_else(|_| unreachable!("valid identity"));
        let user = Identity::new("user-1", None, None, [Role::User])
            .unwrap_or_else(|_| unreachable!("valid identity"));

        assert!(require_roles(&staff, &[Role::Admin, Role::Staff]).is_ok());
        assert_eq!(
            require_roles(&user, &[Role::Admin, Role::Staff])
                .err()
                .map(|error| error.status()),
            Some(StatusCode::FORBIDDEN)
        );
    }

    #[test]
    fn strip_action_requires_matching_suffix() {
        assert_eq!(strip_action("ord_1:status", "status"), Some("ord_1"));
        assert_eq!(strip_action("ord_1:refund", "status"), None);
        assert_eq!(strip_action(":status", "status"), None);
        assert_eq!(strip_action("ord_1", "status"), None);
    }

    proptest! {
        #[test]
        fn all_never_yields_duplicates_or_blanks(values in proptest::collection::vec("[a-zA-Z ,]{0,12}", 0..6)) {
            let pairs: Vec<(&str, &str)> = values.iter().map(|value| ("status", value.as_str())).collect();
            let collected = QueryParams::from_pairs(&pairs).all(&["status"]);
            let mut unique = collected.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(unique.len(), collected.len());
            prop_assert!(collected.iter().all(|value| !value.is_empty() && value == &value.to_lowercase()));
        }
    }
}
