//! Sequence counter naming, options, and formatting rules.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sealworks_core::{AppError, AppResult};

/// Segment used when no other source provides one.
pub const DEFAULT_COUNTER_SEGMENT: &str = "global";

const SEGMENT_VALUE_KEYS: &[&str] = &["id", "name", "segment", "key"];

/// Returns whether `value` is a valid scope token: ASCII letters, digits, `-`, `_`, `.`.
#[must_use]
pub fn is_counter_scope_token(value: &str) -> bool {
    !value.is_empty()
        && !value.contains("..")
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
}

/// Returns whether `value` is a valid segment token; segments also allow `=` and `|`.
#[must_use]
pub fn is_counter_segment_token(value: &str) -> bool {
    !value.is_empty()
        && !value.contains("..")
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '=' | '|'))
}

/// Parsed `scope[:segment]` counter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterName {
    /// Counter scope.
    pub scope: String,
    /// Optional segment from the path.
    pub segment: Option<String>,
}

/// Parses a path counter name of the form `scope` or `scope:segment`.
pub fn parse_counter_name(raw: &str) -> AppResult<CounterName> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("counter name is required".to_owned()));
    }
    if raw.contains('/') || raw.contains("..") {
        return Err(AppError::Validation(format!(
            "counter name '{raw}' contains a forbidden sequence"
        )));
    }

    let (scope, segment) = match raw.split_once(':') {
        Some((scope, segment)) => (scope.trim(), Some(segment.trim())),
        None => (raw, None),
    };

    if !is_counter_scope_token(scope) {
        return Err(AppError::Validation(format!(
            "counter scope '{scope}' has invalid characters"
        )));
    }

    let segment = match segment {
        Some("") | None => None,
        Some(segment) if is_counter_segment_token(segment) => Some(segment.to_owned()),
        Some(segment) => {
            return Err(AppError::Validation(format!(
                "counter segment '{segment}' has invalid characters"
            )));
        }
    };

    Ok(CounterName {
        scope: scope.to_owned(),
        segment,
    })
}

/// Derives a segment from a caller-supplied scope map.
///
/// A single `id`/`name`/`segment`/`key` entry yields its value, any other
/// single entry yields `key=value`, and several entries are sorted by key and
/// joined with `|`. Blank keys and values are ignored.
#[must_use]
pub fn segment_from_scope(scope: &BTreeMap<String, String>) -> Option<String> {
    let mut pairs: Vec<(&str, &str)> = scope
        .iter()
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .collect();
    pairs.sort_unstable();

    match pairs.as_slice() {
        [] => None,
        [(key, value)] if SEGMENT_VALUE_KEYS.contains(&key.to_ascii_lowercase().as_str()) => {
            Some((*value).to_owned())
        }
        [(key, value)] => Some(format!("{key}={value}")),
        many => Some(
            many.iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join("|"),
        ),
    }
}

/// Caller-supplied counter options, validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterOptions {
    /// Increment, strictly positive.
    pub step: Option<i64>,
    /// Inclusive upper bound.
    pub max_value: Option<i64>,
    /// Starting value used only when the counter is first created.
    pub initial_value: Option<i64>,
    /// Text placed before the number.
    pub prefix: String,
    /// Text placed after the number.
    pub suffix: String,
    /// Zero-padding width, 0 disables padding.
    pub pad_length: usize,
}

/// Widest zero-padding a counter may request.
pub const MAX_COUNTER_PAD_LENGTH: usize = 64;

/// Raw options as received from a request body.
#[derive(Debug, Clone, Default)]
pub struct CounterOptionsInput {
    /// Requested step.
    pub step: Option<i64>,
    /// Requested upper bound.
    pub max_value: Option<i64>,
    /// Requested starting value.
    pub initial_value: Option<i64>,
    /// Requested prefix.
    pub prefix: Option<String>,
    /// Requested suffix.
    pub suffix: Option<String>,
    /// Requested padding width.
    pub pad_length: Option<i64>,
}

impl CounterOptions {
    /// Validates raw options.
    pub fn from_input(input: CounterOptionsInput) -> AppResult<Self> {
        if let Some(step) = input.step
            && step <= 0
        {
            return Err(AppError::Validation("step must be positive".to_owned()));
        }
        if let Some(max_value) = input.max_value
            && max_value < 0
        {
            return Err(AppError::Validation(
                "maxValue must be non-negative".to_owned(),
            ));
        }
        if let Some(initial_value) = input.initial_value
            && initial_value < 0
        {
            return Err(AppError::Validation(
                "initialValue must be non-negative".to_owned(),
            ));
        }
        let pad_length = match input.pad_length {
            None => 0,
            Some(pad_length) => usize::try_from(pad_length).map_err(|_| {
                AppError::Validation("padLength must be non-negative".to_owned())
            })?,
        };
        if pad_length > MAX_COUNTER_PAD_LENGTH {
            return Err(AppError::Validation(format!(
                "padLength must not exceed {MAX_COUNTER_PAD_LENGTH}"
            )));
        }

        Ok(Self {
            step: input.step,
            max_value: input.max_value,
            initial_value: input.initial_value,
            prefix: input.prefix.unwrap_or_default().trim().to_owned(),
            suffix: input.suffix.unwrap_or_default().trim().to_owned(),
            pad_length,
        })
    }

    /// Returns the effective increment.
    #[must_use]
    pub fn effective_step(&self) -> i64 {
        self.step.unwrap_or(1)
    }

    /// Formats `value` with prefix, padding, and suffix.
    #[must_use]
    pub fn format(&self, value: i64) -> String {
        let width = self.pad_length;
        if width > 0 {
            format!("{}{value:0width$}{}", self.prefix, self.suffix)
        } else {
            format!("{}{value}{}", self.prefix, self.suffix)
        }
    }
}

/// Next value handed out by a counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterValue {
    /// Raw value.
    pub value: i64,
    /// Formatted value.
    pub formatted: String,
}

/// Builds the storage key for a counter.
#[must_use]
pub fn counter_key(scope: &str, segment: &str) -> String {
    format!("{scope}:{segment}")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::{
        CounterOptions, CounterOptionsInput, MAX_COUNTER_PAD_LENGTH, is_counter_scope_token,
        parse_counter_name, segment_from_scope,
    };

    fn scope(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn formats_with_padding_prefix_and_suffix() {
        let options = CounterOptions::from_input(CounterOptionsInput {
            prefix: Some("ORD-2025-".to_owned()),
            pad_length: Some(6),
            ..CounterOptionsInput::default()
        })
        .unwrap_or_else(|_| unreachable!("valid options"));
        assert_eq!(options.format(101), "ORD-2025-000101");

        let plain = CounterOptions::default();
        assert_eq!(plain.format(7), "7");
    }

    #[test]
    fn parses_scope_and_segment() {
        let name = parse_counter_name("invoices:jp")
            .unwrap_or_else(|_| unreachable!("valid name"));
        assert_eq!(name.scope, "invoices");
        assert_eq!(name.segment.as_deref(), Some("jp"));

        let bare = parse_counter_name("orders").unwrap_or_else(|_| unreachable!("valid name"));
        assert_eq!(bare.segment, None);
    }

    #[test]
    fn rejects_path_traversal_and_bad_characters() {
        for raw in ["orders/2025", "../orders", "or..ders", "orders!", "", "ord ers"] {
            assert!(parse_counter_name(raw).is_err(), "{raw}");
        }
        assert!(parse_counter_name("orders:region=jp|year=2025").is_ok());
        assert!(parse_counter_name("orders:a/b").is_err());
    }

    #[test]
    fn scope_map_rules() {
        assert_eq!(
            segment_from_scope(&scope(&[("id", "jp")])),
            Some("jp".to_owned())
        );
        assert_eq!(
            segment_from_scope(&scope(&[("region", "jp")])),
            Some("region=jp".to_owned())
        );
        assert_eq!(
            segment_from_scope(&scope(&[("year", "2025"), ("region", "jp")])),
            Some("region=jp|year=2025".to_owned())
        );
        assert_eq!(segment_from_scope(&scope(&[("region", " ")])), None);
    }

    #[test]
    fn options_reject_out_of_range_values() {
        let cases = [
            CounterOptionsInput {
                step: Some(0),
                ..CounterOptionsInput::default()
            },
            CounterOptionsInput {
                max_value: Some(-1),
                ..CounterOptionsInput::default()
            },
            CounterOptionsInput {
                initial_value: Some(-5),
                ..CounterOptionsInput::default()
            },
            CounterOptionsInput {
                pad_length: Some(-2),
                ..CounterOptionsInput::default()
            },
            CounterOptionsInput {
                pad_length: Some(70_000),
                ..CounterOptionsInput::default()
            },
        ];
        for input in cases {
            assert!(CounterOptions::from_input(input).is_err());
        }
    }

    #[test]
    fn widest_allowed_padding_formats() {
        let options = CounterOptions::from_input(CounterOptionsInput {
            pad_length: Some(i64::try_from(MAX_COUNTER_PAD_LENGTH).unwrap_or_default()),
            ..CounterOptionsInput::default()
        })
        .unwrap_or_else(|_| unreachable!("bound is inclusive"));
        assert_eq!(options.format(7).len(), MAX_COUNTER_PAD_LENGTH);

        let too_wide = CounterOptions::from_input(CounterOptionsInput {
            pad_length: Some(65),
            ..CounterOptionsInput::default()
        });
        assert!(too_wide.is_err());
    }

    proptest! {
        #[test]
        fn padded_output_keeps_value(value in 0_i64..10_000_000, pad in 0_i64..12) {
            let options = CounterOptions::from_input(CounterOptionsInput {
                prefix: Some("INV-".to_owned()),
                suffix: Some("-JP".to_owned()),
                pad_length: Some(pad),
                ..CounterOptionsInput::default()
            }).unwrap_or_else(|_| unreachable!("valid options"));
            let formatted = options.format(value);
            let digits = formatted
                .strip_prefix("INV-")
                .and_then(|rest| rest.strip_suffix("-JP"))
                .unwrap_or_default();
            prop_assert!(digits.len() >= usize::try_from(pad).unwrap_or_default());
            prop_assert_eq!(digits.parse::<i64>().ok(), Some(value));
        }

        #[test]
        fn scope_tokens_never_contain_slashes(token in "[A-Za-z0-9_./-]{1,16}") {
            if token.contains('/') || token.contains("..") {
                prop_assert!(!is_counter_scope_token(&token));
            } else {
                prop_assert!(is_counter_scope_token(&token));
            }
        }
    }
}
