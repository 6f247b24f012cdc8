//! Tagged line payload parsing.
//!
//! Turns the free-form text after a tag marker into typed fields. Parsing
//! never fails: tokens that are not `key=value` pairs are skipped, and a
//! line with no usable tokens yields an empty map.

use crate::models::{FieldMap, ScalarValue};

/// Parse a raw value into the narrowest scalar type that accepts it.
///
/// `nan`, `inf`, `+inf` and `-inf` (any case) are floats. Anything with a
/// decimal point or exponent marker is tried as a float, everything else as
/// an integer. Values neither parser accepts are kept as text.
pub fn parse_value(raw: &str) -> ScalarValue {
    match raw.to_ascii_lowercase().as_str() {
        "nan" => return ScalarValue::Float(f64::NAN),
        "inf" | "+inf" => return ScalarValue::Float(f64::INFINITY),
        "-inf" => return ScalarValue::Float(f64::NEG_INFINITY),
        _ => {}
    }

    let looks_fractional = raw.contains('.') || raw.contains('e') || raw.contains('E');
    let parsed = if looks_fractional {
        raw.parse::<f64>().ok().map(ScalarValue::Float)
    } else {
        raw.parse::<i64>().ok().map(ScalarValue::Integer)
    };

    parsed.unwrap_or_else(|| ScalarValue::String(raw.to_string()))
}

/// Parse the `key=value` tokens of a line, after its tag marker.
///
/// Text up to and including the first occurrence of `prefix` is discarded,
/// so timestamps or thread ids printed before the marker never become
/// fields. Trailing commas on values are stripped.
///
/// ```
/// use solverlog_extract::parser::parse_key_value_line;
/// use solverlog_extract::models::ScalarValue;
///
/// let fields = parse_key_value_line("FP_FEATURES: n_vars=100, density=0.25", "FP_FEATURES:");
/// assert_eq!(fields["n_vars"], ScalarValue::Integer(100));
/// assert_eq!(fields["density"], ScalarValue::Float(0.25));
/// ```
pub fn parse_key_value_line(line: &str, prefix: &str) -> FieldMap {
    let body = match line.split_once(prefix) {
        Some((_, rest)) => rest,
        None => line,
    };

    let mut fields = FieldMap::new();
    for token in body.split_whitespace() {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        let value = value.trim_end_matches(',');
        fields.insert(key.to_string(), parse_value(value));
    }

    fields
}
