//! Wire record normalization
//!
//! The contract returns validation results either as a keyed mapping
//! (serialized as `[[key, value], ...]` or `{"__map": [[key, value], ...]}`)
//! or as a flat object. Numbers may arrive as JSON numbers, decimal strings,
//! big-integer strings with a trailing `n`, or hex strings. Everything is
//! folded into one [`ValidationRecord`] here; normalization never fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_VALIDATION_ID: &str = "Unknown";
pub const DEFAULT_FEEDBACK: &str = "No feedback";

/// Canonical result of one completed validation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub validation_id: String,
    /// Content preview stored by the contract
    pub content_hash: String,
    pub author: String,
    /// 0..=100
    pub score: u8,
    pub passed: bool,
    pub feedback: String,
    /// Block height, or the contract's sequence number
    pub timestamp: u64,
    pub word_count: u64,
}

/// Shape a raw record arrived in
#[derive(Debug, Clone)]
pub enum WireRecord<'a> {
    /// Keyed mapping; `fallback` holds the properties of a wrapping object
    Mapping {
        entries: Vec<(&'a str, &'a Value)>,
        fallback: Option<&'a Map<String, Value>>,
    },
    Flat(&'a Map<String, Value>),
    Opaque,
}

impl<'a> WireRecord<'a> {
    pub fn decode(raw: &'a Value) -> Self {
        match raw {
            Value::Array(items) => WireRecord::Mapping {
                entries: map_entries(items),
                fallback: None,
            },
            Value::Object(obj) => match obj.get("__map") {
                Some(Value::Array(items)) => WireRecord::Mapping {
                    entries: map_entries(items),
                    fallback: Some(obj),
                },
                _ => WireRecord::Flat(obj),
            },
            _ => WireRecord::Opaque,
        }
    }

    /// Look a field up: mapping entry first, then flat property. `null` counts as absent.
    pub fn field(&self, key: &str) -> Option<&'a Value> {
        let found = match self {
            WireRecord::Mapping { entries, fallback } => entries
                .iter()
                .find(|(k, v)| *k == key && !v.is_null())
                .map(|(_, v)| *v)
                .or_else(|| fallback.and_then(|obj| obj.get(key))),
            WireRecord::Flat(obj) => obj.get(key),
            WireRecord::Opaque => None,
        };
        found.filter(|v| !v.is_null())
    }
}

fn map_entries(items: &[Value]) -> Vec<(&str, &Value)> {
    items
        .iter()
        .filter_map(|item| match item.as_array().map(Vec::as_slice) {
            Some([Value::String(key), value]) => Some((key.as_str(), value)),
            _ => None,
        })
        .collect()
}

/// Fold a raw wire record into a [`ValidationRecord`]
pub fn normalize(raw: &Value) -> ValidationRecord {
    let wire = WireRecord::decode(raw);

    ValidationRecord {
        validation_id: text_field(&wire, "validation_id", DEFAULT_VALIDATION_ID),
        content_hash: text_field(&wire, "content_hash", ""),
        author: text_field(&wire, "author", ""),
        score: wire
            .field("score")
            .map(coerce_u64)
            .unwrap_or(0)
            .min(100) as u8,
        passed: wire.field("passed").map(coerce_bool).unwrap_or(false),
        feedback: text_field(&wire, "feedback", DEFAULT_FEEDBACK),
        timestamp: wire.field("timestamp").map(coerce_u64).unwrap_or(0),
        word_count: wire.field("word_count").map(coerce_u64).unwrap_or(0),
    }
}

fn text_field(wire: &WireRecord<'_>, key: &str, default: &str) -> String {
    match wire.field(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => default.to_string(),
    }
}

/// Best-effort unsigned integer; malformed input is 0
pub fn coerce_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(positive_trunc))
            .unwrap_or(0),
        Value::String(s) => parse_numeric_str(s),
        Value::Bool(b) => u64::from(*b),
        _ => 0,
    }
}

fn parse_numeric_str(s: &str) -> u64 {
    let s = s.trim();
    let s = s.strip_suffix('n').unwrap_or(s);

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return parse_hex(hex);
    }

    s.parse::<u64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(positive_trunc))
        .unwrap_or(0)
}

/// Hex digits to u64, saturating like the decimal path does
fn parse_hex(hex: &str) -> u64 {
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return 0;
    }
    let significant = hex.trim_start_matches('0');
    if significant.len() > 16 {
        return u64::MAX;
    }
    u64::from_str_radix(significant, 16).unwrap_or(0)
}

fn positive_trunc(f: f64) -> Option<u64> {
    // `as` saturates at u64::MAX for oversized big integers
    (f.is_finite() && f > 0.0).then(|| f.trunc() as u64)
}

/// Best-effort boolean
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    }
}
