//! Identifier coercion.
//!
//! Identifiers arrive in mixed surface forms: integers, integral floats
//! (`7.0`, the usual spreadsheet-export rendering), and numeric strings.
//! They are coerced to a single integer type here, once, at parse time.

use serde_json::Value;

/// Identifier shared by schedule rows and scene objects.
pub type Id = i64;

/// Parse an identifier from its textual form.
///
/// Accepts plain integers and integral floats (`"7"`, `"7.0"`). Returns
/// `None` for anything else, including non-integral floats.
pub fn parse_id(text: &str) -> Option<Id> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(n);
    }
    match text.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
            Some(f as Id)
        }
        _ => None,
    }
}

/// Coerce a JSON value to an identifier.
pub fn coerce_id(value: &Value) -> Option<Id> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as Id)
        }
        Value::String(s) => parse_id(s),
        _ => None,
    }
}
