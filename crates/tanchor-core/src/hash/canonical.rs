//! Canonical textual form of structured values.
//!
//! ## Rules
//!
//! - Object keys are sorted by UTF-16 code unit, which differs from byte
//!   order only for keys outside the Basic Multilingual Plane.
//! - Absent fields never reach this layer: typed values mark optional fields
//!   with `skip_serializing_if`, so an absent field and a missing key are the
//!   same thing. `null` is kept and renders as the literal `null`.
//! - Arrays keep their order and recurse element-wise.
//! - No insignificant whitespace.
//! - Integral floating point numbers render without a fractional part
//!   (`1.0` → `1`), everything else uses the shortest round-trip form.

use serde_json::{Map, Number, Value};

/// Produce the canonical textual form of a JSON value.
///
/// Two values that differ only in key order canonicalize to byte-identical
/// strings.
///
/// ```
/// use serde_json::json;
/// use tanchor_core::hash::canonicalize;
///
/// assert_eq!(canonicalize(&json!({"z": 1, "a": 2})), r#"{"a":2,"z":1}"#);
/// assert_eq!(canonicalize(&json!(null)), "null");
/// ```
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&canonical_number(n)),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map),
    }
}

fn write_object(out: &mut String, map: &Map<String, Value>) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));

    out.push('{');
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, &map[key.as_str()]);
    }
    out.push('}');
}

fn write_string(out: &mut String, s: &str) {
    // Serializing a str into JSON cannot fail.
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => out.push_str("\"\""),
    }
}

fn canonical_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        _ => n.to_string(),
    }
}
