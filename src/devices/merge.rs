// merge.rs
//
// Field helpers shared by the adapters. A remote field counts as absent when
// it is missing or falsy (null, false, "", 0), matching how the dashboard
// has always read the store.

use serde_json::Value;

use crate::models::{DeviceSnapshot, Scalar};

pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn present<'a>(snapshot: &'a DeviceSnapshot, name: &str) -> Option<&'a Value> {
    snapshot.field(name).filter(|v| is_truthy(v))
}

pub(crate) fn text_or(snapshot: &DeviceSnapshot, name: &str, default: &str) -> String {
    match present(snapshot, name) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => default.to_string(),
    }
}

/// Numbers and numeric strings convert; anything else is 0.
pub(crate) fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

pub(crate) fn number_or_zero(snapshot: &DeviceSnapshot, name: &str) -> f64 {
    present(snapshot, name).map(coerce_number).unwrap_or(0.0)
}

pub(crate) fn clamp_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Numeric reading of an intent payload. `None` when it is not a number.
pub(crate) fn scalar_number(value: &Scalar) -> Option<f64> {
    let n = match value {
        Scalar::Int(v) => *v as f64,
        Scalar::Float(v) => *v,
        Scalar::Text(s) => s.trim().parse::<f64>().ok()?,
    };
    n.is_finite().then_some(n)
}
