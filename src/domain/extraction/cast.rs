//! Casting raw extracted values to a rule's declared type.

use crate::domain::fact::FactValue;
use crate::domain::strategy::ValueType;

/// Casts captured text. Returns `None` when the text does not fit the type.
pub fn cast_text(raw: &str, value_type: ValueType) -> Option<FactValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match value_type {
        ValueType::Integer => raw.parse::<i64>().ok().map(FactValue::Integer).or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| FactValue::Integer(f as i64))
        }),
        ValueType::Float => raw.parse::<f64>().ok().filter(|f| f.is_finite()).map(FactValue::Float),
        ValueType::Boolean => FactValue::Text(raw.to_string()).as_bool().map(FactValue::Boolean),
        ValueType::Text => Some(FactValue::Text(raw.to_string())),
    }
}

/// Casts a JSON value produced by a model.
pub fn cast_json(value: &serde_json::Value, value_type: ValueType) -> Option<FactValue> {
    use serde_json::Value;

    match (value, value_type) {
        (Value::Null, _) => None,
        (Value::String(s), _) => cast_text(s, value_type),
        (Value::Number(n), ValueType::Integer) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(FactValue::Integer),
        (Value::Number(n), ValueType::Float) => n.as_f64().map(FactValue::Float),
        (Value::Number(n), ValueType::Text) => Some(FactValue::Text(n.to_string())),
        (Value::Bool(b), ValueType::Boolean) => Some(FactValue::Boolean(*b)),
        (Value::Bool(b), ValueType::Text) => Some(FactValue::Text(b.to_string())),
        (Value::Array(items), ValueType::Text) => {
            let items: Option<Vec<String>> = items.iter().map(|i| i.as_str().map(str::to_string)).collect();
            items.filter(|i| !i.is_empty()).map(FactValue::List)
        }
        _ => None,
    }
}
