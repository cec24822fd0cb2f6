use serde_json::{Number, Value};

use super::{ParameterMap, SlicingParameters};

/// Interpret the text of a settings entry.
///
/// JSON is tried first and kept verbatim. Anything else goes through the
/// line-oriented `key=value` scanner, which never fails.
pub fn parse_settings(text: &str) -> SlicingParameters {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => SlicingParameters::Structured(value),
        Err(_) => SlicingParameters::Flat(parse_key_values(text)),
    }
}

/// Scan `key=value` lines, skipping blanks and `#` / `//` comments.
pub fn parse_key_values(text: &str) -> ParameterMap {
    let mut params = ParameterMap::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        params.insert(key.to_string(), coerce_value(value.trim()));
    }

    params
}

fn coerce_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "" => return Value::String(String::new()),
        _ => {}
    }

    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }

    match raw.parse::<f64>() {
        Ok(float) if float.is_finite() => number_value(float)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        _ => Value::String(raw.to_string()),
    }
}

// Integral floats collapse to integers so `1.0` and `1` display the same.
fn number_value(float: f64) -> Option<Number> {
    if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        Some(Number::from(float as i64))
    } else {
        Number::from_f64(float)
    }
}
