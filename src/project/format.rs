use serde_json::Value;

pub const NO_PARAMETERS: &str = "No slicing parameters found";

/// Render parameters as `key: value` lines for display and for the model.
///
/// Nested objects and arrays get one indented level of `sub-key: sub-value`
/// lines, arrays keyed by index. Anything deeper is printed as compact JSON
/// on the sub-key's line.
pub fn format_parameters(params: Option<&Value>) -> String {
    let Some(params) = params else {
        return NO_PARAMETERS.to_string();
    };

    match params {
        Value::Null => NO_PARAMETERS.to_string(),
        Value::Object(map) => format_entries(map.iter().map(|(k, v)| (k.clone(), v))),
        Value::Array(items) => {
            format_entries(items.iter().enumerate().map(|(i, v)| (i.to_string(), v)))
        }
        scalar => display_value(scalar),
    }
}

fn format_entries<'a>(entries: impl Iterator<Item = (String, &'a Value)>) -> String {
    entries
        .map(|(key, value)| match value {
            Value::Object(nested) => {
                let mut block = format!("{key}:");
                for (sub_key, sub_value) in nested {
                    block.push_str(&format!("\n  {sub_key}: {}", display_value(sub_value)));
                }
                block
            }
            Value::Array(items) => {
                let mut block = format!("{key}:");
                for (i, item) in items.iter().enumerate() {
                    block.push_str(&format!("\n  {i}: {}", display_value(item)));
                }
                block
            }
            _ => format!("{key}: {}", display_value(value)),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
