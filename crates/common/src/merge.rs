//! Layered configuration merge over JSON value trees

use serde_json::Value;

/// Merge `overlay` onto `base`, the overlay taking precedence
///
/// - objects merge key by key, recursively
/// - `null` never overrides anything
/// - a non-empty array replaces the base value entirely; an empty one is ignored
/// - any other value (including `false` and `0`) replaces the base value
pub fn merge_layer(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_layer(existing, value),
                    None if is_unset(value) => {}
                    None if value.is_object() => {
                        let mut fresh = Value::Object(serde_json::Map::new());
                        merge_layer(&mut fresh, value);
                        base_map.insert(key.clone(), fresh);
                    }
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (_, Value::Array(items)) if items.is_empty() => {}
        (base, overlay) => *base = overlay.clone(),
    }
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
