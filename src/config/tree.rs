//! The nested key-value tree every source is converted into before merging.

use serde_json::{Map, Value};

/// Arbitrary-depth mapping from key to scalar or nested tree.
///
/// Sequences are carried through as opaque leaf values.
pub type ConfigTree = Map<String, Value>;

/// Look up a dotted path such as `app.name`.
pub fn get_path<'a>(tree: &'a ConfigTree, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = tree.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write `value` at a dotted path, creating intermediate maps.
///
/// An intermediate segment that currently holds a scalar is replaced by a
/// map, matching the blind-overwrite rule of the merger.
pub fn set_path(tree: &mut ConfigTree, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };

    let mut current = tree;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(map) = entry else {
            return;
        };
        current = map;
    }
    current.insert(leaf.to_string(), value);
}

/// Lower-case every key, recursively. YAML keys are case-insensitive.
pub fn normalize_keys(tree: ConfigTree) -> ConfigTree {
    tree.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Object(map) => Value::Object(normalize_keys(map)),
                other => other,
            };
            (key.to_lowercase(), value)
        })
        .collect()
}

/// Human-readable name of a value's type, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
