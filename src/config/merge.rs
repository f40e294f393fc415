//! Deep merge of configuration trees.
//!
//! Later sources win at the leaf level; nested maps are merged key by key.
//! Sequences are replaced entirely, never concatenated.

use super::tree::ConfigTree;
use serde_json::Value;

/// Merge `src` into `dst`, with `src` taking precedence.
///
/// - Key in both, both values maps: merged recursively
/// - Key in both, anything else: `src` replaces `dst` (no coercion, nulls included)
/// - Key only in `src`: added
/// - Key only in `dst`: preserved
///
/// # Example
/// ```
/// use serde_json::json;
/// use layerconf::config::merge;
///
/// let base = json!({"server": {"port": 8080, "host": "localhost"}});
/// let overlay = json!({"server": {"port": 9000}});
/// let merged = merge(
///     base.as_object().cloned().unwrap(),
///     overlay.as_object().cloned().unwrap(),
/// );
/// assert_eq!(
///     serde_json::Value::Object(merged),
///     json!({"server": {"port": 9000, "host": "localhost"}})
/// );
/// ```
pub fn merge(mut dst: ConfigTree, src: ConfigTree) -> ConfigTree {
    for (key, src_value) in src {
        let merged_value = match (dst.remove(&key), src_value) {
            (Some(Value::Object(dst_map)), Value::Object(src_map)) => {
                Value::Object(merge(dst_map, src_map))
            }
            (_, src_value) => src_value,
        };
        dst.insert(key, merged_value);
    }
    dst
}

/// Merge trees in order, later trees taking precedence.
///
/// Equivalent to folding [`merge`] over the sequence starting from an empty tree.
pub fn merge_all(trees: impl IntoIterator<Item = ConfigTree>) -> ConfigTree {
    trees.into_iter().fold(ConfigTree::new(), merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> ConfigTree {
        value.as_object().cloned().unwrap()
    }

    fn merged(base: Value, overlay: Value) -> Value {
        Value::Object(merge(tree(base), tree(overlay)))
    }

    #[test]
    fn test_disjoint_keys_union() {
        let a = json!({"a": 1, "nested": {"x": true}});
        let b = json!({"b": "two"});
        assert_eq!(
            merged(a.clone(), b.clone()),
            json!({"a": 1, "b": "two", "nested": {"x": true}})
        );
        assert_eq!(merged(b, a.clone()), merged(a, json!({"b": "two"})));
    }

    #[test]
    fn test_nested_maps_merge_recursively() {
        let result = merged(json!({"a": {"x": 1, "y": 2}}), json!({"a": {"y": 3}}));
        assert_eq!(result, json!({"a": {"x": 1, "y": 3}}));
    }

    #[test]
    fn test_deep_nested_merge() {
        let base = json!({"l1": {"l2": {"l3": {"a": 1, "b": 2}}}});
        let overlay = json!({"l1": {"l2": {"l3": {"b": 3, "c": 4}}}});
        assert_eq!(
            merged(base, overlay),
            json!({"l1": {"l2": {"l3": {"a": 1, "b": 3, "c": 4}}}})
        );
    }

    #[test]
    fn test_sequences_replaced_not_concatenated() {
        let result = merged(json!({"items": [1, 2, 3]}), json!({"items": [4]}));
        assert_eq!(result, json!({"items": [4]}));
    }

    #[test]
    fn test_scalar_replaced_by_map_and_back() {
        assert_eq!(
            merged(json!({"v": 42}), json!({"v": {"nested": true}})),
            json!({"v": {"nested": true}})
        );
        assert_eq!(
            merged(json!({"v": {"nested": true}}), json!({"v": 42})),
            json!({"v": 42})
        );
    }

    #[test]
    fn test_null_overwrites() {
        assert_eq!(merged(json!({"a": 1}), json!({"a": null})), json!({"a": null}));
    }

    #[test]
    fn test_merge_all() {
        let trees = vec![
            tree(json!({"a": 1})),
            tree(json!({"b": 2})),
            tree(json!({"a": 3, "c": 4})),
        ];
        assert_eq!(
            Value::Object(merge_all(trees)),
            json!({"a": 3, "b": 2, "c": 4})
        );
    }

    #[test]
    fn test_merge_all_identity_and_empty() {
        let a = tree(json!({"a": {"b": 1}}));
        assert_eq!(merge_all(vec![a.clone()]), a);
        assert!(merge_all(Vec::<ConfigTree>::new()).is_empty());
    }
}
