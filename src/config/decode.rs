//! Explicit decoding of a merged tree into a typed configuration.
//!
//! The [`Decoder`] only hands out values for paths the schema declares, and
//! type-checks each one against its declared kind. Absent and null leaves
//! decode to the zero value of their kind, leaving `required` to the
//! validator.

use super::schema::{FieldKind, Schema};
use super::tree::{ConfigTree, value_kind};
use crate::error::{ConfigError, Result};
use serde::Serialize;
use serde_json::Value;

/// A typed configuration record that can be described, decoded, and
/// re-encoded for validation.
///
/// `Serialize` must produce the same key layout the schema declares.
pub trait Configurable: Sized + Serialize {
    /// Describe the configuration surface.
    fn schema() -> Result<Schema>;

    /// Build the typed value from decoded leaves.
    fn decode(decoder: &Decoder<'_>) -> Result<Self>;

    /// Re-encode as a tree (used by validation).
    fn to_tree(&self) -> Result<ConfigTree> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ConfigError::decode(
                "",
                format!("typed config encodes to {}, not a mapping", value_kind(&other)),
            )),
            Err(e) => Err(ConfigError::decode("", e.to_string())),
        }
    }
}

/// Typed, schema-checked access to a merged tree.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    schema: &'a Schema,
    tree: &'a ConfigTree,
}

impl<'a> Decoder<'a> {
    pub fn new(schema: &'a Schema, tree: &'a ConfigTree) -> Self {
        Self { schema, tree }
    }

    /// Type-check every declared leaf, reporting the first mismatch.
    pub fn check(&self) -> Result<()> {
        for doc in self.schema.fields() {
            self.leaf(&doc.path, doc.kind)?;
        }
        Ok(())
    }

    pub fn string(&self, path: &str) -> Result<String> {
        match self.leaf(path, FieldKind::String)? {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Ok(String::new()),
        }
    }

    pub fn int(&self, path: &str) -> Result<i64> {
        Ok(self
            .leaf(path, FieldKind::Int)?
            .and_then(Value::as_i64)
            .unwrap_or_default())
    }

    pub fn uint(&self, path: &str) -> Result<u64> {
        Ok(self
            .leaf(path, FieldKind::Uint)?
            .and_then(Value::as_u64)
            .unwrap_or_default())
    }

    pub fn bool(&self, path: &str) -> Result<bool> {
        Ok(self
            .leaf(path, FieldKind::Bool)?
            .and_then(Value::as_bool)
            .unwrap_or_default())
    }

    pub fn float(&self, path: &str) -> Result<f64> {
        Ok(self
            .leaf(path, FieldKind::Float)?
            .and_then(Value::as_f64)
            .unwrap_or_default())
    }

    /// Resolve a declared leaf, returning `None` when it is absent or null.
    fn leaf(&self, path: &str, kind: FieldKind) -> Result<Option<&'a Value>> {
        let doc = self
            .schema
            .field(path)
            .ok_or_else(|| ConfigError::decode(path, "field is not declared in the schema"))?;
        if doc.kind != kind {
            return Err(ConfigError::decode(
                path,
                format!("field is declared as {}, read as {}", doc.kind, kind),
            ));
        }

        let Some(value) = self.lookup(path)? else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(None);
        }

        let matches = match kind {
            FieldKind::String => value.is_string(),
            FieldKind::Int => value.is_i64() || value.as_u64().is_some_and(|n| n <= i64::MAX as u64),
            FieldKind::Uint => value.is_u64(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Float => value.is_number(),
        };
        if !matches {
            return Err(ConfigError::decode(
                path,
                format!("expected {}, found {} ({})", kind, value_kind(value), value),
            ));
        }
        Ok(Some(value))
    }

    /// Walk the tree, failing if an intermediate segment is not a mapping.
    fn lookup(&self, path: &str) -> Result<Option<&'a Value>> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut current = self.tree;
        for (depth, segment) in segments.iter().enumerate() {
            let Some(value) = current.get(*segment) else {
                return Ok(None);
            };
            if depth + 1 == segments.len() {
                return Ok(Some(value));
            }
            match value {
                Value::Object(map) => current = map,
                Value::Null => return Ok(None),
                other => {
                    return Err(ConfigError::decode(
                        segments[..=depth].join("."),
                        format!("expected mapping, found {}", value_kind(other)),
                    ));
                }
            }
        }
        Ok(None)
    }
}

/// Type-check the whole tree, then build the typed value.
pub fn decode<T: Configurable>(schema: &Schema, tree: &ConfigTree) -> Result<T> {
    let decoder = Decoder::new(schema, tree);
    decoder.check()?;
    T::decode(&decoder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Field;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder()
            .section("server", |s| {
                s.field(Field::string("host"))
                    .field(Field::uint("port"))
                    .field(Field::int("offset"))
                    .field(Field::bool("tls"))
                    .field(Field::float("ratio"))
            })
            .build()
            .unwrap()
    }

    fn tree(value: Value) -> ConfigTree {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_reads_each_kind() {
        let schema = schema();
        let t = tree(json!({"server": {
            "host": "localhost", "port": 8080, "offset": -3, "tls": true, "ratio": 2
        }}));
        let d = Decoder::new(&schema, &t);
        d.check().unwrap();
        assert_eq!(d.string("server.host").unwrap(), "localhost");
        assert_eq!(d.uint("server.port").unwrap(), 8080);
        assert_eq!(d.int("server.offset").unwrap(), -3);
        assert!(d.bool("server.tls").unwrap());
        assert_eq!(d.float("server.ratio").unwrap(), 2.0);
    }

    #[test]
    fn test_absent_and_null_are_zero_values() {
        let schema = schema();
        let t = tree(json!({"server": {"host": null}}));
        let d = Decoder::new(&schema, &t);
        assert_eq!(d.string("server.host").unwrap(), "");
        assert_eq!(d.uint("server.port").unwrap(), 0);
        assert!(!d.bool("server.tls").unwrap());
    }

    #[test]
    fn test_type_mismatch_reports_path() {
        let schema = schema();
        let t = tree(json!({"server": {"port": "eighty"}}));
        let err = Decoder::new(&schema, &t).check().unwrap_err();
        match err {
            ConfigError::Decode { path, message } => {
                assert_eq!(path, "server.port");
                assert!(message.contains("expected uint"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_uint_rejected() {
        let schema = schema();
        let t = tree(json!({"server": {"port": -1}}));
        assert!(Decoder::new(&schema, &t).check().is_err());
    }

    #[test]
    fn test_numeric_string_is_not_a_string() {
        let schema = schema();
        let t = tree(json!({"server": {"host": 1.5}}));
        assert!(Decoder::new(&schema, &t).string("server.host").is_err());
    }

    #[test]
    fn test_scalar_where_record_expected() {
        let schema = schema();
        let t = tree(json!({"server": "oops"}));
        let err = Decoder::new(&schema, &t).check().unwrap_err();
        assert!(matches!(err, ConfigError::Decode { ref path, .. } if path == "server"));
    }

    #[test]
    fn test_undeclared_and_wrong_kind_reads() {
        let schema = schema();
        let t = ConfigTree::new();
        let d = Decoder::new(&schema, &t);
        assert!(d.string("server.missing").is_err());
        assert!(d.string("server.port").is_err());
    }
}
