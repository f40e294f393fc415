//! Seeding the store with declared defaults.

use super::schema::Schema;
use super::tree::{ConfigTree, set_path};
use crate::error::{ConfigError, Result};
use tracing::trace;

/// Write every declared default into `store` at its dotted path.
///
/// Leaves without a default stay absent so later sources can introduce
/// them. A literal that does not parse under its kind is a schema error.
pub fn inject_defaults(store: &mut ConfigTree, schema: &Schema) -> Result<()> {
    for doc in schema.fields().filter(|doc| !doc.default.is_empty()) {
        let value = doc
            .kind
            .parse_literal(&doc.default)
            .map_err(|e| ConfigError::schema(&doc.path, format!("bad default: {}", e)))?;
        trace!(path = %doc.path, default = %doc.default, "Injecting default");
        set_path(store, &doc.path, value);
    }
    Ok(())
}

/// A fresh store holding only the defaults.
pub fn defaults_tree(schema: &Schema) -> Result<ConfigTree> {
    let mut store = ConfigTree::new();
    inject_defaults(&mut store, schema)?;
    Ok(store)
}
