//! Layered configuration loading.
//!
//! Builds one typed configuration from several partial sources, lowest
//! precedence first:
//! 1. **Defaults** - declared on the [`Schema`]
//! 2. **Base** - `config.yaml` (or `config.yml`)
//! 3. **Partials** - every other `config.*.yaml`
//! 4. **Command** - `config.{command}.yaml`
//! 5. **Environment** - `config.{env}.yaml`, where env comes from `APP_ENV`
//! 6. **Extra patterns** - caller-supplied file patterns
//! 7. **Variables** - `APP_` prefixed environment variables (`app.name` -> `APP_APP_NAME`)
//!
//! A `.env` file is loaded into the process environment first unless the
//! environment is `production`.
//!
//! ## Merge Strategy
//! - Maps merge key by key; any other value replaces what was there
//! - The merged tree is decoded explicitly against the schema, then validated

mod decode;
mod defaults;
mod discovery;
mod docs;
mod env;
mod loader;
mod merge;
mod schema;
mod tree;
mod types;
mod validator;

pub use decode::{Configurable, Decoder, decode};
pub use defaults::{defaults_tree, inject_defaults};
pub use discovery::discover;
pub use docs::{config_help, generate_markdown_docs, generate_yaml_example};
pub use env::{
    COMMAND_VAR, DEFAULT_COMMAND, DEFAULT_ENV_PREFIX, DEFAULT_ENVIRONMENT, ENV_VAR, EnvSource, PRODUCTION,
    apply_env_overrides, detect_command_name, detect_command_name_from, env_key,
    environment_name, load_env_file,
};
pub use loader::{
    ConfigLoader, DEFAULT_CONFIG_DIR, DEFAULT_ENV_FILE, LoaderOptions, load, read_tree,
};
pub use merge::{merge, merge_all};
pub use schema::{Field, FieldDoc, FieldKind, Node, Schema, SchemaBuilder, describe};
pub use tree::{ConfigTree, get_path, set_path};
pub use types::{AppConfig, AppSettings, LoggerConfig};
pub use validator::{Bound, Rule, check_tree, parse_rules, validate, validate_tree, validate_with_details};
