//! Environment handling: variable lookup, the dotenv file, command-name
//! detection and the prefixed-variable overlay.
//!
//! ## Control variables
//! - `APP_ENV` - deployment environment (default: `development`)
//! - `APP_COMMAND` - command name when it cannot be taken from the binary

use super::schema::Schema;
use super::tree::{ConfigTree, set_path};
use crate::error::{ConfigError, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Selects the environment suffix and the dotenv auto-load default.
pub const ENV_VAR: &str = "APP_ENV";

/// Fallback source for the command name.
pub const COMMAND_VAR: &str = "APP_COMMAND";

pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Environment in which the dotenv file is not auto-loaded.
pub const PRODUCTION: &str = "production";

pub const DEFAULT_COMMAND: &str = "app";

pub const DEFAULT_ENV_PREFIX: &str = "APP";

/// Binary names that mean "not a real, built command".
const DEGENERATE_BINARIES: &[&str] = &["main", "cargo", "rustc", "rust-script"];

/// Where environment variables are read from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The process environment.
    #[default]
    Process,
    /// A fixed set of variables; the process environment is never consulted.
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    pub fn fixed<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Look up a variable. Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match self {
            EnvSource::Process => std::env::var(key).ok(),
            EnvSource::Fixed(vars) => vars.get(key).cloned(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Current deployment environment, `development` when unset.
pub fn environment_name(env: &EnvSource) -> String {
    env.get(ENV_VAR)
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

/// Variable name bound to a schema path: `APP` + `app.name` -> `APP_APP_NAME`.
pub fn env_key(prefix: &str, path: &str) -> String {
    let key = path.replace('.', "_");
    if prefix.is_empty() {
        key.to_uppercase()
    } else {
        format!("{}_{}", prefix, key).to_uppercase()
    }
}

/// Overwrite tree entries with any bound environment variables.
///
/// Each value is parsed according to its leaf's kind. Returns the number of
/// overrides applied.
pub fn apply_env_overrides(
    tree: &mut ConfigTree,
    schema: &Schema,
    prefix: &str,
    env: &EnvSource,
) -> Result<usize> {
    let mut applied = 0;
    for doc in schema.fields() {
        let key = env_key(prefix, &doc.path);
        let Some(raw) = env.get(&key) else {
            continue;
        };
        let value = doc
            .kind
            .parse_literal(&raw)
            .map_err(|e| ConfigError::decode(&doc.path, format!("from ${}: {}", key, e)))?;
        debug!(path = %doc.path, var = %key, "Applying environment override");
        set_path(tree, &doc.path, value);
        applied += 1;
    }
    Ok(applied)
}

/// Load a dotenv file into the process environment.
///
/// Variables that are already set are left untouched.
pub fn load_env_file(path: &Path) -> Result<()> {
    dotenvy::from_path(path).map_err(|source| ConfigError::Dotenv {
        path: path.to_path_buf(),
        source,
    })
}

/// Detect the running command's name from the process.
pub fn detect_command_name() -> String {
    let argv0 = std::env::args().next();
    let cwd = std::env::current_dir().ok();
    detect_command_name_from(argv0.as_deref(), cwd.as_deref(), &EnvSource::Process)
}

/// Command-name detection over explicit inputs.
///
/// Order: executable base name, a `/cmd/<name>/` segment of the working
/// directory, `APP_COMMAND`, then `app`.
pub fn detect_command_name_from(
    argv0: Option<&str>,
    cwd: Option<&Path>,
    env: &EnvSource,
) -> String {
    if let Some(binary) = argv0
        .and_then(|arg| Path::new(arg).file_stem())
        .and_then(|stem| stem.to_str())
        && !binary.is_empty()
        && !DEGENERATE_BINARIES.contains(&binary)
    {
        return binary.to_string();
    }

    if let Some(cwd) = cwd {
        let cwd = cwd.to_string_lossy().replace('\\', "/");
        if let Some((_, rest)) = cwd.split_once("/cmd/")
            && let Some(name) = rest.split('/').next()
            && !name.is_empty()
        {
            return name.to_string();
        }
    }

    env.get(COMMAND_VAR)
        .unwrap_or_else(|| DEFAULT_COMMAND.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Field;
    use serde_json::{Value, json};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn schema() -> Schema {
        Schema::builder()
            .section("app", |s| {
                s.field(Field::string("env"))
                    .field(Field::string("name"))
            })
            .section("server", |s| s.field(Field::uint("port")))
            .build()
            .unwrap()
    }

    #[test]
    fn test_env_key() {
        assert_eq!(env_key("APP", "app.name"), "APP_APP_NAME");
        assert_eq!(env_key("svc", "server.http.port"), "SVC_SERVER_HTTP_PORT");
        assert_eq!(env_key("", "a.b"), "A_B");
    }

    #[test]
    fn test_environment_name_defaults() {
        assert_eq!(environment_name(&EnvSource::fixed([("X", "y")])), "development");
        assert_eq!(environment_name(&EnvSource::fixed([(ENV_VAR, "")])), "development");
        assert_eq!(
            environment_name(&EnvSource::fixed([(ENV_VAR, "staging")])),
            "staging"
        );
    }

    #[test]
    fn test_overlay_overrides_file_values() {
        let mut tree = json!({"app": {"env": "development", "name": "demo"}})
            .as_object()
            .cloned()
            .unwrap();
        let env = EnvSource::fixed([("APP_APP_ENV", "production"), ("APP_SERVER_PORT", "9000")]);
        let applied = apply_env_overrides(&mut tree, &schema(), "APP", &env).unwrap();
        assert_eq!(applied, 2);
        assert_eq!(
            Value::Object(tree),
            json!({"app": {"env": "production", "name": "demo"}, "server": {"port": 9000}})
        );
    }

    #[test]
    fn test_overlay_parse_failure_is_decode_error() {
        let mut tree = ConfigTree::new();
        let env = EnvSource::fixed([("APP_SERVER_PORT", "high")]);
        let err = apply_env_overrides(&mut tree, &schema(), "APP", &env).unwrap_err();
        match err {
            ConfigError::Decode { path, message } => {
                assert_eq!(path, "server.port");
                assert!(message.contains("APP_SERVER_PORT"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_detect_from_binary_name() {
        let env = EnvSource::fixed([(COMMAND_VAR, "fallback")]);
        assert_eq!(
            detect_command_name_from(Some("/usr/local/bin/worker"), None, &env),
            "worker"
        );
        assert_eq!(
            detect_command_name_from(Some("C:/bin/worker.exe"), None, &env),
            "worker"
        );
    }

    #[test]
    fn test_detect_skips_degenerate_binary() {
        let env = EnvSource::Fixed(HashMap::new());
        let cwd = PathBuf::from("/home/me/project/cmd/api/internal");
        assert_eq!(
            detect_command_name_from(Some("/tmp/main"), Some(&cwd), &env),
            "api"
        );
        assert_eq!(detect_command_name_from(Some("cargo"), None, &env), "app");
    }

    #[test]
    fn test_detect_falls_back_to_env_var() {
        let env = EnvSource::fixed([(COMMAND_VAR, "migrate")]);
        let cwd = PathBuf::from("/srv/project");
        assert_eq!(detect_command_name_from(None, Some(&cwd), &env), "migrate");
    }

    #[test]
    fn test_load_env_file_missing_is_error() {
        let temp = TempDir::new().unwrap();
        let err = load_env_file(&temp.path().join(".env")).unwrap_err();
        assert!(matches!(err, ConfigError::Dotenv { .. }));
    }

    #[test]
    fn test_load_env_file_does_not_override() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".env");
        std::fs::write(
            &path,
            "LAYERCONF_TEST_DOTENV_NEW=from-file\nLAYERCONF_TEST_DOTENV_SET=from-file\n",
        )
        .unwrap();

        temp_env::with_vars(
            [
                ("LAYERCONF_TEST_DOTENV_NEW", None),
                ("LAYERCONF_TEST_DOTENV_SET", Some("from-process")),
            ],
            || {
                load_env_file(&path).unwrap();
                let env = EnvSource::Process;
                assert_eq!(
                    env.get("LAYERCONF_TEST_DOTENV_NEW").as_deref(),
                    Some("from-file")
                );
                assert_eq!(
                    env.get("LAYERCONF_TEST_DOTENV_SET").as_deref(),
                    Some("from-process")
                );
            },
        );
    }
}
