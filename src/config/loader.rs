//! Configuration loader.
//!
//! Loads configuration in layers, each overriding the previous:
//! 1. `.env` file into the process environment (when enabled)
//! 2. Schema defaults
//! 3. Discovered YAML files, in discovery order
//! 4. Prefixed environment variables
//!
//! The merged tree is then decoded into the typed config and validated.

use super::decode::{Configurable, decode};
use super::defaults::defaults_tree;
use super::discovery::{BASE_NAME, discover};
use super::env::{
    DEFAULT_ENV_PREFIX, EnvSource, PRODUCTION, apply_env_overrides, detect_command_name,
    environment_name, load_env_file,
};
use super::merge::merge;
use super::schema::Schema;
use super::tree::{ConfigTree, normalize_keys, value_kind};
use super::validator::validate_tree;
use crate::error::{ConfigError, Result};
use crate::logging::Logger;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Default directory searched for config files.
pub const DEFAULT_CONFIG_DIR: &str = "./config";

/// Default dotenv file.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Inputs for one load. Built once, never mutated by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Directory containing config files.
    pub config_dir: PathBuf,
    /// Command name selecting `config.{command}.yaml`. Empty disables it.
    pub command_name: String,
    /// Environment selecting `config.{environment}.yaml`. When unset it is
    /// read from `APP_ENV` at load time, after the dotenv file.
    pub environment_name: Option<String>,
    /// Path to the dotenv file.
    pub env_file: PathBuf,
    /// Whether to load the dotenv file.
    pub load_env_file: bool,
    /// Prefix for environment variable overrides.
    pub env_prefix: String,
    /// Additional file patterns, relative to `config_dir`.
    pub patterns: Vec<String>,
    /// Explicit config file. When set, discovery is skipped.
    pub config_file: Option<PathBuf>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self::from_env(&EnvSource::Process)
    }
}

impl LoaderOptions {
    /// Defaults, with the dotenv policy taken from `APP_ENV`.
    ///
    /// The dotenv file is loaded unless the environment is `production`.
    pub fn from_env(env: &EnvSource) -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            command_name: String::new(),
            load_env_file: environment_name(env) != PRODUCTION,
            environment_name: None,
            env_file: PathBuf::from(DEFAULT_ENV_FILE),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            patterns: Vec::new(),
            config_file: None,
        }
    }

    /// Defaults with a specific config directory.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self::default().with_config_dir(config_dir)
    }

    /// Set the config directory.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Set the command name.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command_name = command.into();
        self
    }

    /// Use the command name detected from the running process.
    pub fn with_detected_command(self) -> Self {
        self.with_command(detect_command_name())
    }

    /// Pin the environment name instead of reading `APP_ENV`. Does not
    /// change the dotenv policy.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment_name = Some(environment.into());
        self
    }

    /// Set the dotenv file path.
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = path.into();
        self
    }

    /// Enable or disable the dotenv file.
    pub fn with_load_env_file(mut self, load: bool) -> Self {
        self.load_env_file = load;
        self
    }

    /// Set the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Add an extra file pattern.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Set or clear the explicit config file.
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// The pinned environment name, else `APP_ENV` from `env`.
    pub fn environment(&self, env: &EnvSource) -> String {
        self.environment_name
            .clone()
            .unwrap_or_else(|| environment_name(env))
    }
}

/// Runs the load pipeline for one set of options.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    options: LoaderOptions,
    env: EnvSource,
    logger: Logger,
}

impl ConfigLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            options,
            env: EnvSource::Process,
            logger: Logger::new().with_name("config"),
        }
    }

    /// Read override variables from `env` instead of the process.
    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Environment name for this load. Reflects the dotenv file only once it
    /// has been loaded.
    pub fn environment(&self) -> String {
        self.options.environment(&self.env)
    }

    /// Files that would be merged, in merge order. Loads the dotenv file
    /// first so an `APP_ENV` set there selects the environment file.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        self.load_dotenv(&self.logger);
        discover(&self.options, &self.environment())
    }

    /// Defaults, every discovered file, then environment overrides.
    pub fn load_for_command(&self, schema: &Schema) -> Result<ConfigTree> {
        let log = self
            .logger
            .with("config_dir", self.options.config_dir.display())
            .with("command", &self.options.command_name);

        self.load_dotenv(&log);
        let environment = self.environment();
        let log = log.with("environment", &environment);
        let mut store = defaults_tree(schema)?;

        let files = discover(&self.options, &environment)?;
        for file in &files {
            log.debug("Merging config file", &[("path", &file.display())]);
            store = merge(store, read_tree(file)?);
        }

        self.apply_env(&mut store, schema, &log)?;
        log.info("Loaded configuration", &[("files", &files.len())]);
        Ok(store)
    }

    /// Defaults, a single file, then environment overrides.
    ///
    /// With `explicit`, that file must exist. Otherwise the first of
    /// `{config_dir}/config.yaml`, `{config_dir}/config.yml`, `./config.yaml`,
    /// `./config.yml` is used, and finding none is fine.
    pub fn load_single(&self, schema: &Schema, explicit: Option<&Path>) -> Result<ConfigTree> {
        let log = self.logger.with("config_dir", self.options.config_dir.display());

        self.load_dotenv(&log);
        let mut store = defaults_tree(schema)?;

        let file = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => self.search_single(),
        };
        match file {
            Some(path) => {
                log.debug("Reading config file", &[("path", &path.display())]);
                store = merge(store, read_tree(&path)?);
            }
            None => log.debug("No config file found, using defaults and environment", &[]),
        }

        self.apply_env(&mut store, schema, &log)?;
        Ok(store)
    }

    /// Run the whole pipeline into a validated typed config.
    ///
    /// Uses the explicit config file from the options when one is set,
    /// discovery otherwise.
    pub fn load<T: Configurable>(&self) -> Result<T> {
        let schema = T::schema()?;
        let tree = match self.options.config_file.as_deref() {
            Some(path) => self.load_single(&schema, Some(path))?,
            None => self.load_for_command(&schema)?,
        };
        self.finish(&schema, &tree)
    }

    /// Single-file pipeline into a validated typed config.
    pub fn load_file<T: Configurable>(&self, explicit: Option<&Path>) -> Result<T> {
        let schema = T::schema()?;
        let tree = self.load_single(&schema, explicit)?;
        self.finish(&schema, &tree)
    }

    fn finish<T: Configurable>(&self, schema: &Schema, tree: &ConfigTree) -> Result<T> {
        let config: T = decode(schema, tree)?;
        if let Err(e) = validate_tree(schema, &config.to_tree()?) {
            if let Some(violations) = e.violations() {
                self.logger
                    .error("Configuration is invalid", &[("violations", &violations.len())]);
            }
            return Err(e);
        }
        Ok(config)
    }

    fn search_single(&self) -> Option<PathBuf> {
        [self.options.config_dir.as_path(), Path::new(".")]
            .iter()
            .flat_map(|dir| {
                ["yaml", "yml"]
                    .iter()
                    .map(move |ext| dir.join(format!("{}.{}", BASE_NAME, ext)))
            })
            .find(|path| path.is_file())
    }

    fn load_dotenv(&self, log: &Logger) {
        if !self.options.load_env_file {
            return;
        }
        let path = &self.options.env_file;
        match load_env_file(path) {
            Ok(()) => log.debug("Loaded env file", &[("path", &path.display())]),
            Err(e) if !path.exists() => {
                log.debug("Env file not loaded", &[("error", &e)]);
            }
            Err(e) => log.warn("Env file not loaded", &[("error", &e)]),
        }
    }

    fn apply_env(&self, store: &mut ConfigTree, schema: &Schema, log: &Logger) -> Result<()> {
        let applied = apply_env_overrides(store, schema, &self.options.env_prefix, &self.env)?;
        if applied > 0 {
            log.debug(
                "Applied environment overrides",
                &[("count", &applied), ("prefix", &self.options.env_prefix)],
            );
        }
        Ok(())
    }
}

/// Parse one YAML file into a tree with lower-cased keys.
pub fn read_tree(path: &Path) -> Result<ConfigTree> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tree(path, &content)
}

fn parse_tree(path: &Path, content: &str) -> Result<ConfigTree> {
    if is_blank_document(content) {
        return Ok(ConfigTree::new());
    }
    let value: Value = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(normalize_keys(map)),
        Value::Null => Ok(ConfigTree::new()),
        other => Err(ConfigError::NotAMapping {
            path: path.to_path_buf(),
            found: value_kind(&other),
        }),
    }
}

/// Only whitespace, comments and document markers.
fn is_blank_document(content: &str) -> bool {
    content.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

/// Load a typed config from one file (or the default search locations) plus
/// the `APP_` environment, with default options.
pub fn load<T: Configurable>(explicit: Option<&Path>) -> Result<T> {
    ConfigLoader::new(LoaderOptions::default()).load_file(explicit)
}
