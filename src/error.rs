//! Error types for the configuration pipeline.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the loader.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Every way a load can fail.
///
/// All variants except [`ConfigError::Dotenv`] abort the load. The dotenv
/// variant is produced by [`crate::config::load_env_file`] and is only ever
/// logged by the loader.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The schema definition itself is broken (bad default literal, unknown
    /// rule, duplicate path).
    #[error("invalid schema at `{path}`: {message}")]
    Schema { path: String, message: String },

    /// No configuration file exists in the searched directory.
    #[error("no config files found in {}", dir.display())]
    NoFilesFound { dir: PathBuf },

    /// A discovered file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A discovered file is not well-formed YAML.
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A file parsed, but its top level is not a mapping.
    #[error("config file {} must contain a mapping at the top level, found {found}", path.display())]
    NotAMapping { path: PathBuf, found: &'static str },

    /// The merged tree does not fit the typed schema.
    #[error("failed to decode `{path}`: {message}")]
    Decode { path: String, message: String },

    /// One or more validation rules failed.
    #[error("config validation failed: {0}")]
    Validation(ValidationErrors),

    /// The dotenv file is missing or malformed.
    #[error("failed to load env file {}: {source}", path.display())]
    Dotenv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

impl ConfigError {
    pub fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Violation messages when this is a validation failure.
    pub fn violations(&self) -> Option<&[String]> {
        match self {
            Self::Validation(errors) => Some(errors.messages()),
            _ => None,
        }
    }
}

/// The complete, ordered list of rule violations from one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new(messages: Vec<String>) -> Self {
        Self(messages)
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_joins_messages() {
        let err = ConfigError::Validation(ValidationErrors::new(vec![
            "Name is required".into(),
            "Env must be one of: development, staging, production".into(),
        ]));
        assert_eq!(
            err.to_string(),
            "config validation failed: Name is required; Env must be one of: development, staging, production"
        );
        assert_eq!(err.violations().map(|v| v.len()), Some(2));
    }

    #[test]
    fn test_no_files_found_mentions_dir() {
        let err = ConfigError::NoFilesFound {
            dir: PathBuf::from("./config"),
        };
        assert_eq!(err.to_string(), "no config files found in ./config");
        assert!(err.violations().is_none());
    }
}
