//! Built-in application settings.
//!
//! The `app` and `logger` sections every command shares. Defaults live only in
//! the schema below.

use super::decode::{Configurable, Decoder};
use super::schema::{Field, Schema};
use crate::error::Result;
use crate::logging::{LogFormat, LogLevel};
use serde::{Deserialize, Serialize};

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub app: AppConfig,
    pub logger: LoggerConfig,
}

/// Application identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    /// development, staging, or production
    pub env: String,
}

/// Logger settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// debug, info, warn, error
    pub level: String,
    /// json, console
    pub format: String,
}

impl LoggerConfig {
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.level).unwrap_or(LogLevel::Info)
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse(&self.format).unwrap_or_default()
    }
}

impl Configurable for AppSettings {
    fn schema() -> Result<Schema> {
        Schema::builder()
            .section("app", |s| {
                s.field(
                    Field::string("name")
                        .default("layerconf-app")
                        .example("my-awesome-app")
                        .doc("Application name used for logging and metrics")
                        .validate("required,min=1"),
                )
                .field(
                    Field::string("version")
                        .default("0.1.0")
                        .example("1.2.3")
                        .doc("Application version in semantic versioning format")
                        .validate("required,semver"),
                )
                .field(
                    Field::string("env")
                        .default("development")
                        .example("production")
                        .doc("Environment mode: development, staging, or production")
                        .validate("required,oneof=development staging production"),
                )
            })
            .section("logger", |s| {
                s.field(
                    Field::string("level")
                        .default("info")
                        .example("debug")
                        .doc("Log level: debug, info, warn, or error")
                        .validate("required,oneof=debug info warn error"),
                )
                .field(
                    Field::string("format")
                        .default("console")
                        .example("json")
                        .doc("Log format: json for production, console for development")
                        .validate("required,oneof=json console"),
                )
            })
            .build()
    }

    fn decode(d: &Decoder<'_>) -> Result<Self> {
        Ok(Self {
            app: AppConfig {
                name: d.string("app.name")?,
                version: d.string("app.version")?,
                env: d.string("app.env")?,
            },
            logger: LoggerConfig {
                level: d.string("logger.level")?,
                format: d.string("logger.format")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::decode::decode;
    use crate::config::defaults::defaults_tree;
    use crate::config::validator::validate_with_details;

    #[test]
    fn test_defaults_decode_and_validate() {
        let schema = AppSettings::schema().unwrap();
        let tree = defaults_tree(&schema).unwrap();
        let settings: AppSettings = decode(&schema, &tree).unwrap();

        assert_eq!(settings.app.name, "layerconf-app");
        assert_eq!(settings.app.version, "0.1.0");
        assert_eq!(settings.app.env, "development");
        assert_eq!(settings.logger.log_level(), LogLevel::Info);
        assert_eq!(settings.logger.log_format(), LogFormat::Console);
        assert!(validate_with_details(&settings).is_empty());
    }

    #[test]
    fn test_invalid_settings_report_every_field() {
        let settings = AppSettings {
            app: AppConfig {
                name: "demo".into(),
                version: "1.2".into(),
                env: "qa".into(),
            },
            logger: LoggerConfig {
                level: "info".into(),
                format: "xml".into(),
            },
        };
        assert_eq!(
            validate_with_details(&settings),
            vec![
                "Version must be valid semantic version",
                "Env must be one of: development, staging, production",
                "Format must be one of: json, console",
            ]
        );
    }
}
