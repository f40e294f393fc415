//! layerconf
//!
//! Hierarchical configuration loading: schema defaults, layered YAML files,
//! dotenv and prefixed environment overrides, decoded into typed settings and
//! validated against declarative rules.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
