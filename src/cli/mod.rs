//! CLI command definitions for layerconf
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::config::{DEFAULT_CONFIG_DIR, LoaderOptions, PRODUCTION};
use clap::{Arg, ArgMatches, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Id of the config-file flag.
pub const CONFIG_FLAG: &str = "config";

/// Layered configuration loader and inspector
#[derive(Parser, Debug)]
#[command(name = "layerconf", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to an explicit config file (skips discovery)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory searched for config files
    #[arg(long, default_value = DEFAULT_CONFIG_DIR, global = true)]
    pub config_dir: PathBuf,

    /// Command name selecting config.{name}.yaml (default: detected from the binary)
    #[arg(long = "for-command", value_name = "NAME", global = true)]
    pub for_command: Option<String>,

    /// Environment selecting config.{env}.yaml (default: $APP_ENV or development)
    #[arg(long, global = true)]
    pub env: Option<String>,

    /// Path to the dotenv file
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Do not load the dotenv file
    #[arg(long, global = true)]
    pub no_env_file: bool,

    /// Prefix for environment variable overrides
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Extra file pattern to merge after the standard files (repeatable)
    #[arg(long = "pattern", value_name = "GLOB", global = true)]
    pub patterns: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load, validate and print the settings (default if no subcommand given)
    Show(ShowArgs),

    /// List the config files that would be merged, in merge order
    Files,

    /// Print the merged tree before decoding
    Tree,

    /// Report every validation failure
    Validate,

    /// Generate documentation from the settings schema
    Docs(DocsArgs),
}

/// Output format for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Arguments for the show command.
#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// Documentation flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DocsFormat {
    /// Commented example config.yaml
    #[default]
    Yaml,
    /// Markdown reference table
    Markdown,
    /// Plain-text field listing
    Help,
}

/// Arguments for the docs command.
#[derive(Args, Debug)]
pub struct DocsArgs {
    /// Documentation flavor
    #[arg(long, value_enum, default_value_t)]
    pub format: DocsFormat,
}

impl Cli {
    /// Loader options from the process environment and these flags.
    pub fn loader_options(&self) -> LoaderOptions {
        let mut options = LoaderOptions::default()
            .with_config_dir(&self.config_dir)
            .with_config_file(self.config.clone());

        options = match &self.for_command {
            Some(name) => options.with_command(name),
            None => options.with_detected_command(),
        };
        if let Some(env) = &self.env {
            let load_env_file = env != PRODUCTION;
            options = options
                .with_environment(env)
                .with_load_env_file(load_env_file);
        }
        if let Some(path) = &self.env_file {
            options = options.with_env_file(path);
        }
        if self.no_env_file {
            options = options.with_load_env_file(false);
        }
        if let Some(prefix) = &self.prefix {
            options = options.with_env_prefix(prefix);
        }
        for pattern in &self.patterns {
            options = options.with_pattern(pattern);
        }
        options
    }
}

/// Add the `--config` flag to a command unless it already has one.
///
/// Safe to call any number of times on the same command.
pub fn register_config_flag(cmd: clap::Command) -> clap::Command {
    if cmd.get_arguments().any(|arg| arg.get_id() == CONFIG_FLAG) {
        return cmd;
    }
    cmd.arg(
        Arg::new(CONFIG_FLAG)
            .short('c')
            .long(CONFIG_FLAG)
            .value_name("FILE")
            .value_parser(clap::value_parser!(PathBuf))
            .global(true)
            .help("Path to config file"),
    )
}

/// Value of the `--config` flag registered by [`register_config_flag`].
pub fn config_path(matches: &ArgMatches) -> Option<PathBuf> {
    matches.get_one::<PathBuf>(CONFIG_FLAG).cloned()
}
