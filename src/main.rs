//! layerconf
//!
//! Loads the layered application settings and prints, lists, validates or
//! documents them.

use anyhow::{Context, Result};
use clap::Parser;
use layerconf::cli::{Cli, Command, DocsFormat, OutputFormat, ShowArgs};
use layerconf::config::{
    AppSettings, ConfigLoader, ConfigTree, Configurable, config_help, decode,
    generate_markdown_docs, generate_yaml_example, validate_with_details,
};
use layerconf::logging::{LogLevel, LogLevelFilter, Logger, init_subscriber};
use serde_json::Value;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let options = cli.loader_options();

    // Logger settings come from the config itself. Nothing is subscribed
    // yet, so this first pass is silent; a broken config is reported by the
    // command below.
    let logger_settings = ConfigLoader::new(options.clone())
        .load::<AppSettings>()
        .map(|settings| settings.logger)
        .ok();
    let (level, format) = match &logger_settings {
        Some(logger) => (logger.log_level(), logger.log_format()),
        None => (LogLevel::Info, Default::default()),
    };
    let level = if cli.verbose { LogLevel::Debug } else { level };
    init_subscriber(level, format, &cli.log).context("failed to initialize logging")?;

    let logger = Logger::new()
        .with_name("config")
        .with_level_filter(Arc::new(LogLevelFilter::new(level)));
    let loader = ConfigLoader::new(options).with_logger(logger);
    debug!(
        command = %loader.options().command_name,
        environment = %loader.environment(),
        "Resolved loader options"
    );

    match cli.command.unwrap_or(Command::Show(ShowArgs::default())) {
        Command::Show(args) => {
            let settings: AppSettings = loader.load()?;
            let rendered = match args.format {
                OutputFormat::Yaml => serde_yaml::to_string(&settings)?,
                OutputFormat::Json => serde_json::to_string_pretty(&settings)? + "\n",
            };
            print!("{}", rendered);
        }
        Command::Files => {
            let files = match &loader.options().config_file {
                Some(path) => vec![path.clone()],
                None => loader.discover()?,
            };
            for file in files {
                println!("{}", file.display());
            }
        }
        Command::Tree => {
            let tree = merged_tree(&loader)?;
            print!("{}", serde_yaml::to_string(&Value::Object(tree))?);
        }
        Command::Validate => {
            let schema = AppSettings::schema()?;
            let tree = merged_tree(&loader)?;
            let settings: AppSettings = decode(&schema, &tree)?;
            let violations = validate_with_details(&settings);
            if !violations.is_empty() {
                eprintln!("Configuration is invalid:");
                for violation in &violations {
                    eprintln!("  - {}", violation);
                }
                return Ok(ExitCode::FAILURE);
            }
            println!("Configuration is valid");
        }
        Command::Docs(args) => {
            let schema = AppSettings::schema()?;
            let rendered = match args.format {
                DocsFormat::Yaml => generate_yaml_example(&schema),
                DocsFormat::Markdown => generate_markdown_docs(&schema),
                DocsFormat::Help => config_help(&schema),
            };
            print!("{}", rendered);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// The merged tree the loader would decode.
fn merged_tree(loader: &ConfigLoader) -> Result<ConfigTree> {
    let schema = AppSettings::schema()?;
    let tree = match loader.options().config_file.as_deref() {
        Some(path) => loader.load_single(&schema, Some(path))?,
        None => loader.load_for_command(&schema)?,
    };
    Ok(tree)
}
