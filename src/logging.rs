//! Structured logging on top of `tracing`.
//!
//! [`Logger`] is the small leveled interface the loader talks to: every call
//! takes a message plus key-value pairs, and `with` attaches persistent
//! context fields. [`init_subscriber`] installs the global `tracing`
//! subscriber for the binary.

use anyhow::Result;
use std::fmt;
use std::fs::OpenOptions;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU8, Ordering},
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

/// Log severity, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    /// Logged at error level. Never terminates the process.
    Fatal,
}

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "fatal" => Some(LogLevel::Fatal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    /// Convert to a tracing level.
    pub fn to_tracing(self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error | LogLevel::Fatal => Level::ERROR,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            _ => LogLevel::Fatal,
        }
    }
}

/// Output encoding of the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" => Some(LogFormat::Console),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Atomic minimum level shared between logger clones.
pub struct LogLevelFilter(AtomicU8);

impl LogLevelFilter {
    pub fn new(level: LogLevel) -> Self {
        Self(AtomicU8::new(level as u8))
    }

    pub fn get(&self) -> LogLevel {
        LogLevel::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, level: LogLevel) {
        self.0.store(level as u8, Ordering::Relaxed);
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level as u8 >= self.0.load(Ordering::Relaxed)
    }
}

impl Default for LogLevelFilter {
    fn default() -> Self {
        Self::new(LogLevel::Debug)
    }
}

impl fmt::Debug for LogLevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LogLevelFilter").field(&self.get()).finish()
    }
}

/// A key-value pair attached to a log call.
pub type Field<'a> = (&'a str, &'a dyn fmt::Display);

macro_rules! emit {
    ($mac:ident, $name:expr, $fields:expr, $msg:expr) => {
        match ($name, $fields.is_empty()) {
            (Some(name), false) => tracing::$mac!(logger = %name, fields = %$fields, "{}", $msg),
            (Some(name), true) => tracing::$mac!(logger = %name, "{}", $msg),
            (None, false) => tracing::$mac!(fields = %$fields, "{}", $msg),
            (None, true) => tracing::$mac!("{}", $msg),
        }
    };
}

/// Leveled logger with persistent context fields.
#[derive(Debug, Clone)]
pub struct Logger {
    level_filter: Arc<LogLevelFilter>,
    name: Option<String>,
    context: Vec<(String, String)>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            level_filter: Arc::new(LogLevelFilter::default()),
            name: None,
            context: Vec::new(),
        }
    }

    pub fn with_level_filter(mut self, filter: Arc<LogLevelFilter>) -> Self {
        self.level_filter = filter;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// A logger that adds `key=value` to every subsequent message.
    pub fn with(&self, key: &str, value: impl fmt::Display) -> Self {
        let mut logger = self.clone();
        logger.context.push((key.to_string(), value.to_string()));
        logger
    }

    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Render context and call fields as `k=v` pairs.
    fn render(&self, level: LogLevel, fields: &[Field<'_>]) -> String {
        let mut parts: Vec<String> = self
            .context
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        parts.extend(fields.iter().map(|(k, v)| format!("{}={}", k, v)));
        if level == LogLevel::Fatal {
            parts.push("fatal=true".to_string());
        }
        parts.join(" ")
    }

    pub fn log(&self, level: LogLevel, msg: &str, fields: &[Field<'_>]) {
        if !self.level_filter.should_log(level) {
            return;
        }
        let rendered = self.render(level, fields);
        let name = self.name.as_deref();
        match level {
            LogLevel::Debug => emit!(debug, name, rendered, msg),
            LogLevel::Info => emit!(info, name, rendered, msg),
            LogLevel::Warn => emit!(warn, name, rendered, msg),
            LogLevel::Error | LogLevel::Fatal => emit!(error, name, rendered, msg),
        }
    }

    pub fn debug(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(LogLevel::Debug, msg, fields);
    }

    pub fn info(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(LogLevel::Info, msg, fields);
    }

    pub fn warn(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(LogLevel::Warn, msg, fields);
    }

    pub fn error(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(LogLevel::Error, msg, fields);
    }

    pub fn fatal(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(LogLevel::Fatal, msg, fields);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the global subscriber.
///
/// `output` is `0`/`off`, `1`/`stdout`, `2`/`stderr`, or a file path that is
/// appended to.
pub fn init_subscriber(level: LogLevel, format: LogFormat, output: &str) -> Result<()> {
    match output {
        "0" | "off" => Ok(()),
        "1" | "stdout" => install(level, format, std::io::stdout, true),
        "2" | "stderr" => install(level, format, std::io::stderr, true),
        filename => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            install(level, format, Mutex::new(file), false)
        }
    }
}

fn install<W>(level: LogLevel, format: LogFormat, writer: W, ansi: bool) -> Result<()>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = FmtSubscriber::builder()
        .with_max_level(level.to_tracing())
        .with_writer(writer)
        .with_ansi(ansi);
    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Console => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        let filter = LogLevelFilter::new(LogLevel::Warn);
        assert!(!filter.should_log(LogLevel::Debug));
        assert!(!filter.should_log(LogLevel::Info));
        assert!(filter.should_log(LogLevel::Warn));
        assert!(filter.should_log(LogLevel::Error));
        assert!(filter.should_log(LogLevel::Fatal));
    }

    #[test]
    fn test_level_filter_update() {
        let filter = LogLevelFilter::new(LogLevel::Debug);
        assert!(filter.should_log(LogLevel::Debug));
        filter.set(LogLevel::Error);
        assert!(!filter.should_log(LogLevel::Warn));
        assert_eq!(filter.get(), LogLevel::Error);
    }

    #[test]
    fn test_level_parse_and_tracing() {
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("verbose"), None);
        assert_eq!(LogLevel::Fatal.to_tracing(), Level::ERROR);
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
    }

    #[test]
    fn test_with_accumulates_context() {
        let base = Logger::new().with_name("config");
        let scoped = base.with("dir", "./config").with("command", "worker");
        assert!(base.context().is_empty());
        assert_eq!(scoped.context().len(), 2);
        assert_eq!(
            scoped.render(LogLevel::Fatal, &[("files", &3)]),
            "dir=./config command=worker files=3 fatal=true"
        );
    }
}
