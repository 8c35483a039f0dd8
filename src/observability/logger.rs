//! # Structured Logger
//!
//! A JSON-lines logger with dynamic key/value fields. Unlike the `tracing` macros used for
//! the toolkit's own diagnostics, field names here are chosen at runtime by the caller,
//! so records are built as `serde_json` maps and written directly.
//!
//! ## Key Features
//! - Five levels, `Fatal` terminates the process after the record is written
//! - Optional caller location (`file.rs:line` of the logging call)
//! - Optional daily-rotating file output next to stdout
//! - Alert hooks for `Error`/`Fatal` records
//!
//! There is no global instance. Build one logger at startup and pass it by reference
//! (or `Arc<Logger>`) to whatever needs it:
//!
//! ```rust,no_run
//! use service_toolkit::observability::{Level, Logger};
//!
//! let logger = Logger::new()
//!     .set_caller()
//!     .set_level(Level::Debug)
//!     .log_file("./log")
//!     .expect("log directory");
//! logger.info("user created", &["id".into(), 42.into()]);
//! ```

use crate::core::error::{ToolkitError, ToolkitResult};
use crate::observability::fields::fields;
use crate::observability::hook::{AlertHook, WebhookHook};
use crate::observability::writer::DailyFileWriter;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::io::{self, Write};
use std::panic::Location;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// Directory used by [`Logger::log_file`] when given an empty path
pub const DEFAULT_LOG_DIR: &str = "./log";

/// Keys written by the logger itself; user fields with these names are prefixed with `fields.`
const RESERVED_KEYS: [&str; 4] = ["time", "level", "msg", "caller"];

/// Log severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            other => Err(ToolkitError::invalid_input(format!("unknown log level '{}'", other))),
        }
    }
}

/// One emitted log line
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogRecord {
    /// JSON object form of the record
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::String(self.msg.clone()))
    }
}

/// Structured logger instance
pub struct Logger {
    level: Level,
    caller: bool,
    console: Mutex<Box<dyn Write + Send>>,
    file: Option<DailyFileWriter>,
    hooks: Vec<Arc<dyn AlertHook>>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("caller", &self.caller)
            .field("file", &self.file.as_ref().map(|w| w.dir().to_path_buf()))
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl Logger {
    /// Logger writing to stdout at `Info` and above
    pub fn new() -> Self {
        Self {
            level: Level::Info,
            caller: false,
            console: Mutex::new(Box::new(io::stdout())),
            file: None,
            hooks: Vec::new(),
        }
    }

    /// Tag every record with the logging call site
    pub fn set_caller(mut self) -> Self {
        self.caller = true;
        self
    }

    /// Drop records below `level`
    pub fn set_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Also write records to `<dir>/<YYYY-MM-DD>.log`, creating `dir` when missing
    pub fn log_file<P: AsRef<Path>>(mut self, dir: P) -> ToolkitResult<Self> {
        let dir = dir.as_ref();
        let dir = if dir.as_os_str().is_empty() {
            Path::new(DEFAULT_LOG_DIR)
        } else {
            dir
        };

        self.file = Some(DailyFileWriter::new(dir)?);
        Ok(self)
    }

    /// Replace the console sink (stdout by default)
    pub fn set_output<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.console = Mutex::new(Box::new(writer));
        self
    }

    /// Register a hook for high-severity records
    pub fn set_alert_hook(mut self, hook: Arc<dyn AlertHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Forward `Error`/`Fatal` records to a webhook. An empty URL leaves the logger unchanged;
    /// an invalid one is reported and ignored.
    pub fn set_webhook(self, url: &str) -> Self {
        if url.is_empty() {
            return self;
        }
        match WebhookHook::new(url) {
            Ok(hook) => self.set_alert_hook(Arc::new(hook)),
            Err(e) => {
                warn!(error = %e, "Alert webhook not installed");
                self
            }
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    #[track_caller]
    pub fn debug(&self, msg: &str, keyvals: &[Value]) {
        self.log(Level::Debug, msg, keyvals);
    }

    #[track_caller]
    pub fn info(&self, msg: &str, keyvals: &[Value]) {
        self.log(Level::Info, msg, keyvals);
    }

    #[track_caller]
    pub fn warn(&self, msg: &str, keyvals: &[Value]) {
        self.log(Level::Warn, msg, keyvals);
    }

    #[track_caller]
    pub fn error(&self, msg: &str, keyvals: &[Value]) {
        self.log(Level::Error, msg, keyvals);
    }

    /// Write the record, then exit the process with status 1
    #[track_caller]
    pub fn fatal(&self, msg: &str, keyvals: &[Value]) -> ! {
        self.log(Level::Fatal, msg, keyvals);
        std::process::exit(1)
    }

    /// Log at an arbitrary level. `Fatal` records are written but do not exit here.
    #[track_caller]
    pub fn log(&self, level: Level, msg: &str, keyvals: &[Value]) {
        if !self.enabled(level) {
            return;
        }
        let record = self.record(level, msg, keyvals, Location::caller());
        self.emit(&record);
    }

    /// Build the record a log call would emit
    pub fn record(
        &self,
        level: Level,
        msg: &str,
        keyvals: &[Value],
        location: &Location<'_>,
    ) -> LogRecord {
        let mut record_fields = Map::new();
        for (key, value) in fields(keyvals) {
            if RESERVED_KEYS.contains(&key.as_str()) {
                record_fields.insert(format!("fields.{}", key), value);
            } else {
                record_fields.insert(key, value);
            }
        }

        LogRecord {
            time: Utc::now(),
            level,
            msg: msg.to_string(),
            caller: self.caller.then(|| caller_string(location)),
            fields: record_fields,
        }
    }

    fn emit(&self, record: &LogRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to encode log record");
                return;
            }
        };

        {
            let mut console = self.console.lock();
            if let Err(e) = writeln!(console, "{}", line).and_then(|_| console.flush()) {
                warn!(error = %e, "Failed to write log record to console");
            }
        }

        if let Some(file) = &self.file {
            if let Err(e) = file.write_line(&line) {
                warn!(error = %e, "Failed to write log record to file");
            }
        }

        for hook in &self.hooks {
            if hook.levels().contains(&record.level) {
                hook.fire(record);
            }
        }
    }
}

/// `file.rs:line` with the directory stripped
fn caller_string(location: &Location<'_>) -> String {
    let file = location.file();
    let name = file.rsplit(['/', '\\']).next().unwrap_or(file);
    format!("{}:{}", name, location.line())
}
