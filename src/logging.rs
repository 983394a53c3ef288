//! Structured logging and tracing for the bridge
//!
//! This module wires `tracing-subscriber` to the console and, optionally, to a
//! daily-rotated file. Components obtain a [`StructuredLogger`] tagged with
//! their name so every line carries a `component=` field.

use crate::config::LoggingConfig;
use crate::error::{BridgeError, Result};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Once;
use tracing::{Level, debug, error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// Keep the non-blocking worker guard alive for the entire process lifetime
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static INIT_ONCE: Once = Once::new();
static INIT_ERROR: OnceCell<String> = OnceCell::new();

/// Initialize logging system based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let level = parse_log_level(&config.level)?;
            let filters = build_filters(level, std::env::var("RUST_LOG").ok().as_deref());

            if should_use_console_only(config) {
                init_console_only_logging(filters, config.json_format, level);
                return Ok(());
            }

            init_file_logging(config, filters, level)
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(BridgeError::config(err.clone()));
    }
    Ok(())
}

/// Target filter plus the level cap applied to every output layer
struct Filters {
    targets: EnvFilter,
    output: LevelFilter,
}

/// A valid `RUST_LOG` replaces the configured level entirely, in both directions
fn build_filters(level: Level, rust_log: Option<&str>) -> Filters {
    let from_env = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok());
    if let Some(targets) = from_env {
        return Filters {
            targets,
            output: LevelFilter::TRACE,
        };
    }
    Filters {
        targets: format!("soltaro_bridge={level},reqwest=warn,hyper=warn").into(),
        output: LevelFilter::from_level(level),
    }
}

fn should_use_console_only(config: &LoggingConfig) -> bool {
    cfg!(test)
        || config.file.trim().is_empty()
        || std::env::var_os("SOLTARO_DISABLE_FILE_LOG").is_some()
}

fn init_console_only_logging(filters: Filters, json_format: bool, level: Level) {
    let console_layer = {
        let layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if json_format {
            layer.json().with_filter(filters.output).boxed()
        } else {
            layer.with_filter(filters.output).boxed()
        }
    };

    // A second init (e.g. another test binary thread) is harmless
    let _ = tracing_subscriber::registry()
        .with(filters.targets)
        .with(console_layer)
        .try_init();

    debug!("Logging initialized - level: {:?}, console-only", level);
}

fn init_file_logging(config: &LoggingConfig, filters: Filters, level: Level) -> Result<()> {
    let output = filters.output;
    let registry = tracing_subscriber::registry().with(filters.targets);

    // Set up log file appender with rotation
    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix("soltaro-bridge")
        .filename_suffix("log")
        .max_log_files(config.backup_count.max(1) as usize)
        .build({
            // If config.file is a file path, use its parent dir; otherwise treat as dir
            let p = Path::new(&config.file);
            if p.extension().is_some() {
                p.parent().unwrap_or(p)
            } else {
                p
            }
        })
        .map_err(|e| BridgeError::io(format!("Failed to create log file appender: {e}")))?;

    let (non_blocking_appender, guard) = non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let file_layer = {
        let base = fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if config.json_format {
            base.json().with_filter(output).boxed()
        } else {
            base.with_filter(output).boxed()
        }
    };

    let subscriber = registry.with(file_layer);

    if config.console_output {
        let console_layer = {
            let base = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false);
            if config.json_format {
                base.json().with_filter(output).boxed()
            } else {
                base.with_filter(output).boxed()
            }
        };
        subscriber
            .with(console_layer)
            .try_init()
            .map_err(|e| BridgeError::config(e.to_string()))?;
    } else {
        subscriber
            .try_init()
            .map_err(|e| BridgeError::config(e.to_string()))?;
    }

    info!(
        "Logging initialized - level: {:?}, file: {}",
        level, config.file
    );
    Ok(())
}

/// Parse log level string to tracing Level
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.trim().to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(BridgeError::config(format!(
            "Invalid log level: {level_str}"
        ))),
    }
}

/// Structured logger tagged with a component name
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    component: String,
}

impl StructuredLogger {
    /// Create a new structured logger for a component
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
        }
    }

    /// Component this logger is tagged with
    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn info(&self, message: &str) {
        info!(component = %self.component, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!(component = %self.component, "{}", message);
    }

    pub fn error(&self, message: &str) {
        error!(component = %self.component, "{}", message);
    }

    pub fn debug(&self, message: &str) {
        debug!(component = %self.component, "{}", message);
    }

    pub fn trace(&self, message: &str) {
        trace!(component = %self.component, "{}", message);
    }
}

/// Create a logger for a specific component
pub fn get_logger(component: &str) -> StructuredLogger {
    StructuredLogger::new(component)
}
