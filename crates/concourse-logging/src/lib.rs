//! Structured logging for Concourse
//!
//! This crate wires the `tracing` events emitted by the routing crates into
//! console and file output.
//!
//! # Features
//!
//! - **JSONL Output**: Structured JSON lines for log aggregation (default)
//! - **Pretty or Compact Console**: Human-readable output at a terminal
//! - **File Rotation**: Daily/hourly log rotation via tracing-appender
//! - **Target Filters**: Per-target levels on top of `RUST_LOG`
//!
//! # Quick Start
//!
//! ```ignore
//! use concourse_logging::{ConcourseSubscriberBuilder, LogConfig};
//!
//! // JSONL to the console
//! ConcourseSubscriberBuilder::new().init();
//!
//! // Pretty console, routing crates at debug
//! ConcourseSubscriberBuilder::new()
//!     .with_config(LogConfig::interactive())
//!     .init();
//!
//! // Follow one misbehaving calculation
//! ConcourseSubscriberBuilder::new()
//!     .with_config(LogConfig::route_trace())
//!     .init();
//! ```
//!
//! Route calculations run inside spans carrying a `route_id` field, so with
//! span lists enabled every JSONL line of a calculation names its route.

pub mod config;
pub mod error;

pub use config::{ConsoleConfig, ConsoleFormat, FileConfig, FileRotation, JsonlFields, LogConfig};
pub use error::LoggingError;
pub use tracing_appender::non_blocking::WorkerGuard;

use std::fs::{self, File};

use tracing::Subscriber;
use tracing_appender::non_blocking::NonBlocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Builder for configuring and initializing the Concourse logging subscriber
///
/// By default, console output uses JSONL format. Use `LogConfig::interactive()`
/// for human-readable output at a terminal.
pub struct ConcourseSubscriberBuilder {
    config: LogConfig,
    respect_env: bool,
}

impl ConcourseSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    ///
    /// Default: JSONL output to console
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
            respect_env: true,
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the base log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    /// Console format; `ConsoleFormat::Off` disables the console
    pub fn with_console(mut self, format: ConsoleFormat) -> Self {
        self.config.console.format = format;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    /// Ignore `RUST_LOG` and use the configured level only
    pub fn ignore_env(mut self) -> Self {
        self.respect_env = false;
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Build the subscriber without installing it
    ///
    /// The returned guard (present with file output) must be kept alive for
    /// the file writer to flush.
    pub fn build(
        self,
    ) -> Result<(impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>), LoggingError> {
        let directives = self.config.directives();
        let mut filter = match EnvFilter::try_from_default_env() {
            Ok(filter) if self.respect_env => filter,
            _ => EnvFilter::try_new(&self.config.level)?,
        };
        for directive in directives.iter().skip(1) {
            filter = filter.add_directive(directive.parse()?);
        }

        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        let console = &self.config.console;
        let layer = match console.format {
            ConsoleFormat::Off => None,
            ConsoleFormat::Pretty => Some(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(console.ansi)
                    .boxed(),
            ),
            ConsoleFormat::Compact => Some(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_ansi(console.ansi)
                    .with_target(true)
                    .boxed(),
            ),
            ConsoleFormat::Jsonl => Some(jsonl_layer(&self.config.jsonl, std::io::stdout)),
        };
        if let Some(layer) = layer {
            let layer = match &console.level {
                Some(level) => layer.with_filter(EnvFilter::try_new(level)?).boxed(),
                None => layer,
            };
            layers.push(layer);
        }

        if let Some(file_config) = &self.config.file {
            let (writer, file_guard) = file_writer(file_config)?;
            layers.push(jsonl_layer(&self.config.jsonl, writer));
            guard = Some(file_guard);
        }

        let subscriber = Registry::default().with(layers).with(filter);
        Ok((subscriber, guard))
    }

    /// Try to initialize the subscriber globally
    ///
    /// Returns an error if a global subscriber has already been set.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let (subscriber, guard) = self.build()?;
        subscriber.try_init()?;
        Ok(guard)
    }

    /// Initialize the subscriber globally
    ///
    /// Failures are reported on stderr; logging then stays disabled.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: Failed to initialize logging: {}", e);
                None
            }
        }
    }
}

impl Default for ConcourseSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn jsonl_layer<W>(fields: &JsonlFields, writer: W) -> BoxedLayer
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(fields.current_span)
        .with_span_list(fields.span_list)
        .flatten_event(fields.flatten)
        .with_file(fields.source_location)
        .with_line_number(fields.source_location)
        .with_thread_ids(fields.thread)
        .with_thread_names(fields.thread)
        .with_writer(writer)
        .boxed()
}

/// Truncates for `Never` rotation, appends otherwise
fn file_writer(file_config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let rotation = match file_config.rotation {
        FileRotation::Never => {
            fs::create_dir_all(&file_config.directory)?;
            let path = file_config
                .directory
                .join(format!("{}.log", file_config.prefix));
            return Ok(tracing_appender::non_blocking(File::create(path)?));
        }
        FileRotation::Daily => Rotation::DAILY,
        FileRotation::Hourly => Rotation::HOURLY,
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(file_config.prefix.as_str())
        .filename_suffix("log");
    if let Some(keep) = file_config.keep {
        builder = builder.max_log_files(keep);
    }
    let appender = builder.build(&file_config.directory)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize logging with default settings (JSONL to console)
///
/// This is a convenience function for quick setup.
pub fn init_default() -> Option<WorkerGuard> {
    ConcourseSubscriberBuilder::new().init()
}

/// Pretty console output for a terminal session
pub fn init_interactive() -> Option<WorkerGuard> {
    ConcourseSubscriberBuilder::new()
        .with_config(LogConfig::interactive())
        .init()
}

/// Warnings only; safe to call from every test
pub fn init_quiet() {
    let _ = ConcourseSubscriberBuilder::new()
        .with_config(LogConfig::quiet())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_jsonl() {
        let builder = ConcourseSubscriberBuilder::new();
        assert_eq!(builder.config().level, "info");
        assert_eq!(builder.config().console.format, ConsoleFormat::Jsonl);
    }

    #[test]
    fn test_builder_overrides() {
        let builder = ConcourseSubscriberBuilder::new()
            .with_config(LogConfig::interactive())
            .with_level("trace")
            .with_console(ConsoleFormat::Compact);
        assert_eq!(builder.config().level, "trace");
        assert_eq!(builder.config().console.format, ConsoleFormat::Compact);
        assert!(builder.config().targets.contains_key("concourse_routing"));
    }

    #[test]
    fn test_bad_level_rejected() {
        let result = ConcourseSubscriberBuilder::new()
            .ignore_env()
            .with_level("concourse=loudest")
            .build();
        assert!(matches!(result, Err(LoggingError::Filter(_))));
    }

    #[test]
    fn test_bad_target_level_rejected() {
        let result = ConcourseSubscriberBuilder::new()
            .ignore_env()
            .with_config(LogConfig::quiet().with_target("concourse_routing", "chatty"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_without_outputs() {
        let (_subscriber, guard) = ConcourseSubscriberBuilder::new()
            .ignore_env()
            .with_console(ConsoleFormat::Off)
            .build()
            .unwrap();
        assert!(guard.is_none());
    }
}
