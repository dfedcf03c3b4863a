//! # featurec-logger
//!
//! Installs the global `tracing` subscriber for the `featurec` binary.
//!
//! * Console output goes to **stderr**; stdout is reserved for progress messages.
//! * The filter starts from a programmatic default and is overridden by the
//!   `FEATUREC_LOG` environment variable (same syntax as `RUST_LOG`).
//! * An optional directory adds a non-blocking, plain-text log file.
//!
//! ## Example
//!
//! ```rust
//! use featurec_logger::{LevelFilter, Logger};
//!
//! let _logger = Logger::builder("featurec").level(LevelFilter::DEBUG).init().unwrap();
//! tracing::debug!("ready");
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable holding filter directives, e.g. `featurec=debug`.
pub const LOG_ENV: &str = "FEATUREC_LOG";
const LOG_FILE_SUFFIX: &str = "log";
const DEFAULT_MAX_FILES: usize = 5;

#[derive(Debug)]
struct LoggerConfig {
    name: String,
    console: bool,
    directory: Option<PathBuf>,
    level: LevelFilter,
    rotation: Rotation,
    max_files: usize,
    env_filter: Option<String>,
}

/// Configures and installs the global tracing subscriber.
#[derive(Debug)]
pub struct LoggerBuilder {
    config: LoggerConfig,
}

impl LoggerBuilder {
    /// Default level when neither directives nor `FEATUREC_LOG` are given.
    #[must_use]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Default filter directives (e.g. `warn,featurec=debug`), still overridden by `FEATUREC_LOG`.
    /// Invalid directives make [`LoggerBuilder::init`] fail.
    #[must_use]
    pub fn env_filter(mut self, directives: impl Into<String>) -> Self {
        self.config.env_filter = Some(directives.into());
        self
    }

    #[must_use]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Additionally writes plain-text logs into `directory`, named after the logger.
    #[must_use]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config.directory = Some(directory.into());
        self
    }

    /// Log file rotation; [`Rotation::NEVER`] appends to a single file.
    #[must_use]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.config.rotation = rotation;
        self
    }

    #[must_use]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.config.max_files = max;
        self
    }

    /// Consumes the builder and installs the global subscriber.
    ///
    /// Keep the returned [`Logger`] alive until shutdown so buffered file
    /// output is flushed.
    ///
    /// # Errors
    /// [`LoggerError::InvalidConfiguration`] for bad settings or filter directives,
    /// [`LoggerError::Appender`] if the log file cannot be opened and
    /// [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let config = self.config;
        validate_config(&config)?;
        let env_filter = build_env_filter(&config, std::env::var(LOG_ENV).ok().as_deref())?;

        let mut layers = Vec::new();

        if config.console {
            layers.push(layer().compact().with_writer(io::stderr).with_ansi(true).boxed());
        }

        let guard = if let Some(directory) = &config.directory {
            fs::create_dir_all(directory).context(format!(
                "Failed to create log directory: {}",
                directory.display()
            ))?;

            let appender = RollingFileAppender::builder()
                .rotation(config.rotation.clone())
                .filename_prefix(&config.name)
                .filename_suffix(LOG_FILE_SUFFIX)
                .max_log_files(config.max_files)
                .build(directory)?;

            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(layer().with_writer(writer).with_ansi(false).boxed());
            Some(guard)
        } else {
            None
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging output enabled. Enable the console or set a log directory."
                    .into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;

        Ok(Logger { guard })
    }
}

/// Handle to the installed logging system; owns the file writer's worker guard.
#[must_use = "Dropping this handle stops the background log writer."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts configuring a logger. `name` prefixes log file names.
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder {
            config: LoggerConfig {
                name: name.into(),
                console: true,
                directory: None,
                level: LevelFilter::WARN,
                rotation: Rotation::NEVER,
                max_files: DEFAULT_MAX_FILES,
                env_filter: None,
            },
        }
    }

    /// Whether a file writer is attached.
    #[must_use]
    pub const fn has_file_output(&self) -> bool {
        self.guard.is_some()
    }
}

fn validate_config(config: &LoggerConfig) -> Result<(), LoggerError> {
    if config.name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }

    if config.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }

    Ok(())
}

/// Environment directives win over programmatic ones; an empty variable counts as unset.
fn build_env_filter(config: &LoggerConfig, from_env: Option<&str>) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(config.level.into());
    let (directives, source) = match from_env.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => (Some(directives), LOG_ENV),
        None => (config.env_filter.as_deref(), "log.level"),
    };

    directives.map_or_else(
        || Ok(builder.parse_lossy("")),
        |directives| {
            builder.parse(directives).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("Invalid filter '{directives}': {e}").into(),
                context: Some(source.into()),
            })
        },
    )
}
