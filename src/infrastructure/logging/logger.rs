use std::io;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use super::config::{LogConfig, LogFormat, RotationPolicy};
use super::secret_scrubbing::ScrubbingMakeWriter;

const LOG_FILE_PREFIX: &str = "planner-janitor.log";

/// Logger implementation using tracing
///
/// Console output goes to stderr so that `--json` command output on stdout
/// stays machine-readable.
pub struct LoggerImpl {
    _guard: Option<WorkerGuard>,
}

impl LoggerImpl {
    /// Install the global subscriber.
    ///
    /// # Errors
    /// Returns an error for an invalid level or when a global subscriber is
    /// already installed.
    pub fn init(config: &LogConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;
        let env_filter = || {
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy()
        };

        let console_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(ScrubbingMakeWriter::new(io::stderr))
                .with_current_span(true)
                .with_target(true)
                .with_filter(env_filter())
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(ScrubbingMakeWriter::new(io::stderr))
                .with_target(true)
                .with_file(false)
                .with_filter(env_filter())
                .boxed(),
        };

        let (file_layer, guard) = match &config.log_dir {
            Some(log_dir) => {
                let appender = match config.rotation {
                    RotationPolicy::Daily => rolling::daily(log_dir, LOG_FILE_PREFIX),
                    RotationPolicy::Hourly => rolling::hourly(log_dir, LOG_FILE_PREFIX),
                    RotationPolicy::Never => rolling::never(log_dir, LOG_FILE_PREFIX),
                };
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                // Files are always JSON
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(ScrubbingMakeWriter::new(non_blocking))
                    .with_ansi(false)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(env_filter())
                    .boxed();
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .context("failed to install tracing subscriber")?;

        tracing::debug!(
            level = %config.level,
            format = ?config.format,
            file_output = config.log_dir.is_some(),
            "logger initialized"
        );

        Ok(Self { _guard: guard })
    }
}

/// Parse log level string to Level
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}
