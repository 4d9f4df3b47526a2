use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
    Registry,
};

use crate::error::{HopeError, HopeResult};

#[cfg(feature = "file_logging")]
pub use tracing_appender::non_blocking::WorkerGuard;

/// Placeholder guard when file logging is compiled out
#[cfg(not(feature = "file_logging"))]
pub struct WorkerGuard;

/// Logging configuration for HOPEZIP
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// Write daily-rolling log files here when set
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Initialize the logging system.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the program.
pub fn init_logging(config: &LoggingConfig) -> HopeResult<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "hopezip={},reqwest=warn,hyper=warn,{}",
                config.level, config.level
            ))
        });

    let registry = Registry::default().with(env_filter);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .boxed();

    let guard = match &config.log_dir {
        #[cfg(feature = "file_logging")]
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)
                .map_err(|e| HopeError::file_io(log_dir.to_string_lossy().to_string(), e))?;

            let file_appender = tracing_appender::rolling::daily(log_dir, "hopezip.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .boxed();

            registry.with(console_layer).with(file_layer).init();
            Some(guard)
        }
        #[cfg(not(feature = "file_logging"))]
        Some(_) => {
            registry.with(console_layer).init();
            tracing::warn!("File logging requested but the file_logging feature is disabled");
            None
        }
        None => {
            registry.with(console_layer).init();
            None
        }
    };

    info!("Log level: {}", config.level);
    if let Some(dir) = &config.log_dir {
        info!("File logging enabled: {}", dir.display());
    }

    Ok(guard)
}

/// Performance logging utilities
pub struct PerformanceTimer {
    start: std::time::Instant,
    operation: String,
}

impl PerformanceTimer {
    pub fn start(operation: impl Into<String>) -> Self {
        let operation = operation.into();
        info!("⏱️  Starting: {}", operation);
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    pub fn checkpoint(&self, checkpoint: &str) {
        let elapsed = self.start.elapsed();
        info!("⏱️  {} - {}: {}ms", self.operation, checkpoint, elapsed.as_millis());
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        info!("⏱️  Completed {}: {}ms", self.operation, elapsed.as_millis());
    }
}

/// Log a per-item failure that the batch will skip over
#[macro_export]
macro_rules! log_skipped {
    ($error:expr, $file:expr) => {
        tracing::warn!(
            file = %$file,
            error = %$error,
            recoverable = $error.is_recoverable(),
            "Skipping image"
        );
    };
}
