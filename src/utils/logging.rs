//! Logging Module
//!
//! Structured logging on top of `tracing`. The subscriber honours `RUST_LOG`
//! when it is set and falls back to the configured level otherwise.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::utils::error::{BenchError, Result};
use crate::utils::format_duration;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: LogLevel,
    /// Whether to include timestamps
    pub timestamps: bool,
    /// Whether to include target (module path)
    pub include_target: bool,
    /// Whether to use ANSI colors
    pub ansi_colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            timestamps: true,
            include_target: false,
            ansi_colors: true,
        }
    }
}

impl LogConfig {
    /// Create a verbose logging config for debugging
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            include_target: true,
            ..Self::default()
        }
    }
}

/// Log level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level name, falling back to `Info` for unknown names
    pub fn from_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Initialize the global subscriber with the given configuration
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let mut rejected_env = None;
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(e) => {
            if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
                rejected_env = Some(e);
            }
            EnvFilter::new(config.level.to_string())
        }
    };

    let layer = fmt::layer()
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .compact();

    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.timestamps {
        registry.with(layer).try_init()
    } else {
        registry.with(layer.without_time()).try_init()
    };

    installed.map_err(|e| BenchError::Config(format!("Failed to initialize logger: {e}")))?;

    if let Some(e) = rejected_env {
        tracing::warn!(
            "Ignoring invalid {}: {}, using level {}",
            EnvFilter::DEFAULT_ENV,
            e,
            config.level
        );
    }
    Ok(())
}

/// Wall-clock bookkeeping for the epoch loop
pub struct TrainingLogger {
    /// Current epoch (0-indexed)
    epoch: usize,
    /// Total epochs
    total_epochs: usize,
    /// Epoch start time
    epoch_start: Instant,
    /// Training start time
    training_start: Instant,
}

impl TrainingLogger {
    /// Create a new training logger
    pub fn new(total_epochs: usize) -> Self {
        Self {
            epoch: 0,
            total_epochs,
            epoch_start: Instant::now(),
            training_start: Instant::now(),
        }
    }

    /// Log start of an epoch
    pub fn start_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
        self.epoch_start = Instant::now();

        tracing::debug!("Epoch {} started", self.epoch_label());
    }

    /// Current epoch against the last epoch index, e.g. `2/4` for the third of five
    pub fn epoch_label(&self) -> String {
        format!("{}/{}", self.epoch, self.total_epochs.saturating_sub(1))
    }

    /// Log the end of the current epoch with its duration and the remaining estimate
    pub fn log_epoch_end(&self) {
        tracing::info!(
            "Epoch {} done in {} (ETA {})",
            self.epoch_label(),
            format_duration(self.epoch_seconds()),
            format_duration(self.eta_seconds())
        );
    }

    /// Seconds elapsed since `start_epoch`
    pub fn epoch_seconds(&self) -> f64 {
        self.epoch_start.elapsed().as_secs_f64()
    }

    /// Seconds elapsed since the logger was created
    pub fn total_seconds(&self) -> f64 {
        self.training_start.elapsed().as_secs_f64()
    }

    /// Estimated seconds until the last epoch finishes
    pub fn eta_seconds(&self) -> f64 {
        let done = self.epoch + 1;
        let remaining = self.total_epochs.saturating_sub(done);
        remaining as f64 * self.total_seconds() / done as f64
    }

    /// Log training completion
    pub fn log_complete(&self, images_per_sec: f64) {
        tracing::info!(
            "Training complete: {} epochs in {:.1}s ({:.1} images/s overall)",
            self.total_epochs,
            self.total_seconds(),
            images_per_sec
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_name() {
        assert_eq!(LogLevel::from_name("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::from_name("INFO"), LogLevel::Info);
        assert_eq!(LogLevel::from_name("Warning"), LogLevel::Warn);
        assert_eq!(LogLevel::from_name("unknown"), LogLevel::Info);
    }

    #[test]
    fn test_log_config_presets() {
        assert_eq!(LogConfig::default().level, LogLevel::Info);
        assert_eq!(LogConfig::verbose().level, LogLevel::Debug);
        assert!(LogConfig::verbose().include_target);
    }

    #[test]
    fn test_epoch_label_counts_from_zero() {
        let mut logger = TrainingLogger::new(5);
        logger.start_epoch(0);
        assert_eq!(logger.epoch_label(), "0/4");
        logger.start_epoch(4);
        assert_eq!(logger.epoch_label(), "4/4");
    }

    #[test]
    fn test_second_init_reports_an_error() {
        let config = LogConfig {
            ansi_colors: false,
            ..LogConfig::default()
        };
        let _ = init_logging(&config);
        // A global subscriber is installed now, so this one must fail loudly
        assert!(matches!(init_logging(&config), Err(BenchError::Config(_))));
    }

    #[test]
    fn test_eta_is_zero_on_last_epoch() {
        let mut logger = TrainingLogger::new(3);
        logger.start_epoch(2);
        assert_eq!(logger.eta_seconds(), 0.0);
    }
}
