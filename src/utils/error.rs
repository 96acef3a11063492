//! Error Handling Module
//!
//! Defines the error type shared by the dataset, model and training layers.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for benchmark operations
#[derive(Error, Debug)]
pub enum BenchError {
    /// Dataset archive could not be fetched
    #[error("Download failed for '{url}': {reason}")]
    Download { url: String, reason: String },

    /// Dataset archive could not be unpacked
    #[error("Failed to extract archive '{0}': {1}")]
    Archive(PathBuf, String),

    /// Error with dataset contents or layout
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error inside the training or validation loop
    #[error("Training error: {0}")]
    Training(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Extension trait for turning foreign errors into dataset errors with context
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, msg: &str) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| BenchError::Dataset(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| BenchError::Dataset(format!("{}: {}", f(), e)))
    }
}

impl<T> ResultExt<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| BenchError::Dataset(msg.to_string()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| BenchError::Dataset(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BenchError::Dataset("truncated record".to_string());
        assert_eq!(format!("{}", err), "Dataset error: truncated record");
    }

    #[test]
    fn test_download_error_mentions_url() {
        let err = BenchError::Download {
            url: "https://example.org/archive.tar.gz".to_string(),
            reason: "404".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("archive.tar.gz"));
        assert!(msg.contains("404"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BenchError = io_err.into();
        assert!(matches!(err, BenchError::Io(_)));
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<i32, std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"));

        let err = result.context("Failed to read train.bin").unwrap_err();
        assert!(err.to_string().contains("train.bin"));
    }

    #[test]
    fn test_option_context() {
        let opt: Option<i32> = None;
        assert!(opt.context("Value was None").is_err());
    }
}
