//! Error types and result handling for startup-smoke-producer.
//!
//! This module defines the main error type [`Error`] and a convenience
//! [`Result`] type alias used throughout the crate.
//!
//! # Example
//!
//! ```rust
//! use startup_smoke_producer::{Error, Result};
//!
//! fn resolve_topic(topic: &str) -> Result<&str> {
//!     if topic.trim().is_empty() {
//!         return Err(Error::Config("app.topic is required".to_string()));
//!     }
//!     Ok(topic)
//! }
//!
//! match resolve_topic("") {
//!     Ok(topic) => println!("Producing to {}", topic),
//!     Err(Error::Config(msg)) => eprintln!("Configuration error: {}", msg),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

use thiserror::Error;

/// The main error type for startup-smoke-producer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error: missing topic, unparseable value or unreadable file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Kafka client, enqueue, delivery or flush error.
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// I/O error, typically from installing the signal handler.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The broker did not acknowledge within the configured bound.
    #[error("Timeout error: {message}")]
    Timeout {
        /// Description of what timed out
        message: String,
    },

    /// Graceful shutdown was requested (e.g., via Ctrl+C).
    ///
    /// This is not really an error but uses the error mechanism
    /// to leave the keep-alive wait.
    #[error("Shutdown requested")]
    Shutdown,
}

impl Error {
    /// Whether this error comes from the broker side of a run rather than
    /// from configuration.
    pub fn is_send_error(&self) -> bool {
        matches!(self, Error::Kafka(_) | Error::Timeout { .. })
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// A convenient Result type alias for startup-smoke-producer operations.
///
/// This is equivalent to `std::result::Result<T, startup_smoke_producer::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use rdkafka::error::KafkaError;
    use rdkafka::types::RDKafkaErrorCode;

    #[test]
    fn test_send_error_classification() {
        let kafka = Error::Kafka(KafkaError::MessageProduction(
            RDKafkaErrorCode::MessageTimedOut,
        ));
        assert!(kafka.is_send_error());

        let timeout = Error::Timeout {
            message: "no ack".to_string(),
        };
        assert!(timeout.is_send_error());

        assert!(!Error::Config("topic".to_string()).is_send_error());
        assert!(!Error::Shutdown.is_send_error());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = Error::Config("app.topic is required".to_string());
        assert_eq!(err.to_string(), "Configuration error: app.topic is required");
    }
}
