//! Error types for the logging daemon.
//!
//! A single `thiserror` enum covers the failure modes of the pipeline:
//! configuration loading and validation, sensor access, file I/O, and
//! record decoding. The binary wraps these in `anyhow` at its boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for daemon operations.
pub type Result<T> = std::result::Result<T, SeismoError>;

/// Errors that can occur while configuring or running the logger.
#[derive(Error, Debug)]
pub enum SeismoError {
    /// Configuration file or environment parsing failed.
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Configuration parsed but failed semantic validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// The sensor did not respond at startup. Fatal: the daemon refuses to
    /// start logging without a working sensor.
    #[error("Sensor is not connected or failed to identify")]
    SensorNotConnected,

    /// Sensor communication failed mid-stream. The in-tree simulated
    /// sensor never fails; this variant is for out-of-tree hardware
    /// drivers implementing [`crate::sensor::SensorDriver`].
    #[error("Sensor error: {message}")]
    Sensor {
        /// Description of the failure.
        message: String,
    },

    /// File or directory I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A day file record was shorter than the fixed record length.
    #[error("Truncated record: got {len} bytes, expected {expected}")]
    TruncatedRecord {
        /// Bytes available.
        len: usize,
        /// Bytes required for one record.
        expected: usize,
    },

    /// A day file name did not parse as a `YYYY-MM-DD` UTC date.
    #[error("Day file name does not contain a YYYY-MM-DD date: {path}")]
    InvalidDayFileName {
        /// The offending path.
        path: PathBuf,
    },

    /// The logger was started while already running, or stopped twice.
    #[error("Invalid logger state: {0}")]
    InvalidState(String),
}

impl SeismoError {
    /// Build a [`SeismoError::Sensor`] from any displayable cause, for
    /// hardware drivers implemented outside this crate.
    pub fn sensor(message: impl Into<String>) -> Self {
        Self::Sensor {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for SeismoError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}
