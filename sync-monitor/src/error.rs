//! Error types for the sync monitor.

use std::io;
use thiserror::Error;

use crate::types::Endpoint;

/// Main error type for the sync monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Connectivity error for {endpoint}: {source}")]
    Connectivity {
        endpoint: Endpoint,
        #[source]
        source: ConnectivityError,
    },

    #[error("Node {endpoint} is stuck (oldest sample {oldest}, newest sample {newest})")]
    StuckDetected {
        endpoint: Endpoint,
        oldest: u64,
        newest: u64,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl MonitorError {
    /// Returns a static string representing the error category based on the variant
    pub fn category(&self) -> &'static str {
        match self {
            MonitorError::InvalidArguments(_) => "arguments",
            MonitorError::Connectivity {
                ..
            } => "connectivity",
            MonitorError::StuckDetected {
                ..
            } => "stuck",
            MonitorError::Config(_) => "config",
            MonitorError::Logging(_) => "logging",
            MonitorError::Io(_) => "io",
        }
    }

    /// Process exit status reported for this error.
    ///
    /// Every failure exits with 1; callers only distinguish success from failure.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Errors raised while querying a node's chain height.
#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Timeout occurred")]
    Timeout,

    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ConnectivityError {
    /// Whether retrying the same request may succeed.
    ///
    /// A node answering with an RPC error or garbage will answer the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ConnectivityError::Http(_) | ConnectivityError::Status(_) | ConnectivityError::Timeout
        )
    }
}

impl From<reqwest::Error> for ConnectivityError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ConnectivityError::Timeout
        } else if err.is_decode() {
            ConnectivityError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ConnectivityError::Status(status.as_u16())
        } else {
            ConnectivityError::Http(err.to_string())
        }
    }
}

/// Logging-related errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log directory: {0}")]
    DirectoryCreation(#[from] std::io::Error),

    #[error("Subscriber initialization failed: {0}")]
    SubscriberInit(String),

    #[error("Log rotation failed: {0}")]
    RotationFailed(String),
}

/// Type alias for Result with MonitorError.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Type alias for height query results.
pub type ConnectivityResult<T> = std::result::Result<T, ConnectivityError>;

/// Type alias for logging operation results.
pub type LoggingResult<T> = std::result::Result<T, LoggingError>;
