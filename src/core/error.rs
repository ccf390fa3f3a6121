//! Error types for the driver layer
//!
//! This module defines all error types that can occur while driving a native
//! database API through the abstraction layer.

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, DriverError>;

/// Error types for driver operations
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Required native capability or library is absent
    #[error("environment check failed: {0}")]
    Environment(String),

    /// Caller supplied a value of the wrong shape or kind to a factory method
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation violates a structural constraint of the underlying cursor
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Connection lifecycle misuse or failure
    #[error("connection error: {0}")]
    Connection(String),

    /// Statement preparation or execution misuse
    #[error("statement error: {0}")]
    Statement(String),

    /// Transaction boundary misuse
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Failure reported by the native database library, passed through
    /// untranslated
    #[error("native driver error (code {code}): {message}")]
    Native { code: i32, message: String },
}

impl DriverError {
    /// Create an environment error
    pub fn environment<S: Into<String>>(msg: S) -> Self {
        DriverError::Environment(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        DriverError::InvalidArgument(msg.into())
    }

    /// Create an unsupported operation error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        DriverError::UnsupportedOperation(msg.into())
    }

    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        DriverError::Connection(msg.into())
    }

    /// Create a statement error
    pub fn statement<S: Into<String>>(msg: S) -> Self {
        DriverError::Statement(msg.into())
    }

    /// Create a transaction error
    pub fn transaction<S: Into<String>>(msg: S) -> Self {
        DriverError::Transaction(msg.into())
    }

    /// Wrap a native library failure
    pub fn native(code: i32, message: impl Into<String>) -> Self {
        DriverError::Native {
            code,
            message: message.into(),
        }
    }
}
