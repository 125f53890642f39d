//! Error types for transceiver management operations.
//!
//! This module defines the error taxonomy shared by all transceiver
//! daemon crates. All errors implement `std::error::Error` via
//! `thiserror`.

use std::io;
use thiserror::Error;

/// Result type alias for transceiver operations.
pub type XcvrResult<T> = Result<T, XcvrError>;

/// Errors that can occur during transceiver operations.
#[derive(Debug, Error)]
pub enum XcvrError {
    /// The platform management service could not be reached.
    #[error("Management service unreachable: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// An RPC on an already-open connection failed.
    #[error("Management RPC failed: {operation}: {message}")]
    Rpc {
        /// The RPC that failed (e.g., "presence", "set_reset").
        operation: String,
        /// Error message.
        message: String,
    },

    /// Caller supplied a port outside the resolved range.
    #[error("Port {port} is outside the valid port range")]
    InvalidPort {
        /// The offending port number.
        port: u32,
    },

    /// Caller supplied an invalid argument.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// EEPROM cache file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    Config {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },
}

impl XcvrError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates an RPC error.
    pub fn rpc(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rpc {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error means the management service itself
    /// was unreachable (as opposed to a single RPC failing).
    ///
    /// Connection-level failures abort a poll cycle; RPC-level failures
    /// degrade the affected port only.
    pub fn is_connection(&self) -> bool {
        matches!(self, XcvrError::Connection { .. })
    }
}
