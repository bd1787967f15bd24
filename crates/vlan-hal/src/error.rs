//! Error types for VLAN HAL operations.
//!
//! Every HAL entry point returns [`HalResult`]. At the C boundary all
//! variants collapse to [`RETURN_ERR`]; inside Rust callers can tell a
//! rejected argument from a missing group or a failed bridge command.

use std::fmt::Display;
use std::io;
use thiserror::Error;

/// Success sentinel at the C ABI boundary.
pub const RETURN_OK: i32 = 0;

/// Generic failure sentinel at the C ABI boundary.
pub const RETURN_ERR: i32 = -1;

/// Result type alias for HAL operations.
pub type HalResult<T> = Result<T, VlanHalError>;

/// Errors that can occur during HAL operations.
#[derive(Debug, Error)]
pub enum VlanHalError {
    /// An argument was NULL, empty, malformed or out of range.
    #[error("Invalid argument {argument}: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        argument: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A group, membership or config entry does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// What was looked up.
        kind: &'static str,
        /// The identifier that was looked up.
        name: String,
    },

    /// The entity exists in a conflicting state.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists {
        /// What conflicts.
        kind: &'static str,
        /// The conflicting identifier.
        name: String,
    },

    /// The backend cannot perform the operation.
    #[error("Operation not supported: {operation}")]
    Unsupported {
        /// The operation that was requested.
        operation: String,
    },

    /// Failed to execute a shell command (spawn error).
    #[error("Failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Shell command returned non-zero exit code.
    #[error("Shell command failed: '{command}' (exit code {exit_code}): {output}")]
    ShellCommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// Shell command did not finish in time.
    #[error("Shell command timed out after {timeout_secs}s: '{command}'")]
    ShellTimeout {
        /// The command that timed out.
        command: String,
        /// The timeout that elapsed.
        timeout_secs: u64,
    },

    /// Configuration validation error.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// The VLAN configuration store could not be read or written.
    #[error("VLAN config store error: {message}")]
    Store {
        /// Error message.
        message: String,
    },

    /// Writing a report failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VlanHalError {
    /// Creates an invalid argument error.
    pub fn invalid(argument: &'static str, reason: impl Display) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.to_string(),
        }
    }

    /// Creates the error for a NULL argument.
    pub fn missing(argument: &'static str) -> Self {
        Self::InvalidArgument {
            argument,
            reason: "argument is NULL".to_string(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates an already exists error.
    pub fn already_exists(kind: &'static str, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Returns true if the caller passed bad input, as opposed to the
    /// environment failing underneath a well-formed request.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            VlanHalError::InvalidArgument { .. }
                | VlanHalError::NotFound { .. }
                | VlanHalError::AlreadyExists { .. }
        )
    }

    /// The C ABI sentinel for this error. Always [`RETURN_ERR`].
    pub fn return_code(&self) -> i32 {
        RETURN_ERR
    }
}

/// Collapses a HAL result to the C ABI sentinel.
pub fn return_code<T>(result: &HalResult<T>) -> i32 {
    match result {
        Ok(_) => RETURN_OK,
        Err(e) => e.return_code(),
    }
}
