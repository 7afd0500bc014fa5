//! Typed domain error enums.
//!
//! Every failure the gateway can observe has a variant here. None of them
//! escape to the tool layer: the execution engine folds them into an `error`
//! envelope and the serializer folds [`EncodeError`] into an error block.

use thiserror::Error;

// ── Policy ────────────────────────────────────────────────────────────────────

/// A command refused by the command policy before any session is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyRejection {
    /// The command does not start with the verb its operation class requires.
    #[error("Only '{verb}' commands allowed")]
    InvalidOperation { verb: &'static str },

    /// A `show` command carries a pipe, redirect, or write-capable token.
    #[error("Disallowed modifier in '{command}'")]
    DisallowedModifier { command: String },

    /// A configuration block mentions `erase`.
    #[error("Dangerous 'erase' detected")]
    DangerousOperation,
}

// ── Collaborator errors ───────────────────────────────────────────────────────

/// Failures reported by a device session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("no parser available for '{0}'")]
    NoParser(String),

    #[error("failed to parse '{command}': {message}")]
    Parse { command: String, message: String },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("command failed: {0}")]
    Command(String),

    #[error("{0}")]
    Unsupported(String),
}

/// Failures reported by the device directory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("failed to load device directory {source_name}: {message}")]
    Load { source_name: String, message: String },

    #[error("device '{device}' uses unsupported protocol '{protocol}'")]
    UnsupportedProtocol { device: String, protocol: String },

    #[error("device '{0}' has no usable connection")]
    NoConnection(String),
}

/// Failure of the compact encoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EncodeError(pub String);

/// Failures of the worker pool itself (not of the work it runs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("worker pool is shut down")]
    PoolClosed,

    #[error("worker dropped the request without a result")]
    WorkerLost,
}

// ── Gateway ───────────────────────────────────────────────────────────────────

/// Everything that can turn a request into an `error` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Policy(#[from] PolicyRejection),

    #[error("Device '{device}' not found in {source_name}")]
    DeviceNotFound { device: String, source_name: String },

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Connection error on {device}: {message}")]
    Connection { device: String, message: String },

    #[error(transparent)]
    Execution(#[from] DriverError),

    #[error("operation cancelled before completion")]
    Cancelled,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl GatewayError {
    /// Short machine-readable kind, used as a structured log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Policy(_) => "policy_rejection",
            Self::DeviceNotFound { .. } => "device_not_found",
            Self::Directory(_) => "directory_error",
            Self::Connection { .. } => "connection_error",
            Self::Execution(_) => "execution_error",
            Self::Cancelled => "cancelled",
            Self::Dispatch(_) => "dispatch_error",
        }
    }
}
