//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`.
//!
//! Device ports return `Send` futures because every device operation runs on
//! a worker task of the dispatch pool.

use std::future::Future;
use std::process::Output;
use std::time::Duration;

use serde_json::Value;

use crate::domain::{DeviceValue, DirectoryError, DriverError, EncodeError};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Options passed to [`DeviceSession::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Upper bound for login, including any prompt negotiation.
    pub timeout: Duration,
    /// Learn the device hostname from its prompt instead of the directory.
    pub learn_hostname: bool,
    /// Echo device output to the process log.
    pub log_stdout: bool,
    /// Skip the driver's post-login initialisation commands.
    pub skip_init: bool,
}

impl ConnectOptions {
    /// The options the gateway always connects with.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            learn_hostname: true,
            log_stdout: false,
            skip_init: true,
        }
    }
}

// ── Device Ports ──────────────────────────────────────────────────────────────

/// A handle to one device that can be connected, driven, and disconnected.
pub trait DeviceSession: Send + Sync {
    /// Open the connection.
    fn connect(
        &self,
        options: &ConnectOptions,
    ) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Close the connection.
    fn disconnect(&self) -> impl Future<Output = Result<(), DriverError>> + Send;

    /// Whether the connection is currently open.
    fn is_connected(&self) -> impl Future<Output = bool> + Send;

    /// Run `command` and return its raw text output.
    fn execute(&self, command: &str) -> impl Future<Output = Result<String, DriverError>> + Send;

    /// Run `command` and return its output parsed into structured data.
    fn parse(
        &self,
        command: &str,
    ) -> impl Future<Output = Result<DeviceValue, DriverError>> + Send;

    /// Whether a structural parser exists for `command` on this device.
    fn has_parser(&self, command: &str) -> bool;

    /// Apply a configuration block and return the driver's transcript.
    fn configure(&self, block: &str) -> impl Future<Output = Result<String, DriverError>> + Send;
}

/// Resolves device names to sessions from a topology definition.
///
/// Implementations must re-read their source on every lookup so that edits
/// are visible to the next request without invalidation.
pub trait DeviceDirectory: Send + Sync + 'static {
    type Session: DeviceSession + 'static;

    /// Human-readable name of the topology source, used in error messages.
    fn source_name(&self) -> String;

    /// Look up `device`; `Ok(None)` when the directory has no such device.
    fn lookup(
        &self,
        device: &str,
    ) -> impl Future<Output = Result<Option<Self::Session>, DirectoryError>> + Send;
}

// ── Serialization Ports ───────────────────────────────────────────────────────

/// Reference tokenizer used only to measure encoding efficiency.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`, or `None` when counting is unavailable.
    fn count(&self, text: &str) -> Option<usize>;
}

/// Token-efficient encoder for JSON-safe values.
pub trait CompactEncoder: Send + Sync {
    /// Encode `value`.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] when the value cannot be represented.
    fn encode(&self, value: &Value) -> Result<String, EncodeError>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so the SSH adapter can be swapped or mocked.
pub trait CommandRunner: Send + Sync {
    /// Run a program and capture its output, killing it after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> impl Future<Output = anyhow::Result<Output>> + Send;

    /// Run a program with stdin piped from `input`, killing it after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    fn run_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &[u8],
        timeout: Duration,
    ) -> impl Future<Output = anyhow::Result<Output>> + Send;
}
