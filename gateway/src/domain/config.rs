//! Gateway tuning knobs shared by the session manager and the worker pool.

use std::time::Duration;

/// Timeout applied when opening a device session.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(120);

/// Deadline for one whole operation (connect, execute, disconnect).
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(300);

pub const DEFAULT_WORKERS: usize = 8;

pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Replacement for a zero timeout, which would fail every operation.
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Bound on `connect` for each session.
    pub connect_timeout: Duration,

    /// Deadline after which an in-flight operation is cancelled.
    pub operation_timeout: Duration,

    /// Number of worker tasks executing device operations.
    pub workers: usize,

    /// Requests that may wait for a worker before submission blocks.
    pub queue_depth: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            workers: DEFAULT_WORKERS,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl GatewayConfig {
    /// Clamp pool sizing to at least one worker and one queue slot, and
    /// replace zero timeouts with [`MIN_TIMEOUT`].
    ///
    /// Timeouts read from whole seconds therefore end up at 1s or more.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.connect_timeout.is_zero() {
            self.connect_timeout = MIN_TIMEOUT;
        }
        if self.operation_timeout.is_zero() {
            self.operation_timeout = MIN_TIMEOUT;
        }
        self.workers = self.workers.max(1);
        self.queue_depth = self.queue_depth.max(1);
        self
    }
}
