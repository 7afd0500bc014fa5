//! Application service: device session lifecycle.
//!
//! A session lives for exactly one operation. [`SessionManager::acquire`]
//! hands out a [`Session`] guard and [`SessionManager::release`] consumes it,
//! so a session cannot be released twice or carried into another operation.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{ConnectOptions, DeviceDirectory, DeviceSession};
use crate::domain::GatewayError;

/// Upper bound for a best-effort disconnect.
pub const RELEASE_TIMEOUT: Duration = Duration::from_secs(30);

/// An open device connection owned by one in-flight operation.
#[derive(Debug)]
pub struct Session<S> {
    device: String,
    handle: S,
}

impl<S: DeviceSession> Session<S> {
    fn new(device: &str, handle: S) -> Self {
        Self {
            device: device.to_string(),
            handle,
        }
    }

    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    #[must_use]
    pub fn handle(&self) -> &S {
        &self.handle
    }
}

/// Opens, reuses, and tears down device sessions.
pub struct SessionManager<D> {
    directory: Arc<D>,
    connect_timeout: Duration,
}

impl<D> Clone for SessionManager<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            connect_timeout: self.connect_timeout,
        }
    }
}

impl<D: DeviceDirectory> SessionManager<D> {
    #[must_use]
    pub fn new(directory: Arc<D>, connect_timeout: Duration) -> Self {
        Self {
            directory,
            connect_timeout,
        }
    }

    /// Resolve `device` and return a connected session.
    ///
    /// A handle the directory reports as already connected is reused as-is.
    /// A connect that fails, times out, or is cancelled leaves nothing open:
    /// the half-open handle is released before the error is returned.
    ///
    /// # Errors
    ///
    /// `DeviceNotFound` on a directory miss, `Directory` when the directory
    /// cannot be read, `Connection` on driver failure or timeout, and
    /// `Cancelled` when `cancel` fires first.
    pub async fn acquire(
        &self,
        device: &str,
        cancel: &CancellationToken,
    ) -> Result<Session<D::Session>, GatewayError> {
        let handle = self
            .directory
            .lookup(device)
            .await?
            .ok_or_else(|| GatewayError::DeviceNotFound {
                device: device.to_string(),
                source_name: self.directory.source_name(),
            })?;

        if handle.is_connected().await {
            tracing::debug!(device, "reusing open connection");
            return Ok(Session::new(device, handle));
        }

        tracing::info!(
            device,
            timeout_secs = self.connect_timeout.as_secs(),
            "connecting"
        );
        let options = ConnectOptions::with_timeout(self.connect_timeout);

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(GatewayError::Cancelled),
            res = tokio::time::timeout(self.connect_timeout, handle.connect(&options)) => match res {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(GatewayError::Connection {
                    device: device.to_string(),
                    message: e.to_string(),
                }),
                Err(_) => Err(GatewayError::Connection {
                    device: device.to_string(),
                    message: format!("timed out after {}s", self.connect_timeout.as_secs()),
                }),
            },
        };

        let session = Session::new(device, handle);
        match outcome {
            Ok(()) => {
                tracing::info!(device, "connected");
                Ok(session)
            }
            Err(err) => {
                tracing::error!(device, kind = err.kind(), error = %err, "connection failed");
                self.release(session).await;
                Err(err)
            }
        }
    }

    /// Disconnect `session` if it is still connected.
    ///
    /// Never fails: a disconnect error or timeout is logged and swallowed.
    pub async fn release(&self, session: Session<D::Session>) {
        let Session { device, handle } = session;

        if !handle.is_connected().await {
            tracing::debug!(device = %device, "already disconnected");
            return;
        }

        tracing::info!(device = %device, "disconnecting");
        match tokio::time::timeout(RELEASE_TIMEOUT, handle.disconnect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(device = %device, error = %e, "disconnect failed"),
            Err(_) => tracing::warn!(
                device = %device,
                timeout_secs = RELEASE_TIMEOUT.as_secs(),
                "disconnect timed out"
            ),
        }
    }
}
