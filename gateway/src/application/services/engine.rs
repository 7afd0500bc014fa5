//! Application service: command execution against an open session.
//!
//! `show`, `ping`, and `linux-raw` use parse-first/raw-fallback; `config`
//! applies a dedented block; the `learn-*` classes run a fixed diagnostic
//! command raw. Driver failures never escape: each one becomes an `error`
//! envelope.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{DeviceDirectory, DeviceSession};
use crate::application::services::session::SessionManager;
use crate::domain::clean::{dedent, strip_ansi};
use crate::domain::{
    CommandRequest, DeviceValue, DispatchError, GatewayError, OperationClass, ResultEnvelope,
};

/// Acquire a session, execute `request`, and release the session.
///
/// Release happens on every path: success, driver failure, a driver panic,
/// and cancellation observed while executing.
pub async fn run<D: DeviceDirectory>(
    sessions: &SessionManager<D>,
    request: &CommandRequest,
    cancel: &CancellationToken,
) -> ResultEnvelope {
    let device = request.device();

    let session = match sessions.acquire(device, cancel).await {
        Ok(session) => session,
        Err(err) => return ResultEnvelope::error(device, err),
    };

    let envelope = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            tracing::warn!(device, class = %request.class(), "operation cancelled");
            ResultEnvelope::error(device, GatewayError::Cancelled)
        }
        outcome = AssertUnwindSafe(execute(session.handle(), request)).catch_unwind() => {
            outcome.unwrap_or_else(|_| {
                tracing::error!(device, class = %request.class(), "driver panicked");
                ResultEnvelope::error(device, DispatchError::WorkerLost)
            })
        }
    };

    sessions.release(session).await;
    envelope
}

/// Execute `request` on an already-open session.
pub async fn execute<S: DeviceSession>(session: &S, request: &CommandRequest) -> ResultEnvelope {
    let device = request.device();
    let command = request.command();

    match request.class() {
        OperationClass::Show | OperationClass::Ping => parse_or_raw(session, device, command).await,
        OperationClass::LinuxRaw => {
            if session.has_parser(command) {
                parse_or_raw(session, device, command).await
            } else {
                tracing::debug!(device, command, "no parser registered, executing raw");
                raw(session, device, command).await
            }
        }
        OperationClass::Config => configure(session, device, command).await,
        OperationClass::LearnConfig => learn(session, device, command, true).await,
        OperationClass::LearnLogging => learn(session, device, command, false).await,
    }
}

async fn parse_or_raw<S: DeviceSession>(session: &S, device: &str, command: &str) -> ResultEnvelope {
    match session.parse(command).await {
        Ok(parsed) => ResultEnvelope::completed(device, parsed),
        Err(err) => {
            tracing::warn!(device, command, error = %err, "parse failed, falling back to raw execution");
            raw(session, device, command).await
        }
    }
}

async fn raw<S: DeviceSession>(session: &S, device: &str, command: &str) -> ResultEnvelope {
    match session.execute(command).await {
        Ok(output) => ResultEnvelope::completed_raw(device, output),
        Err(err) => {
            tracing::error!(device, command, error = %err, "raw execution failed");
            ResultEnvelope::error(device, err)
        }
    }
}

async fn configure<S: DeviceSession>(session: &S, device: &str, block: &str) -> ResultEnvelope {
    let block = dedent(block);
    tracing::info!(device, lines = block.lines().count(), "applying configuration");

    match session.configure(&block).await {
        Ok(output) => ResultEnvelope::success(device, output),
        Err(err) => {
            tracing::error!(device, error = %err, "configuration failed");
            ResultEnvelope::error(device, err)
        }
    }
}

async fn learn<S: DeviceSession>(
    session: &S,
    device: &str,
    command: &str,
    clean: bool,
) -> ResultEnvelope {
    match session.execute(command).await {
        Ok(output) => {
            let output = if clean { strip_ansi(&output) } else { output };
            ResultEnvelope::completed_raw(
                device,
                DeviceValue::map([("raw_output", DeviceValue::Text(output))]),
            )
        }
        Err(err) => {
            tracing::error!(device, command, error = %err, "diagnostic command failed");
            ResultEnvelope::error(device, err)
        }
    }
}
