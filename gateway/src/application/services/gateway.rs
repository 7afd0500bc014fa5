//! Application service: the gateway facade.
//!
//! One method per external operation. Each runs the command policy, hands the
//! device work to the worker pool, normalizes the envelope, and returns the
//! serializer's rendered text. None of them can fail.

use std::sync::Arc;

use crate::application::ports::DeviceDirectory;
use crate::application::services::dispatch::WorkerPool;
use crate::application::services::engine;
use crate::application::services::serializer::{CompactSerializer, Rendered};
use crate::application::services::session::SessionManager;
use crate::domain::{CommandRequest, GatewayConfig, OperationClass, ResultEnvelope, Status, policy};

pub struct Gateway<D> {
    sessions: SessionManager<D>,
    pool: WorkerPool,
    serializer: CompactSerializer,
}

impl<D: DeviceDirectory> Gateway<D> {
    /// Build a gateway and start its worker pool on the current runtime.
    #[must_use]
    pub fn new(directory: Arc<D>, serializer: CompactSerializer, config: &GatewayConfig) -> Self {
        let config = config.clone().sanitized();
        Self {
            sessions: SessionManager::new(directory, config.connect_timeout),
            pool: WorkerPool::new(config.workers, config.queue_depth, config.operation_timeout),
            serializer,
        }
    }

    /// Run a `show` command; parse-first, raw-fallback.
    pub async fn run_show_command(&self, device: &str, command: &str) -> String {
        self.handle(CommandRequest::new(OperationClass::Show, device, command))
            .await
    }

    /// Apply a configuration block.
    pub async fn configure_device(&self, device: &str, config: &str) -> String {
        self.handle(CommandRequest::new(OperationClass::Config, device, config))
            .await
    }

    /// Fetch the running configuration, cleaned of terminal escapes.
    pub async fn show_running_config(&self, device: &str) -> String {
        self.handle(CommandRequest::new(OperationClass::LearnConfig, device, ""))
            .await
    }

    /// Fetch the most recent log buffer entries.
    pub async fn show_logging(&self, device: &str) -> String {
        self.handle(CommandRequest::new(OperationClass::LearnLogging, device, ""))
            .await
    }

    /// Run a `ping` command from the device.
    pub async fn ping_from_device(&self, device: &str, command: &str) -> String {
        self.handle(CommandRequest::new(OperationClass::Ping, device, command))
            .await
    }

    /// Run an arbitrary command on a Linux host from the directory.
    pub async fn run_linux_command(&self, device: &str, command: &str) -> String {
        self.handle(CommandRequest::new(OperationClass::LinuxRaw, device, command))
            .await
    }

    /// Dispatch, normalize, and serialize one request.
    pub async fn handle(&self, request: CommandRequest) -> String {
        self.render(request).await.to_string()
    }

    /// Like [`Gateway::handle`] but returns the structured rendering.
    pub async fn render(&self, request: CommandRequest) -> Rendered {
        let envelope = self.dispatch(request).await;
        self.serializer.serialize(&envelope.to_json())
    }

    /// Validate `request` and run it on a worker, producing its envelope.
    pub async fn dispatch(&self, request: CommandRequest) -> ResultEnvelope {
        let device = request.device().to_string();
        let class = request.class();

        if let Err(rejection) = policy::validate(class, request.command()) {
            tracing::warn!(
                device = %device,
                class = %class,
                reason = %rejection,
                "request rejected by command policy"
            );
            return ResultEnvelope::error(device, rejection);
        }

        let sessions = self.sessions.clone();
        let envelope = self
            .pool
            .submit(device.clone(), move |cancel| async move {
                engine::run(&sessions, &request, &cancel).await
            })
            .await
            .unwrap_or_else(|err| ResultEnvelope::error(device.clone(), err));

        match (envelope.status(), envelope.error_kind()) {
            (Status::Error, Some(err)) => tracing::warn!(
                device = %device,
                class = %class,
                kind = err.kind(),
                error = %err,
                "operation failed"
            ),
            (status, _) => tracing::info!(
                device = %device,
                class = %class,
                status = status.as_str(),
                "operation completed"
            ),
        }
        envelope
    }
}
