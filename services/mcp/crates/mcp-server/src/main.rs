//! netgate MCP server entry point.
//!
//! Initialises tracing on stderr, loads configuration from environment
//! variables (prefixed with `NETGATE_`), builds the gateway over the testbed
//! file, and serves the device tools over stdio or Streamable HTTP.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod tools;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum_server::tls_rustls::RustlsConfig;
use rmcp::ServiceExt;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use netgate::application::ports::TokenCounter;
use netgate::application::{CompactSerializer, Gateway};
use netgate::domain::GatewayConfig;
use netgate::domain::config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_OPERATION_TIMEOUT, DEFAULT_QUEUE_DEPTH, DEFAULT_WORKERS,
};
use netgate::infra::{
    SshSettings, TestbedDirectory, TiktokenCounter, TokioCommandRunner, ToonEncoder,
    UnavailableCounter,
};

use crate::tools::{NetgateTools, TestbedGateway};

// ===================================================================
// Configuration
// ===================================================================

/// Server configuration loaded from environment variables via `envy`.
///
/// Each field maps to `NETGATE_<FIELD>`:
///   - `NETGATE_TRANSPORT`              (default `stdio`, or `http`)
///   - `NETGATE_LISTEN_ADDR`            (default `127.0.0.1:8080`)
///   - `NETGATE_TESTBED_PATH`           (default `testbed.yaml`)
///   - `NETGATE_CONNECT_TIMEOUT_SECS`   (default `120`)
///   - `NETGATE_OPERATION_TIMEOUT_SECS` (default `300`)
///   - `NETGATE_WORKERS`                (default `8`)
///   - `NETGATE_QUEUE_DEPTH`            (default `64`)
///   - `NETGATE_SSH_CONTROL_DIR`        (optional, defaults to the temp dir)
///   - `NETGATE_TLS_CERT`               (optional, path to TLS cert)
///   - `NETGATE_TLS_KEY`                (optional, path to TLS key)
#[derive(Debug, Deserialize)]
struct Config {
    #[serde(default)]
    transport: Transport,

    /// Socket address to bind the HTTP server to.
    #[serde(default = "default_listen_addr")]
    listen_addr: String,

    /// Path to the YAML testbed describing reachable devices.
    #[serde(default = "default_testbed_path")]
    testbed_path: PathBuf,

    #[serde(default = "default_connect_timeout_secs")]
    connect_timeout_secs: u64,

    #[serde(default = "default_operation_timeout_secs")]
    operation_timeout_secs: u64,

    #[serde(default = "default_workers")]
    workers: usize,

    #[serde(default = "default_queue_depth")]
    queue_depth: usize,

    /// Directory for SSH control sockets.
    ssh_control_dir: Option<PathBuf>,

    /// Path to TLS certificate (enables HTTPS when set).
    tls_cert: Option<String>,

    /// Path to TLS private key.
    tls_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Transport {
    #[default]
    Stdio,
    Http,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_testbed_path() -> PathBuf {
    PathBuf::from("testbed.yaml")
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_operation_timeout_secs() -> u64 {
    DEFAULT_OPERATION_TIMEOUT.as_secs()
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_queue_depth() -> usize {
    DEFAULT_QUEUE_DEPTH
}

impl Config {
    fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            operation_timeout: Duration::from_secs(self.operation_timeout_secs),
            workers: self.workers,
            queue_depth: self.queue_depth,
        }
        .sanitized()
    }

    fn ssh_settings(&self) -> SshSettings {
        SshSettings {
            control_dir: self
                .ssh_control_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            command_timeout: Duration::from_secs(self.operation_timeout_secs.max(1)),
        }
    }
}

// ===================================================================
// Health endpoint
// ===================================================================

/// Minimal health-check handler for load-balancer probes.
async fn health() -> StatusCode {
    StatusCode::OK
}

// ===================================================================
// Entry point
// ===================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Tracing goes to stderr: stdout carries the stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("netgate-mcp starting");

    // 2. Load configuration from NETGATE_* env vars.
    let config: Config = envy::prefixed("NETGATE_")
        .from_env()
        .context("failed to load config from NETGATE_* env vars")?;

    // 3. The testbed is re-read per request, but it must exist at startup.
    anyhow::ensure!(
        config.testbed_path.is_file(),
        "testbed file not found: {} (set NETGATE_TESTBED_PATH)",
        config.testbed_path.display()
    );

    let gateway_config = config.gateway_config();
    tracing::info!(
        transport = ?config.transport,
        testbed = %config.testbed_path.display(),
        connect_timeout_secs = gateway_config.connect_timeout.as_secs(),
        operation_timeout_secs = gateway_config.operation_timeout.as_secs(),
        workers = gateway_config.workers,
        queue_depth = gateway_config.queue_depth,
        tls_enabled = config.tls_cert.is_some(),
        "configuration loaded",
    );

    // 4. Build the gateway shared by every MCP session.
    let gateway = Arc::new(build_gateway(&config, &gateway_config));

    match config.transport {
        Transport::Stdio => serve_stdio(gateway).await?,
        Transport::Http => serve_http(&config, gateway).await?,
    }

    tracing::info!("netgate-mcp shut down");
    Ok(())
}

fn build_gateway(config: &Config, gateway_config: &GatewayConfig) -> TestbedGateway {
    let directory = TestbedDirectory::new(
        &config.testbed_path,
        config.ssh_settings(),
        Arc::new(TokioCommandRunner::new()),
    );

    let counter: Arc<dyn TokenCounter> = match TiktokenCounter::o200k() {
        Ok(counter) => Arc::new(counter),
        Err(e) => {
            tracing::warn!(error = %e, "tokenizer unavailable, token savings will not be reported");
            Arc::new(UnavailableCounter)
        }
    };
    let serializer = CompactSerializer::new(Arc::new(ToonEncoder), counter);

    Gateway::new(Arc::new(directory), serializer, gateway_config)
}

async fn serve_stdio(gateway: Arc<TestbedGateway>) -> Result<()> {
    tracing::info!("MCP server ready on stdio");

    let service = NetgateTools::new(gateway)
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start stdio MCP service")?;

    tokio::select! {
        res = service.waiting() => {
            res.context("stdio MCP service error")?;
        }
        () = shutdown_signal() => {}
    }
    Ok(())
}

async fn serve_http(config: &Config, gateway: Arc<TestbedGateway>) -> Result<()> {
    // The factory closure creates a fresh NetgateTools per MCP session,
    // each sharing the same gateway and worker pool.
    let service = StreamableHttpService::new(
        move || Ok(NetgateTools::new(Arc::clone(&gateway))),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    //    - `/mcp`    → MCP Streamable-HTTP transport
    //    - `/health` → health-check probe
    let router = axum::Router::new()
        .nest_service("/mcp", service)
        .route("/health", axum::routing::get(health));

    let addr: std::net::SocketAddr = config
        .listen_addr
        .parse()
        .context("invalid listen address")?;

    if let (Some(cert_path), Some(key_path)) = (&config.tls_cert, &config.tls_key) {
        tracing::info!("TLS enabled, loading cert from {}", cert_path);
        let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .context("failed to load TLS certificates")?;

        tracing::info!("MCP server ready on https://{}/mcp", config.listen_addr);

        let handle = axum_server::Handle::new();
        let shutdown = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
        });

        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(router.into_make_service())
            .await
            .context("HTTPS server error")?;
    } else {
        tracing::info!(
            "MCP server ready on http://{}/mcp (TLS disabled)",
            config.listen_addr,
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("failed to bind TCP listener")?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;
    }
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
