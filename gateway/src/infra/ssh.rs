//! Infrastructure implementation of the `DeviceSession` port over OpenSSH.
//!
//! Each session owns one control master. `connect` starts it in the
//! background, every command is multiplexed over its socket, and
//! `disconnect` asks it to exit. Sessions never share a socket, so releasing
//! one cannot tear down another request's connection.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::application::ports::{CommandRunner, ConnectOptions, DeviceSession};
use crate::domain::{DeviceValue, DriverError};

const SSH: &str = "ssh";

/// Upper bound for control-socket housekeeping (`-O check`, `-O exit`).
const CONTROL_TIMEOUT: Duration = Duration::from_secs(10);

static NEXT_SOCKET_ID: AtomicU64 = AtomicU64::new(0);

/// Where and how to reach a device over SSH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub identity_file: Option<PathBuf>,
}

impl SshTarget {
    /// `user@host`, or just `host` without a username.
    #[must_use]
    pub fn destination(&self) -> String {
        match &self.username {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

/// Settings shared by every session a directory creates.
#[derive(Debug, Clone)]
pub struct SshSettings {
    /// Directory holding control sockets.
    pub control_dir: PathBuf,
    /// Upper bound for one command round-trip.
    pub command_timeout: Duration,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            control_dir: std::env::temp_dir(),
            command_timeout: Duration::from_secs(300),
        }
    }
}

/// A device reached through a dedicated OpenSSH control master.
pub struct SshSession<R> {
    device: String,
    os: Option<String>,
    target: SshTarget,
    control_path: PathBuf,
    command_timeout: Duration,
    runner: Arc<R>,
    master_started: AtomicBool,
    log_output: AtomicBool,
}

impl<R> std::fmt::Debug for SshSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("device", &self.device)
            .field("os", &self.os)
            .field("target", &self.target)
            .field("control_path", &self.control_path)
            .finish_non_exhaustive()
    }
}

impl<R: CommandRunner> SshSession<R> {
    #[must_use]
    pub fn new(
        device: impl Into<String>,
        os: Option<String>,
        target: SshTarget,
        settings: &SshSettings,
        runner: Arc<R>,
    ) -> Self {
        let device = device.into();
        let control_path = control_path(&settings.control_dir, &device);
        Self {
            device,
            os,
            target,
            control_path,
            command_timeout: settings.command_timeout,
            runner,
            master_started: AtomicBool::new(false),
            log_output: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    #[must_use]
    pub fn control_path(&self) -> &Path {
        &self.control_path
    }

    /// Linux hosts accept commands but have no configuration mode.
    #[must_use]
    pub fn is_linux(&self) -> bool {
        self.os
            .as_deref()
            .is_some_and(|os| os.eq_ignore_ascii_case("linux"))
    }

    /// Arguments every invocation shares: socket, port, identity, batch mode.
    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-S".to_string(),
            self.control_path.display().to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
        ];
        if let Some(port) = self.target.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        if let Some(identity) = &self.target.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        args
    }

    async fn control(&self, operation: &str) -> anyhow::Result<Output> {
        let mut args = self.base_args();
        args.extend(["-O".to_string(), operation.to_string(), self.target.destination()]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.runner
            .run_with_timeout(SSH, &args, CONTROL_TIMEOUT)
            .await
    }

    fn trace_output(&self, command: &str, output: &str) {
        if self.log_output.load(Ordering::Relaxed) {
            tracing::debug!(device = %self.device, command, output, "device output");
        }
    }
}

fn control_path(dir: &Path, device: &str) -> PathBuf {
    let id = NEXT_SOCKET_ID.fetch_add(1, Ordering::Relaxed);
    let safe: String = device
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    dir.join(format!("netgate-{}-{id}-{safe}.sock", std::process::id()))
}

fn failure(command: &str, output: &Output) -> DriverError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let code = output
        .status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string());
    DriverError::Command(format!("'{command}' exited with {code}: {}", stderr.trim()))
}

impl<R: CommandRunner + 'static> DeviceSession for SshSession<R> {
    async fn connect(&self, options: &ConnectOptions) -> Result<(), DriverError> {
        self.log_output.store(options.log_stdout, Ordering::Relaxed);

        let mut args = vec!["-M".to_string(), "-f".to_string(), "-N".to_string()];
        args.extend(self.base_args());
        args.extend([
            "-o".to_string(),
            format!("ConnectTimeout={}", options.timeout.as_secs().max(1)),
            self.target.destination(),
        ]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = self
            .runner
            .run_with_timeout(SSH, &args, options.timeout)
            .await
            .map_err(|e| DriverError::Connect(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DriverError::Connect(stderr.trim().to_string()));
        }
        self.master_started.store(true, Ordering::Release);
        tracing::debug!(device = %self.device, socket = %self.control_path.display(), "control master started");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DriverError> {
        if !self.master_started.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let output = self
            .control("exit")
            .await
            .map_err(|e| DriverError::Command(e.to_string()))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(failure("-O exit", &output))
        }
    }

    async fn is_connected(&self) -> bool {
        if !self.master_started.load(Ordering::Acquire) {
            return false;
        }
        matches!(self.control("check").await, Ok(output) if output.status.success())
    }

    async fn execute(&self, command: &str) -> Result<String, DriverError> {
        let mut args = self.base_args();
        args.push(self.target.destination());
        args.push(command.to_string());
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = self
            .runner
            .run_with_timeout(SSH, &args, self.command_timeout)
            .await
            .map_err(|e| DriverError::Command(e.to_string()))?;
        if !output.status.success() {
            return Err(failure(command, &output));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        self.trace_output(command, &text);
        Ok(text)
    }

    async fn parse(&self, command: &str) -> Result<DeviceValue, DriverError> {
        Err(DriverError::NoParser(command.to_string()))
    }

    fn has_parser(&self, _command: &str) -> bool {
        false
    }

    async fn configure(&self, block: &str) -> Result<String, DriverError> {
        if self.is_linux() {
            return Err(DriverError::Unsupported(format!(
                "configuration is not supported on linux host '{}'",
                self.device
            )));
        }

        let mut args = vec!["-T".to_string()];
        args.extend(self.base_args());
        args.push(self.target.destination());
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let script = format!("configure terminal\n{block}\nend\n");
        let output = self
            .runner
            .run_with_stdin(SSH, &args, script.as_bytes(), self.command_timeout)
            .await
            .map_err(|e| DriverError::Command(e.to_string()))?;
        if !output.status.success() {
            return Err(failure("configure terminal", &output));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        self.trace_output("configure terminal", &text);
        Ok(text)
    }
}
