//! Infrastructure implementation of the `DeviceDirectory` port.
//!
//! `TestbedDirectory` reads a YAML testbed file on every lookup, so edits to
//! the file take effect on the next request.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::application::ports::{CommandRunner, DeviceDirectory};
use crate::domain::DirectoryError;
use crate::infra::ssh::{SshSession, SshSettings, SshTarget};

/// Connection names tried first, in order, before any other entry.
const PREFERRED_CONNECTIONS: [&str; 3] = ["cli", "ssh", "default"];

/// Root of a testbed document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Testbed {
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceEntry {
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionEntry>,
    #[serde(default)]
    pub credentials: BTreeMap<String, CredentialEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionEntry {
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl ConnectionEntry {
    fn address(&self) -> Option<&str> {
        self.ip.as_deref().or(self.host.as_deref())
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct CredentialEntry {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
    /// Accepted so common testbeds parse; sessions authenticate with keys only.
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("username", &self.username)
            .field("identity_file", &self.identity_file)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A device entry resolved to something a session can dial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDevice {
    pub os: Option<String>,
    pub target: SshTarget,
}

impl Testbed {
    /// Parse a testbed document.
    ///
    /// # Errors
    ///
    /// Returns the YAML error when the document is malformed.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes as unit, not as an empty mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Resolve `name` to an SSH target; `Ok(None)` when no such device exists.
    ///
    /// # Errors
    ///
    /// `UnsupportedProtocol` when the chosen connection is not SSH and
    /// `NoConnection` when the entry has no reachable address.
    pub fn resolve(&self, name: &str) -> Result<Option<ResolvedDevice>, DirectoryError> {
        let Some(entry) = self.devices.get(name) else {
            return Ok(None);
        };

        let connection = PREFERRED_CONNECTIONS
            .iter()
            .find_map(|key| entry.connections.get(*key).filter(|c| c.address().is_some()))
            .or_else(|| entry.connections.values().find(|c| c.address().is_some()))
            .ok_or_else(|| DirectoryError::NoConnection(name.to_string()))?;

        let protocol = connection.protocol.as_deref().unwrap_or("ssh");
        if !protocol.eq_ignore_ascii_case("ssh") {
            return Err(DirectoryError::UnsupportedProtocol {
                device: name.to_string(),
                protocol: protocol.to_string(),
            });
        }

        let credential = entry
            .credentials
            .get("default")
            .or_else(|| entry.credentials.values().next());

        if credential.is_some_and(|c| c.password.is_some()) {
            tracing::warn!(
                device = name,
                "testbed password is ignored, ssh runs in batch mode with key authentication only"
            );
        }

        let host = connection
            .address()
            .ok_or_else(|| DirectoryError::NoConnection(name.to_string()))?;

        Ok(Some(ResolvedDevice {
            os: entry.os.clone(),
            target: SshTarget {
                host: host.to_string(),
                port: connection.port,
                username: credential.and_then(|c| c.username.clone()),
                identity_file: credential.and_then(|c| c.identity_file.clone()),
            },
        }))
    }
}

/// Device directory backed by a testbed file on disk.
pub struct TestbedDirectory<R> {
    path: PathBuf,
    settings: SshSettings,
    runner: Arc<R>,
}

impl<R> TestbedDirectory<R> {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, settings: SshSettings, runner: Arc<R>) -> Self {
        Self {
            path: path.into(),
            settings,
            runner,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Testbed, DirectoryError> {
        let load_error = |message: String| DirectoryError::Load {
            source_name: self.path.display().to_string(),
            message,
        };
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| load_error(e.to_string()))?;
        Testbed::from_yaml(&content).map_err(|e| load_error(e.to_string()))
    }
}

impl<R: CommandRunner + 'static> DeviceDirectory for TestbedDirectory<R> {
    type Session = SshSession<R>;

    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    async fn lookup(&self, device: &str) -> Result<Option<Self::Session>, DirectoryError> {
        let testbed = self.load().await?;
        let Some(resolved) = testbed.resolve(device)? else {
            tracing::debug!(device, testbed = %self.path.display(), "device not in testbed");
            return Ok(None);
        };

        Ok(Some(SshSession::new(
            device,
            resolved.os,
            resolved.target,
            &self.settings,
            Arc::clone(&self.runner),
        )))
    }
}
