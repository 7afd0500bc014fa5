//! Command requests and operation classes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed command executed for [`OperationClass::LearnConfig`].
pub const LEARN_CONFIG_COMMAND: &str = "show run brief";

/// Fixed command executed for [`OperationClass::LearnLogging`].
pub const LEARN_LOGGING_COMMAND: &str = "show logging last 250";

/// Category of a request; selects the policy rule and execution protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationClass {
    Show,
    Ping,
    Config,
    LinuxRaw,
    LearnConfig,
    LearnLogging,
}

impl OperationClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Ping => "ping",
            Self::Config => "config",
            Self::LinuxRaw => "linux-raw",
            Self::LearnConfig => "learn-config",
            Self::LearnLogging => "learn-logging",
        }
    }
}

impl fmt::Display for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable request against one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    class: OperationClass,
    device: String,
    command: String,
}

impl CommandRequest {
    /// Build a request. For `config` the command is the whole configuration
    /// block; for `learn-*` it is replaced by the fixed diagnostic command.
    #[must_use]
    pub fn new(class: OperationClass, device: impl Into<String>, command: impl Into<String>) -> Self {
        let command = match class {
            OperationClass::LearnConfig => LEARN_CONFIG_COMMAND.to_string(),
            OperationClass::LearnLogging => LEARN_LOGGING_COMMAND.to_string(),
            _ => command.into(),
        };
        Self {
            class,
            device: device.into(),
            command,
        }
    }

    #[must_use]
    pub fn class(&self) -> OperationClass {
        self.class
    }

    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }
}
