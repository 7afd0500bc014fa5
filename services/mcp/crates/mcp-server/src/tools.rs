//! MCP tool implementations for the netgate server.
//!
//! Exposes six device tools via the `rmcp` `#[tool]` macro:
//!   - `run_show_command`
//!   - `configure_device`
//!   - `show_running_config`
//!   - `show_logging`
//!   - `ping_from_network_device`
//!   - `run_linux_command`
//!
//! Every tool returns the gateway's rendered TOON text. Command policy
//! rejections and device failures are part of that text, not tool errors;
//! only a malformed `device_name` is refused before reaching the gateway.

use std::sync::Arc;

use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;

use netgate::application::Gateway;
use netgate::infra::{TestbedDirectory, TokioCommandRunner};

/// The gateway as wired by the server: testbed file plus system `ssh`.
pub type TestbedGateway = Gateway<TestbedDirectory<TokioCommandRunner>>;

// ===================================================================
// Input structs
// ===================================================================

/// Input parameters for `run_show_command` and `ping_from_network_device`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeviceCommandInput {
    /// Device name as it appears in the testbed.
    pub device_name: String,
    /// The command to run, e.g. `show ip interface brief`.
    pub command: String,
}

/// Input parameters for `configure_device`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ConfigureInput {
    /// Device name as it appears in the testbed.
    pub device_name: String,
    /// Configuration block, one command per line, without
    /// `configure terminal` or `end`.
    pub config_commands: String,
}

/// Input parameters for tools that only need a device.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeviceInput {
    /// Device name as it appears in the testbed.
    pub device_name: String,
}

// ===================================================================
// NetgateTools: the MCP server handler
// ===================================================================

/// MCP server handler forwarding each tool call to the shared gateway.
#[derive(Clone)]
pub struct NetgateTools {
    gateway: Arc<TestbedGateway>,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for NetgateTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetgateTools")
            .field("gateway", &"<Gateway>")
            .finish()
    }
}

impl NetgateTools {
    pub fn new(gateway: Arc<TestbedGateway>) -> Self {
        Self {
            gateway,
            tool_router: Self::tool_router(),
        }
    }
}

// -------------------------------------------------------------------
// Tool implementations
// -------------------------------------------------------------------

#[tool_router]
impl NetgateTools {
    #[tool(description = "Run a 'show' command on a network device. Returns structured \
        output when a parser exists, raw text otherwise. Pipes, redirects and \
        write-like keywords are rejected.")]
    async fn run_show_command(
        &self,
        params: Parameters<DeviceCommandInput>,
    ) -> Result<String, String> {
        let input = params.0;
        validate_device_name(&input.device_name)?;
        Ok(self
            .gateway
            .run_show_command(&input.device_name, &input.command)
            .await)
    }

    #[tool(description = "Apply a configuration block to a network device. \
        Blocks containing 'erase' are rejected.")]
    async fn configure_device(&self, params: Parameters<ConfigureInput>) -> Result<String, String> {
        let input = params.0;
        validate_device_name(&input.device_name)?;
        Ok(self
            .gateway
            .configure_device(&input.device_name, &input.config_commands)
            .await)
    }

    #[tool(description = "Fetch the running configuration of a network device.")]
    async fn show_running_config(&self, params: Parameters<DeviceInput>) -> Result<String, String> {
        let input = params.0;
        validate_device_name(&input.device_name)?;
        Ok(self.gateway.show_running_config(&input.device_name).await)
    }

    #[tool(description = "Fetch the last 250 log entries of a network device.")]
    async fn show_logging(&self, params: Parameters<DeviceInput>) -> Result<String, String> {
        let input = params.0;
        validate_device_name(&input.device_name)?;
        Ok(self.gateway.show_logging(&input.device_name).await)
    }

    #[tool(description = "Run a 'ping' command from a network device, \
        e.g. 'ping 10.0.0.1 repeat 5'.")]
    async fn ping_from_network_device(
        &self,
        params: Parameters<DeviceCommandInput>,
    ) -> Result<String, String> {
        let input = params.0;
        validate_device_name(&input.device_name)?;
        Ok(self
            .gateway
            .ping_from_device(&input.device_name, &input.command)
            .await)
    }

    #[tool(description = "Run a shell command on a Linux host from the testbed.")]
    async fn run_linux_command(
        &self,
        params: Parameters<DeviceCommandInput>,
    ) -> Result<String, String> {
        let input = params.0;
        validate_device_name(&input.device_name)?;
        Ok(self
            .gateway
            .run_linux_command(&input.device_name, &input.command)
            .await)
    }
}

// -------------------------------------------------------------------
// ServerHandler implementation (via tool_handler macro)
// -------------------------------------------------------------------

#[tool_handler]
impl ServerHandler for NetgateTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "netgate: run commands on testbed devices. \
                 Responses are TOON-encoded and start with @@TOON@@."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// -------------------------------------------------------------------
// Helpers
// -------------------------------------------------------------------

/// Reject device names that cannot be testbed keys.
fn validate_device_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("device_name must not be empty".to_string());
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(format!(
            "Invalid device_name '{}': whitespace and control characters are not allowed",
            name.escape_debug()
        ));
    }
    Ok(())
}
