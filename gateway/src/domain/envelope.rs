//! Result envelope: the single, immutable result of one request.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::GatewayError;
use crate::domain::normalize::normalize;
use crate::domain::value::DeviceValue;

/// Outcome class of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Output is structured data from a parser.
    Completed,
    /// Output is raw text; structured parsing was unavailable or failed.
    CompletedRaw,
    /// A configuration block was applied.
    Success,
    /// The request did not reach a device result.
    Error,
}

impl Status {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::CompletedRaw => "completed_raw",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Body {
    Output(DeviceValue),
    Error(GatewayError),
}

/// `{status, device, output | error}`.
///
/// Fields are private: the constructors are the only way to pair a status
/// with a body, so an `error` status always carries an error and every other
/// status always carries output.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    status: Status,
    device: String,
    body: Body,
}

impl ResultEnvelope {
    #[must_use]
    pub fn completed(device: impl Into<String>, output: DeviceValue) -> Self {
        Self::with_output(Status::Completed, device, output)
    }

    #[must_use]
    pub fn completed_raw(device: impl Into<String>, output: impl Into<DeviceValue>) -> Self {
        Self::with_output(Status::CompletedRaw, device, output.into())
    }

    #[must_use]
    pub fn success(device: impl Into<String>, output: impl Into<DeviceValue>) -> Self {
        Self::with_output(Status::Success, device, output.into())
    }

    #[must_use]
    pub fn error(device: impl Into<String>, error: impl Into<GatewayError>) -> Self {
        Self {
            status: Status::Error,
            device: device.into(),
            body: Body::Error(error.into()),
        }
    }

    fn with_output(status: Status, device: impl Into<String>, output: DeviceValue) -> Self {
        Self {
            status,
            device: device.into(),
            body: Body::Output(output),
        }
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    #[must_use]
    pub fn output(&self) -> Option<&DeviceValue> {
        match &self.body {
            Body::Output(v) => Some(v),
            Body::Error(_) => None,
        }
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<&GatewayError> {
        match &self.body {
            Body::Error(e) => Some(e),
            Body::Output(_) => None,
        }
    }

    /// Normalized JSON form: `output` passes through the normalizer, `error`
    /// is rendered as its message.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("status".to_string(), Value::from(self.status.as_str()));
        map.insert("device".to_string(), Value::from(self.device.as_str()));
        match &self.body {
            Body::Output(output) => {
                map.insert("output".to_string(), normalize(output));
            }
            Body::Error(err) => {
                map.insert("error".to_string(), Value::from(err.to_string()));
            }
        }
        Value::Object(map)
    }
}
