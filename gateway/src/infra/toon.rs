//! Infrastructure implementation of the `CompactEncoder` port over TOON.

use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;

use crate::application::ports::CompactEncoder;
use crate::domain::EncodeError;

/// TOON encoder with default options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToonEncoder;

impl CompactEncoder for ToonEncoder {
    fn encode(&self, value: &Value) -> Result<String, EncodeError> {
        panic::catch_unwind(AssertUnwindSafe(|| ::toon::encode(value, None))).map_err(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "encoder panicked".to_string());
            EncodeError(format!("TOON encoding failed: {reason}"))
        })
    }
}
