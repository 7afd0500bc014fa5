//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod clean;
pub mod command;
pub mod config;
pub mod envelope;
pub mod error;
pub mod normalize;
pub mod policy;
pub mod value;

pub use command::{CommandRequest, OperationClass};
pub use config::GatewayConfig;
pub use envelope::{ResultEnvelope, Status};
pub use error::{DirectoryError, DispatchError, DriverError, EncodeError, GatewayError, PolicyRejection};
pub use normalize::normalize;
pub use value::DeviceValue;
