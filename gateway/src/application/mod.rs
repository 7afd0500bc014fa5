//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`.

pub mod ports;
pub mod services;

pub use ports::{
    CommandRunner, CompactEncoder, ConnectOptions, DeviceDirectory, DeviceSession, TokenCounter,
};
pub use services::dispatch::WorkerPool;
pub use services::gateway::Gateway;
pub use services::serializer::{CompactSerializer, Rendered, TokenReport};
pub use services::session::{Session, SessionManager};
