//! Application services: use-case orchestration over injected ports.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

pub mod dispatch;
pub mod engine;
pub mod gateway;
pub mod serializer;
pub mod session;
