//! Unit tests for the netgate gateway.
//!
//! These tests drive the application services through mocked ports and run
//! without touching real devices.

mod dispatch;
mod engine;
mod policy_gateway;
mod property_tests;
