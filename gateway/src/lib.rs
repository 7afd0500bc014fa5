//! netgate library: device command gateway exposed for the MCP server and
//! for integration testing.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod application;
pub mod domain;
pub mod infra;
