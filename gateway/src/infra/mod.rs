//! Infrastructure layer: I/O adapters implementing the application ports.

pub mod command_runner;
pub mod ssh;
pub mod testbed;
pub mod tokenizer;
pub mod toon;

pub use command_runner::TokioCommandRunner;
pub use ssh::{SshSession, SshSettings, SshTarget};
pub use testbed::{Testbed, TestbedDirectory};
pub use tokenizer::{TiktokenCounter, UnavailableCounter};
pub use toon::ToonEncoder;
