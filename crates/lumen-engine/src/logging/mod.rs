//! Logging utilities.
//!
//! The engine only talks to the `log` facade; this module wires `env_logger`
//! up as the backend for binaries and tests that want console output.

mod init;

pub use init::{init_logging, LoggingConfig};
