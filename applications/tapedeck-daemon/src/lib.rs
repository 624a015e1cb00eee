//! Tapedeck Daemon Library
//!
//! Configuration, command ingress, health reporting and process wiring for
//! the tapedeck playback daemon.
//!
//! This library exposes the daemon components for testing purposes.

pub mod config;
pub mod engine;
pub mod error;
pub mod health;
pub mod ingress;

// Re-export commonly used types for convenience
pub use config::{DaemonConfig, OutputBackend};
pub use engine::{open_journal, open_output, Engine};
pub use error::{DaemonError, Result};
pub use ingress::{parse_command, pump, IngressStats};
