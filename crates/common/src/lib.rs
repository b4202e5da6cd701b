//! Common components shared by the polis crates
//!
//! This crate provides the error type, client configuration and logging
//! setup used by the storage, proposal and CLI crates.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ClientConfig, Configuration, NotificationConfig};
pub use error::{Error, Result};
pub use logging::init_logging;
