//! Polis
//!
//! Anonymous policy proposals and up/down voting, persisted through a
//! generic key-value backend.

/// Module version information
pub mod version {
    /// The current version of the polis library
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

pub use polis_common as common;
pub use polis_proposals as proposals;
pub use polis_storage as storage;
