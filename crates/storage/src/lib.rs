//! Key-value backend for polis
//!
//! This crate defines the primitive store that proposal data is persisted
//! through, and two implementations of it:
//! - `MemoryStorage`, an in-process store used by tests and demos
//! - `FileStorage`, one file per key under a base directory
//!
//! The backend offers independent reads and writes on single keys only. There
//! are no multi-key transactions and no compare-and-swap.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod file_storage;
pub mod memory_storage;

pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;

/// Storage-related errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unexpected error: {0}")]
    Other(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Acknowledgment returned by a successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Identifier of the write
    pub tx_id: String,
    /// Key that was written
    pub key: String,
    /// Size of the stored value
    pub bytes_written: usize,
}

impl TxReceipt {
    pub fn new(key: &str, bytes_written: usize) -> Self {
        Self {
            tx_id: format!("tx-{}", uuid::Uuid::new_v4()),
            key: key.to_string(),
            bytes_written,
        }
    }
}

/// The primitive key-value store every backend must provide
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Whether the backend is currently reachable
    async fn is_available(&self) -> bool;

    /// Read the value stored at `key`. An absent key reads as empty bytes.
    async fn get_data(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Replace the value stored at `key`
    async fn set_data(&self, key: &str, value: &[u8]) -> StorageResult<TxReceipt>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipts_get_distinct_ids() {
        let a = TxReceipt::new("proposal_keys", 2);
        let b = TxReceipt::new("proposal_keys", 2);
        assert_ne!(a.tx_id, b.tx_id);
        assert!(a.tx_id.starts_with("tx-"));
        assert_eq!(a.bytes_written, 2);
    }

    #[test]
    fn io_errors_convert() {
        let err: StorageError = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
        assert!(matches!(err, StorageError::Io(msg) if msg.contains("disk gone")));
    }
}
