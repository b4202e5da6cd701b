use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use super::{Backend, StorageError, StorageResult, TxReceipt};

/// In-memory backend for tests and demos.
///
/// Clones share the same underlying map, so two clients built from clones of
/// one `MemoryStorage` observe each other's writes the way two clients of a
/// remote store would.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    available: Arc<AtomicBool>,
    reject_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStorage {
    /// Create a new empty memory storage
    pub fn new() -> Self {
        Self::with_data(HashMap::new())
    }

    /// Create a new memory storage with initial data
    pub fn with_data(data: HashMap<String, Vec<u8>>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            available: Arc::new(AtomicBool::new(true)),
            reject_writes: Arc::new(AtomicBool::new(false)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Simulate the backend going down or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Simulate the authorizer declining every write
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Store raw bytes without going through `set_data`
    pub async fn insert_raw(&self, key: &str, value: impl Into<Vec<u8>>) {
        self.data.write().await.insert(key.to_string(), value.into());
    }

    /// Raw bytes at `key`, if any
    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.data.read().await.get(key).cloned()
    }

    /// Number of successful `set_data` calls
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> StorageResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory backend is offline".to_string()))
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryStorage {
    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn get_data(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.ensure_available()?;
        let store = self.data.read().await;
        trace!("Memory read for key: {}", key);
        Ok(store.get(key).cloned().unwrap_or_default())
    }

    async fn set_data(&self, key: &str, value: &[u8]) -> StorageResult<TxReceipt> {
        self.ensure_available()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected("user rejected transaction".to_string()));
        }

        let mut store = self.data.write().await;
        store.insert(key.to_string(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(TxReceipt::new(key, value.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_basic_operations() {
        let storage = MemoryStorage::new();

        // Absent keys read as empty
        assert!(storage.get_data("missing").await.unwrap().is_empty());

        let receipt = storage.set_data("test1", b"Hello World").await.unwrap();
        assert_eq!(receipt.key, "test1");
        assert_eq!(receipt.bytes_written, 11);
        assert_eq!(storage.get_data("test1").await.unwrap(), b"Hello World");

        // Overwrite replaces the whole value
        storage.set_data("test1", b"Updated").await.unwrap();
        assert_eq!(storage.get_data("test1").await.unwrap(), b"Updated");
        assert_eq!(storage.write_count(), 2);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let a = MemoryStorage::new();
        let b = a.clone();

        a.set_data("shared", b"1").await.unwrap();
        assert_eq!(b.get_data("shared").await.unwrap(), b"1");

        b.set_available(false);
        assert!(!a.is_available().await);
    }

    #[tokio::test]
    async fn offline_backend_fails_reads_and_writes() {
        let storage = MemoryStorage::new();
        storage.set_available(false);

        assert!(matches!(storage.get_data("k").await, Err(StorageError::Unavailable(_))));
        assert!(matches!(storage.set_data("k", b"v").await, Err(StorageError::Unavailable(_))));
    }

    #[tokio::test]
    async fn rejected_writes_leave_store_untouched() {
        let storage = MemoryStorage::new();
        storage.insert_raw("k", "old").await;
        storage.set_reject_writes(true);

        assert!(matches!(storage.set_data("k", b"new").await, Err(StorageError::Rejected(_))));
        assert_eq!(storage.raw("k").await.unwrap(), b"old");
        assert_eq!(storage.write_count(), 0);
    }
}
