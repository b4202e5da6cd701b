//! Ownership of the proposal index key

use std::collections::HashSet;
use std::sync::Arc;
use polis_storage::{Backend, StorageResult};
use tracing::{debug, warn};

use crate::codec::{decode_index, encode_index, INDEX_KEY};
use crate::error::ProposalResult;

/// Sole reader and writer of the `"proposal_keys"` entry.
///
/// The index is the authoritative set of existing proposals. A record payload
/// whose id is not listed here is treated as non-existent by every reader.
#[derive(Clone)]
pub struct IndexManager {
    backend: Arc<dyn Backend>,
}

impl IndexManager {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Current ordered list of proposal ids.
    ///
    /// Never fails: an absent, unreadable or unreachable index reads as empty.
    pub async fn read_index(&self) -> Vec<String> {
        match self.fetch_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Could not read proposal index, treating it as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Like `read_index`, but backend failures are returned to the caller.
    /// Empty or undecodable content still reads as an empty index.
    pub async fn fetch_keys(&self) -> StorageResult<Vec<String>> {
        let bytes = self.backend.get_data(INDEX_KEY).await?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }

        match decode_index(&bytes) {
            Ok(keys) => Ok(dedup_preserving_order(keys)),
            Err(e) => {
                warn!("Proposal index is unreadable, treating it as empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Append `key` to the index unless it is already listed.
    ///
    /// Returns whether the index was rewritten. This is a read followed by a
    /// write of the whole index: an append by another client landing between
    /// the two is overwritten.
    pub async fn append_key(&self, key: &str) -> ProposalResult<bool> {
        let mut keys = self.fetch_keys().await?;
        if keys.iter().any(|k| k == key) {
            debug!("Key {} already indexed", key);
            return Ok(false);
        }

        keys.push(key.to_string());
        let bytes = encode_index(&keys)?;
        self.backend.set_data(INDEX_KEY, &bytes).await?;
        debug!("Indexed key {} ({} total)", key, keys.len());
        Ok(true)
    }

    /// Whether `key` is currently listed
    pub async fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.fetch_keys().await?.iter().any(|k| k == key))
    }
}

fn dedup_preserving_order(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}
