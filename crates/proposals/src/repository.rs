//! Listing, creating and voting on proposals over the key-value backend

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use polis_storage::Backend;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::codec::{decode_record, encode_record, record_key, INDEX_KEY};
use crate::encoder::{PayloadEncoder, PlaceholderEncoder};
use crate::error::{DecodeError, ProposalError, ProposalResult};
use crate::index::IndexManager;
use crate::types::{ProposalDraft, ProposalRecord, Signer, VoteDirection};

const ID_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 7;

/// Why an indexed proposal was left out of a load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The index lists the id but no payload is stored for it
    Missing,
    /// The payload could not be decoded
    Unreadable(DecodeError),
    /// The backend failed while fetching the payload
    Fetch(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub id: String,
    pub reason: SkipReason,
}

/// Point-in-time view of every readable proposal, newest first.
///
/// Never authoritative: discard it and load again after any write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProposalSnapshot {
    pub records: Vec<ProposalRecord>,
    pub skipped: Vec<SkippedRecord>,
    /// Unix seconds at which the load finished
    pub loaded_at: u64,
}

impl ProposalSnapshot {
    pub fn get(&self, id: &str) -> Option<&ProposalRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

/// Proposal storage protocol on top of a plain key-value backend
pub struct ProposalRepository {
    backend: Arc<dyn Backend>,
    index: IndexManager,
    encoder: Arc<dyn PayloadEncoder>,
    signer: Option<Signer>,
}

impl ProposalRepository {
    /// Create a read-only repository using the placeholder encoder
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            index: IndexManager::new(Arc::clone(&backend)),
            backend,
            encoder: Arc::new(PlaceholderEncoder),
            signer: None,
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn PayloadEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Attach write capability
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn signer(&self) -> Option<&Signer> {
        self.signer.as_ref()
    }

    pub fn index(&self) -> &IndexManager {
        &self.index
    }

    /// Load every indexed proposal, newest first.
    ///
    /// A proposal that cannot be fetched or decoded is logged and reported in
    /// `skipped`; it never prevents the rest from loading. Proposals with equal
    /// timestamps keep their index order.
    pub async fn load(&self) -> ProposalResult<ProposalSnapshot> {
        if !self.backend.is_available().await {
            warn!("Backend is not available, aborting load");
            return Err(ProposalError::BackendUnavailable(
                "backend reported unavailable".to_string(),
            ));
        }

        let keys = self.index.fetch_keys().await?;
        debug!("Loading {} indexed proposals", keys.len());

        let mut records = Vec::with_capacity(keys.len());
        let mut skipped = Vec::new();

        for id in keys {
            match self.backend.get_data(&record_key(&id)).await {
                Ok(bytes) if bytes.is_empty() => {
                    warn!("Proposal {} is indexed but has no payload", id);
                    skipped.push(SkippedRecord { id, reason: SkipReason::Missing });
                }
                Ok(bytes) => match decode_record(&id, &bytes) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!("Skipping unreadable proposal {}: {}", id, e);
                        skipped.push(SkippedRecord { id, reason: SkipReason::Unreadable(e) });
                    }
                },
                Err(e) => {
                    warn!("Error loading proposal {}: {}", id, e);
                    skipped.push(SkippedRecord { id, reason: SkipReason::Fetch(e.to_string()) });
                }
            }
        }

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(ProposalSnapshot {
            records,
            skipped,
            loaded_at: unix_now().as_secs(),
        })
    }

    /// Encode and store a new proposal, returning its id.
    ///
    /// The record is written before its id is indexed. If the second step
    /// fails the record is left unreferenced and invisible to readers.
    pub async fn create(&self, draft: &ProposalDraft) -> ProposalResult<String> {
        let signer = self.require_signer()?;
        draft.validate()?;

        let plain = serde_json::to_string(draft)?;
        let content = self.encoder.encode(&plain);

        let id = generate_proposal_id();
        let record = ProposalRecord::new(
            id.clone(),
            content,
            unix_now().as_secs(),
            signer.address(),
            draft.category,
        );

        let receipt = self
            .backend
            .set_data(&record_key(&id), &encode_record(&record)?)
            .await?;
        debug!("Stored proposal {} in {}", id, receipt.tx_id);

        self.index.append_key(&id).await?;
        info!("Created proposal {} in {}", id, draft.category);
        Ok(id)
    }

    /// Add one vote to a proposal and return the record as written.
    ///
    /// Read-modify-write without any concurrency check: a vote written by
    /// another client between this read and this write is lost. Repeated
    /// votes are not deduplicated.
    pub async fn vote(&self, id: &str, direction: VoteDirection) -> ProposalResult<ProposalRecord> {
        self.require_signer()?;

        let key = record_key(id);
        if key == INDEX_KEY || !self.index.contains(id).await? {
            return Err(ProposalError::NotFound(id.to_string()));
        }

        let bytes = self.backend.get_data(&key).await?;
        let mut record = decode_record(id, &bytes)
            .map_err(|e| ProposalError::NotFound(format!("{} ({})", id, e)))?;

        record.apply_vote(direction)?;
        let receipt = self.backend.set_data(&key, &encode_record(&record)?).await?;

        info!(
            "Recorded {:?} vote on {} in {} (up {}, down {})",
            direction, id, receipt.tx_id, record.upvotes, record.downvotes
        );
        Ok(record)
    }

    fn require_signer(&self) -> ProposalResult<&Signer> {
        self.signer.as_ref().ok_or(ProposalError::SignerRequired)
    }
}

fn unix_now() -> std::time::Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

/// Millisecond clock plus a random base36 suffix, so two clients creating in
/// the same millisecond still get distinct ids.
fn generate_proposal_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_SUFFIX_ALPHABET[rng.gen_range(0..ID_SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", unix_now().as_millis(), suffix)
}
