//! User-facing proposal operations
//!
//! Wraps the repository with a status board and the most recently loaded
//! snapshot. Every successful write is followed by a full reload; the
//! snapshot is never patched in place.

use polis_common::NotificationConfig;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::error::{ProposalError, ProposalResult};
use crate::repository::{ProposalRepository, ProposalSnapshot};
use crate::status::{StatusBoard, StatusNotice};
use crate::types::{CategoryFilter, ProposalDraft, ProposalRecord, VoteDirection};
use crate::view::{self, ProposalStats};

pub struct ProposalService {
    repository: ProposalRepository,
    status: StatusBoard,
    snapshot: RwLock<ProposalSnapshot>,
}

impl ProposalService {
    pub fn new(repository: ProposalRepository, notifications: NotificationConfig) -> Self {
        Self {
            repository,
            status: StatusBoard::new(notifications),
            snapshot: RwLock::new(ProposalSnapshot::default()),
        }
    }

    pub fn repository(&self) -> &ProposalRepository {
        &self.repository
    }

    /// Reload every proposal. On failure the previous snapshot is kept.
    pub async fn refresh(&self) -> ProposalResult<()> {
        match self.repository.load().await {
            Ok(snapshot) => {
                *self.snapshot.write().await = snapshot;
                Ok(())
            }
            Err(e) => {
                error!("Error loading proposals: {}", e);
                Err(e)
            }
        }
    }

    /// Create a proposal and reload
    pub async fn submit(&self, draft: &ProposalDraft) -> ProposalResult<String> {
        if let Err(e) = self.precheck(draft) {
            self.status.fail(e.to_string()).await;
            return Err(e);
        }

        self.status.pending("Encrypting policy proposal...").await;
        match self.repository.create(draft).await {
            Ok(id) => {
                self.status.succeed("Encrypted proposal submitted anonymously!").await;
                self.refresh_after_write().await;
                Ok(id)
            }
            Err(e) => {
                self.status.fail(failure_message("Submission failed", &e)).await;
                Err(e)
            }
        }
    }

    /// Cast one vote and reload
    pub async fn cast_vote(&self, id: &str, direction: VoteDirection) -> ProposalResult<ProposalRecord> {
        if self.repository.signer().is_none() {
            let e = ProposalError::SignerRequired;
            self.status.fail(e.to_string()).await;
            return Err(e);
        }

        self.status.pending("Processing anonymous vote...").await;
        match self.repository.vote(id, direction).await {
            Ok(record) => {
                self.status.succeed("Vote recorded anonymously!").await;
                self.refresh_after_write().await;
                Ok(record)
            }
            Err(e) => {
                self.status.fail(failure_message("Voting failed", &e)).await;
                Err(e)
            }
        }
    }

    pub async fn snapshot(&self) -> ProposalSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Loaded proposals, newest first
    pub async fn records(&self) -> Vec<ProposalRecord> {
        self.snapshot.read().await.records.clone()
    }

    pub async fn visible(&self, search: &str, category: CategoryFilter) -> Vec<ProposalRecord> {
        let snapshot = self.snapshot.read().await;
        view::filter(&snapshot.records, search, category)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn stats(&self) -> ProposalStats {
        view::stats(&self.snapshot.read().await.records)
    }

    pub async fn status(&self) -> Option<StatusNotice> {
        self.status.current().await
    }

    fn precheck(&self, draft: &ProposalDraft) -> ProposalResult<()> {
        if self.repository.signer().is_none() {
            return Err(ProposalError::SignerRequired);
        }
        draft.validate()
    }

    // The write already succeeded; a failed reload only leaves the view stale
    async fn refresh_after_write(&self) {
        if let Err(e) = self.refresh().await {
            warn!("Write succeeded but reload failed, view may be stale: {}", e);
        }
    }
}

fn failure_message(context: &str, err: &ProposalError) -> String {
    match err {
        ProposalError::Rejected(_) => "Transaction rejected by user".to_string(),
        other => format!("{}: {}", context, other),
    }
}
