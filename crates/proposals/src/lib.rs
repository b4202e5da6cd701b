//! Policy proposals and voting for polis
//!
//! Proposals are stored in a plain key-value backend:
//! - `"proposal_keys"` holds the ordered list of every proposal id
//! - `"proposal_<id>"` holds one serialized proposal record
//!
//! The index is the only source of truth for which proposals exist. Records
//! are written before their id is appended to the index, so an interrupted
//! create leaves an unreferenced record behind rather than an index entry
//! pointing at nothing.
//!
//! The backend has no transactions and no compare-and-swap. Index appends and
//! votes are read-modify-write sequences and are last-writer-wins against
//! other clients.

pub mod codec;
pub mod encoder;
pub mod error;
pub mod index;
pub mod repository;
pub mod service;
pub mod status;
pub mod types;
pub mod view;

pub use encoder::{PayloadEncoder, PlaceholderEncoder};
pub use error::{DecodeError, ProposalError, ProposalResult};
pub use index::IndexManager;
pub use repository::{ProposalRepository, ProposalSnapshot, SkipReason, SkippedRecord};
pub use service::ProposalService;
pub use status::{StatusBoard, StatusNotice, TransactionStatus};
pub use types::{Category, CategoryFilter, ProposalDraft, ProposalRecord, Signer, VoteDirection};
pub use view::{filter, stats, ProposalStats};
