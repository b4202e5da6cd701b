use polis_storage::StorageError;
use thiserror::Error;

/// Why a stored value could not be read back as a proposal or an index
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload is empty")]
    Empty,

    #[error("payload is malformed: {0}")]
    Malformed(String),

    #[error("payload is missing required field `{0}`")]
    MissingField(&'static str),
}

/// Proposal-related errors
#[derive(Debug, Clone, Error)]
pub enum ProposalError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Proposal not found: {0}")]
    NotFound(String),

    #[error("Transaction rejected by user: {0}")]
    Rejected(String),

    #[error("No signer attached, connect a wallet first")]
    SignerRequired,

    #[error("Vote counter is full on proposal {0}")]
    CounterOverflow(String),

    #[error("Invalid proposal: {0}")]
    InvalidDraft(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for ProposalError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(msg) => ProposalError::BackendUnavailable(msg),
            StorageError::Rejected(msg) => ProposalError::Rejected(msg),
            other => ProposalError::Storage(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ProposalError {
    fn from(err: serde_json::Error) -> Self {
        ProposalError::Serialization(err.to_string())
    }
}

/// Result type for proposal operations
pub type ProposalResult<T> = Result<T, ProposalError>;
