//! Proposal data types

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProposalError, ProposalResult};

/// Policy area a proposal belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Education,
    Healthcare,
    Infrastructure,
    Environment,
    Economy,
    Security,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Education,
        Category::Healthcare,
        Category::Infrastructure,
        Category::Environment,
        Category::Economy,
        Category::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Education => "Education",
            Category::Healthcare => "Healthcare",
            Category::Infrastructure => "Infrastructure",
            Category::Environment => "Environment",
            Category::Economy => "Economy",
            Category::Security => "Security",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ProposalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ProposalError::InvalidDraft(format!("Unknown category: {}", s)))
    }
}

/// Category selection for a filtered view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = ProposalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

/// Direction of a single vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl From<bool> for VoteDirection {
    fn from(upvote: bool) -> Self {
        if upvote { VoteDirection::Up } else { VoteDirection::Down }
    }
}

/// Write capability attached to a client; its address becomes the author of
/// every proposal created through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    address: String,
}

impl Signer {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into() }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Plaintext proposal as entered by its author, before encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDraft {
    pub title: String,
    pub category: Category,
    pub content: String,
}

impl ProposalDraft {
    pub fn new(category: Category, content: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            category,
            content: content.into(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn validate(&self) -> ProposalResult<()> {
        if self.content.trim().is_empty() {
            return Err(ProposalError::InvalidDraft("Content cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// A stored policy proposal.
///
/// Only the two vote counters ever change after creation, and they only grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalRecord {
    pub id: String,
    /// Encoded payload produced by the `PayloadEncoder`
    pub content: String,
    /// Creation time, Unix seconds
    pub timestamp: u64,
    pub author: String,
    pub category: Category,
    pub upvotes: u64,
    pub downvotes: u64,
    /// Stored fields this client does not interpret. They are written back
    /// unchanged when the record is updated.
    pub extensions: Map<String, Value>,
}

impl ProposalRecord {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        timestamp: u64,
        author: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            timestamp,
            author: author.into(),
            category,
            upvotes: 0,
            downvotes: 0,
            extensions: Map::new(),
        }
    }

    pub fn total_votes(&self) -> u64 {
        self.upvotes.saturating_add(self.downvotes)
    }

    /// Share of upvotes, 0.0 when nobody has voted
    pub fn approval_ratio(&self) -> f64 {
        self.upvotes as f64 / self.total_votes().max(1) as f64
    }

    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(6) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.timestamp).ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }

    /// Add exactly one vote to the matching counter
    pub fn apply_vote(&mut self, direction: VoteDirection) -> ProposalResult<()> {
        let counter = match direction {
            VoteDirection::Up => &mut self.upvotes,
            VoteDirection::Down => &mut self.downvotes,
        };
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| ProposalError::CounterOverflow(self.id.clone()))?;
        Ok(())
    }
}
