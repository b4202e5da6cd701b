//! Filtered views and aggregate statistics over a loaded collection

use crate::types::{CategoryFilter, ProposalRecord};

/// Aggregate figures for a collection of proposals
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalStats {
    pub count: usize,
    pub total_votes: u64,
    /// Upvotes over all votes, 0.0 when there are no votes
    pub approval_rate: f64,
    /// Proposal with the most votes; the earliest one in input order wins ties
    pub most_discussed: Option<ProposalRecord>,
}

impl ProposalStats {
    /// Approval rate as a percentage with one decimal place
    pub fn approval_percent(&self) -> String {
        format!("{:.1}%", self.approval_rate * 100.0)
    }
}

/// Proposals whose content contains `search` (ignoring case) and whose
/// category passes `category`, in input order.
pub fn filter<'a>(
    records: &'a [ProposalRecord],
    search: &str,
    category: CategoryFilter,
) -> Vec<&'a ProposalRecord> {
    let needle = search.to_lowercase();
    records
        .iter()
        .filter(|r| category.matches(r.category))
        .filter(|r| needle.is_empty() || r.content.to_lowercase().contains(&needle))
        .collect()
}

pub fn stats(records: &[ProposalRecord]) -> ProposalStats {
    // Counters come from other clients; totals saturate like `total_votes`
    let (total_upvotes, total_votes) = records.iter().fold((0u64, 0u64), |(up, all), r| {
        (up.saturating_add(r.upvotes), all.saturating_add(r.total_votes()))
    });

    let approval_rate = if total_votes == 0 {
        0.0
    } else {
        total_upvotes as f64 / total_votes as f64
    };

    let mut most_discussed: Option<&ProposalRecord> = None;
    for record in records {
        if most_discussed.map_or(true, |best| record.total_votes() > best.total_votes()) {
            most_discussed = Some(record);
        }
    }

    ProposalStats {
        count: records.len(),
        total_votes,
        approval_rate,
        most_discussed: most_discussed.cloned(),
    }
}
