//! The candidate leaderboard and the report produced by one ranking computation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::amount::TokenAmount;
use crate::candidate::CandidateName;

/// One leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: CandidateName,
    pub balance: TokenAmount,
}

impl RankingEntry {
    pub fn new(name: CandidateName, balance: TokenAmount) -> Self {
        Self { name, balance }
    }

    /// Balance formatted for display, without the symbol.
    pub fn display_balance(&self) -> String {
        self.balance.to_decimal_string()
    }
}

/// Leaderboard sorted by balance, highest first.
///
/// Invariants: no candidate appears twice, and balances never increase
/// from one entry to the next. Equal balances keep registry order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Ranking {
    entries: Vec<RankingEntry>,
}

impl Ranking {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a ranking from `(registry_position, entry)` pairs in any order.
    ///
    /// Later duplicates of a name are dropped.
    pub fn from_positioned(mut rows: Vec<(usize, RankingEntry)>) -> Self {
        rows.sort_by(|(pos_a, a), (pos_b, b)| {
            b.balance.cmp(&a.balance).then_with(|| pos_a.cmp(pos_b))
        });
        let mut seen = HashSet::new();
        let entries = rows
            .into_iter()
            .filter(|(_, entry)| seen.insert(entry.name.clone()))
            .map(|(_, entry)| entry)
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn balance_of(&self, name: &str) -> Option<TokenAmount> {
        self.entries
            .iter()
            .find(|e| e.name.as_str() == name)
            .map(|e| e.balance)
    }
}

/// Why a candidate produced no leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ExclusionReason {
    /// The contract has no account for this name yet.
    Unresolved,
    /// A remote read failed; the candidate may well exist.
    LookupFailed(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Exclusion {
    pub name: CandidateName,
    pub reason: ExclusionReason,
}

/// Overall shape of one ranking computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RankingStatus {
    /// Every candidate resolved and reported a balance.
    Complete,
    /// Some candidates were excluded, at least one was ranked.
    Partial,
    /// Candidates were configured but none could be ranked.
    AggregateEmpty,
    /// No candidates were configured.
    NoCandidates,
}

/// Result of one ranking computation: the leaderboard plus what was left out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankingReport {
    pub ranking: Ranking,
    pub exclusions: Vec<Exclusion>,
    pub status: RankingStatus,
}

impl RankingReport {
    pub fn new(ranking: Ranking, exclusions: Vec<Exclusion>, requested: usize) -> Self {
        let status = if requested == 0 {
            RankingStatus::NoCandidates
        } else if ranking.is_empty() {
            RankingStatus::AggregateEmpty
        } else if exclusions.is_empty() {
            RankingStatus::Complete
        } else {
            RankingStatus::Partial
        };
        Self {
            ranking,
            exclusions,
            status,
        }
    }

    /// Report for a client that has not computed a ranking yet.
    pub fn not_loaded() -> Self {
        Self::new(Ranking::empty(), Vec::new(), 0)
    }

    /// Number of exclusions caused by failed remote reads.
    pub fn lookup_failures(&self) -> usize {
        self.exclusions
            .iter()
            .filter(|e| matches!(e.reason, ExclusionReason::LookupFailed(_)))
            .count()
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &CandidateName> {
        self.exclusions
            .iter()
            .filter(|e| e.reason == ExclusionReason::Unresolved)
            .map(|e| &e.name)
    }
}

impl fmt::Display for RankingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RankingStatus::Complete => "complete",
            RankingStatus::Partial => "partial",
            RankingStatus::AggregateEmpty => "aggregate-empty",
            RankingStatus::NoCandidates => "no-candidates",
        };
        f.write_str(s)
    }
}
