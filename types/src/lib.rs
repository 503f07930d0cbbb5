//! Fundamental types for the Turing voting client.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! candidate names and the candidate registry, ledger accounts, token amounts,
//! the ranking leaderboard, action descriptors, and remote notifications.

pub mod account;
pub mod action;
pub mod amount;
pub mod candidate;
pub mod error;
pub mod event;
pub mod ranking;

pub use account::CandidateAccount;
pub use action::{ActionKind, ActionOutcome, PendingAction};
pub use amount::{TokenAmount, TOKEN_DECIMALS, TOKEN_SYMBOL, TOKEN_UNIT};
pub use candidate::{CandidateName, CandidateRegistry};
pub use error::{AmountParseError, TuringError};
pub use event::VoteCast;
pub use ranking::{Exclusion, ExclusionReason, Ranking, RankingEntry, RankingReport, RankingStatus};
