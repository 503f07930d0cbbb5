//! Notifications pushed by the remote contract.

use serde::Serialize;

use crate::account::CandidateAccount;

/// A vote was cast by someone, somewhere.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VoteCast {
    /// The voting account, when the transport reports it.
    pub voter: Option<CandidateAccount>,
}
