//! Remote ledger gateway for the Turing voting contract.
//!
//! The contract (candidate registry, token issuance, vote recording, and the
//! voting switch) is an external service. [`LedgerGateway`] is the fixed
//! surface the client core calls, one method per contract operation.
//! [`RpcGateway`] is the production transport; tests use the nullable
//! gateway from `turing-nullables`.

pub mod error;
pub mod rpc;
pub mod stream;

use std::future::Future;

use serde::{Deserialize, Serialize};
use turing_types::{CandidateAccount, CandidateName, TokenAmount};

pub use error::GatewayError;
pub use rpc::{RpcGateway, RpcGatewayConfig};
pub use stream::VoteCastStream;

/// A state-changing call the ledger accepted for processing but has not yet confirmed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub tx_hash: String,
}

/// Proof that a submitted call took effect remotely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub tx_hash: String,
    #[serde(default)]
    pub detail: Option<String>,
}

/// The contract operations the client consumes.
///
/// Every call may suspend and may fail independently of every other call.
/// Timeouts are the implementation's concern; callers impose none.
pub trait LedgerGateway: Send + Sync + 'static {
    /// Resolve a candidate's account. `Ok(None)` means the name is not registered.
    fn resolve_account(
        &self,
        name: &CandidateName,
    ) -> impl Future<Output = Result<Option<CandidateAccount>, GatewayError>> + Send;

    /// Token balance held by `account`.
    fn balance_of(
        &self,
        account: &CandidateAccount,
    ) -> impl Future<Output = Result<TokenAmount, GatewayError>> + Send;

    /// Submit a token issuance to `name`.
    fn issue_tokens(
        &self,
        name: &CandidateName,
        amount: TokenAmount,
    ) -> impl Future<Output = Result<Submission, GatewayError>> + Send;

    /// Submit a vote of `amount` for `name`.
    fn cast_vote(
        &self,
        name: &CandidateName,
        amount: TokenAmount,
    ) -> impl Future<Output = Result<Submission, GatewayError>> + Send;

    /// Read the authoritative voting switch.
    fn is_voting_enabled(&self) -> impl Future<Output = Result<bool, GatewayError>> + Send;

    /// Submit a change of the voting switch.
    fn set_voting_enabled(
        &self,
        enabled: bool,
    ) -> impl Future<Output = Result<Submission, GatewayError>> + Send;

    /// Wait until `submission` is confirmed or rejected.
    fn await_confirmation(
        &self,
        submission: &Submission,
    ) -> impl Future<Output = Result<Confirmation, GatewayError>> + Send;

    /// Open the stream of remote "vote cast" notifications.
    fn subscribe_vote_cast(
        &self,
    ) -> impl Future<Output = Result<VoteCastStream, GatewayError>> + Send;

    /// Human-readable name of this gateway.
    fn name(&self) -> &str;
}
