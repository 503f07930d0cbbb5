use thiserror::Error;
use turing_gateway::GatewayError;
use turing_types::TuringError;

/// Failure of a user-initiated action. Exactly one of these, or a receipt,
/// ends every action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// A local precondition failed; nothing was sent.
    #[error("invalid request: {0}")]
    Validation(#[from] TuringError),

    /// The cached voting switch is off; nothing was sent.
    #[error("voting is currently disabled")]
    VotingDisabled,

    /// Another toggle from this client has not been confirmed yet; nothing was sent.
    #[error("a voting toggle is already in flight")]
    ToggleInFlight,

    /// The contract refused the call. The reason is the contract's own.
    #[error("rejected by contract: {0}")]
    Rejected(String),

    /// The call could not be completed (transport, timeout, bad response).
    #[error("ledger unavailable: {0}")]
    Gateway(GatewayError),
}

impl ActionError {
    /// True when the action failed before any remote call was issued.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ActionError::Validation(_) | ActionError::VotingDisabled | ActionError::ToggleInFlight
        )
    }
}

impl From<GatewayError> for ActionError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Rejected(reason) => ActionError::Rejected(reason),
            other => ActionError::Gateway(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("config error: {0}")]
    Config(String),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    Types(#[from] TuringError),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("logging error: {0}")]
    Logging(String),
}
