use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The contract refused a state-changing call.
    #[error("rejected by contract: {0}")]
    Rejected(String),

    /// The node answered a read with an error.
    #[error("remote error: {0}")]
    Remote(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response from node: {0}")]
    InvalidResponse(String),

    #[error("subscription error: {0}")]
    Subscription(String),

    #[error("timed out waiting for the ledger")]
    Timeout,
}
