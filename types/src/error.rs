//! Top-level error types shared across crates.

use thiserror::Error;

/// Domain validation errors for the Turing client.
///
/// Every variant is raised before any remote call is made.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TuringError {
    #[error("unknown candidate: {0}")]
    UnknownCandidate(String),

    #[error("candidate name must not be empty")]
    EmptyCandidateName,

    #[error("duplicate candidate in registry: {0}")]
    DuplicateCandidate(String),

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountParseError),

    #[error("invalid account: {0}")]
    InvalidAccount(String),
}

/// Reasons a decimal token amount string cannot be represented in raw units.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,

    #[error("malformed amount {0:?}")]
    Malformed(String),

    #[error("amount has more than {max} fractional digits")]
    TooPrecise { max: usize },

    #[error("amount is too large")]
    Overflow,
}
