//! Pre-built [`tracing::Span`] constructors for client operations.
//!
//! Consistent span names and fields make refreshes and actions easy to
//! correlate in log output.

use tracing::{info_span, Span};

/// Span covering one ranking computation and its publication.
pub fn ranking_refresh_span(trigger: &str, ticket: u64) -> Span {
    info_span!("ranking_refresh", trigger = %trigger, ticket)
}

/// Span covering one user-initiated action, from validation to report.
pub fn action_span(kind: &str, candidate: Option<&str>) -> Span {
    info_span!("action", kind = %kind, candidate = candidate.unwrap_or("-"))
}

/// Span covering a read of the remote voting switch.
pub fn voting_refresh_span() -> Span {
    info_span!("voting_refresh")
}

/// Span covering the handling of one vote-cast notification (or burst).
pub fn vote_cast_event_span(seq: u64, coalesced: usize) -> Span {
    info_span!("vote_cast_event", seq, coalesced)
}
