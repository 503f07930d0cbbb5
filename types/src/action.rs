//! Descriptors for user-initiated state changes.

use serde::Serialize;
use std::fmt;

use crate::amount::TokenAmount;
use crate::candidate::CandidateName;

/// The three state-changing actions a user can drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
    Issue,
    Vote,
    Toggle,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Issue => "issue",
            ActionKind::Vote => "vote",
            ActionKind::Toggle => "toggle",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An in-flight state-changing call. Lives only for the duration of the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAction {
    pub kind: ActionKind,
    pub candidate: Option<CandidateName>,
    pub amount: Option<TokenAmount>,
}

impl PendingAction {
    pub fn issue(candidate: CandidateName, amount: TokenAmount) -> Self {
        Self {
            kind: ActionKind::Issue,
            candidate: Some(candidate),
            amount: Some(amount),
        }
    }

    pub fn vote(candidate: CandidateName, amount: TokenAmount) -> Self {
        Self {
            kind: ActionKind::Vote,
            candidate: Some(candidate),
            amount: Some(amount),
        }
    }

    pub fn toggle() -> Self {
        Self {
            kind: ActionKind::Toggle,
            candidate: None,
            amount: None,
        }
    }
}

/// The terminal, user-visible result of one action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    pub success: bool,
    pub message: String,
}

impl ActionOutcome {
    pub fn succeeded(kind: ActionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(kind: ActionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "ok" } else { "failed" };
        write!(f, "{} {}: {}", self.kind, status, self.message)
    }
}
