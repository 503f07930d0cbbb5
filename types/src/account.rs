//! Ledger account resolved from a candidate name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TuringError;

/// A ledger account: `0x` followed by 40 hex digits, stored lowercase.
///
/// The all-zero account is what the contract returns for names it has never
/// registered; gateways translate it to "unresolved" before it reaches the core.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CandidateAccount(String);

impl CandidateAccount {
    pub const PREFIX: &'static str = "0x";
    const HEX_LEN: usize = 40;

    /// Parse and normalise an account string.
    pub fn parse(raw: &str) -> Result<Self, TuringError> {
        let s = raw.trim();
        let hex = s
            .strip_prefix(Self::PREFIX)
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| TuringError::InvalidAccount(s.to_string()))?;
        if hex.len() != Self::HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TuringError::InvalidAccount(s.to_string()));
        }
        Ok(Self(format!("{}{}", Self::PREFIX, hex.to_ascii_lowercase())))
    }

    pub fn is_zero(&self) -> bool {
        self.0[Self::PREFIX.len()..].bytes().all(|b| b == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CandidateAccount {
    type Err = TuringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CandidateAccount {
    type Error = TuringError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CandidateAccount> for String {
    fn from(account: CandidateAccount) -> Self {
        account.0
    }
}

impl fmt::Display for CandidateAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
