//! Token amount type for TUR balances.
//!
//! Amounts are fixed-point integers (u128) in raw units to avoid floating-point errors.
//! The ledger uses 18 fractional digits, so 1 TUR = 10^18 raw.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AmountParseError;

/// Number of fractional digits the ledger keeps.
pub const TOKEN_DECIMALS: usize = 18;

/// Raw units per whole token.
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

/// Display symbol of the token.
pub const TOKEN_SYMBOL: &str = "TUR";

/// TUR amount, stored as raw units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Whole tokens, e.g. `from_tokens(30)` is 30 TUR.
    pub fn from_tokens(tokens: u64) -> Self {
        Self(tokens as u128 * TOKEN_UNIT)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Parse a human decimal string (`"1.5"`, `"30"`, `".25"`) into raw units.
    pub fn from_decimal_str(input: &str) -> Result<Self, AmountParseError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }

        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !digits_only(whole) || !digits_only(fraction)
        {
            return Err(AmountParseError::Malformed(s.to_string()));
        }
        if fraction.len() > TOKEN_DECIMALS {
            return Err(AmountParseError::TooPrecise {
                max: TOKEN_DECIMALS,
            });
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| AmountParseError::Overflow)?
        };
        let fraction: u128 = if fraction.is_empty() {
            0
        } else {
            format!("{fraction:0<width$}", width = TOKEN_DECIMALS)
                .parse()
                .map_err(|_| AmountParseError::Malformed(s.to_string()))?
        };

        whole
            .checked_mul(TOKEN_UNIT)
            .and_then(|raw| raw.checked_add(fraction))
            .map(Self)
            .ok_or(AmountParseError::Overflow)
    }

    /// Decimal rendering without the symbol: `30.0`, `1.5`, `0.000000000000000001`.
    pub fn to_decimal_string(&self) -> String {
        let whole = self.0 / TOKEN_UNIT;
        let fraction = self.0 % TOKEN_UNIT;
        if fraction == 0 {
            return format!("{whole}.0");
        }
        let padded = format!("{fraction:0width$}", width = TOKEN_DECIMALS);
        format!("{whole}.{}", padded.trim_end_matches('0'))
    }
}

impl FromStr for TokenAmount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal_string(), TOKEN_SYMBOL)
    }
}
