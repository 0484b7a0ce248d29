use crate::model::Money;
use std::str::FromStr;

/// How EXACT and PERCENT shares are reconciled with the expense total after
/// rounding to cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SplitRounding {
    /// Redistribute the leftover cents in participant order, so shares always
    /// sum to the total.
    #[default]
    PennyCorrected,
    /// Keep each rounded share as is. PERCENT splits may drift from the total by
    /// up to (n - 1) cents and EXACT splits keep the declared sum.
    Parity,
}

/// Ordering among debtors (or creditors) whose balances are equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// Stable sort: equal balances keep their input order.
    #[default]
    InputOrder,
    /// Equal balances are ordered by participant id, independent of input order.
    ParticipantId,
}

/// Tunables shared by the split calculator and the debt simplifier.
///
/// # Example
/// ```
/// use splitmint_domain::services::{LedgerPolicy, SplitRounding, TieBreak};
///
/// let policy = LedgerPolicy {
///     tie_break: TieBreak::ParticipantId,
///     ..LedgerPolicy::default()
/// };
/// assert_eq!(policy.split_rounding, SplitRounding::PennyCorrected);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerPolicy {
    /// Balances and mismatches at or below this magnitude count as zero.
    pub epsilon: Money,
    pub split_rounding: SplitRounding,
    pub tie_break: TieBreak,
}

impl LedgerPolicy {
    pub const DEFAULT_EPSILON: Money = Money::CENT;

    /// Leaves rounded EXACT and PERCENT shares uncorrected.
    pub fn parity() -> Self {
        Self {
            split_rounding: SplitRounding::Parity,
            ..Self::default()
        }
    }
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            epsilon: Self::DEFAULT_EPSILON,
            split_rounding: SplitRounding::default(),
            tie_break: TieBreak::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct PolicyParseError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for SplitRounding {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "corrected" | "penny-corrected" => Ok(SplitRounding::PennyCorrected),
            "parity" => Ok(SplitRounding::Parity),
            other => Err(PolicyParseError {
                kind: "split rounding",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for TieBreak {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input-order" => Ok(TieBreak::InputOrder),
            "participant-id" => Ok(TieBreak::ParticipantId),
            other => Err(PolicyParseError {
                kind: "tie break",
                value: other.to_string(),
            }),
        }
    }
}
