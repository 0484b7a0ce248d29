use crate::model::{Money, ParticipantId};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("'{0}' is not a valid amount")]
    Invalid(String),
    #[error("amount {0} has more than two decimal places")]
    SubCentPrecision(Decimal),
    #[error("amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// Malformed or out-of-range input to a split computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidArgument {
    #[error("total must be positive (found {0})")]
    NonPositiveTotal(Money),
    #[error("at least one participant is required")]
    NoParticipants,
    #[error("participant '{0}' is listed more than once")]
    DuplicateParticipant(ParticipantId),
    #[error("declared value {value} for '{participant}' is negative")]
    NegativeDeclaredValue {
        participant: ParticipantId,
        value: Decimal,
    },
    #[error("split amounts are out of range")]
    AmountOutOfRange,
}

/// Declared split values that do not reconcile with the expense total.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("declared splits sum to {declared}, expected {total}")]
    SplitMismatch { declared: Decimal, total: Money },
    #[error("declared percentages sum to {declared}%, expected 100%")]
    PercentMismatch { declared: Decimal },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("a group needs at least one member")]
    Empty,
    #[error("groups can have at most {max} members (found {count})")]
    TooManyMembers { count: usize, max: usize },
    #[error("member '{0}' is listed more than once")]
    DuplicateMember(ParticipantId),
}

/// Non-fatal diagnostic: the balances handed to the simplifier were not
/// zero-sum, so the returned settlement leaves someone unsettled.
///
/// Only raised when at least one residual balance exceeds epsilon, so
/// `unsettled` is never empty. Drift spread in sub-epsilon amounts across
/// participants (`{a: 0.01, b: 0.01}`) is not reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error(
    "balances do not sum to zero (imbalance {imbalance}); {} participant(s) left unsettled",
    .unsettled.len()
)]
pub struct BalanceConservationWarning {
    pub imbalance: Money,
    pub unsettled: Vec<(ParticipantId, Money)>,
}
