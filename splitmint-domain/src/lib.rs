#![warn(clippy::uninlined_format_args)]

pub mod error;
pub mod model;
pub mod services;

pub use error::{
    BalanceConservationWarning, GroupError, InvalidArgument, MoneyError, SplitError,
    ValidationError,
};
pub use model::{
    DeclaredValues, Expense, Group, GroupBalances, MAX_GROUP_MEMBERS, Member, MemberSummary,
    Money, NetBalance, ParticipantId, Settlement, SplitLine, SplitResult, SplitStrategy, Transfer,
};
pub use services::{
    BalanceAggregator, DebtSimplifier, LedgerPolicy, SplitCalculator, SplitRounding, TieBreak,
    aggregate_balances, compute_splits, parse_declared_values, simplify_debts,
};
