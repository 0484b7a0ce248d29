pub mod balance_aggregator;
pub mod debt_simplifier;
pub mod policy;
pub mod rounding;
pub mod split_calculator;

pub use balance_aggregator::{BalanceAccumulator, BalanceAggregator, aggregate_balances};
pub use debt_simplifier::{DebtSimplifier, simplify_debts};
pub use policy::{LedgerPolicy, PolicyParseError, SplitRounding, TieBreak};
pub use rounding::{distribute_residual, floor_to_cents, round_half_away_to_cents};
pub use split_calculator::{SplitCalculator, compute_splits, parse_declared_values};
