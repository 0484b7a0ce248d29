use crate::error::{BalanceConservationWarning, GroupError, MoneyError};
use arcstr::ArcStr;
use fxhash::FxHashSet;
use indexmap::IndexMap;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::{
    borrow::Borrow,
    fmt,
    hash::{Hash, Hasher},
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

/// Decimal places of the currency minor unit.
pub const CENT_SCALE: u32 = 2;

/// Owner plus three others.
pub const MAX_GROUP_MEMBERS: usize = 4;

/// Participant -> declared amount (EXACT) or percent (PERCENT), in input order.
pub type DeclaredValues = IndexMap<ParticipantId, Decimal>;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ParticipantId(ArcStr);

impl ParticipantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(ArcStr::from(value))
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(ArcStr::from(value))
    }
}

impl From<&ParticipantId> for ParticipantId {
    fn from(value: &ParticipantId) -> Self {
        value.clone()
    }
}

impl Borrow<str> for ParticipantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Must hash like `str` so maps keyed by id can be queried with `&str`.
impl Hash for ParticipantId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Currency amount in integer cents.
///
/// Operators follow `i64` overflow rules. Amounts built from decimals are
/// bounded by [`Money::MAX`]; sums of untrusted amounts go through
/// [`Money::checked_add`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);
    pub const CENT: Self = Self(1);
    /// Largest magnitude accepted from user input: ten trillion currency units.
    pub const MAX: Self = Self(1_000_000_000_000_000);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn signum(self) -> i64 {
        self.0.signum()
    }

    /// `|self| <= |epsilon|`
    pub fn is_within(self, epsilon: Money) -> bool {
        self.0.unsigned_abs() <= epsilon.0.unsigned_abs()
    }

    /// `None` when the sum leaves `-MAX..=MAX`.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .filter(|sum| sum.is_within(Self::MAX))
    }

    pub fn checked_mul(self, factor: i64) -> Option<Self> {
        self.0.checked_mul(factor).map(Self)
    }

    pub fn as_decimal(self) -> Decimal {
        Decimal::new(self.0, CENT_SCALE)
    }

    /// Exact conversion; amounts finer than one cent are rejected rather than
    /// rounded, and magnitudes above [`Money::MAX`] are out of range.
    pub fn try_from_decimal(value: Decimal) -> Result<Self, MoneyError> {
        let cents = value
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::OutOfRange(value))?;
        if !cents.fract().is_zero() {
            return Err(MoneyError::SubCentPrecision(value));
        }
        cents
            .to_i64()
            .map(Self)
            .filter(|money| money.is_within(Self::MAX))
            .ok_or(MoneyError::OutOfRange(value))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| MoneyError::Invalid(s.to_string()))?;
        Self::try_from_decimal(value)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "UPPERCASE")
)]
pub enum SplitStrategy {
    Equal,
    Exact,
    Percent,
}

impl fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SplitStrategy::Equal => "EQUAL",
            SplitStrategy::Exact => "EXACT",
            SplitStrategy::Percent => "PERCENT",
        };
        f.write_str(name)
    }
}

/// Owed amount per participant, in the order the participants were given.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct SplitResult {
    shares: IndexMap<ParticipantId, Money>,
}

impl SplitResult {
    pub(crate) fn new(shares: IndexMap<ParticipantId, Money>) -> Self {
        Self { shares }
    }

    pub fn get(&self, participant: &str) -> Option<Money> {
        self.shares.get(participant).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, Money)> + '_ {
        self.shares.iter().map(|(id, amount)| (id, *amount))
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn total(&self) -> Money {
        self.shares.values().sum()
    }

    pub fn into_inner(self) -> IndexMap<ParticipantId, Money> {
        self.shares
    }
}

/// One persisted split row of an expense.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SplitLine {
    pub participant: ParticipantId,
    pub amount: Money,
    pub percent: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expense {
    pub description: Option<String>,
    pub amount: Money,
    pub payer: ParticipantId,
    pub strategy: SplitStrategy,
    pub splits: Vec<SplitLine>,
}

impl Expense {
    pub fn new(
        amount: Money,
        payer: impl Into<ParticipantId>,
        strategy: SplitStrategy,
        splits: Vec<SplitLine>,
    ) -> Self {
        Self {
            description: None,
            amount,
            payer: payer.into(),
            strategy,
            splits,
        }
    }

    /// Builds the expense record for a computed split. For PERCENT expenses the
    /// declared percent is kept on each line.
    pub fn from_split(
        amount: Money,
        payer: impl Into<ParticipantId>,
        strategy: SplitStrategy,
        result: SplitResult,
        declared: Option<&DeclaredValues>,
    ) -> Self {
        let splits = result
            .into_inner()
            .into_iter()
            .map(|(participant, amount)| {
                let percent = match strategy {
                    SplitStrategy::Percent => Some(
                        declared
                            .and_then(|values| values.get(&participant).copied())
                            .unwrap_or(Decimal::ZERO),
                    ),
                    SplitStrategy::Equal | SplitStrategy::Exact => None,
                };
                SplitLine {
                    participant,
                    amount,
                    percent,
                }
            })
            .collect();
        Self::new(amount, payer, strategy, splits)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn split_total(&self) -> Money {
        self.splits.iter().map(|line| line.amount).sum()
    }
}

/// Signed position per participant: positive is owed money, negative owes money.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct NetBalance {
    balances: IndexMap<ParticipantId, Money>,
}

impl NetBalance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_participants<'a, I>(participants: I) -> Self
    where
        I: IntoIterator<Item = &'a ParticipantId>,
    {
        participants
            .into_iter()
            .map(|id| (id.clone(), Money::ZERO))
            .collect()
    }

    pub fn get(&self, participant: &str) -> Option<Money> {
        self.balances.get(participant).copied()
    }

    pub fn get_mut(&mut self, participant: &str) -> Option<&mut Money> {
        self.balances.get_mut(participant)
    }

    pub fn insert(&mut self, participant: impl Into<ParticipantId>, balance: Money) {
        self.balances.insert(participant.into(), balance);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, Money)> + '_ {
        self.balances.iter().map(|(id, balance)| (id, *balance))
    }

    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> + '_ {
        self.balances.keys()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn sum(&self) -> Money {
        self.balances.values().sum()
    }

    pub fn is_settled(&self, epsilon: Money) -> bool {
        self.balances
            .values()
            .all(|balance| balance.is_within(epsilon))
    }

    /// Applies transfers: the payer's balance rises, the receiver's falls.
    /// Participants absent from the table start at zero.
    pub fn apply_transfers(&self, transfers: &[Transfer]) -> NetBalance {
        let mut balances = self.balances.clone();
        for transfer in transfers {
            *balances
                .entry(transfer.from.clone())
                .or_insert(Money::ZERO) += transfer.amount;
            *balances.entry(transfer.to.clone()).or_insert(Money::ZERO) -= transfer.amount;
        }
        Self { balances }
    }
}

impl FromIterator<(ParticipantId, Money)> for NetBalance {
    fn from_iter<T: IntoIterator<Item = (ParticipantId, Money)>>(iter: T) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a NetBalance {
    type Item = (&'a ParticipantId, &'a Money);
    type IntoIter = indexmap::map::Iter<'a, ParticipantId, Money>;

    fn into_iter(self) -> Self::IntoIter {
        self.balances.iter()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Money,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settlement {
    pub transfers: Vec<Transfer>,
    /// Balances after applying `transfers`; within epsilon of zero when the input was conserved.
    pub residual_balances: NetBalance,
    pub warning: Option<BalanceConservationWarning>,
}

impl Settlement {
    pub fn transferred_total(&self) -> Money {
        self.transfers.iter().map(|transfer| transfer.amount).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Member {
    pub id: ParticipantId,
    /// External starting budget; never part of inter-member flow.
    pub initial_balance: Money,
}

impl Member {
    pub fn new(id: impl Into<ParticipantId>) -> Self {
        Self {
            id: id.into(),
            initial_balance: Money::ZERO,
        }
    }

    pub fn with_initial_balance(mut self, initial_balance: Money) -> Self {
        self.initial_balance = initial_balance;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Group {
    members: Vec<Member>,
}

impl Group {
    pub fn try_new(members: Vec<Member>) -> Result<Self, GroupError> {
        if members.is_empty() {
            return Err(GroupError::Empty);
        }
        if members.len() > MAX_GROUP_MEMBERS {
            return Err(GroupError::TooManyMembers {
                count: members.len(),
                max: MAX_GROUP_MEMBERS,
            });
        }

        let mut seen = FxHashSet::default();
        for member in &members {
            if !seen.insert(&member.id) {
                return Err(GroupError::DuplicateMember(member.id.clone()));
            }
        }

        Ok(Self { members })
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.id.as_str() == id)
    }

    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.members.iter().map(|member| member.id.clone()).collect()
    }
}

/// Dashboard figures for one member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemberSummary {
    pub paid: Money,
    pub share: Money,
    pub flow: Money,
    pub adjusted: Money,
    pub remaining_budget: Money,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupBalances {
    /// Payer/split-derived balances; the input to settlement.
    pub flow: NetBalance,
    /// `flow` plus each member's initial balance.
    pub adjusted: NetBalance,
    pub summaries: IndexMap<ParticipantId, MemberSummary>,
    pub total_spend: Money,
}
