use crate::model::{
    Expense, Group, GroupBalances, MemberSummary, Money, NetBalance, ParticipantId,
};
use indexmap::IndexMap;

/// Folds expenses into per-participant balances.
///
/// The payer is credited with the full amount and each split line debits its
/// participant. Expense order only affects intermediate states. Payers or split
/// participants outside the tracked set are skipped.
pub struct BalanceAccumulator {
    flow: NetBalance,
    paid: IndexMap<ParticipantId, Money>,
    share: IndexMap<ParticipantId, Money>,
    total_spend: Money,
}

impl BalanceAccumulator {
    pub fn new<'a, I>(participants: I) -> Self
    where
        I: IntoIterator<Item = &'a ParticipantId>,
    {
        let zeros: IndexMap<ParticipantId, Money> = participants
            .into_iter()
            .map(|id| (id.clone(), Money::ZERO))
            .collect();

        Self {
            flow: NetBalance::with_participants(zeros.keys()),
            paid: zeros.clone(),
            share: zeros,
            total_spend: Money::ZERO,
        }
    }

    pub fn apply(&mut self, expense: &Expense) {
        self.total_spend += expense.amount;

        match self.paid.get_mut(&expense.payer) {
            Some(paid) => {
                *paid += expense.amount;
                if let Some(balance) = self.flow.get_mut(expense.payer.as_str()) {
                    *balance += expense.amount;
                }
            }
            None => {
                tracing::warn!(
                    payer = %expense.payer,
                    amount = %expense.amount,
                    "Expense payer is not a group member; payment skipped"
                );
            }
        }

        for line in &expense.splits {
            match self.share.get_mut(&line.participant) {
                Some(share) => {
                    *share += line.amount;
                    if let Some(balance) = self.flow.get_mut(line.participant.as_str()) {
                        *balance -= line.amount;
                    }
                }
                None => {
                    tracing::warn!(
                        participant = %line.participant,
                        amount = %line.amount,
                        "Split participant is not a group member; share skipped"
                    );
                }
            }
        }
    }

    pub fn balances(&self) -> &NetBalance {
        &self.flow
    }

    pub fn into_balances(self) -> NetBalance {
        self.flow
    }

    fn into_group_balances(self, group: &Group) -> GroupBalances {
        let mut adjusted = NetBalance::new();
        let mut summaries = IndexMap::with_capacity(group.members().len());

        for member in group.members() {
            let flow = self.flow.get(member.id.as_str()).unwrap_or(Money::ZERO);
            let paid = self.paid.get(&member.id).copied().unwrap_or(Money::ZERO);
            let share = self.share.get(&member.id).copied().unwrap_or(Money::ZERO);
            let summary = MemberSummary {
                paid,
                share,
                flow,
                adjusted: flow + member.initial_balance,
                remaining_budget: member.initial_balance - share,
            };
            adjusted.insert(member.id.clone(), summary.adjusted);
            summaries.insert(member.id.clone(), summary);
        }

        GroupBalances {
            flow: self.flow,
            adjusted,
            summaries,
            total_spend: self.total_spend,
        }
    }
}

/// Computes flow balances, budget-adjusted balances and member summaries for a group.
pub struct BalanceAggregator;

impl BalanceAggregator {
    pub fn aggregate(&self, expenses: &[Expense], group: &Group) -> GroupBalances {
        let participants = group.participant_ids();
        let mut accumulator = BalanceAccumulator::new(&participants);
        for expense in expenses {
            accumulator.apply(expense);
        }

        let balances = accumulator.into_group_balances(group);
        tracing::debug!(
            expense_count = expenses.len(),
            member_count = participants.len(),
            total_spend = %balances.total_spend,
            flow_sum = %balances.flow.sum(),
            "Group balances aggregated"
        );
        balances
    }
}

/// Flow balances only: what settlement consumes.
pub fn aggregate_balances(expenses: &[Expense], participants: &[ParticipantId]) -> NetBalance {
    let mut accumulator = BalanceAccumulator::new(participants);
    for expense in expenses {
        accumulator.apply(expense);
    }
    accumulator.into_balances()
}
