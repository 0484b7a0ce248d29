use crate::{
    error::BalanceConservationWarning,
    model::{Money, NetBalance, ParticipantId, Settlement, Transfer},
    services::policy::{LedgerPolicy, TieBreak},
};
use std::cmp::Ordering;

/// Greedy two-pointer debt simplification.
///
/// Debtors (most negative first) are matched against creditors (most positive
/// first); each step settles the smaller side completely. The result uses at
/// most `debtors + creditors - 1` transfers, but it is a fixed greedy policy
/// and not a globally minimal cash-flow solution: a balance table that splits
/// into independent zero-sum subsets can sometimes be settled with fewer
/// transfers than this produces.
#[derive(Clone, Copy, Debug, Default)]
pub struct DebtSimplifier {
    policy: LedgerPolicy,
}

impl DebtSimplifier {
    pub fn new(policy: LedgerPolicy) -> Self {
        Self { policy }
    }

    /// Suggests transfers that bring every balance within epsilon of zero.
    ///
    /// Balances within epsilon are already settled and never appear in a
    /// transfer. When the input is not zero-sum the transfers are still
    /// returned, together with a [`BalanceConservationWarning`].
    pub fn simplify(&self, balances: &NetBalance) -> Settlement {
        let epsilon = self.policy.epsilon.abs();

        let mut debtors: Vec<(ParticipantId, Money)> = balances
            .iter()
            .filter(|(_, balance)| *balance < -epsilon)
            .map(|(id, balance)| (id.clone(), balance))
            .collect();
        let mut creditors: Vec<(ParticipantId, Money)> = balances
            .iter()
            .filter(|(_, balance)| *balance > epsilon)
            .map(|(id, balance)| (id.clone(), balance))
            .collect();

        // `sort_by` is stable, so under `TieBreak::InputOrder` equal balances
        // keep the order they had in `balances`.
        debtors.sort_by(|(id_a, a), (id_b, b)| {
            a.cmp(b).then_with(|| self.tie_break(id_a, id_b))
        });
        creditors.sort_by(|(id_a, a), (id_b, b)| {
            b.cmp(a).then_with(|| self.tie_break(id_a, id_b))
        });

        let mut transfers =
            Vec::with_capacity((debtors.len() + creditors.len()).saturating_sub(1));
        let (mut i, mut j) = (0, 0);

        while i < debtors.len() && j < creditors.len() {
            let (debtor, debt) = &mut debtors[i];
            let (creditor, credit) = &mut creditors[j];

            let amount = debt.abs().min(*credit);
            transfers.push(Transfer {
                from: debtor.clone(),
                to: creditor.clone(),
                amount,
            });

            *debt += amount;
            *credit -= amount;

            if debt.is_within(epsilon) {
                i += 1;
            }
            if credit.is_within(epsilon) {
                j += 1;
            }
        }

        let residual_balances = balances.apply_transfers(&transfers);
        let imbalance = balances.sum();
        let unsettled: Vec<(ParticipantId, Money)> = residual_balances
            .iter()
            .filter(|(_, balance)| !balance.is_within(epsilon))
            .map(|(id, balance)| (id.clone(), balance))
            .collect();
        // An imbalance spread thinner than epsilon leaves nobody to pay or be paid.
        let warning = if imbalance.is_within(epsilon) || unsettled.is_empty() {
            if !imbalance.is_zero() {
                tracing::debug!(imbalance = %imbalance, "Balance drift is within epsilon");
            }
            None
        } else {
            tracing::warn!(
                imbalance = %imbalance,
                unsettled_count = unsettled.len(),
                participant_count = balances.len(),
                "Balances are not zero-sum; settlement is incomplete"
            );
            Some(BalanceConservationWarning {
                imbalance,
                unsettled,
            })
        };

        tracing::debug!(
            participant_count = balances.len(),
            debtor_count = debtors.len(),
            creditor_count = creditors.len(),
            transfer_count = transfers.len(),
            tie_break = ?self.policy.tie_break,
            "Debts simplified"
        );

        Settlement {
            transfers,
            residual_balances,
            warning,
        }
    }

    fn tie_break(&self, a: &ParticipantId, b: &ParticipantId) -> Ordering {
        match self.policy.tie_break {
            TieBreak::InputOrder => Ordering::Equal,
            TieBreak::ParticipantId => a.cmp(b),
        }
    }
}

/// [`DebtSimplifier::simplify`] with the default policy.
pub fn simplify_debts(balances: &NetBalance) -> Settlement {
    DebtSimplifier::default().simplify(balances)
}
