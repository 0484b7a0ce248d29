use proptest::prelude::*;
use splitmint_domain::{
    BalanceAggregator, DebtSimplifier, Expense, Group, GroupBalances, LedgerPolicy, Member, Money,
    NetBalance, ParticipantId, Settlement, SplitCalculator, SplitStrategy, TieBreak,
    compute_splits, simplify_debts,
};

const NAMES: [&str; 4] = ["alice", "bob", "carol", "dave"];

/// Builds a zero-sum table: the last participant absorbs the negated sum of the others.
fn conserved_balances(cents: &[i64]) -> NetBalance {
    let mut balances: NetBalance = NAMES
        .iter()
        .zip(cents)
        .map(|(name, cents)| (ParticipantId::from(*name), Money::from_cents(*cents)))
        .collect();
    let sum = balances.sum();
    balances.insert(NAMES[cents.len()], -sum);
    balances
}

fn budgeted_group(member_count: usize, budgets: &[i64]) -> Group {
    let members: Vec<Member> = NAMES[..member_count]
        .iter()
        .zip(budgets)
        .map(|(name, budget)| Member::new(*name).with_initial_balance(Money::from_cents(*budget)))
        .collect();
    Group::try_new(members).expect("group build failed")
}

/// One EQUAL expense per amount, paid by the member at the matching index
/// and shared by the first `sharer_count` members.
fn equal_expenses(
    group: &Group,
    amounts: &[i64],
    payers: &[usize],
    sharers: &[usize],
) -> Vec<Expense> {
    let participants = group.participant_ids();
    let member_count = participants.len();
    amounts
        .iter()
        .enumerate()
        .map(|(idx, amount)| {
            let payer_idx = payers.get(idx).copied().unwrap_or(0) % member_count;
            let sharer_count = sharers.get(idx).copied().unwrap_or(0) % member_count + 1;
            let total = Money::from_cents(*amount);
            let split = compute_splits(
                total,
                SplitStrategy::Equal,
                &participants[..sharer_count],
                None,
            )
            .expect("equal split should succeed");
            Expense::from_split(
                total,
                participants[payer_idx].clone(),
                SplitStrategy::Equal,
                split,
                None,
            )
        })
        .collect()
}

#[test]
fn three_way_dinner_settles_in_two_transfers() {
    let group = Group::try_new(NAMES[..3].iter().copied().map(Member::new).collect())
        .expect("valid group");
    let split = compute_splits(
        Money::from_cents(9_000),
        SplitStrategy::Equal,
        &group.participant_ids(),
        None,
    )
    .expect("equal split should succeed");
    let expense = Expense::from_split(
        Money::from_cents(9_000),
        "alice",
        SplitStrategy::Equal,
        split,
        None,
    );

    let balances = BalanceAggregator.aggregate(&[expense], &group);
    let settlement = simplify_debts(&balances.flow);

    let transfers: Vec<(&str, &str, i64)> = settlement
        .transfers
        .iter()
        .map(|transfer| (transfer.from.as_str(), transfer.to.as_str(), transfer.amount.cents()))
        .collect();
    assert_eq!(
        transfers,
        [("bob", "alice", 3_000), ("carol", "alice", 3_000)]
    );
    assert!(settlement.residual_balances.is_settled(Money::ZERO));
}

#[test]
fn public_types_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<Group>();
    assert_send_sync::<Expense>();
    assert_send_sync::<GroupBalances>();
    assert_send_sync::<Settlement>();
    assert_send_sync::<SplitCalculator>();
    assert_send_sync::<DebtSimplifier>();
}

proptest! {
    #[test]
    fn settlement_clears_conserved_balances(
        cents in prop::collection::vec(-1_000_000i64..=1_000_000, 0..=3),
        by_id in any::<bool>(),
    ) {
        let balances = conserved_balances(&cents);
        let policy = LedgerPolicy {
            tie_break: if by_id { TieBreak::ParticipantId } else { TieBreak::InputOrder },
            ..LedgerPolicy::default()
        };

        let settlement = DebtSimplifier::new(policy).simplify(&balances);

        // Balances inside epsilon never move, so each can leave up to one cent behind.
        let tolerance = policy.epsilon.checked_mul(balances.len() as i64).expect("small table");
        prop_assert!(settlement.warning.is_none());
        prop_assert!(settlement.residual_balances.is_settled(tolerance));
        prop_assert!(settlement.transfers.len() < balances.len().max(1));
        for transfer in &settlement.transfers {
            prop_assert!(transfer.amount.is_positive());
            prop_assert_ne!(&transfer.from, &transfer.to);
            prop_assert!(balances.get(transfer.from.as_str()).is_some_and(Money::is_negative));
            prop_assert!(balances.get(transfer.to.as_str()).is_some_and(Money::is_positive));
        }
    }

    #[test]
    fn settled_balances_need_no_transfers(
        cents in prop::collection::vec(-1i64..=1, 1..=4),
    ) {
        let balances: NetBalance = NAMES
            .iter()
            .zip(&cents)
            .map(|(name, cents)| (ParticipantId::from(*name), Money::from_cents(*cents)))
            .collect();

        let settlement = simplify_debts(&balances);

        prop_assert!(settlement.transfers.is_empty());
        prop_assert_eq!(settlement.residual_balances, balances);
    }

    #[test]
    fn aggregated_flow_is_zero_sum(
        member_count in 1usize..=4,
        amounts in prop::collection::vec(1i64..=100_000, 0..=20),
        payer_indexes in prop::collection::vec(0usize..=3, 0..=20),
        budgets in prop::collection::vec(0i64..=1_000_000, 4),
    ) {
        let group = budgeted_group(member_count, &budgets);
        let sharers = vec![member_count - 1; amounts.len()];
        let expenses = equal_expenses(&group, &amounts, &payer_indexes, &sharers);

        let balances = BalanceAggregator.aggregate(&expenses, &group);

        prop_assert!(balances.flow.sum().is_zero());
        let spend: Money = amounts.iter().copied().map(Money::from_cents).sum();
        prop_assert_eq!(balances.total_spend, spend);
        for member in group.members() {
            let summary = balances.summaries[&member.id];
            prop_assert_eq!(summary.adjusted - summary.flow, member.initial_balance);
            prop_assert_eq!(summary.flow, summary.paid - summary.share);
        }

        let settlement = simplify_debts(&balances.flow);
        let tolerance = Money::from_cents(member_count as i64);
        prop_assert!(settlement.residual_balances.is_settled(tolerance));
    }

    #[test]
    fn aggregation_ignores_expense_order(
        member_count in 1usize..=4,
        amounts in prop::collection::vec(1i64..=100_000, 0..=20),
        payer_indexes in prop::collection::vec(0usize..=3, 0..=20),
        sharer_counts in prop::collection::vec(0usize..=3, 0..=20),
        budgets in prop::collection::vec(0i64..=1_000_000, 4),
        rotation in 0usize..20,
    ) {
        let group = budgeted_group(member_count, &budgets);
        let expenses = equal_expenses(&group, &amounts, &payer_indexes, &sharer_counts);

        let reversed: Vec<Expense> = expenses.iter().rev().cloned().collect();
        let mut rotated = expenses.clone();
        if !rotated.is_empty() {
            let len = rotated.len();
            rotated.rotate_left(rotation % len);
        }

        let forward = BalanceAggregator.aggregate(&expenses, &group);
        for reordered in [reversed, rotated] {
            let balances = BalanceAggregator.aggregate(&reordered, &group);
            prop_assert_eq!(&balances.flow, &forward.flow);
            prop_assert_eq!(&balances.adjusted, &forward.adjusted);
            prop_assert_eq!(&balances.summaries, &forward.summaries);
            prop_assert_eq!(balances.total_spend, forward.total_spend);
        }
    }
}
