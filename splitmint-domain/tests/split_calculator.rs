use proptest::prelude::*;
use rust_decimal::Decimal;
use splitmint_domain::{
    DeclaredValues, InvalidArgument, LedgerPolicy, Money, ParticipantId, SplitCalculator,
    SplitError, SplitStrategy, ValidationError, compute_splits,
};

const NAMES: [&str; 4] = ["A", "B", "C", "D"];

fn participants(count: usize) -> Vec<ParticipantId> {
    NAMES[..count].iter().copied().map(ParticipantId::from).collect()
}

fn declared(participants: &[ParticipantId], values: &[Decimal]) -> DeclaredValues {
    participants.iter().cloned().zip(values.iter().copied()).collect()
}

/// Splits `whole` into `count` non-negative parts that sum exactly to it.
fn partition(whole: i64, cuts: &[i64], count: usize) -> Vec<i64> {
    let mut points: Vec<i64> = cuts
        .iter()
        .take(count - 1)
        .map(|cut| cut.rem_euclid(whole + 1))
        .collect();
    points.sort_unstable();
    let mut parts = Vec::with_capacity(count);
    let mut previous = 0;
    for point in points {
        parts.push(point - previous);
        previous = point;
    }
    parts.push(whole - previous);
    parts
}

#[test]
fn equal_split_of_one_hundred_between_three() {
    let result = compute_splits(
        "100.00".parse().expect("valid amount"),
        SplitStrategy::Equal,
        &participants(3),
        None,
    )
    .expect("equal split should succeed");

    assert_eq!(result.get("A"), Some("33.34".parse().expect("valid amount")));
    assert_eq!(result.get("B"), Some("33.33".parse().expect("valid amount")));
    assert_eq!(result.get("C"), Some("33.33".parse().expect("valid amount")));
}

#[test]
fn exact_split_off_by_a_dollar_is_rejected() {
    let people = participants(2);
    let values = declared(&people, &[Decimal::from(60), Decimal::from(39)]);

    let result = compute_splits(
        Money::from_cents(10_000),
        SplitStrategy::Exact,
        &people,
        Some(&values),
    );

    assert!(matches!(
        result,
        Err(SplitError::Validation(ValidationError::SplitMismatch { .. }))
    ));
}

#[test]
fn percent_split_of_ninety() {
    let people = participants(3);
    let values = declared(
        &people,
        &[Decimal::from(50), Decimal::from(30), Decimal::from(20)],
    );

    let result = compute_splits(
        Money::from_cents(9_000),
        SplitStrategy::Percent,
        &people,
        Some(&values),
    )
    .expect("percent split should succeed");

    assert_eq!(result.get("A"), Some(Money::from_cents(4_500)));
    assert_eq!(result.get("B"), Some(Money::from_cents(2_700)));
    assert_eq!(result.get("C"), Some(Money::from_cents(1_800)));
    assert_eq!(result.total(), Money::from_cents(9_000));
}

#[test]
fn sub_cent_totals_cannot_be_expressed() {
    assert!("10.005".parse::<Money>().is_err());
    assert_eq!(
        compute_splits(Money::ZERO, SplitStrategy::Equal, &participants(2), None),
        Err(SplitError::InvalidArgument(InvalidArgument::NonPositiveTotal(
            Money::ZERO
        )))
    );
}

proptest! {
    #[test]
    fn equal_split_conserves_total(
        total in 1i64..=10_000_000,
        count in 1usize..=4,
    ) {
        let result = compute_splits(
            Money::from_cents(total),
            SplitStrategy::Equal,
            &participants(count),
            None,
        ).expect("equal split should succeed");

        prop_assert_eq!(result.total(), Money::from_cents(total));

        // Extra cents go to the earliest participants and differ by at most one.
        let shares: Vec<i64> = result.iter().map(|(_, amount)| amount.cents()).collect();
        for pair in shares.windows(2) {
            prop_assert!(pair[0] >= pair[1]);
            prop_assert!(pair[0] - pair[1] <= 1);
        }
    }

    #[test]
    fn exact_split_conserves_total(
        total in 1i64..=10_000_000,
        count in 1usize..=4,
        cuts in prop::collection::vec(any::<i64>(), 3),
    ) {
        let people = participants(count);
        let parts: Vec<Decimal> = partition(total, &cuts, count)
            .into_iter()
            .map(|cents| Money::from_cents(cents).as_decimal())
            .collect();
        let values = declared(&people, &parts);

        let result = compute_splits(
            Money::from_cents(total),
            SplitStrategy::Exact,
            &people,
            Some(&values),
        ).expect("exact split should succeed");

        prop_assert_eq!(result.total(), Money::from_cents(total));
        for (id, amount) in result.iter() {
            prop_assert_eq!(Some(&amount.as_decimal()), values.get(id));
        }
    }

    #[test]
    fn percent_split_conserves_total(
        total in 1i64..=10_000_000,
        count in 1usize..=4,
        cuts in prop::collection::vec(any::<i64>(), 3),
    ) {
        let people = participants(count);
        // Percentages with up to three decimals, summing to exactly 100.
        let percents: Vec<Decimal> = partition(100_000, &cuts, count)
            .into_iter()
            .map(|thousandths| Decimal::new(thousandths, 3))
            .collect();
        let values = declared(&people, &percents);

        let result = compute_splits(
            Money::from_cents(total),
            SplitStrategy::Percent,
            &people,
            Some(&values),
        ).expect("percent split should succeed");

        prop_assert_eq!(result.total(), Money::from_cents(total));
        for (id, amount) in result.iter() {
            prop_assert!(!amount.is_negative());
            if values.get(id).is_some_and(Decimal::is_zero) {
                prop_assert!(amount.is_zero());
            }
        }
    }

    #[test]
    fn parity_percent_drift_is_bounded(
        total in 1i64..=10_000_000,
        count in 1usize..=4,
        cuts in prop::collection::vec(any::<i64>(), 3),
    ) {
        let people = participants(count);
        let percents: Vec<Decimal> = partition(100_000, &cuts, count)
            .into_iter()
            .map(|thousandths| Decimal::new(thousandths, 3))
            .collect();
        let values = declared(&people, &percents);

        let result = SplitCalculator::new(LedgerPolicy::parity())
            .compute(Money::from_cents(total), SplitStrategy::Percent, &people, Some(&values))
            .expect("percent split should succeed");

        // Each share is off by at most half a cent.
        let drift = (result.total() - Money::from_cents(total)).cents().abs();
        prop_assert!(drift * 2 <= count as i64);
    }
}
