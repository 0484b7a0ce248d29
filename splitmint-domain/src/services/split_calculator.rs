use crate::{
    error::{InvalidArgument, SplitError, ValidationError},
    model::{DeclaredValues, Money, ParticipantId, SplitResult, SplitStrategy},
    services::{
        policy::{LedgerPolicy, SplitRounding},
        rounding::{distribute_residual, floor_to_cents, round_half_away_to_cents},
    },
};
use fxhash::FxHashSet;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Splits an expense total into per-participant owed amounts.
#[derive(Clone, Copy, Debug, Default)]
pub struct SplitCalculator {
    policy: LedgerPolicy,
}

impl SplitCalculator {
    pub fn new(policy: LedgerPolicy) -> Self {
        Self { policy }
    }

    /// Computes the owed amount of every participant.
    ///
    /// * EQUAL: the floored per-head share, with one extra cent for each of the
    ///   first `remainder` participants in the order given. Callers wanting a
    ///   different recipient for the extra cents must reorder `participants`.
    /// * EXACT: the declared amounts, which must sum to `total` within epsilon.
    /// * PERCENT: `total * percent / 100` rounded half away from zero; the
    ///   percentages must sum to 100 within epsilon.
    ///
    /// Participants without a declared value are treated as declaring zero;
    /// declared values for non-participants are ignored.
    ///
    /// # Errors
    /// [`InvalidArgument`] for a non-positive total, an empty or duplicated
    /// participant list, or negative declared values; [`ValidationError`] when
    /// declared values do not reconcile with the total.
    pub fn compute(
        &self,
        total: Money,
        strategy: SplitStrategy,
        participants: &[ParticipantId],
        declared: Option<&DeclaredValues>,
    ) -> Result<SplitResult, SplitError> {
        validate_inputs(total, participants)?;

        let shares = match strategy {
            SplitStrategy::Equal => equal_shares(total, participants.len())?,
            SplitStrategy::Exact => {
                let values = declared_values(participants, declared)?;
                self.exact_shares(total, &values)?
            }
            SplitStrategy::Percent => {
                let values = declared_values(participants, declared)?;
                self.percent_shares(total, &values)?
            }
        };

        let split_total: Money = shares.iter().sum();
        tracing::debug!(
            strategy = %strategy,
            total = %total,
            participant_count = participants.len(),
            split_total = %split_total,
            rounding = ?self.policy.split_rounding,
            "Split computed"
        );

        Ok(SplitResult::new(
            participants.iter().cloned().zip(shares).collect(),
        ))
    }

    fn exact_shares(&self, total: Money, values: &[Decimal]) -> Result<Vec<Money>, SplitError> {
        let declared = checked_sum(values)?;
        if (declared - total.as_decimal()).abs() > self.policy.epsilon.as_decimal() {
            return Err(ValidationError::SplitMismatch { declared, total }.into());
        }

        let mut shares = values
            .iter()
            .map(|value| round_half_away_to_cents(*value))
            .collect::<Option<Vec<_>>>()
            .ok_or(InvalidArgument::AmountOutOfRange)?;
        self.reconcile(&mut shares, total, values);
        Ok(shares)
    }

    fn percent_shares(&self, total: Money, percents: &[Decimal]) -> Result<Vec<Money>, SplitError> {
        let declared = checked_sum(percents)?;
        if (declared - Decimal::ONE_HUNDRED).abs() > self.policy.epsilon.as_decimal() {
            return Err(ValidationError::PercentMismatch { declared }.into());
        }

        let total_decimal = total.as_decimal();
        let mut shares = percents
            .iter()
            .map(|percent| {
                let raw = total_decimal
                    .checked_mul(*percent)?
                    .checked_div(Decimal::ONE_HUNDRED)?;
                round_half_away_to_cents(raw)
            })
            .collect::<Option<Vec<_>>>()
            .ok_or(InvalidArgument::AmountOutOfRange)?;
        self.reconcile(&mut shares, total, percents);
        Ok(shares)
    }

    /// Closes the gap between rounded shares and `total`. Extra cents only go to
    /// participants who declared a positive value; a participant who declared
    /// zero owes nothing.
    fn reconcile(&self, shares: &mut [Money], total: Money, values: &[Decimal]) {
        let residual = total - shares.iter().sum::<Money>();
        if residual.is_zero() {
            return;
        }

        match self.policy.split_rounding {
            SplitRounding::Parity => {
                tracing::debug!(
                    residual = %residual,
                    "Split rounding residual left uncorrected"
                );
            }
            SplitRounding::PennyCorrected => {
                let mut recipients: Vec<bool> = values
                    .iter()
                    .map(|value| value.is_sign_positive() && !value.is_zero())
                    .collect();
                if !recipients.contains(&true) {
                    recipients.fill(true);
                }
                let distributed = distribute_residual(shares, residual, &recipients);
                debug_assert!(distributed, "residual exceeds split total");
                tracing::debug!(
                    residual = %residual,
                    "Split rounding residual redistributed"
                );
            }
        }
    }
}

/// [`SplitCalculator::compute`] with the default policy.
pub fn compute_splits(
    total: Money,
    strategy: SplitStrategy,
    participants: &[ParticipantId],
    declared: Option<&DeclaredValues>,
) -> Result<SplitResult, SplitError> {
    SplitCalculator::default().compute(total, strategy, participants, declared)
}

/// Parses declared split values supplied as text. Values that are not decimals
/// count as zero; a trailing `%` is accepted.
pub fn parse_declared_values<'a, I, K>(raw: I) -> DeclaredValues
where
    I: IntoIterator<Item = (K, &'a str)>,
    K: Into<ParticipantId>,
{
    raw.into_iter()
        .map(|(participant, text)| {
            let participant = participant.into();
            let trimmed = text.trim();
            let value = match Decimal::from_str(trimmed.strip_suffix('%').unwrap_or(trimmed)) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(
                        participant = %participant,
                        value = text,
                        error = %err,
                        "Unparseable declared split value treated as zero"
                    );
                    Decimal::ZERO
                }
            };
            (participant, value)
        })
        .collect()
}

fn validate_inputs(total: Money, participants: &[ParticipantId]) -> Result<(), InvalidArgument> {
    if !total.is_positive() {
        return Err(InvalidArgument::NonPositiveTotal(total));
    }
    if participants.is_empty() {
        return Err(InvalidArgument::NoParticipants);
    }

    let mut seen = FxHashSet::default();
    for participant in participants {
        if !seen.insert(participant) {
            return Err(InvalidArgument::DuplicateParticipant(participant.clone()));
        }
    }
    Ok(())
}

fn declared_values(
    participants: &[ParticipantId],
    declared: Option<&DeclaredValues>,
) -> Result<Vec<Decimal>, InvalidArgument> {
    participants
        .iter()
        .map(|participant| {
            let value = declared
                .and_then(|values| values.get(participant).copied())
                .unwrap_or(Decimal::ZERO);
            if value.is_sign_negative() && !value.is_zero() {
                return Err(InvalidArgument::NegativeDeclaredValue {
                    participant: participant.clone(),
                    value,
                });
            }
            Ok(value)
        })
        .collect()
}

fn equal_shares(total: Money, count: usize) -> Result<Vec<Money>, InvalidArgument> {
    let base = floor_to_cents(total.as_decimal() / Decimal::from(count))
        .ok_or(InvalidArgument::AmountOutOfRange)?;
    let allotted = base
        .checked_mul(count as i64)
        .ok_or(InvalidArgument::AmountOutOfRange)?;
    let remainder = (total - allotted).cents() as usize;
    debug_assert!(remainder < count);

    Ok((0..count)
        .map(|idx| if idx < remainder { base + Money::CENT } else { base })
        .collect())
}

fn checked_sum(values: &[Decimal]) -> Result<Decimal, InvalidArgument> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(*value))
        .ok_or(InvalidArgument::AmountOutOfRange)
}
