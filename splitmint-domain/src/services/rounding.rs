//! Cent-level rounding primitives.
//!
//! The split calculator never rounds implicitly: EQUAL shares are floored,
//! EXACT and PERCENT shares are rounded half away from zero, and any leftover
//! cents are handed out explicitly by [`distribute_residual`].

use crate::model::{CENT_SCALE, Money};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

/// Rounds toward negative infinity at cent precision (`33.339 -> 33.33`).
pub fn floor_to_cents(value: Decimal) -> Option<Money> {
    round_to_cents(value, RoundingStrategy::ToNegativeInfinity)
}

/// Rounds half away from zero at cent precision (`0.125 -> 0.13`, `-0.125 -> -0.13`).
pub fn round_half_away_to_cents(value: Decimal) -> Option<Money> {
    round_to_cents(value, RoundingStrategy::MidpointAwayFromZero)
}

fn round_to_cents(value: Decimal, strategy: RoundingStrategy) -> Option<Money> {
    let rounded = value.round_dp_with_strategy(CENT_SCALE, strategy);
    let cents = rounded.checked_mul(Decimal::ONE_HUNDRED)?;
    cents.to_i64().map(Money::from_cents)
}

/// Adds `residual` to `shares` one cent at a time in list order, cycling when
/// the residual exceeds the share count.
///
/// A positive residual only goes to shares whose `recipients` flag is set; a
/// negative residual is only taken from positive shares so no share drops
/// below zero. Returns `false` if the residual could not be fully placed:
/// nobody may receive a positive residual, or a negative residual exceeds the
/// sum of the shares.
pub fn distribute_residual(shares: &mut [Money], residual: Money, recipients: &[bool]) -> bool {
    debug_assert_eq!(shares.len(), recipients.len());
    let step = residual.signum();
    let mut remaining = residual.cents().unsigned_abs();

    while remaining > 0 {
        let eligible: Vec<usize> = shares
            .iter()
            .zip(recipients)
            .enumerate()
            .filter(|(_, (share, receives))| {
                if step > 0 {
                    **receives
                } else {
                    share.is_positive()
                }
            })
            .map(|(idx, _)| idx)
            .collect();
        if eligible.is_empty() {
            return false;
        }

        let per_share = remaining / eligible.len() as u64;
        if per_share == 0 {
            for &idx in eligible.iter().take(remaining as usize) {
                shares[idx] += Money::from_cents(step);
            }
            return true;
        }

        // Taking cents away stops at the smallest eligible share, which then
        // drops out of the next round.
        let per_share = if step < 0 {
            eligible
                .iter()
                .map(|&idx| shares[idx].cents().unsigned_abs())
                .min()
                .map_or(per_share, |smallest| per_share.min(smallest))
        } else {
            per_share
        };

        for &idx in &eligible {
            shares[idx] += Money::from_cents(step * per_share as i64);
        }
        remaining -= per_share * eligible.len() as u64;
    }

    true
}
