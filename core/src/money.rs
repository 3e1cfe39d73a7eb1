//! Currency helpers.
//!
//! Every amount is a `Decimal` in a single implicit currency unit.
//! Binary floating point never touches a monetary comparison.

use crate::error::{EngineError, EngineResult};
use rust_decimal::{Decimal, RoundingStrategy};

pub type Money = Decimal;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// `part / whole * 100`, or `None` when `whole` is zero.
pub fn percent_of(part: Money, whole: Money) -> Option<Decimal> {
    if whole.is_zero() {
        return None;
    }
    part.checked_div(whole).and_then(|r| r.checked_mul(HUNDRED))
}

/// `amount * pct / 100`.
pub fn apply_percent(field: &str, amount: Money, pct: Decimal) -> EngineResult<Money> {
    amount
        .checked_mul(pct)
        .and_then(|v| v.checked_div(HUNDRED))
        .ok_or_else(|| overflow(field))
}

/// True when `a` and `b` differ by more than `tolerance`.
/// A difference too wide to represent is beyond any tolerance.
pub fn differs_beyond(a: Money, b: Money, tolerance: Money) -> bool {
    a.checked_sub(b).map_or(true, |d| d.abs() > tolerance)
}

// ── Checked arithmetic ─────────────────────────────────────────
//
// `Decimal` operators panic on overflow; sums over caller data go through these.

pub fn checked_add(field: &str, a: Money, b: Money) -> EngineResult<Money> {
    a.checked_add(b).ok_or_else(|| overflow(field))
}

pub fn checked_sub(field: &str, a: Money, b: Money) -> EngineResult<Money> {
    a.checked_sub(b).ok_or_else(|| overflow(field))
}

pub fn checked_sum<I>(field: &str, amounts: I) -> EngineResult<Money>
where
    I: IntoIterator<Item = Money>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| checked_add(field, acc, v))
}

fn overflow(field: &str) -> EngineError {
    EngineError::validation(field, "amount overflow")
}

/// Amount as shown in discrepancy messages: no trailing zeros, no "-0".
pub fn display_amount(amount: Money) -> String {
    amount.normalize().to_string()
}

/// Percentage as shown in discrepancy messages: two decimals at most.
pub fn display_percent(pct: Decimal) -> String {
    pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string()
}

pub fn ensure_non_negative(field: &str, amount: Money) -> EngineResult<Money> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(EngineError::validation(
            field,
            format!("must be non-negative, got {}", display_amount(amount)),
        ));
    }
    Ok(amount)
}
