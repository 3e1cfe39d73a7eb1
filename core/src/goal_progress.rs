//! Goal progress — how a business unit tracks against its monthly target.
//!
//!   raw %     = actual / target * 100
//!   display % = min(raw %, 100)
//!   achieved  = raw % >= 100
//!   bonus     = achieved ? actual * bonus_percentage / 100 : 0
//!
//! Eligibility is decided on the unclamped percentage. The bonus is paid
//! on achieved sales, not on the target, and has no ceiling.

use crate::{
    error::{EngineError, EngineResult},
    model::{Goal, TransactionRecord},
    money::{self, Money},
    types::{BusinessUnitId, PeriodKey},
};
use chrono::FixedOffset;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub business_unit_id: BusinessUnitId,
    pub period_key: PeriodKey,
    pub target_amount: Money,
    pub actual_amount: Money,
    pub raw_progress_percent: Decimal,
    pub display_progress_percent: Decimal,
    pub remaining_amount: Money,
    pub bonus_amount: Money,
    pub achieved: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct GoalProgressEngine {
    offset: FixedOffset,
}

impl GoalProgressEngine {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Progress of `goal` given every sale the store holds for the unit.
    /// Records from other units or other months are ignored.
    pub fn progress(
        &self,
        goal: &Goal,
        records: &[TransactionRecord],
    ) -> EngineResult<GoalProgress> {
        goal.ensure_valid()?;

        let actual_amount = money::checked_sum(
            "transaction.amount",
            records
                .iter()
                .filter(|r| r.business_unit_id == goal.business_unit_id)
                .filter(|r| r.period_key(self.offset) == goal.period_key)
                .map(|r| r.amount),
        )?;

        Self::evaluate(goal, actual_amount)
    }

    /// Progress from an already-summed sales figure.
    pub fn progress_from_total(
        &self,
        goal: &Goal,
        actual_amount: Money,
    ) -> EngineResult<GoalProgress> {
        goal.ensure_valid()?;
        Self::evaluate(goal, actual_amount)
    }

    fn evaluate(goal: &Goal, actual_amount: Money) -> EngineResult<GoalProgress> {
        // Target is positive here, so `None` can only mean overflow.
        let raw_progress_percent = money::percent_of(actual_amount, goal.target_amount)
            .ok_or_else(|| EngineError::validation("actual_amount", "amount overflow"))?;
        let achieved = raw_progress_percent >= Decimal::ONE_HUNDRED;
        let display_progress_percent = raw_progress_percent.min(Decimal::ONE_HUNDRED);
        let bonus_amount = if achieved {
            money::apply_percent("bonus_amount", actual_amount, goal.bonus_percentage)?
        } else {
            Decimal::ZERO
        };
        let remaining_amount =
            money::checked_sub("actual_amount", goal.target_amount, actual_amount)?
                .max(Decimal::ZERO);

        if raw_progress_percent > Decimal::ONE_HUNDRED {
            log::debug!(
                "goal {}/{} over target at {}%, bonus {} uncapped",
                goal.business_unit_id,
                goal.period_key,
                money::display_percent(raw_progress_percent),
                bonus_amount
            );
        }

        Ok(GoalProgress {
            business_unit_id: goal.business_unit_id.clone(),
            period_key: goal.period_key,
            target_amount: goal.target_amount,
            actual_amount,
            raw_progress_percent,
            display_progress_percent,
            remaining_amount,
            bonus_amount,
            achieved,
        })
    }
}
