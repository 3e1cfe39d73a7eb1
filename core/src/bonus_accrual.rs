//! Bonus accrual rollup across a company's business units.
//!
//! Bonuses count as paid only once their period has closed. Goals for
//! the current month are pending; goals dated after it are ignored.

use crate::{
    error::EngineResult,
    goal_progress::GoalProgress,
    money::{self, Money},
    types::{BusinessUnitId, PeriodKey},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitBonusLine {
    pub business_unit_id: BusinessUnitId,
    pub period_key: PeriodKey,
    pub achieved: bool,
    pub bonus_amount: Money,
    pub settled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusSummary {
    pub current_period: PeriodKey,
    pub current_period_goals: usize,
    pub historical_goals: usize,
    /// Goals met this period.
    pub goals_met: usize,
    /// Sum of bonuses over closed periods.
    pub total_bonuses_paid: Money,
    /// Goals met this period with a non-zero bonus still to be paid.
    pub bonuses_pending: usize,
    pub pending_bonus_amount: Money,
    pub lines: Vec<UnitBonusLine>,
}

pub struct BonusAccrualAggregator;

impl BonusAccrualAggregator {
    pub fn summarize(
        current_period: PeriodKey,
        progress: &[GoalProgress],
    ) -> EngineResult<BonusSummary> {
        let mut summary = BonusSummary {
            current_period,
            current_period_goals: 0,
            historical_goals: 0,
            goals_met: 0,
            total_bonuses_paid: Decimal::ZERO,
            bonuses_pending: 0,
            pending_bonus_amount: Decimal::ZERO,
            lines: Vec::new(),
        };

        for p in progress {
            let settled = if p.period_key == current_period {
                summary.current_period_goals += 1;
                if p.achieved {
                    summary.goals_met += 1;
                    if p.bonus_amount > Decimal::ZERO {
                        summary.bonuses_pending += 1;
                        summary.pending_bonus_amount = money::checked_add(
                            "pending_bonus_amount",
                            summary.pending_bonus_amount,
                            p.bonus_amount,
                        )?;
                    }
                }
                false
            } else if p.period_key < current_period {
                summary.historical_goals += 1;
                summary.total_bonuses_paid = money::checked_add(
                    "total_bonuses_paid",
                    summary.total_bonuses_paid,
                    p.bonus_amount,
                )?;
                true
            } else {
                log::debug!(
                    "skipping future goal {}/{} (current period {current_period})",
                    p.business_unit_id,
                    p.period_key
                );
                continue;
            };

            summary.lines.push(UnitBonusLine {
                business_unit_id: p.business_unit_id.clone(),
                period_key: p.period_key,
                achieved: p.achieved,
                bonus_amount: p.bonus_amount,
                settled,
            });
        }

        summary
            .lines
            .sort_by(|a, b| {
                b.period_key
                    .cmp(&a.period_key)
                    .then_with(|| a.business_unit_id.cmp(&b.business_unit_id))
            });

        log::debug!(
            "bonus summary {current_period}: met={} paid={} pending={}",
            summary.goals_met,
            summary.total_bonuses_paid,
            summary.bonuses_pending
        );

        Ok(summary)
    }
}
