//! The engine facade — wires configuration into the four components.
//!
//! EVALUATION ORDER (fixed):
//!   Rendition:  ExpectedAmountCalculator → RenditionValidator → alert policy
//!   Incentives: GoalProgressEngine (per goal) → BonusAccrualAggregator
//!
//! RULES:
//!   - Pure computation over materialized inputs; no I/O, no retained state.
//!   - Same inputs, same outputs. Safe to share across threads.

use crate::{
    alert::{self, AlertReason},
    bonus_accrual::{BonusAccrualAggregator, BonusSummary},
    config::EngineConfig,
    error::{EngineError, EngineResult},
    expected_amount::{ExpectedAmount, ExpectedAmountCalculator},
    goal_progress::{GoalProgress, GoalProgressEngine},
    model::{CashRegister, Goal, TransactionRecord},
    rendition::{RenditionResult, RenditionSubmission, RenditionValidator},
    types::PeriodKey,
};
use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Everything a single rendition evaluation produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenditionEvaluation {
    pub expected: ExpectedAmount,
    pub result:   RenditionResult,
    pub alert:    Option<AlertReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncentiveReport {
    pub progress: Vec<GoalProgress>,
    pub summary:  BonusSummary,
}

pub struct Engine {
    config:     EngineConfig,
    calculator: ExpectedAmountCalculator,
    validator:  RenditionValidator,
    goals:      GoalProgressEngine,
}

impl Engine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::assemble(config))
    }

    /// Engine with the built-in thresholds, UTC calendar.
    pub fn with_defaults() -> Self {
        Self::assemble(EngineConfig::default())
    }

    fn assemble(config: EngineConfig) -> Self {
        let offset = config.calendar.offset();
        Self {
            calculator: ExpectedAmountCalculator::new(offset),
            validator:  RenditionValidator::new(config.rendition.clone()),
            goals:      GoalProgressEngine::new(offset),
            config,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.config.calendar.offset()
    }

    pub fn goal_engine(&self) -> &GoalProgressEngine {
        &self.goals
    }

    /// Reconcile one register for one local day.
    ///
    /// The submission is checked before anything is summed, so a malformed
    /// request fails without touching the records.
    pub fn evaluate_rendition(
        &self,
        register: &CashRegister,
        submission: &RenditionSubmission,
        as_of: NaiveDate,
        records: &[TransactionRecord],
    ) -> EngineResult<RenditionEvaluation> {
        submission.ensure_well_formed()?;
        if submission.cash_register_id != register.id {
            return Err(EngineError::validation(
                "cash_register_id",
                format!(
                    "submission targets '{}' but register is '{}'",
                    submission.cash_register_id, register.id
                ),
            ));
        }

        let expected =
            self.calculator
                .for_day(&register.id, as_of, register.initial_amount, records)?;
        let result = self.validator.validate(submission, expected.expected_amount)?;
        let alert = alert::alert_reason(&result, &self.config.alerts);

        Ok(RenditionEvaluation {
            expected,
            result,
            alert,
        })
    }

    /// Progress for every goal, then the company rollup for `current_period`.
    pub fn incentive_report(
        &self,
        goals: &[Goal],
        records: &[TransactionRecord],
        current_period: PeriodKey,
    ) -> EngineResult<IncentiveReport> {
        let progress = goals
            .iter()
            .map(|g| self.goals.progress(g, records))
            .collect::<EngineResult<Vec<_>>>()?;
        let summary = BonusAccrualAggregator::summarize(current_period, &progress)?;
        Ok(IncentiveReport { progress, summary })
    }
}
