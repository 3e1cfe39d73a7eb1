//! The desk — where the engine meets the store.
//!
//! A rendition settles in a fixed sequence:
//!   1. reject malformed submissions before any read
//!   2. fetch the register and the day's transactions
//!   3. evaluate (pure engine call)
//!   4. persist the rendition, then set the register balance to the count
//!   5. raise an alert when the policy says so
//!   6. append events for every step that wrote something
//!
//! Nothing is written when steps 1–3 fail. Steps 4–6 run as one unit
//! through `RenditionSink::atomically`: either all of them land or none.

use crate::{
    alert::RenditionAlert,
    engine::{Engine, IncentiveReport, RenditionEvaluation},
    error::{EngineError, EngineResult},
    event::EngineEvent,
    model::TransactionRecord,
    rendition::RenditionSubmission,
    source::{
        AlertSink, EventSink, GoalSource, RegisterSource, RenditionRecord, RenditionSink,
        TransactionSource,
    },
    types::{CompanyId, EntityId, PeriodKey},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SOURCE: &str = "desk";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenditionOutcome {
    pub rendition_id: EntityId,
    pub evaluation:   RenditionEvaluation,
    pub alert_id:     Option<EntityId>,
    pub events:       Vec<EngineEvent>,
}

impl RenditionOutcome {
    pub fn alert_raised(&self) -> bool {
        self.alert_id.is_some()
    }
}

pub struct RenditionDesk<'a, S> {
    engine: &'a Engine,
    store:  &'a S,
}

impl<'a, S> RenditionDesk<'a, S>
where
    S: TransactionSource + RegisterSource + RenditionSink + AlertSink + EventSink,
{
    pub fn new(engine: &'a Engine, store: &'a S) -> Self {
        Self { engine, store }
    }

    /// Settle a cashier's count for `as_of` (local day).
    pub fn submit(
        &self,
        submission: &RenditionSubmission,
        as_of: NaiveDate,
        now: DateTime<Utc>,
    ) -> EngineResult<RenditionOutcome> {
        let actual_amount = submission.ensure_well_formed()?;

        let register = self.store.register(&submission.cash_register_id)?;
        if register.business_unit_id != submission.business_unit_id {
            return Err(EngineError::validation(
                "business_unit_id",
                format!(
                    "register '{}' belongs to '{}', not '{}'",
                    register.id, register.business_unit_id, submission.business_unit_id
                ),
            ));
        }

        let records =
            self.store
                .transactions_for_register(&register.id, as_of, as_of, self.engine.offset())?;
        let evaluation = self
            .engine
            .evaluate_rendition(&register, submission, as_of, &records)?;
        let result = &evaluation.result;

        let rendition_id = Uuid::new_v4().to_string();
        let record = RenditionRecord {
            rendition_id: rendition_id.clone(),
            cash_register_id: register.id.clone(),
            business_unit_id: register.business_unit_id.clone(),
            cashier_id: submission.cashier_id.clone(),
            rendered_on: as_of,
            result: result.clone(),
            status: result.status(),
            alerted: evaluation.alert.is_some(),
            breakdown: submission.breakdown.clone(),
            notes: submission.notes.clone(),
            created_at: now,
        };

        let mut events = vec![
            EngineEvent::RenditionValidated {
                rendition_id: rendition_id.clone(),
                cash_register_id: register.id.clone(),
                expected_amount: result.expected_amount,
                actual_amount: result.actual_amount,
                difference_amount: result.difference_amount,
                auto_approved: result.auto_approved,
                discrepancy_count: result.discrepancies.len(),
            },
            EngineEvent::RegisterBalanceUpdated {
                cash_register_id: register.id.clone(),
                previous_amount: register.current_amount,
                new_amount: actual_amount,
            },
        ];

        let alert = evaluation.alert.map(|reason| RenditionAlert {
            alert_id: Uuid::new_v4().to_string(),
            rendition_id: rendition_id.clone(),
            cash_register_id: register.id.clone(),
            business_unit_id: register.business_unit_id.clone(),
            difference_amount: result.difference_amount,
            reason,
            messages: result.discrepancy_messages(),
            raised_at: now,
        });
        if let Some(alert) = &alert {
            events.push(EngineEvent::RenditionAlertRaised {
                alert_id: alert.alert_id.clone(),
                rendition_id: rendition_id.clone(),
                cash_register_id: register.id.clone(),
                difference_amount: result.difference_amount,
                reason: alert.reason.as_str().to_string(),
            });
        }

        self.store.atomically(|| {
            self.store.record_rendition(&record)?;
            self.store.update_register_balance(&register.id, actual_amount)?;
            if let Some(alert) = &alert {
                self.store.raise_alert(alert)?;
            }
            for event in &events {
                self.store.append_event(SOURCE, now, event)?;
            }
            Ok(())
        })?;

        if let Some(alert) = &alert {
            log::warn!(
                "rendition alert register={} diff={} reason={} findings={:?}",
                register.id,
                result.difference_amount,
                alert.reason.as_str(),
                alert.messages
            );
        }
        log::info!(
            "rendition {rendition_id} register={} status={} diff={}",
            register.id,
            result.status().as_str(),
            result.difference_amount
        );

        Ok(RenditionOutcome {
            rendition_id,
            alert_id: alert.map(|a| a.alert_id),
            evaluation,
            events,
        })
    }
}

pub struct IncentiveDesk<'a, S> {
    engine: &'a Engine,
    store:  &'a S,
}

impl<'a, S> IncentiveDesk<'a, S>
where
    S: TransactionSource + GoalSource + EventSink,
{
    pub fn new(engine: &'a Engine, store: &'a S) -> Self {
        Self { engine, store }
    }

    /// Goal progress and bonus rollup for every unit of a company.
    ///
    /// Goals already met in the current period are logged as events.
    pub fn report(
        &self,
        company_id: &CompanyId,
        now: DateTime<Utc>,
    ) -> EngineResult<IncentiveReport> {
        let offset = self.engine.offset();
        let current_period = PeriodKey::current(now, offset);
        let goals = self.store.goals_for_company(company_id)?;

        let mut records: Vec<TransactionRecord> = Vec::new();
        for goal in &goals {
            let (from, to) = goal.period_key.date_span()?;
            records.extend(self.store.transactions_for_unit(
                &goal.business_unit_id,
                from,
                to,
                offset,
            )?);
        }

        let report = self
            .engine
            .incentive_report(&goals, &records, current_period)?;

        for p in report
            .progress
            .iter()
            .filter(|p| p.achieved && p.period_key == current_period)
        {
            self.store.append_event(
                SOURCE,
                now,
                &EngineEvent::GoalAchieved {
                    business_unit_id: p.business_unit_id.clone(),
                    period_key: p.period_key,
                    actual_amount: p.actual_amount,
                    bonus_amount: p.bonus_amount,
                },
            )?;
        }

        log::info!(
            "incentive report company={company_id} period={current_period}: {} goals, {} met",
            report.progress.len(),
            report.summary.goals_met
        );

        Ok(report)
    }
}
