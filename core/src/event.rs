//! Engine events — the record of every decision handed to the store.
//!
//! RULE: Events describe outcomes, they never carry instructions.
//! Variants are only ever appended.

use crate::{
    money::Money,
    types::{BusinessUnitId, CashRegisterId, EntityId, PeriodKey},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    // ── Rendition events ───────────────────────────
    RenditionValidated {
        rendition_id: EntityId,
        cash_register_id: CashRegisterId,
        expected_amount: Money,
        actual_amount: Money,
        difference_amount: Money,
        auto_approved: bool,
        discrepancy_count: usize,
    },
    RegisterBalanceUpdated {
        cash_register_id: CashRegisterId,
        previous_amount: Money,
        new_amount: Money,
    },
    RenditionAlertRaised {
        alert_id: EntityId,
        rendition_id: EntityId,
        cash_register_id: CashRegisterId,
        difference_amount: Money,
        reason: String,
    },

    // ── Goal events ────────────────────────────────
    GoalAchieved {
        business_unit_id: BusinessUnitId,
        period_key: PeriodKey,
        actual_amount: Money,
        bonus_amount: Money,
    },
}

impl EngineEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::RenditionValidated { .. }     => "rendition_validated",
            EngineEvent::RegisterBalanceUpdated { .. } => "register_balance_updated",
            EngineEvent::RenditionAlertRaised { .. }   => "rendition_alert_raised",
            EngineEvent::GoalAchieved { .. }           => "goal_achieved",
        }
    }
}

/// A persisted event log entry (as stored in the database).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:          Option<i64>,
    pub recorded_at: DateTime<Utc>,
    pub source:      String,
    pub event_type:  String,
    pub payload:     String, // JSON-serialized EngineEvent
}

impl EventLogEntry {
    pub fn from_event(
        source: &str,
        recorded_at: DateTime<Utc>,
        event: &EngineEvent,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            id: None,
            recorded_at,
            source: source.to_string(),
            event_type: event.event_type().to_string(),
            payload: serde_json::to_string(event)?,
        })
    }

    pub fn decode(&self) -> serde_json::Result<EngineEvent> {
        serde_json::from_str(&self.payload)
    }
}
