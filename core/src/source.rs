//! Collaborator contracts.
//!
//! RULE: The engine performs no I/O. Callers fetch through these traits,
//! hand plain records to the engine, and persist what it returns.
//! `store::EngineStore` is the SQLite implementation.

use crate::{
    alert::RenditionAlert,
    error::EngineResult,
    event::EngineEvent,
    model::{CashRegister, Goal, TransactionRecord},
    money::Money,
    rendition::{CashBreakdown, RenditionResult, RenditionStatus},
    types::{BusinessUnitId, CashRegisterId, CompanyId, EntityId, PeriodKey},
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A rendition as handed to the store once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenditionRecord {
    pub rendition_id: EntityId,
    pub cash_register_id: CashRegisterId,
    pub business_unit_id: BusinessUnitId,
    pub cashier_id: EntityId,
    pub rendered_on: NaiveDate,
    pub result: RenditionResult,
    pub status: RenditionStatus,
    pub alerted: bool,
    pub breakdown: Option<CashBreakdown>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub trait TransactionSource {
    /// Records on a register whose local day falls in `from..=to`.
    fn transactions_for_register(
        &self,
        register_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        offset: FixedOffset,
    ) -> EngineResult<Vec<TransactionRecord>>;

    /// Records of a business unit whose local day falls in `from..=to`.
    fn transactions_for_unit(
        &self,
        business_unit_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        offset: FixedOffset,
    ) -> EngineResult<Vec<TransactionRecord>>;
}

pub trait RegisterSource {
    fn register(&self, register_id: &str) -> EngineResult<CashRegister>;
}

pub trait GoalSource {
    fn goals_for_company(&self, company_id: &CompanyId) -> EngineResult<Vec<Goal>>;

    fn goal_for(&self, business_unit_id: &str, period: PeriodKey) -> EngineResult<Option<Goal>>;
}

pub trait RenditionSink {
    fn record_rendition(&self, record: &RenditionRecord) -> EngineResult<()>;

    fn update_register_balance(&self, register_id: &str, amount: Money) -> EngineResult<()>;

    /// Run `work` as one unit of writes. When it returns `Err`, nothing
    /// written inside it remains, alert and event writes included.
    fn atomically<T, F>(&self, work: F) -> EngineResult<T>
    where
        F: FnOnce() -> EngineResult<T>;
}

/// Fire-and-forget from the engine's point of view.
pub trait AlertSink {
    fn raise_alert(&self, alert: &RenditionAlert) -> EngineResult<()>;
}

pub trait EventSink {
    fn append_event(
        &self,
        source: &str,
        recorded_at: DateTime<Utc>,
        event: &EngineEvent,
    ) -> EngineResult<()>;
}
