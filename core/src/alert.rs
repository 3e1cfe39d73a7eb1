//! Alert policy applied at the settlement boundary.
//!
//! The alert band is independent of, and wider than, the approval band:
//! a rendition 600 short with no finding still alerts, a rendition 50 over
//! with no finding never does.

use crate::{
    config::AlertPolicy,
    error::EngineError,
    money::Money,
    rendition::RenditionResult,
    types::{BusinessUnitId, CashRegisterId, EntityId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    Discrepancies,
    DifferenceAboveThreshold,
    DiscrepanciesAndDifference,
}

impl AlertReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertReason::Discrepancies              => "discrepancies",
            AlertReason::DifferenceAboveThreshold   => "difference_above_threshold",
            AlertReason::DiscrepanciesAndDifference => "discrepancies_and_difference",
        }
    }
}

impl FromStr for AlertReason {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discrepancies"                => Ok(AlertReason::Discrepancies),
            "difference_above_threshold"   => Ok(AlertReason::DifferenceAboveThreshold),
            "discrepancies_and_difference" => Ok(AlertReason::DiscrepanciesAndDifference),
            other => Err(EngineError::validation("alert.reason", format!("unknown reason '{other}'"))),
        }
    }
}

/// Why (if at all) a rendition result must be escalated.
pub fn alert_reason(result: &RenditionResult, policy: &AlertPolicy) -> Option<AlertReason> {
    let has_findings = !result.discrepancies.is_empty();
    let over_threshold = result.difference_amount.abs() > policy.alert_difference;
    match (has_findings, over_threshold) {
        (true, true)   => Some(AlertReason::DiscrepanciesAndDifference),
        (true, false)  => Some(AlertReason::Discrepancies),
        (false, true)  => Some(AlertReason::DifferenceAboveThreshold),
        (false, false) => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenditionAlert {
    pub alert_id: EntityId,
    pub rendition_id: EntityId,
    pub cash_register_id: CashRegisterId,
    pub business_unit_id: BusinessUnitId,
    pub difference_amount: Money,
    pub reason: AlertReason,
    pub messages: Vec<String>,
    pub raised_at: DateTime<Utc>,
}
