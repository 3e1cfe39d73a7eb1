//! Rendition metrics — a per-unit snapshot of how tills have been closing.

use crate::{
    error::EngineResult,
    money::{self, Money},
    rendition::RenditionStatus,
    source::RenditionRecord,
    types::BusinessUnitId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenditionMetrics {
    pub business_unit_id: BusinessUnitId,
    pub total_renditions: usize,
    pub auto_approved: usize,
    pub pending_review: usize,
    pub alerted: usize,
    pub with_discrepancies: usize,
    /// Sum of |difference| across renditions.
    pub gross_difference: Money,
    /// Signed sum: negative means tills ran short overall.
    pub net_difference: Money,
    pub largest_shortfall: Money,
}

impl RenditionMetrics {
    /// Roll up the given renditions; records of other units are skipped.
    pub fn compute(business_unit_id: &str, records: &[RenditionRecord]) -> EngineResult<Self> {
        let mine: Vec<&RenditionRecord> = records
            .iter()
            .filter(|r| r.business_unit_id == business_unit_id)
            .collect();

        let auto_approved = mine
            .iter()
            .filter(|r| r.status == RenditionStatus::AutoApproved)
            .count();
        let alerted = mine.iter().filter(|r| r.alerted).count();
        let with_discrepancies = mine
            .iter()
            .filter(|r| !r.result.discrepancies.is_empty())
            .count();
        let gross_difference = money::checked_sum(
            "gross_difference",
            mine.iter().map(|r| r.result.difference_amount.abs()),
        )?;
        let net_difference = money::checked_sum(
            "net_difference",
            mine.iter().map(|r| r.result.difference_amount),
        )?;
        let largest_shortfall = mine
            .iter()
            .map(|r| r.result.difference_amount)
            .filter(|d| *d < Decimal::ZERO)
            .map(|d| d.abs())
            .max()
            .unwrap_or(Decimal::ZERO);

        Ok(Self {
            business_unit_id: business_unit_id.to_string(),
            total_renditions: mine.len(),
            auto_approved,
            pending_review: mine.len() - auto_approved,
            alerted,
            with_discrepancies,
            gross_difference,
            net_difference,
            largest_shortfall,
        })
    }
}
