//! Rendition validator — compares a physically counted till against the
//! expected amount and decides whether it can be auto-approved.
//!
//! Checks run in a fixed order and accumulate; several can fire at once:
//!   1. breakdown consistency (only when a breakdown is supplied)
//!   2. absolute difference above `large_difference`
//!   3. relative difference above `relative_difference_pct` of expected
//!   4. negative actual amount
//!
//! Approval band vs alarm band:
//!   |diff| <= auto_approve_band               → auto-approved, silent
//!   auto_approve_band < |diff| <= large_diff  → manual review, no finding
//!   |diff| > large_difference                 → manual review + finding

use crate::{
    config::RenditionThresholds,
    error::{EngineError, EngineResult},
    money::{self, Money},
    types::{BusinessUnitId, CashRegisterId, EntityId},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// How many notes or coins of one face value were counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenominationCount {
    pub face_value: Money,
    pub count: u32,
}

/// Optional itemisation of the counted amount.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashBreakdown {
    #[serde(default)]
    pub denominations: Vec<DenominationCount>,
    #[serde(default)]
    pub card_total: Money,
    #[serde(default)]
    pub transfer_total: Money,
}

impl CashBreakdown {
    pub fn cash_total(&self) -> EngineResult<Money> {
        let mut total = Decimal::ZERO;
        for d in &self.denominations {
            let line = d
                .face_value
                .checked_mul(Decimal::from(d.count))
                .ok_or_else(|| EngineError::validation("breakdown", "amount overflow"))?;
            total = money::checked_add("breakdown", total, line)?;
        }
        Ok(total)
    }

    /// Total the breakdown claims: counted cash plus card and transfer slips.
    pub fn reconstructed_total(&self) -> EngineResult<Money> {
        money::checked_sum(
            "breakdown",
            [self.cash_total()?, self.card_total, self.transfer_total],
        )
    }

    fn ensure_well_formed(&self) -> EngineResult<()> {
        for d in &self.denominations {
            if d.face_value <= Decimal::ZERO {
                return Err(EngineError::validation(
                    "breakdown.denominations",
                    format!("face value must be positive, got {}", d.face_value),
                ));
            }
        }
        money::ensure_non_negative("breakdown.card_total", self.card_total)?;
        money::ensure_non_negative("breakdown.transfer_total", self.transfer_total)?;
        Ok(())
    }
}

/// A cashier's end-of-period count, as received from the caller.
///
/// Identifier and amount fields arrive unchecked; `RenditionValidator`
/// rejects a submission with any of them missing before computing anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenditionSubmission {
    pub cash_register_id: CashRegisterId,
    pub business_unit_id: BusinessUnitId,
    pub cashier_id: EntityId,
    pub actual_amount: Option<Money>,
    #[serde(default)]
    pub breakdown: Option<CashBreakdown>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RenditionSubmission {
    /// Checks required fields and returns the declared amount.
    pub fn ensure_well_formed(&self) -> EngineResult<Money> {
        let required = [
            ("cash_register_id", &self.cash_register_id),
            ("business_unit_id", &self.business_unit_id),
            ("cashier_id", &self.cashier_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(EngineError::validation(field, "is required"));
            }
        }
        let actual = self
            .actual_amount
            .ok_or_else(|| EngineError::validation("actual_amount", "is required"))?;
        if let Some(b) = &self.breakdown {
            b.ensure_well_formed()?;
        }
        Ok(actual)
    }
}

/// A non-fatal finding. `Display` renders the message persisted with the
/// rendition and shown to reviewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    BreakdownMismatch { reconstructed: Money, actual: Money },
    LargeDifference { difference: Money },
    HighPercentageDifference { percent: Decimal },
    NegativeActualAmount,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::BreakdownMismatch { reconstructed, actual } => write!(
                f,
                "breakdown mismatch: reconstructed={} actual={}",
                money::display_amount(*reconstructed),
                money::display_amount(*actual)
            ),
            Discrepancy::LargeDifference { difference } => {
                write!(f, "large difference: {}", money::display_amount(*difference))
            }
            Discrepancy::HighPercentageDifference { percent } => {
                write!(f, "high percentage difference: {}%", money::display_percent(*percent))
            }
            Discrepancy::NegativeActualAmount => f.write_str("negative actual amount"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenditionStatus {
    AutoApproved,
    PendingReview,
}

impl RenditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenditionStatus::AutoApproved  => "auto_approved",
            RenditionStatus::PendingReview => "pending_review",
        }
    }
}

impl FromStr for RenditionStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto_approved"  => Ok(RenditionStatus::AutoApproved),
            "pending_review" => Ok(RenditionStatus::PendingReview),
            other => Err(EngineError::validation("rendition.status", format!("unknown status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenditionResult {
    pub expected_amount:   Money,
    pub actual_amount:     Money,
    /// `actual - expected`: negative means the till came up short.
    pub difference_amount: Money,
    pub discrepancies:     Vec<Discrepancy>,
    pub auto_approved:     bool,
}

impl RenditionResult {
    pub fn status(&self) -> RenditionStatus {
        if self.auto_approved {
            RenditionStatus::AutoApproved
        } else {
            RenditionStatus::PendingReview
        }
    }

    pub fn discrepancy_messages(&self) -> Vec<String> {
        self.discrepancies.iter().map(ToString::to_string).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

pub struct RenditionValidator {
    thresholds: RenditionThresholds,
}

impl RenditionValidator {
    pub fn new(thresholds: RenditionThresholds) -> Self {
        Self { thresholds }
    }

    /// Validate a submission against the amount the till should hold.
    ///
    /// Returns `Err` only for malformed input, amounts too large to total
    /// included; every well-formed submission
    /// yields a result, with findings listed in `discrepancies`.
    pub fn validate(
        &self,
        submission: &RenditionSubmission,
        expected_amount: Money,
    ) -> EngineResult<RenditionResult> {
        let actual_amount = submission.ensure_well_formed()?;
        let t = &self.thresholds;

        let difference_amount =
            money::checked_sub("actual_amount", actual_amount, expected_amount)?;
        let abs_difference = difference_amount.abs();
        let mut discrepancies = Vec::new();

        // 1. Breakdown consistency
        if let Some(breakdown) = &submission.breakdown {
            let reconstructed = breakdown.reconstructed_total()?;
            if money::differs_beyond(reconstructed, actual_amount, t.breakdown_tolerance) {
                discrepancies.push(Discrepancy::BreakdownMismatch {
                    reconstructed,
                    actual: actual_amount,
                });
            }
        }

        // 2. Absolute difference
        if abs_difference > t.large_difference {
            discrepancies.push(Discrepancy::LargeDifference {
                difference: difference_amount,
            });
        }

        // 3. Relative difference, only meaningful against a positive expectation
        if expected_amount > Decimal::ZERO {
            if let Some(pct) = money::percent_of(abs_difference, expected_amount) {
                if pct > t.relative_difference_pct {
                    discrepancies.push(Discrepancy::HighPercentageDifference { percent: pct });
                }
            }
        }

        // 4. Sign
        if actual_amount.is_sign_negative() && !actual_amount.is_zero() {
            discrepancies.push(Discrepancy::NegativeActualAmount);
        }

        let auto_approved = discrepancies.is_empty() && abs_difference <= t.auto_approve_band;

        log::debug!(
            "rendition register={} expected={} actual={} diff={} findings={} auto_approved={}",
            submission.cash_register_id,
            expected_amount,
            actual_amount,
            difference_amount,
            discrepancies.len(),
            auto_approved
        );

        Ok(RenditionResult {
            expected_amount,
            actual_amount,
            difference_amount,
            discrepancies,
            auto_approved,
        })
    }
}
