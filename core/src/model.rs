//! Records supplied by the external store.
//!
//! The engine references these, it never owns or mutates them.

use crate::{
    error::{EngineError, EngineResult},
    money::Money,
    types::{BusinessUnitId, CashRegisterId, CompanyId, EntityId, PeriodKey},
};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    #[serde(alias = "card")]
    Debit,
    Credit,
    Transfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Debit,
        PaymentMethod::Credit,
        PaymentMethod::Transfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash     => "cash",
            PaymentMethod::Debit    => "debit",
            PaymentMethod::Credit   => "credit",
            PaymentMethod::Transfer => "transfer",
        }
    }

    /// Only physical cash ends up in the till.
    pub fn counts_toward_till(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash"            => Ok(PaymentMethod::Cash),
            "debit" | "card"  => Ok(PaymentMethod::Debit),
            "credit"          => Ok(PaymentMethod::Credit),
            "transfer"        => Ok(PaymentMethod::Transfer),
            other => Err(EngineError::validation(
                "payment_method",
                format!("unknown payment method '{other}'"),
            )),
        }
    }
}

/// An immutable sale or cash movement recorded at the point of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: EntityId,
    pub business_unit_id: BusinessUnitId,
    #[serde(default)]
    pub cash_register_id: Option<CashRegisterId>,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub occurred_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Calendar day of the record in the store's local time.
    pub fn local_date(&self, offset: FixedOffset) -> NaiveDate {
        self.occurred_at.with_timezone(&offset).date_naive()
    }

    pub fn period_key(&self, offset: FixedOffset) -> PeriodKey {
        PeriodKey::from_timestamp(self.occurred_at, offset)
    }

    pub fn is_on_register(&self, register_id: &str) -> bool {
        self.cash_register_id.as_deref() == Some(register_id)
    }
}

/// A till as known to the store. `current_amount` is what the last
/// rendition counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashRegister {
    pub id: CashRegisterId,
    pub business_unit_id: BusinessUnitId,
    pub name: String,
    /// Opening float. May be negative when a debt is carried forward.
    pub initial_amount: Money,
    pub current_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessUnit {
    pub id: BusinessUnitId,
    pub company_id: CompanyId,
    pub name: String,
}

/// Monthly sales target for one business unit.
/// The store keeps at most one per (business unit, period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub business_unit_id: BusinessUnitId,
    pub period_key: PeriodKey,
    pub target_amount: Money,
    pub bonus_percentage: Decimal,
}

impl Goal {
    /// Guard against a goal the store should never have let through.
    pub fn ensure_valid(&self) -> EngineResult<()> {
        if self.target_amount <= Decimal::ZERO {
            return Err(self.invalid(format!(
                "target amount must be positive, got {}",
                self.target_amount
            )));
        }
        if self.bonus_percentage.is_sign_negative() && !self.bonus_percentage.is_zero() {
            return Err(self.invalid(format!(
                "bonus percentage must be non-negative, got {}",
                self.bonus_percentage
            )));
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> EngineError {
        EngineError::InvalidGoal {
            business_unit_id: self.business_unit_id.clone(),
            period_key: self.period_key.to_string(),
            reason,
        }
    }
}
