//! Expected till amount — what a register *should* hold.
//!
//!   expected = initial float + sum(cash transactions on the register)
//!
//! Card, credit and transfer totals are reported per method but never
//! enter the expected figure: only physical cash is counted at a rendition.

use crate::{
    error::{EngineError, EngineResult},
    model::{PaymentMethod, TransactionRecord},
    money::{self, Money},
};
use chrono::{FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedAmount {
    pub cash_register_id: String,
    pub from:             NaiveDate,
    pub to:               NaiveDate,
    pub initial_amount:   Money,
    pub expected_amount:  Money,
    pub transaction_count: usize,
    /// Every method appears, zero when no record used it.
    pub total_by_method:  BTreeMap<PaymentMethod, Money>,
}

impl ExpectedAmount {
    pub fn total_for(&self, method: PaymentMethod) -> Money {
        self.total_by_method
            .get(&method)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Sum across every payment method (not just cash).
    pub fn gross_sales(&self) -> EngineResult<Money> {
        money::checked_sum("gross_sales", self.total_by_method.values().copied())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExpectedAmountCalculator {
    offset: FixedOffset,
}

impl ExpectedAmountCalculator {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Expected till total for a single local calendar day.
    pub fn for_day(
        &self,
        cash_register_id: &str,
        as_of: NaiveDate,
        initial_amount: Money,
        records: &[TransactionRecord],
    ) -> EngineResult<ExpectedAmount> {
        self.for_range(cash_register_id, as_of, as_of, initial_amount, records)
    }

    /// Expected till total over an inclusive range of local calendar days.
    pub fn for_range(
        &self,
        cash_register_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        initial_amount: Money,
        records: &[TransactionRecord],
    ) -> EngineResult<ExpectedAmount> {
        if cash_register_id.trim().is_empty() {
            return Err(EngineError::validation("cash_register_id", "must not be empty"));
        }
        if from > to {
            return Err(EngineError::validation(
                "date_range",
                format!("start {from} is after end {to}"),
            ));
        }

        let mut total_by_method: BTreeMap<PaymentMethod, Money> = PaymentMethod::ALL
            .iter()
            .map(|m| (*m, Decimal::ZERO))
            .collect();
        let mut transaction_count = 0usize;

        for record in records.iter().filter(|r| r.is_on_register(cash_register_id)) {
            let day = record.local_date(self.offset);
            if day < from || day > to {
                continue;
            }
            money::ensure_non_negative("transaction.amount", record.amount).map_err(|_| {
                EngineError::validation(
                    "transaction.amount",
                    format!("record '{}' has negative amount {}", record.id, record.amount),
                )
            })?;
            let slot = total_by_method.entry(record.payment_method).or_insert(Decimal::ZERO);
            *slot = money::checked_add("transaction.amount", *slot, record.amount)?;
            transaction_count += 1;
        }

        let cash = money::checked_sum(
            "transaction.amount",
            total_by_method
                .iter()
                .filter(|(m, _)| m.counts_toward_till())
                .map(|(_, v)| *v),
        )?;
        let expected_amount = money::checked_add("initial_amount", initial_amount, cash)?;

        log::debug!(
            "expected amount register={cash_register_id} {from}..={to}: \
             initial={initial_amount} cash={cash} txns={transaction_count} expected={expected_amount}"
        );

        Ok(ExpectedAmount {
            cash_register_id: cash_register_id.to_string(),
            from,
            to,
            initial_amount,
            expected_amount,
            transaction_count,
            total_by_method,
        })
    }
}
