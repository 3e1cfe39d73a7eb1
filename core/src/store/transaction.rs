use super::{parsed, ts_to_sql, EngineStore};
use crate::{
    error::EngineResult,
    model::TransactionRecord,
    source::TransactionSource,
    types::local_day_span,
};
use chrono::{FixedOffset, NaiveDate};
use rusqlite::params;

const TXN_COLUMNS: &str =
    "transaction_id, business_unit_id, cash_register_id, amount, payment_method, occurred_at";

impl EngineStore {
    pub fn insert_transaction(&self, record: &TransactionRecord) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO transaction_record
             (transaction_id, business_unit_id, cash_register_id, amount, payment_method, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.business_unit_id,
                record.cash_register_id,
                record.amount.to_string(),
                record.payment_method.as_str(),
                ts_to_sql(record.occurred_at),
            ],
        )?;
        Ok(())
    }

    /// Insert a batch atomically: either every record lands or none does.
    pub fn insert_transactions(&self, records: &[TransactionRecord]) -> EngineResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for record in records {
            self.insert_transaction(record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn transaction_count(&self) -> EngineResult<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM transaction_record", [], |row| row.get(0))?;
        Ok(n)
    }

    fn query_transactions(
        &self,
        key_column: &str,
        key: &str,
        from: NaiveDate,
        to: NaiveDate,
        offset: FixedOffset,
    ) -> EngineResult<Vec<TransactionRecord>> {
        let (start, end) = local_day_span(from, to, offset)?;
        let sql = format!(
            "SELECT {TXN_COLUMNS} FROM transaction_record
             WHERE {key_column} = ?1 AND occurred_at >= ?2 AND occurred_at < ?3
             ORDER BY occurred_at ASC, transaction_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![key, ts_to_sql(start), ts_to_sql(end)], |row| {
                Ok(TransactionRecord {
                    id:               row.get(0)?,
                    business_unit_id: row.get(1)?,
                    cash_register_id: row.get(2)?,
                    amount:           parsed(row, 3)?,
                    payment_method:   parsed(row, 4)?,
                    occurred_at:      parsed(row, 5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl TransactionSource for EngineStore {
    fn transactions_for_register(
        &self,
        register_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        offset: FixedOffset,
    ) -> EngineResult<Vec<TransactionRecord>> {
        self.query_transactions("cash_register_id", register_id, from, to, offset)
    }

    fn transactions_for_unit(
        &self,
        business_unit_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        offset: FixedOffset,
    ) -> EngineResult<Vec<TransactionRecord>> {
        self.query_transactions("business_unit_id", business_unit_id, from, to, offset)
    }
}
