use super::{not_found, parsed, EngineStore};
use crate::{
    error::EngineResult,
    model::{BusinessUnit, CashRegister},
    money::Money,
    source::{RegisterSource, RenditionRecord, RenditionSink},
};
use rusqlite::{params, OptionalExtension};

impl EngineStore {
    pub fn insert_business_unit(&self, unit: &BusinessUnit) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO business_unit (business_unit_id, company_id, name)
             VALUES (?1, ?2, ?3)",
            params![unit.id, unit.company_id, unit.name],
        )?;
        Ok(())
    }

    pub fn insert_register(&self, register: &CashRegister) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO cash_register
             (cash_register_id, business_unit_id, name, initial_amount, current_amount)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                register.id,
                register.business_unit_id,
                register.name,
                register.initial_amount.to_string(),
                register.current_amount.to_string(),
            ],
        )?;
        Ok(())
    }

    fn map_register_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CashRegister> {
        Ok(CashRegister {
            id:               row.get(0)?,
            business_unit_id: row.get(1)?,
            name:             row.get(2)?,
            initial_amount:   parsed(row, 3)?,
            current_amount:   parsed(row, 4)?,
        })
    }
}

impl RegisterSource for EngineStore {
    fn register(&self, register_id: &str) -> EngineResult<CashRegister> {
        self.conn
            .query_row(
                "SELECT cash_register_id, business_unit_id, name, initial_amount, current_amount
                 FROM cash_register WHERE cash_register_id = ?1",
                params![register_id],
                Self::map_register_row,
            )
            .optional()?
            .ok_or_else(|| not_found("cash register", register_id))
    }
}

impl RenditionSink for EngineStore {
    fn record_rendition(&self, record: &RenditionRecord) -> EngineResult<()> {
        self.insert_rendition(record)
    }

    fn update_register_balance(&self, register_id: &str, amount: Money) -> EngineResult<()> {
        let changed = self.conn.execute(
            "UPDATE cash_register SET current_amount = ?1 WHERE cash_register_id = ?2",
            params![amount.to_string(), register_id],
        )?;
        if changed == 0 {
            return Err(not_found("cash register", register_id));
        }
        Ok(())
    }

    fn atomically<T, F>(&self, work: F) -> EngineResult<T>
    where
        F: FnOnce() -> EngineResult<T>,
    {
        // Dropping the guard without commit rolls back.
        let tx = self.conn.unchecked_transaction()?;
        let out = work()?;
        tx.commit()?;
        Ok(out)
    }
}
