use super::{json_col, json_opt_col, parsed, ts_to_sql, EngineStore};
use crate::{
    alert::RenditionAlert,
    error::EngineResult,
    rendition::RenditionResult,
    source::{AlertSink, RenditionRecord},
};
use chrono::NaiveDate;
use rusqlite::params;

impl EngineStore {
    pub(super) fn insert_rendition(&self, r: &RenditionRecord) -> EngineResult<()> {
        let discrepancies = serde_json::to_string(&r.result.discrepancies)?;
        let breakdown = r.breakdown.as_ref().map(serde_json::to_string).transpose()?;
        self.conn.execute(
            "INSERT INTO rendition
             (rendition_id, cash_register_id, business_unit_id, cashier_id, rendered_on,
              expected_amount, actual_amount, difference_amount, discrepancies,
              auto_approved, status, alerted, breakdown, notes, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
            params![
                r.rendition_id,
                r.cash_register_id,
                r.business_unit_id,
                r.cashier_id,
                r.rendered_on.to_string(),
                r.result.expected_amount.to_string(),
                r.result.actual_amount.to_string(),
                r.result.difference_amount.to_string(),
                discrepancies,
                r.result.auto_approved,
                r.status.as_str(),
                r.alerted,
                breakdown,
                r.notes,
                ts_to_sql(r.created_at),
            ],
        )?;
        Ok(())
    }

    /// Renditions of a unit rendered on local days `from..=to`.
    pub fn renditions_for_unit(
        &self,
        business_unit_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<RenditionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT rendition_id, cash_register_id, business_unit_id, cashier_id, rendered_on,
                    expected_amount, actual_amount, difference_amount, discrepancies,
                    auto_approved, status, alerted, breakdown, notes, created_at
             FROM rendition
             WHERE business_unit_id = ?1 AND rendered_on >= ?2 AND rendered_on <= ?3
             ORDER BY rendered_on ASC, created_at ASC",
        )?;
        let rows = stmt
            .query_map(
                params![business_unit_id, from.to_string(), to.to_string()],
                Self::map_rendition_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_rendition_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RenditionRecord> {
        Ok(RenditionRecord {
            rendition_id:     row.get(0)?,
            cash_register_id: row.get(1)?,
            business_unit_id: row.get(2)?,
            cashier_id:       row.get(3)?,
            rendered_on:      parsed(row, 4)?,
            result: RenditionResult {
                expected_amount:   parsed(row, 5)?,
                actual_amount:     parsed(row, 6)?,
                difference_amount: parsed(row, 7)?,
                discrepancies:     json_col(row, 8)?,
                auto_approved:     row.get(9)?,
            },
            status:     parsed(row, 10)?,
            alerted:    row.get(11)?,
            breakdown:  json_opt_col(row, 12)?,
            notes:      row.get(13)?,
            created_at: parsed(row, 14)?,
        })
    }

    pub fn alerts_for_register(&self, register_id: &str) -> EngineResult<Vec<RenditionAlert>> {
        let mut stmt = self.conn.prepare(
            "SELECT alert_id, rendition_id, cash_register_id, business_unit_id,
                    difference_amount, reason, messages, raised_at
             FROM rendition_alert WHERE cash_register_id = ?1
             ORDER BY raised_at ASC",
        )?;
        let rows = stmt
            .query_map(params![register_id], |row| {
                Ok(RenditionAlert {
                    alert_id:          row.get(0)?,
                    rendition_id:      row.get(1)?,
                    cash_register_id:  row.get(2)?,
                    business_unit_id:  row.get(3)?,
                    difference_amount: parsed(row, 4)?,
                    reason:            parsed(row, 5)?,
                    messages:          json_col(row, 6)?,
                    raised_at:         parsed(row, 7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl AlertSink for EngineStore {
    fn raise_alert(&self, alert: &RenditionAlert) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO rendition_alert
             (alert_id, rendition_id, cash_register_id, business_unit_id,
              difference_amount, reason, messages, raised_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                alert.alert_id,
                alert.rendition_id,
                alert.cash_register_id,
                alert.business_unit_id,
                alert.difference_amount.to_string(),
                alert.reason.as_str(),
                serde_json::to_string(&alert.messages)?,
                ts_to_sql(alert.raised_at),
            ],
        )?;
        Ok(())
    }
}
