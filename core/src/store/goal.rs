use super::{parsed, EngineStore};
use crate::{
    error::EngineResult,
    model::Goal,
    source::GoalSource,
    types::{CompanyId, PeriodKey},
};
use rusqlite::{params, OptionalExtension};

impl EngineStore {
    /// Insert or replace the goal for (business unit, period).
    pub fn upsert_goal(&self, goal: &Goal) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO goal (business_unit_id, period_key, target_amount, bonus_percentage)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (business_unit_id, period_key)
             DO UPDATE SET target_amount = excluded.target_amount,
                           bonus_percentage = excluded.bonus_percentage",
            params![
                goal.business_unit_id,
                goal.period_key.to_string(),
                goal.target_amount.to_string(),
                goal.bonus_percentage.to_string(),
            ],
        )?;
        Ok(())
    }

    fn map_goal_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Goal> {
        Ok(Goal {
            business_unit_id: row.get(0)?,
            period_key:       parsed(row, 1)?,
            target_amount:    parsed(row, 2)?,
            bonus_percentage: parsed(row, 3)?,
        })
    }
}

impl GoalSource for EngineStore {
    fn goals_for_company(&self, company_id: &CompanyId) -> EngineResult<Vec<Goal>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.business_unit_id, g.period_key, g.target_amount, g.bonus_percentage
             FROM goal g
             JOIN business_unit u ON u.business_unit_id = g.business_unit_id
             WHERE u.company_id = ?1
             ORDER BY g.period_key ASC, g.business_unit_id ASC",
        )?;
        let rows = stmt
            .query_map(params![company_id], Self::map_goal_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn goal_for(&self, business_unit_id: &str, period: PeriodKey) -> EngineResult<Option<Goal>> {
        let goal = self
            .conn
            .query_row(
                "SELECT business_unit_id, period_key, target_amount, bonus_percentage
                 FROM goal WHERE business_unit_id = ?1 AND period_key = ?2",
                params![business_unit_id, period.to_string()],
                Self::map_goal_row,
            )
            .optional()?;
        Ok(goal)
    }
}
