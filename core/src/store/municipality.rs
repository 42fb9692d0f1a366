//! Store methods for the municipality directory.

use crate::{error::{LookupError, PipelineResult}, types::MunicipalityRef};
use rusqlite::params;

use super::SalesStore;

impl SalesStore {
    /// All municipalities ordered by name.
    pub fn municipalities(&self) -> Result<Vec<MunicipalityRef>, LookupError> {
        let mut stmt = self
            .conn
            .prepare("SELECT ID, NOME FROM municipios_rj ORDER BY NOME")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MunicipalityRef {
                    id:   row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Fixture helpers ───────────────────────────────────────────────

    pub fn insert_municipality(&self, id: i64, name: &str) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO municipios_rj (ID, NOME) VALUES (?1, ?2)",
            params![id, name],
        )?;
        Ok(())
    }

    pub fn municipality_count(&self) -> PipelineResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM municipios_rj", [], |row| row.get(0))?;
        Ok(count)
    }
}
