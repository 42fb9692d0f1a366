//! Store methods for sales records and the grouped-sum query.

use crate::{
    error::{LookupError, PipelineResult, QueryError},
    source::SalesSource,
    types::{MunicipalityRef, SalesAggregateRow, Year},
};
use rusqlite::{params, types::ValueRef, ErrorCode};

use super::SalesStore;

const GROUPED_TOTALS_SQL: &str = "
    SELECT ANO_VENDA, MUNICIPIO_VENDA, PRINCIPIO_ATIVO, SUM(QTD_VENDIDA) AS TOTAL_VENDIDO
    FROM vendas_medicamentos
    WHERE MUNICIPIO_VENDA = ?1
    GROUP BY ANO_VENDA, MUNICIPIO_VENDA, PRINCIPIO_ATIVO
    ORDER BY TOTAL_VENDIDO DESC";

/// One raw sale line, as loaded by the ingestion scripts.
#[derive(Debug, Clone)]
pub struct SaleRecord {
    pub year:              Year,
    pub month:             Option<u32>,
    pub state:             Option<String>,
    pub municipality:      String,
    pub active_ingredient: String,
    pub quantity:          i64,
}

impl SalesStore {
    /// Grouped totals for one municipality. Sums run inside SQLite over
    /// integer units, so they are exact; the float conversion happens only
    /// when each summed value is read back.
    pub fn grouped_totals_for(
        &self,
        municipality: &str,
    ) -> Result<Vec<SalesAggregateRow>, QueryError> {
        let mut stmt = self
            .conn
            .prepare_cached(GROUPED_TOTALS_SQL)
            .map_err(classify_query_error)?;
        let mut rows = stmt
            .query(params![municipality])
            .map_err(classify_query_error)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(classify_query_error)? {
            let year: i64 = row.get(0).map_err(classify_query_error)?;
            let year = Year::try_from(year).map_err(|_| QueryError::Decode {
                column: "ANO_VENDA",
                detail: format!("{year} is out of range"),
            })?;
            let total = row.get_ref(3).map_err(classify_query_error)?;
            out.push(SalesAggregateRow {
                year,
                municipality:      row.get(1).map_err(classify_query_error)?,
                active_ingredient: row.get(2).map_err(classify_query_error)?,
                total_quantity:    quantity_from_sql(total)?,
            });
        }
        Ok(out)
    }

    // ── Fixture helpers ───────────────────────────────────────────────

    pub fn insert_sale(&self, sale: &SaleRecord) -> PipelineResult<()> {
        self.conn.execute(
            "INSERT INTO vendas_medicamentos
                 (ANO_VENDA, MES_VENDA, UF_VENDA, MUNICIPIO_VENDA, PRINCIPIO_ATIVO, QTD_VENDIDA)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                sale.year,
                sale.month,
                sale.state,
                sale.municipality,
                sale.active_ingredient,
                sale.quantity,
            ],
        )?;
        Ok(())
    }

    pub fn sale_count(&self) -> PipelineResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vendas_medicamentos", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl SalesSource for SalesStore {
    fn list_municipalities(&self) -> Result<Vec<MunicipalityRef>, LookupError> {
        self.municipalities()
    }

    fn grouped_totals(&self, municipality: &str) -> Result<Vec<SalesAggregateRow>, QueryError> {
        self.grouped_totals_for(municipality)
    }
}

/// Map a SQLite error onto the query taxonomy. Busy, locked and interrupted
/// statements are the SQLite shapes of a timed-out query.
pub fn classify_query_error(err: rusqlite::Error) -> QueryError {
    let timed_out = match &err {
        rusqlite::Error::SqliteFailure(e, _) => matches!(
            e.code,
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::OperationInterrupted
        ),
        _ => false,
    };
    let message = err.to_string();
    if timed_out || message.to_lowercase().contains("timeout") {
        QueryError::Timeout(message)
    } else {
        QueryError::Failed(message)
    }
}

/// Convert a summed storage value to f64. Decimal text is accepted for
/// databases that keep quantities as exact strings.
fn quantity_from_sql(value: ValueRef<'_>) -> Result<f64, QueryError> {
    let decode = |detail: String| QueryError::Decode {
        column: "TOTAL_VENDIDO",
        detail,
    };
    match value {
        ValueRef::Integer(i) => Ok(i as f64),
        ValueRef::Real(f) => Ok(f),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| decode(e.to_string()))?;
            text.trim()
                .parse::<f64>()
                .map_err(|e| decode(format!("'{text}': {e}")))
        }
        ValueRef::Null => Err(decode("NULL total".to_string())),
        ValueRef::Blob(_) => Err(decode("unexpected BLOB".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(code), None)
    }

    #[test]
    fn busy_and_locked_are_timeouts() {
        assert!(classify_query_error(sqlite_failure(ffi::SQLITE_BUSY)).is_timeout());
        assert!(classify_query_error(sqlite_failure(ffi::SQLITE_LOCKED)).is_timeout());
        assert!(classify_query_error(sqlite_failure(ffi::SQLITE_INTERRUPT)).is_timeout());
    }

    #[test]
    fn timeout_in_message_is_a_timeout() {
        let err = rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_ERROR),
            Some("statement Timeout exceeded".to_string()),
        );
        assert!(classify_query_error(err).is_timeout());
    }

    #[test]
    fn other_failures_are_not_retried() {
        let err = classify_query_error(sqlite_failure(ffi::SQLITE_CORRUPT));
        assert!(matches!(err, QueryError::Failed(_)));
    }

    #[test]
    fn decimal_text_totals_are_decoded() {
        assert_eq!(quantity_from_sql(ValueRef::Text(b" 1234.50")).unwrap(), 1234.5);
        assert_eq!(quantity_from_sql(ValueRef::Integer(7)).unwrap(), 7.0);
        assert!(quantity_from_sql(ValueRef::Null).is_err());
        assert!(quantity_from_sql(ValueRef::Text(b"abc")).is_err());
    }
}
