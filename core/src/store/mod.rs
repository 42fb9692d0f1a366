//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The pipeline reaches it through the SalesSource trait.

use crate::error::PipelineResult;
use rusqlite::{Connection, OpenFlags};
use std::time::Duration;

mod municipality;
mod sales;

pub use sales::{classify_query_error, SaleRecord};

pub struct SalesStore {
    conn: Connection,
}

impl SalesStore {
    pub fn open(path: &str) -> PipelineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PipelineResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// How long a query waits on a locked database before SQLite gives up
    /// with SQLITE_BUSY, which the aggregator treats as a timeout.
    pub fn set_query_timeout(&self, timeout: Duration) -> PipelineResult<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Create the sales schema if it is not there yet.
    pub fn migrate(&self) -> PipelineResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_sales.sql"))?;
        Ok(())
    }
}
