use std::fmt;

use duckdb::{AccessMode, Appender, Config, Connection};

use crate::error::Result;
use crate::escape_sql_ident;
use crate::result::TableSnapshot;

/// Path understood by [`MetricsStore::open`] as an in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    ReadWrite,
    ReadOnly,
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreMode::ReadWrite => write!(f, "read-write"),
            StoreMode::ReadOnly => write!(f, "read-only"),
        }
    }
}

/// Exclusive handle on the backing DuckDB file.
///
/// One handle is opened per phase and passed explicitly into every stage.
/// The connection is closed when the handle is dropped, on success and on
/// every error path alike.
pub struct MetricsStore {
    conn: Connection,
    path: String,
    mode: StoreMode,
}

impl MetricsStore {
    /// `threads`: DuckDB worker threads; 1 keeps aggregation order reproducible.
    pub fn open(path: &str, mode: StoreMode, threads: i64) -> Result<Self> {
        let mut config = Config::default().threads(threads)?;
        if mode == StoreMode::ReadOnly {
            config = config.access_mode(AccessMode::ReadOnly)?;
        }

        let conn = if path == MEMORY_PATH {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(path, config)?
        };
        log::debug!("opened {path} ({mode})");

        Ok(MetricsStore {
            conn,
            path: path.to_string(),
            mode,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(MEMORY_PATH, StoreMode::ReadWrite, 1)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    pub fn execute(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn query(&self, sql: &str) -> Result<TableSnapshot> {
        TableSnapshot::from_query(&self.conn, sql)
    }

    /// Runs a query returning a single integer (e.g. `COUNT(*)`).
    pub fn query_count(&self, sql: &str) -> Result<u64> {
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    /// Runs a query returning a single, possibly NULL, double.
    pub fn query_f64(&self, sql: &str) -> Result<Option<f64>> {
        let v: Option<f64> = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(v)
    }

    /// Names of all tables in the main schema, sorted.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'main' ORDER BY table_name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.table_names()?.iter().any(|t| t == table))
    }

    /// Returns the subset of `required` that does not exist, in input order.
    pub fn missing_tables(&self, required: &[&str]) -> Result<Vec<String>> {
        let existing = self.table_names()?;
        Ok(required
            .iter()
            .filter(|t| !existing.iter().any(|e| e == *t))
            .map(|t| t.to_string())
            .collect())
    }

    pub fn row_count(&self, table: &str) -> Result<u64> {
        self.query_count(&format!(
            "SELECT COUNT(*) FROM \"{}\"",
            escape_sql_ident(table)
        ))
    }

    /// Replaces `table` with the result of `select_sql` inside one
    /// transaction. On error the previous version of the table is kept.
    /// Returns the row count of the new table.
    pub fn replace_table(&mut self, table: &str, select_sql: &str) -> Result<u64> {
        let ident = escape_sql_ident(table);
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "CREATE OR REPLACE TABLE \"{ident}\" AS {select_sql}"
        ))?;
        let rows: i64 = tx.query_row(&format!("SELECT COUNT(*) FROM \"{ident}\""), [], |row| {
            row.get(0)
        })?;
        tx.commit()?;
        Ok(rows.max(0) as u64)
    }

    pub fn appender(&self, table: &str) -> Result<Appender<'_>> {
        Ok(self.conn.appender(table)?)
    }
}
