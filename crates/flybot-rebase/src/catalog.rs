//! `TableCatalog` — enumerate snapshot tables, load them whole, commit them back.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use flybot_core::{FlybotError, FlybotResult};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use tracing::{debug, info};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One table held fully in memory, row order preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// All cells of one column, top to bottom.
    pub fn column_values(&self, column: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Table name → contents. Ordered so commits are deterministic.
pub type TableSet = BTreeMap<String, Table>;

pub struct TableCatalog;

impl TableCatalog {
    /// Load every user table of the snapshot at `path`.
    pub fn load_all(path: &Path) -> FlybotResult<TableSet> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| FlybotError::storage(path, e))?;

        let names = table_names(&conn).map_err(|e| FlybotError::CatalogQuery {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if names.is_empty() {
            return Err(FlybotError::EmptyCatalog {
                path: path.to_path_buf(),
            });
        }

        let mut tables = TableSet::new();
        for name in names {
            let table = load_table(&conn, &name)
                .map_err(|e| FlybotError::storage(path, format!("load {name}: {e}")))?;
            debug!(table = %name, rows = table.len(), "table loaded");
            tables.insert(name, table);
        }
        info!(path = %path.display(), tables = tables.len(), "snapshot tables loaded");
        Ok(tables)
    }

    /// Replace the contents of every table in `tables` inside one transaction.
    /// On any failure the transaction is rolled back and the file keeps its
    /// pre-commit contents.
    pub fn commit_all(path: &Path, tables: &TableSet) -> FlybotResult<()> {
        let mut conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
            .map_err(|e| FlybotError::storage(path, e))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| FlybotError::storage(path, e))?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| FlybotError::storage(path, e))?;

        let mut written = 0usize;
        for table in tables.values() {
            written += write_table(&tx, table)
                .map_err(|e| FlybotError::storage(path, format!("write {}: {e}", table.name)))?;
        }

        tx.commit().map_err(|e| FlybotError::storage(path, e))?;
        info!(
            path = %path.display(),
            tables = tables.len(),
            rows = written,
            "snapshot tables committed"
        );
        Ok(())
    }
}

fn table_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
         ORDER BY name",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect()
}

fn load_table(conn: &Connection, name: &str) -> rusqlite::Result<Table> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(name)))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Table::new(name, columns, rows))
}

fn write_table(conn: &Connection, table: &Table) -> rusqlite::Result<usize> {
    let ident = quote_ident(&table.name);
    conn.execute(&format!("DELETE FROM {ident}"), [])?;
    if table.rows.is_empty() {
        return Ok(0);
    }

    let columns = table
        .columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=table.columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {ident} ({columns}) VALUES ({placeholders})"
    ))?;

    for row in &table.rows {
        stmt.execute(rusqlite::params_from_iter(row.iter()))?;
    }
    Ok(table.rows.len())
}

/// Double-quote an SQL identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
