//! Campaign storage with SQLite
//!
//! [`CampaignStore`] owns a single connection. Opening a store runs the
//! schema convergence routine first, so every method below can assume the
//! current table shape. Entity operations live in one submodule per table.

mod adventures;
mod characters;
mod error;
mod json;
mod locations;
mod magic_items;
mod migrate;
mod notes;
mod quests;
mod schema;
mod sessions;
mod transfer;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

pub use error::{Result, StoreError};
pub use migrate::{AppliedMigration, ConvergenceReport};
pub use quests::QuestFilter;
pub use schema::CONTENT_TABLES;
pub use transfer::{ExportBundle, ImportMode, ImportReport, BUNDLE_FORMAT_VERSION};

pub struct CampaignStore {
    conn: Connection,
    convergence: ConvergenceReport,
}

/// Row counts and migration history.
#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub table_counts: Vec<(&'static str, i64)>,
    pub migrations: Vec<AppliedMigration>,
}

impl CampaignStore {
    /// Opens (or creates) the database file and converges its schema.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(StoreError::migration("connect"))?;
        tracing::debug!(path = %path.display(), "opened database");
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::migration("connect"))?;
        Self::from_connection(conn)
    }

    /// Wraps an already open connection, converging its schema first.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        let convergence = migrate::converge(&conn)?;
        Ok(Self { conn, convergence })
    }

    /// What the convergence run at open time changed.
    pub fn convergence_report(&self) -> &ConvergenceReport {
        &self.convergence
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    pub fn status(&self) -> Result<StoreStatus> {
        let mut table_counts = Vec::with_capacity(CONTENT_TABLES.len());
        for table in CONTENT_TABLES.iter().rev() {
            let count: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            table_counts.push((*table, count));
        }
        let migrations = migrate::applied_migrations(&self.conn)?;
        Ok(StoreStatus {
            table_counts,
            migrations,
        })
    }

    /// Runs `UPDATE {table} SET ... WHERE id = ?` with only the assigned
    /// columns. An empty assignment list just checks that the row exists.
    fn apply_update(
        &self,
        entity: &'static str,
        table: &str,
        id: i64,
        set: Assignments,
    ) -> Result<()> {
        let Assignments {
            columns,
            mut values,
            touched,
        } = set;
        let affected = if columns.is_empty() && touched.is_empty() {
            self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE id = ?1"),
                [id],
                |row| row.get::<_, i64>(0),
            )? as usize
        } else {
            let clause = columns
                .iter()
                .enumerate()
                .map(|(i, column)| format!("{column} = ?{}", i + 1))
                .chain(touched.iter().map(|column| format!("{column} = datetime('now')")))
                .collect::<Vec<_>>()
                .join(", ");
            values.push(Value::Integer(id));
            let sql = format!("UPDATE {table} SET {clause} WHERE id = ?{}", values.len());
            self.conn.execute(&sql, params_from_iter(values.iter()))?
        };

        if affected == 0 {
            return Err(StoreError::NotFound { entity, id });
        }
        Ok(())
    }

    fn delete_by_id(&self, entity: &'static str, table: &str, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])?;
        if affected == 0 {
            return Err(StoreError::NotFound { entity, id });
        }
        Ok(())
    }
}

/// Column assignments collected from a patch. Column names only ever come
/// from the patch mappers in this module tree, never from caller input.
#[derive(Debug, Default)]
struct Assignments {
    columns: Vec<&'static str>,
    values: Vec<Value>,
    touched: Vec<&'static str>,
}

impl Assignments {
    fn push(&mut self, column: &'static str, value: Value) {
        self.columns.push(column);
        self.values.push(value);
    }

    /// Assigns a NOT NULL column. An explicit null is refused, never skipped.
    fn required(&mut self, column: &'static str, value: Option<Option<Value>>) -> Result<()> {
        match value {
            None => Ok(()),
            Some(Some(v)) => {
                self.push(column, v);
                Ok(())
            }
            Some(None) => Err(StoreError::Invalid(format!("{column} cannot be null"))),
        }
    }

    fn text(&mut self, column: &'static str, value: Option<Option<String>>) -> Result<()> {
        self.required(column, value.map(|v| v.map(Value::Text)))
    }

    fn nullable_text(&mut self, column: &'static str, value: Option<Option<String>>) {
        if let Some(v) = value {
            self.push(column, v.map_or(Value::Null, Value::Text));
        }
    }

    fn int(&mut self, column: &'static str, value: Option<Option<i64>>) -> Result<()> {
        self.required(column, value.map(|v| v.map(Value::Integer)))
    }

    fn nullable_int(&mut self, column: &'static str, value: Option<Option<i64>>) {
        if let Some(v) = value {
            self.push(column, v.map_or(Value::Null, Value::Integer));
        }
    }

    fn flag(&mut self, column: &'static str, value: Option<Option<bool>>) -> Result<()> {
        self.required(column, value.map(|v| v.map(|b| Value::Integer(i64::from(b)))))
    }

    fn json<T: serde::Serialize>(
        &mut self,
        column: &'static str,
        value: Option<Option<T>>,
    ) -> Result<()> {
        if let Some(v) = value {
            let encoded = json::encode_nullable(v.as_ref())?;
            self.push(column, encoded.map_or(Value::Null, Value::Text));
        }
        Ok(())
    }

    /// Sets a timestamp column to the current time.
    fn touch(&mut self, column: &'static str) {
        self.touched.push(column);
    }

    fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_patch_non_empty(field: &str, value: &Option<Option<String>>) -> Result<()> {
    match value {
        Some(Some(v)) => require_non_empty(field, v),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("campaign.db");
        let store = CampaignStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.convergence_report().adventures_seeded, 2);
    }

    #[test]
    fn test_status_counts_tables() {
        let store = CampaignStore::open_in_memory().unwrap();
        let status = store.status().unwrap();
        let adventures = status
            .table_counts
            .iter()
            .find(|(t, _)| *t == "adventures")
            .map(|(_, c)| *c);
        assert_eq!(adventures, Some(2));
        assert_eq!(status.migrations.len(), 2);
    }
}
