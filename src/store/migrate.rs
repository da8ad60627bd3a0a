//! Schema convergence
//!
//! Brings a database of any prior shape (empty, legacy or current) to the
//! current schema. Every step is idempotent, so the routine runs on every
//! open rather than tracking a single schema version. The two destructive
//! legacy rebuilds are additionally recorded in `schema_migrations` and run
//! inside a transaction each.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::error::{Result, StoreError};
use super::schema::{
    magic_items_sql, CHARACTER_COLUMNS, INDEXES, MIGRATION_MAGIC_ITEMS_OWNERSHIP,
    MIGRATION_NPCS_TO_CHARACTERS, SEED_ADVENTURES, TABLES, UNIQUE_ASSIGNMENT_INDEX,
};

/// What a convergence run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvergenceReport {
    /// Columns added to `characters` by the backfill.
    pub columns_added: Vec<String>,
    /// Rows copied out of a legacy `npcs` table, if one was migrated.
    pub legacy_characters_copied: Option<usize>,
    /// Rows carried across the `magic_items` rebuild, if it ran.
    pub magic_items_rebuilt: Option<usize>,
    /// Duplicate `(character, item)` assignment rows removed.
    pub duplicate_assignments_removed: usize,
    /// Adventures inserted by the seed step.
    pub adventures_seeded: usize,
}

impl ConvergenceReport {
    /// True when the run found the database already at the current shape.
    pub fn is_noop(&self) -> bool {
        self.columns_added.is_empty()
            && self.legacy_characters_copied.is_none()
            && self.magic_items_rebuilt.is_none()
            && self.duplicate_assignments_removed == 0
            && self.adventures_seeded == 0
    }
}

/// An applied entry of the migration log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
    pub applied_at: String,
}

/// Runs every convergence step in order. Any failure is fatal; a later run
/// starts again from the first step.
pub fn converge(conn: &Connection) -> Result<ConvergenceReport> {
    let mut report = ConvergenceReport::default();

    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(StoreError::migration("connect"))?;

    conn.execute_batch(TABLES)
        .map_err(StoreError::migration("create_tables"))?;

    report.columns_added =
        backfill_character_columns(conn).map_err(StoreError::migration("backfill_characters"))?;

    report.legacy_characters_copied =
        migrate_legacy_npcs(conn).map_err(StoreError::migration("npcs_to_characters"))?;

    report.magic_items_rebuilt =
        normalize_magic_items(conn).map_err(StoreError::migration("normalize_magic_items"))?;

    report.duplicate_assignments_removed = enforce_unique_assignments(conn)
        .map_err(StoreError::migration("unique_assignments"))?;

    conn.execute_batch(INDEXES)
        .map_err(StoreError::migration("create_indexes"))?;

    report.adventures_seeded =
        seed_adventures(conn).map_err(StoreError::migration("seed_adventures"))?;

    if report.is_noop() {
        debug!("schema already current");
    } else {
        info!(?report, "schema converged");
    }
    Ok(report)
}

/// Lists the applied one-time migrations, oldest first.
pub fn applied_migrations(conn: &Connection) -> rusqlite::Result<Vec<AppliedMigration>> {
    let mut stmt =
        conn.prepare("SELECT version, name, applied_at FROM schema_migrations ORDER BY version")?;
    let rows = stmt.query_map([], |row| {
        Ok(AppliedMigration {
            version: row.get(0)?,
            name: row.get(1)?,
            applied_at: row.get(2)?,
        })
    })?;
    rows.collect()
}

// ============================================
// INTROSPECTION
// ============================================

pub(crate) fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub(crate) fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let rows = stmt.query_map(params![table], |row| row.get(0))?;
    rows.collect()
}

fn migration_applied(conn: &Connection, version: i64) -> rusqlite::Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM schema_migrations WHERE version = ?1",
            params![version],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

fn record_migration(conn: &Connection, (version, name): (i64, &str)) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (?1, ?2)",
        params![version, name],
    )?;
    Ok(())
}

// ============================================
// STEPS
// ============================================

fn backfill_character_columns(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let existing = table_columns(conn, "characters")?;
    let mut added = Vec::new();

    for (column, declaration) in CHARACTER_COLUMNS {
        if existing.iter().any(|c| c.eq_ignore_ascii_case(column)) {
            continue;
        }
        conn.execute_batch(&format!(
            "ALTER TABLE characters ADD COLUMN {column} {declaration};"
        ))?;
        debug!(column, "added column to characters");
        added.push((*column).to_string());
    }

    Ok(added)
}

fn migrate_legacy_npcs(conn: &Connection) -> rusqlite::Result<Option<usize>> {
    let (version, name) = MIGRATION_NPCS_TO_CHARACTERS;
    if migration_applied(conn, version)? {
        if table_exists(conn, "npcs")? {
            warn!(
                migration = name,
                "npcs table present after migration was recorded; leaving it untouched"
            );
        }
        return Ok(None);
    }

    let tx = conn.unchecked_transaction()?;
    let copied = if table_exists(&tx, "npcs")? {
        tx.execute_batch("ALTER TABLE npcs RENAME TO characters_temp;")?;
        let copied = tx.execute(
            "INSERT INTO characters (id, adventure_id, name, role, description, tags)
             SELECT id, adventure_id, name, role, description, tags FROM characters_temp",
            [],
        )?;
        tx.execute_batch("DROP TABLE characters_temp;")?;
        info!(rows = copied, "migrated legacy npcs into characters");
        Some(copied)
    } else {
        None
    };
    record_migration(&tx, MIGRATION_NPCS_TO_CHARACTERS)?;
    tx.commit()?;

    Ok(copied)
}

fn normalize_magic_items(conn: &Connection) -> rusqlite::Result<Option<usize>> {
    let (version, _) = MIGRATION_MAGIC_ITEMS_OWNERSHIP;

    if !table_exists(conn, "magic_items")? {
        conn.execute_batch(&magic_items_sql("magic_items"))?;
        record_migration(conn, MIGRATION_MAGIC_ITEMS_OWNERSHIP)?;
        return Ok(None);
    }

    if migration_applied(conn, version)? {
        return Ok(None);
    }

    let columns = table_columns(conn, "magic_items")?;
    if !columns.iter().any(|c| c == "adventure_id") {
        record_migration(conn, MIGRATION_MAGIC_ITEMS_OWNERSHIP)?;
        return Ok(None);
    }

    // The pragma is a no-op inside a transaction, so it brackets the swap.
    conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
    let rebuilt = rebuild_magic_items(conn);
    let restored = conn.execute_batch("PRAGMA foreign_keys = ON;");
    let rebuilt = rebuilt?;
    restored?;

    report_foreign_key_violations(conn)?;
    info!(rows = rebuilt, "rebuilt magic_items without adventure_id");
    Ok(Some(rebuilt))
}

fn rebuild_magic_items(conn: &Connection) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch("DROP TABLE IF EXISTS magic_items_new;")?;
    tx.execute_batch(&magic_items_sql("magic_items_new"))?;
    let copied = tx.execute(
        "INSERT OR REPLACE INTO magic_items_new
             (id, name, rarity, type, description, properties, attunement_required)
         SELECT id, name, rarity, type, description, properties, attunement_required
         FROM magic_items",
        [],
    )?;
    tx.execute_batch(
        "DROP TABLE magic_items;
         ALTER TABLE magic_items_new RENAME TO magic_items;",
    )?;
    record_migration(&tx, MIGRATION_MAGIC_ITEMS_OWNERSHIP)?;
    tx.commit()?;
    Ok(copied)
}

fn report_foreign_key_violations(conn: &Connection) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
    let violations = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if !violations.is_empty() {
        warn!(
            count = violations.len(),
            tables = ?violations,
            "foreign key violations left by legacy data"
        );
    }
    Ok(())
}

/// Keeps the oldest row of each `(character_id, magic_item_id)` pair and
/// makes the pair unique from then on.
fn enforce_unique_assignments(conn: &Connection) -> rusqlite::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let removed = tx.execute(
        "DELETE FROM character_magic_items
         WHERE rowid NOT IN (
             SELECT MIN(rowid) FROM character_magic_items
             GROUP BY character_id, magic_item_id
         )",
        [],
    )?;
    tx.execute_batch(UNIQUE_ASSIGNMENT_INDEX)?;
    tx.commit()?;

    if removed > 0 {
        warn!(rows = removed, "removed duplicate magic item assignments");
    }
    Ok(removed)
}

fn seed_adventures(conn: &Connection) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM adventures", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(0);
    }

    let tx = conn.unchecked_transaction()?;
    for (slug, title, description) in SEED_ADVENTURES {
        tx.execute(
            "INSERT INTO adventures (slug, title, description) VALUES (?1, ?2, ?3)",
            params![slug, title, description],
        )?;
    }
    tx.commit()?;

    info!(count = SEED_ADVENTURES.len(), "seeded adventures");
    Ok(SEED_ADVENTURES.len())
}
