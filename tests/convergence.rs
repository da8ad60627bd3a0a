//! Convergence against real database files: legacy shapes in, current
//! shape out, with data carried across.

use std::path::{Path, PathBuf};

use lorekeeper::model::{NewCharacter, NewMagicItem, NewSession};
use lorekeeper::store::{CampaignStore, ImportMode};
use rusqlite::{params, Connection};
use tempfile::TempDir;

fn db_file(dir: &TempDir) -> PathBuf {
    dir.path().join("campaign.db")
}

/// Every schema object as `(type, name, sql)`, sorted.
fn schema_dump(path: &Path) -> Vec<(String, String, Option<String>)> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT type, name, sql FROM sqlite_master
             WHERE name NOT LIKE 'sqlite_%'
             ORDER BY type, name",
        )
        .unwrap();
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap();
    rows.collect::<rusqlite::Result<_>>().unwrap()
}

fn columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1)")
        .unwrap();
    let rows = stmt.query_map([table], |row| row.get(0)).unwrap();
    rows.collect::<rusqlite::Result<_>>().unwrap()
}

fn table_exists(conn: &Connection, table: &str) -> bool {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get::<_, i64>(0),
    )
    .unwrap()
        > 0
}

#[test]
fn second_open_leaves_schema_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_file(&dir);

    let first = CampaignStore::open(&path).unwrap();
    assert!(!first.convergence_report().is_noop());
    drop(first);
    let before = schema_dump(&path);

    let second = CampaignStore::open(&path).unwrap();
    assert!(second.convergence_report().is_noop());
    drop(second);

    assert_eq!(schema_dump(&path), before);
}

#[test]
fn open_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("campaign.db");
    CampaignStore::open(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn legacy_characters_table_is_backfilled_without_data_loss() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_file(&dir);
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"CREATE TABLE characters (
                   id INTEGER PRIMARY KEY AUTOINCREMENT,
                   adventure_id INTEGER,
                   name TEXT NOT NULL,
                   role TEXT,
                   description TEXT,
                   tags TEXT,
                   race TEXT
               );
               INSERT INTO characters (id, name, role, description, tags, race)
               VALUES (7, 'Eda Oweland', 'ally', 'Retired adventurer', '["saltmarsh"]', 'human');"#,
        )
        .unwrap();
    }

    let store = CampaignStore::open(&path).unwrap();
    let added = &store.convergence_report().columns_added;
    assert!(!added.contains(&"race".to_string()));
    assert!(added.contains(&"backstory".to_string()));

    let eda = store.get_character(7).unwrap().unwrap();
    assert_eq!(eda.name, "Eda Oweland");
    assert_eq!(eda.role.as_deref(), Some("ally"));
    assert_eq!(eda.race.as_deref(), Some("human"));
    assert_eq!(eda.tags, vec!["saltmarsh".to_string()]);
    assert_eq!(eda.level, 1);
    assert_eq!(eda.abilities.strength, 10);
    assert!(eda.equipment.is_empty());
}

#[test]
fn legacy_npcs_are_moved_into_characters_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_file(&dir);
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE npcs (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 adventure_id INTEGER,
                 name TEXT NOT NULL,
                 role TEXT,
                 description TEXT,
                 tags TEXT
             );",
        )
        .unwrap();
        for (id, name, role) in [
            (1, "Anders Solmor", "council"),
            (2, "Gellan Primewater", "council"),
            (3, "Keledek the Unspoken", "wizard"),
        ] {
            conn.execute(
                "INSERT INTO npcs (id, name, role, tags) VALUES (?1, ?2, ?3, '[]')",
                params![id, name, role],
            )
            .unwrap();
        }
    }

    let store = CampaignStore::open(&path).unwrap();
    assert_eq!(store.convergence_report().legacy_characters_copied, Some(3));

    let characters = store.list_characters(None).unwrap();
    assert_eq!(characters.len(), 3);
    let keledek = store.get_character(3).unwrap().unwrap();
    assert_eq!(keledek.name, "Keledek the Unspoken");
    assert_eq!(keledek.role.as_deref(), Some("wizard"));

    let conn = store.into_connection();
    assert!(!table_exists(&conn, "npcs"));
    assert!(!table_exists(&conn, "characters_temp"));
    drop(conn);

    let reopened = CampaignStore::open(&path).unwrap();
    assert_eq!(reopened.convergence_report().legacy_characters_copied, None);
    assert_eq!(reopened.list_characters(None).unwrap().len(), 3);
    let status = reopened.status().unwrap();
    assert!(status
        .migrations
        .iter()
        .any(|m| m.name == "npcs_to_characters"));
}

#[test]
fn legacy_npcs_id_collision_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_file(&dir);
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE characters (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 adventure_id INTEGER,
                 name TEXT NOT NULL,
                 role TEXT,
                 description TEXT,
                 tags TEXT
             );
             INSERT INTO characters (id, name) VALUES (1, 'Existing');
             CREATE TABLE npcs (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 adventure_id INTEGER,
                 name TEXT NOT NULL,
                 role TEXT,
                 description TEXT,
                 tags TEXT
             );
             INSERT INTO npcs (id, name) VALUES (1, 'Colliding');",
        )
        .unwrap();
    }

    let err = CampaignStore::open(&path).err().unwrap();
    assert!(err.to_string().contains("npcs_to_characters"), "{err}");

    let conn = Connection::open(&path).unwrap();
    assert!(table_exists(&conn, "npcs"));
    assert!(!table_exists(&conn, "characters_temp"));
    let name: String = conn
        .query_row("SELECT name FROM characters WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "Existing");
}

#[test]
fn legacy_magic_items_lose_adventure_ownership() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_file(&dir);
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"CREATE TABLE characters (
                   id INTEGER PRIMARY KEY AUTOINCREMENT,
                   adventure_id INTEGER,
                   name TEXT NOT NULL,
                   role TEXT,
                   description TEXT,
                   tags TEXT
               );
               INSERT INTO characters (id, name) VALUES (1, 'Captain Xendros');
               CREATE TABLE magic_items (
                   id INTEGER PRIMARY KEY AUTOINCREMENT,
                   adventure_id INTEGER,
                   name TEXT NOT NULL,
                   rarity TEXT NOT NULL DEFAULT 'common',
                   type TEXT NOT NULL DEFAULT 'wondrous item',
                   description TEXT NOT NULL DEFAULT '',
                   properties TEXT,
                   attunement_required BOOLEAN NOT NULL DEFAULT 0
               );
               INSERT INTO magic_items (id, adventure_id, name, rarity, properties)
               VALUES (1, 1, 'Cloak of the Manta Ray', 'uncommon', '["water breathing"]'),
                      (2, 2, 'Staff of Power', 'very rare', NULL);
               CREATE TABLE character_magic_items (
                   character_id INTEGER NOT NULL,
                   magic_item_id INTEGER NOT NULL,
                   equipped BOOLEAN NOT NULL DEFAULT 0,
                   PRIMARY KEY(character_id, magic_item_id),
                   FOREIGN KEY(character_id) REFERENCES characters(id) ON DELETE CASCADE,
                   FOREIGN KEY(magic_item_id) REFERENCES magic_items(id) ON DELETE CASCADE
               );
               INSERT INTO character_magic_items VALUES (1, 1, 1);"#,
        )
        .unwrap();
    }

    let store = CampaignStore::open(&path).unwrap();
    assert_eq!(store.convergence_report().magic_items_rebuilt, Some(2));

    let cloak = store.get_magic_item(1).unwrap().unwrap();
    assert_eq!(cloak.name, "Cloak of the Manta Ray");
    assert_eq!(cloak.properties, vec!["water breathing".to_string()]);
    assert_eq!(store.list_magic_items(None).unwrap().len(), 2);

    // The assignment survives the table swap.
    let owned = store.character_magic_items(1).unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].item.name, "Cloak of the Manta Ray");
    assert!(owned[0].equipped);

    let conn = store.connection();
    assert!(!columns(conn, "magic_items").contains(&"adventure_id".to_string()));
    assert!(!table_exists(conn, "magic_items_new"));
    let fk: i64 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    assert_eq!(fk, 1);
    drop(store);

    let before = schema_dump(&path);
    let reopened = CampaignStore::open(&path).unwrap();
    assert!(reopened.convergence_report().is_noop());
    assert_eq!(reopened.character_magic_items(1).unwrap().len(), 1);
    drop(reopened);
    assert_eq!(schema_dump(&path), before);
}

#[test]
fn keyless_assignment_table_gains_pair_uniqueness() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_file(&dir);
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE characters (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 adventure_id INTEGER,
                 name TEXT NOT NULL,
                 role TEXT,
                 description TEXT,
                 tags TEXT
             );
             INSERT INTO characters (id, name) VALUES (1, 'Eda Oweland');
             CREATE TABLE magic_items (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 name TEXT NOT NULL,
                 rarity TEXT NOT NULL DEFAULT 'common',
                 type TEXT NOT NULL DEFAULT 'wondrous item',
                 description TEXT NOT NULL DEFAULT '',
                 properties TEXT,
                 attunement_required BOOLEAN NOT NULL DEFAULT 0
             );
             INSERT INTO magic_items (id, name) VALUES (1, 'Sending Stone');
             CREATE TABLE character_magic_items (
                 character_id INTEGER NOT NULL,
                 magic_item_id INTEGER NOT NULL,
                 equipped BOOLEAN NOT NULL DEFAULT 0
             );
             INSERT INTO character_magic_items VALUES (1, 1, 1), (1, 1, 0);",
        )
        .unwrap();
    }

    let store = CampaignStore::open(&path).unwrap();
    assert_eq!(store.convergence_report().duplicate_assignments_removed, 1);
    let owned = store.character_magic_items(1).unwrap();
    assert_eq!(owned.len(), 1);
    assert!(owned[0].equipped);

    assert!(!store.assign_magic_item(1, 1, false).unwrap());
    assert_eq!(store.bulk_assign_magic_item(1, &[1]).unwrap(), 0);
    assert_eq!(store.character_magic_items(1).unwrap().len(), 1);

    // Upserts need the pair as a conflict target.
    let bundle = store.export_bundle().unwrap();
    store.import_bundle(&bundle, ImportMode::Merge).unwrap();
    store.import_bundle(&bundle, ImportMode::Replace).unwrap();
    assert_eq!(store.character_magic_items(1).unwrap().len(), 1);
}

#[test]
fn seeding_happens_once_and_respects_existing_adventures() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_file(&dir);

    let store = CampaignStore::open(&path).unwrap();
    assert_eq!(store.convergence_report().adventures_seeded, 2);
    store.delete_adventure(1).unwrap();
    drop(store);

    // One adventure left: not empty, so nothing is re-seeded.
    let store = CampaignStore::open(&path).unwrap();
    assert_eq!(store.convergence_report().adventures_seeded, 0);
    let slugs: Vec<_> = store
        .list_adventures()
        .unwrap()
        .into_iter()
        .filter_map(|a| a.slug)
        .collect();
    assert_eq!(slugs, vec!["pharaoh".to_string()]);
}

#[test]
fn deleting_an_adventure_orphans_its_content() {
    let store = CampaignStore::open_in_memory().unwrap();
    let mut npc = NewCharacter::named("Captain Xendros");
    npc.adventure_id = Some(1);
    let npc = store.create_character(&npc).unwrap();

    store.delete_adventure(1).unwrap();

    let npc = store.get_character(npc.id).unwrap().unwrap();
    assert_eq!(npc.adventure_id, None);
}

#[test]
fn deleting_a_character_cascades_to_item_assignments() {
    let store = CampaignStore::open_in_memory().unwrap();
    let hero = store.create_character(&NewCharacter::named("Vola")).unwrap();
    let item = store
        .create_magic_item(&NewMagicItem {
            name: "Trident of Fish Command".into(),
            ..NewMagicItem::default()
        })
        .unwrap();
    assert!(store.assign_magic_item(hero.id, item.id, true).unwrap());

    store.delete_character(hero.id).unwrap();

    let remaining: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM character_magic_items", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
    assert!(store.get_magic_item(item.id).unwrap().is_some());
}

#[test]
fn malformed_json_columns_read_as_empty() {
    let store = CampaignStore::open_in_memory().unwrap();
    let mut hero = NewCharacter::named("Sethrakk");
    hero.equipment = vec!["trident".into(), "net".into()];
    let hero = store.create_character(&hero).unwrap();
    assert_eq!(hero.equipment, vec!["trident".to_string(), "net".to_string()]);

    store
        .connection()
        .execute(
            "UPDATE characters SET equipment = '{broken', skills = 'null' WHERE id = ?1",
            [hero.id],
        )
        .unwrap();

    let reread = store.get_character(hero.id).unwrap().unwrap();
    assert!(reread.equipment.is_empty());
    assert!(reread.skills.is_empty());
    assert_eq!(reread.name, "Sethrakk");
}

#[test]
fn fresh_file_walkthrough() {
    let dir = tempfile::tempdir().unwrap();
    let path = db_file(&dir);
    let store = CampaignStore::open(&path).unwrap();

    let count: i64 = store
        .connection()
        .query_row("SELECT count(*) FROM adventures", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
    assert!(store.get_adventure_by_slug("saltmarsh").unwrap().is_some());
    assert!(store.get_adventure_by_slug("pharaoh").unwrap().is_some());

    let session = store
        .create_session(&NewSession {
            adventure_id: Some(1),
            title: "The Haunted House".into(),
            date: "2024-03-02".into(),
            text: "The party explores the alchemist's mansion.".into(),
        })
        .unwrap();

    store.delete_adventure(1).unwrap();

    let session = store.get_session(session.id).unwrap().unwrap();
    assert_eq!(session.adventure_id, None);
    assert_eq!(session.title, "The Haunted House");
}
