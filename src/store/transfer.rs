//! Whole-database export and import
//!
//! A bundle is a plain snapshot of every content table with ids preserved.
//! Import runs in a single transaction: either every row lands or the
//! database is left exactly as it was.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::error::{Result, StoreError};
use super::json;
use super::schema::CONTENT_TABLES;
use super::CampaignStore;
use crate::model::{
    Adventure, Character, CharacterMagicItem, GlobalNote, Location, MagicItem, Quest,
    QuestObjective, Session,
};

/// Bumped whenever the bundle layout changes incompatibly.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub adventures: Vec<Adventure>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub global_notes: Vec<GlobalNote>,
    #[serde(default)]
    pub magic_items: Vec<MagicItem>,
    #[serde(default)]
    pub character_magic_items: Vec<CharacterMagicItem>,
    #[serde(default)]
    pub quests: Vec<Quest>,
    #[serde(default)]
    pub quest_objectives: Vec<QuestObjective>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Upsert every row by id, keeping rows the bundle does not mention.
    Merge,
    /// Delete all existing content first.
    Replace,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub rows_written: usize,
}

impl CampaignStore {
    /// Reads every table inside one deferred transaction so the bundle is a
    /// single snapshot even when another connection writes meanwhile.
    pub fn export_bundle(&self) -> Result<ExportBundle> {
        let tx = self.conn.unchecked_transaction()?;

        let mut character_magic_items = Vec::new();
        {
            let mut stmt = tx.prepare(
                "SELECT character_id, magic_item_id, equipped FROM character_magic_items
                 ORDER BY character_id, magic_item_id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(CharacterMagicItem {
                    character_id: row.get(0)?,
                    magic_item_id: row.get(1)?,
                    equipped: row.get(2)?,
                })
            })?;
            for row in rows {
                character_magic_items.push(row?);
            }
        }

        let mut quest_objectives = Vec::new();
        let quests = self.list_quests(&Default::default())?;
        for quest in &quests {
            quest_objectives.extend(self.list_objectives(quest.id)?);
        }

        let bundle = ExportBundle {
            version: BUNDLE_FORMAT_VERSION,
            exported_at: Utc::now(),
            adventures: self.list_adventures()?,
            sessions: self.list_sessions(None)?,
            characters: self.list_characters(None)?,
            locations: self.list_locations(None)?,
            global_notes: self.list_global_notes()?,
            magic_items: self.list_magic_items(None)?,
            character_magic_items,
            quests,
            quest_objectives,
        };
        tx.commit()?;

        Ok(bundle)
    }

    pub fn import_bundle(&self, bundle: &ExportBundle, mode: ImportMode) -> Result<ImportReport> {
        if bundle.version > BUNDLE_FORMAT_VERSION {
            return Err(StoreError::Invalid(format!(
                "bundle format {} is newer than supported format {}",
                bundle.version, BUNDLE_FORMAT_VERSION
            )));
        }

        let tx = self.conn.unchecked_transaction()?;
        if mode == ImportMode::Replace {
            for table in CONTENT_TABLES {
                tx.execute(&format!("DELETE FROM {table}"), [])?;
            }
        }
        let rows_written = write_bundle(&tx, bundle)?;
        tx.commit()?;

        tracing::info!(rows = rows_written, ?mode, "imported bundle");
        Ok(ImportReport { rows_written })
    }
}

/// `INSERT ... ON CONFLICT DO UPDATE` for the given columns. Updating in
/// place keeps `ON DELETE` actions from firing on rows being overwritten.
fn upsert_sql(table: &str, columns: &[&str], key: &[&str]) -> String {
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = columns
        .iter()
        .filter(|c| !key.contains(*c))
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders}) ON CONFLICT({}) DO UPDATE SET {updates}",
        columns.join(", "),
        key.join(", ")
    )
}

/// Inserts parents before children so foreign keys hold row by row.
fn write_bundle(conn: &Connection, bundle: &ExportBundle) -> Result<usize> {
    let mut written = 0;

    let sql = upsert_sql("adventures", &["id", "slug", "title", "description"], &["id"]);
    for a in &bundle.adventures {
        written += conn.execute(&sql, params![a.id, a.slug, a.title, a.description])?;
    }

    let sql = upsert_sql(
        "sessions",
        &["id", "adventure_id", "title", "date", "text"],
        &["id"],
    );
    for s in &bundle.sessions {
        written += conn.execute(&sql, params![s.id, s.adventure_id, s.title, s.date, s.text])?;
    }

    let sql = upsert_sql("characters", CHARACTER_UPSERT_COLUMNS, &["id"]);
    for c in &bundle.characters {
        written += write_character(conn, &sql, c)?;
    }

    let sql = upsert_sql(
        "locations",
        &["id", "adventure_id", "name", "description", "notes", "tags"],
        &["id"],
    );
    for l in &bundle.locations {
        written += conn.execute(
            &sql,
            params![
                l.id,
                l.adventure_id,
                l.name,
                l.description,
                l.notes,
                json::encode(&l.tags)?
            ],
        )?;
    }

    let sql = upsert_sql("global_notes", &["id", "title", "text", "created_at"], &["id"]);
    for n in &bundle.global_notes {
        written += conn.execute(&sql, params![n.id, n.title, n.text, n.created_at])?;
    }

    let sql = upsert_sql(
        "magic_items",
        &[
            "id",
            "name",
            "rarity",
            "type",
            "description",
            "properties",
            "attunement_required",
        ],
        &["id"],
    );
    for m in &bundle.magic_items {
        written += conn.execute(
            &sql,
            params![
                m.id,
                m.name,
                m.rarity,
                m.item_type,
                m.description,
                json::encode(&m.properties)?,
                m.attunement_required
            ],
        )?;
    }

    let sql = upsert_sql(
        "character_magic_items",
        &["character_id", "magic_item_id", "equipped"],
        &["character_id", "magic_item_id"],
    );
    for cmi in &bundle.character_magic_items {
        written += conn.execute(&sql, params![cmi.character_id, cmi.magic_item_id, cmi.equipped])?;
    }

    let sql = upsert_sql(
        "quests",
        &[
            "id",
            "adventure_id",
            "title",
            "description",
            "status",
            "priority",
            "type",
            "due_date",
            "assigned_to",
            "tags",
            "created_at",
            "updated_at",
        ],
        &["id"],
    );
    for q in &bundle.quests {
        written += conn.execute(
            &sql,
            params![
                q.id,
                q.adventure_id,
                q.title,
                q.description,
                q.status,
                q.priority,
                q.quest_type,
                q.due_date,
                q.assigned_to,
                json::encode(&q.tags)?,
                q.created_at,
                q.updated_at
            ],
        )?;
    }

    let sql = upsert_sql(
        "quest_objectives",
        &[
            "id",
            "quest_id",
            "description",
            "completed",
            "created_at",
            "updated_at",
        ],
        &["id"],
    );
    for o in &bundle.quest_objectives {
        written += conn.execute(
            &sql,
            params![
                o.id,
                o.quest_id,
                o.description,
                o.completed,
                o.created_at,
                o.updated_at
            ],
        )?;
    }

    Ok(written)
}

/// Column order matches the parameter order in [`write_character`].
const CHARACTER_UPSERT_COLUMNS: &[&str] = &[
    "id",
    "adventure_id",
    "name",
    "race",
    "class",
    "level",
    "background",
    "alignment",
    "experience",
    "classes",
    "items",
    "strength",
    "dexterity",
    "constitution",
    "intelligence",
    "wisdom",
    "charisma",
    "hit_points",
    "max_hit_points",
    "armor_class",
    "initiative",
    "speed",
    "proficiency_bonus",
    "saving_throws",
    "skills",
    "equipment",
    "weapons",
    "spells",
    "spellcasting_ability",
    "spell_save_dc",
    "spell_attack_bonus",
    "personality_traits",
    "ideals",
    "bonds",
    "flaws",
    "backstory",
    "role",
    "description",
    "tags",
];

fn write_character(conn: &Connection, sql: &str, c: &Character) -> Result<usize> {
    let written = conn.execute(
        sql,
        params![
            c.id,
            c.adventure_id,
            c.name,
            c.race,
            c.class,
            c.level,
            c.background,
            c.alignment,
            c.experience,
            json::encode(&c.classes)?,
            json::encode(&c.items)?,
            c.abilities.strength,
            c.abilities.dexterity,
            c.abilities.constitution,
            c.abilities.intelligence,
            c.abilities.wisdom,
            c.abilities.charisma,
            c.hit_points,
            c.max_hit_points,
            c.armor_class,
            c.initiative,
            c.speed,
            c.proficiency_bonus,
            json::encode(&c.saving_throws)?,
            json::encode(&c.skills)?,
            json::encode(&c.equipment)?,
            json::encode(&c.weapons)?,
            json::encode(&c.spells)?,
            c.spellcasting_ability,
            c.spell_save_dc,
            c.spell_attack_bonus,
            json::encode(&c.personality_traits)?,
            json::encode(&c.ideals)?,
            json::encode(&c.bonds)?,
            json::encode(&c.flaws)?,
            c.backstory,
            c.role,
            c.description,
            json::encode(&c.tags)?,
        ],
    )?;
    Ok(written)
}
