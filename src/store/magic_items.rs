//! Magic items and their ownership by characters.
//!
//! Items are global; which character carries an item is recorded in the
//! `character_magic_items` join table.

use rusqlite::{params, OptionalExtension, Row};

use super::json;
use super::{
    require_non_empty, require_patch_non_empty, Assignments, CampaignStore, Result, StoreError,
};
use crate::model::{MagicItem, MagicItemPatch, NewMagicItem, OwnedMagicItem};

const COLUMNS: &str = "id, name, rarity, type, description, properties, attunement_required";

fn map_row(row: &Row) -> rusqlite::Result<MagicItem> {
    Ok(MagicItem {
        id: row.get(0)?,
        name: row.get(1)?,
        rarity: row.get(2)?,
        item_type: row.get(3)?,
        description: row.get(4)?,
        properties: json::decode_or_default("properties", row.get(5)?),
        attunement_required: row.get(6)?,
    })
}

impl CampaignStore {
    pub fn create_magic_item(&self, new: &NewMagicItem) -> Result<MagicItem> {
        require_non_empty("name", &new.name)?;
        let item = self.conn.query_row(
            &format!(
                "INSERT INTO magic_items
                 (name, rarity, type, description, properties, attunement_required)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING {COLUMNS}"
            ),
            params![
                new.name,
                new.rarity,
                new.item_type,
                new.description,
                json::encode(&new.properties)?,
                new.attunement_required,
            ],
            map_row,
        )?;
        Ok(item)
    }

    pub fn get_magic_item(&self, id: i64) -> Result<Option<MagicItem>> {
        let item = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM magic_items WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?;
        Ok(item)
    }

    /// Items sorted by name, optionally filtered by rarity.
    pub fn list_magic_items(&self, rarity: Option<&str>) -> Result<Vec<MagicItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM magic_items
             WHERE ?1 IS NULL OR rarity = ?1
             ORDER BY name COLLATE NOCASE, id"
        ))?;
        let rows = stmt.query_map(params![rarity], map_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_magic_item(&self, id: i64, patch: MagicItemPatch) -> Result<MagicItem> {
        require_patch_non_empty("name", &patch.name)?;
        let mut set = Assignments::default();
        set.text("name", patch.name)?;
        set.text("rarity", patch.rarity)?;
        set.text("type", patch.item_type)?;
        set.text("description", patch.description)?;
        set.json("properties", patch.properties)?;
        set.flag("attunement_required", patch.attunement_required)?;
        self.apply_update("magic item", "magic_items", id, set)?;
        self.get_magic_item(id)?.ok_or(StoreError::NotFound {
            entity: "magic item",
            id,
        })
    }

    pub fn delete_magic_item(&self, id: i64) -> Result<()> {
        self.delete_by_id("magic item", "magic_items", id)
    }

    // ============================================
    // OWNERSHIP
    // ============================================

    /// Gives an item to a character. Returns `false` when the pair was
    /// already assigned, in which case nothing changes.
    pub fn assign_magic_item(
        &self,
        character_id: i64,
        magic_item_id: i64,
        equipped: bool,
    ) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO character_magic_items (character_id, magic_item_id, equipped)
             VALUES (?1, ?2, ?3)",
            params![character_id, magic_item_id, equipped],
        )?;
        Ok(inserted > 0)
    }

    /// Assigns one item to many characters atomically. Returns how many new
    /// assignments were made; existing ones are left as they are.
    pub fn bulk_assign_magic_item(
        &self,
        magic_item_id: i64,
        character_ids: &[i64],
    ) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO character_magic_items (character_id, magic_item_id, equipped)
                 VALUES (?1, ?2, 0)",
            )?;
            for character_id in character_ids {
                inserted += stmt.execute(params![character_id, magic_item_id])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn unassign_magic_item(&self, character_id: i64, magic_item_id: i64) -> Result<()> {
        let removed = self.conn.execute(
            "DELETE FROM character_magic_items WHERE character_id = ?1 AND magic_item_id = ?2",
            params![character_id, magic_item_id],
        )?;
        if removed == 0 {
            return Err(StoreError::NotFound {
                entity: "magic item assignment",
                id: magic_item_id,
            });
        }
        Ok(())
    }

    pub fn set_magic_item_equipped(
        &self,
        character_id: i64,
        magic_item_id: i64,
        equipped: bool,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE character_magic_items SET equipped = ?3
             WHERE character_id = ?1 AND magic_item_id = ?2",
            params![character_id, magic_item_id, equipped],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "magic item assignment",
                id: magic_item_id,
            });
        }
        Ok(())
    }

    pub fn character_magic_items(&self, character_id: i64) -> Result<Vec<OwnedMagicItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.id, m.name, m.rarity, m.type, m.description, m.properties,
                    m.attunement_required, cmi.equipped
             FROM character_magic_items cmi
             JOIN magic_items m ON m.id = cmi.magic_item_id
             WHERE cmi.character_id = ?1
             ORDER BY m.name COLLATE NOCASE",
        )?;
        let rows = stmt.query_map(params![character_id], |row| {
            Ok(OwnedMagicItem {
                item: map_row(row)?,
                equipped: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
