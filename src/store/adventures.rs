use rusqlite::{params, OptionalExtension, Row};

use super::{
    require_non_empty, require_patch_non_empty, Assignments, CampaignStore, Result, StoreError,
};
use crate::model::{Adventure, AdventurePatch, NewAdventure};

const COLUMNS: &str = "id, slug, title, description";

fn map_row(row: &Row) -> rusqlite::Result<Adventure> {
    Ok(Adventure {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
    })
}

impl CampaignStore {
    pub fn create_adventure(&self, new: &NewAdventure) -> Result<Adventure> {
        require_non_empty("title", &new.title)?;
        let adventure = self.conn.query_row(
            &format!(
                "INSERT INTO adventures (slug, title, description) VALUES (?1, ?2, ?3)
                 RETURNING {COLUMNS}"
            ),
            params![new.slug, new.title, new.description],
            map_row,
        )?;
        Ok(adventure)
    }

    pub fn get_adventure(&self, id: i64) -> Result<Option<Adventure>> {
        let adventure = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM adventures WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?;
        Ok(adventure)
    }

    pub fn get_adventure_by_slug(&self, slug: &str) -> Result<Option<Adventure>> {
        let adventure = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM adventures WHERE slug = ?1"),
                params![slug],
                map_row,
            )
            .optional()?;
        Ok(adventure)
    }

    pub fn list_adventures(&self) -> Result<Vec<Adventure>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM adventures ORDER BY id"))?;
        let rows = stmt.query_map([], map_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_adventure(&self, id: i64, patch: AdventurePatch) -> Result<Adventure> {
        require_patch_non_empty("title", &patch.title)?;
        let mut set = Assignments::default();
        set.nullable_text("slug", patch.slug);
        set.text("title", patch.title)?;
        set.nullable_text("description", patch.description);
        self.apply_update("adventure", "adventures", id, set)?;
        self.fetch_adventure(id)
    }

    /// Deletes an adventure. Children keep their rows with `adventure_id`
    /// set to `NULL`.
    pub fn delete_adventure(&self, id: i64) -> Result<()> {
        self.delete_by_id("adventure", "adventures", id)
    }

    fn fetch_adventure(&self, id: i64) -> Result<Adventure> {
        self.get_adventure(id)?.ok_or(StoreError::NotFound {
            entity: "adventure",
            id,
        })
    }
}
