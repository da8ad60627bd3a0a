use rusqlite::{params, OptionalExtension, Row};

use super::{
    require_non_empty, require_patch_non_empty, Assignments, CampaignStore, Result, StoreError,
};
use crate::model::{GlobalNote, GlobalNotePatch, NewGlobalNote};

const COLUMNS: &str = "id, title, text, created_at";

fn map_row(row: &Row) -> rusqlite::Result<GlobalNote> {
    Ok(GlobalNote {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl CampaignStore {
    pub fn create_global_note(&self, new: &NewGlobalNote) -> Result<GlobalNote> {
        require_non_empty("title", &new.title)?;
        let note = self.conn.query_row(
            &format!("INSERT INTO global_notes (title, text) VALUES (?1, ?2) RETURNING {COLUMNS}"),
            params![new.title, new.text],
            map_row,
        )?;
        Ok(note)
    }

    pub fn get_global_note(&self, id: i64) -> Result<Option<GlobalNote>> {
        let note = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM global_notes WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?;
        Ok(note)
    }

    /// Newest first.
    pub fn list_global_notes(&self) -> Result<Vec<GlobalNote>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM global_notes ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], map_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_global_note(&self, id: i64, patch: GlobalNotePatch) -> Result<GlobalNote> {
        require_patch_non_empty("title", &patch.title)?;
        let mut set = Assignments::default();
        set.text("title", patch.title)?;
        set.text("text", patch.text)?;
        self.apply_update("global note", "global_notes", id, set)?;
        self.get_global_note(id)?.ok_or(StoreError::NotFound {
            entity: "global note",
            id,
        })
    }

    pub fn delete_global_note(&self, id: i64) -> Result<()> {
        self.delete_by_id("global note", "global_notes", id)
    }
}
