use rusqlite::{params, OptionalExtension, Row};

use super::json;
use super::{
    require_non_empty, require_patch_non_empty, Assignments, CampaignStore, Result, StoreError,
};
use crate::model::{Location, LocationPatch, NewLocation};

const COLUMNS: &str = "id, adventure_id, name, description, notes, tags";

fn map_row(row: &Row) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        adventure_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        notes: row.get(4)?,
        tags: json::decode_or_default("tags", row.get(5)?),
    })
}

impl CampaignStore {
    pub fn create_location(&self, new: &NewLocation) -> Result<Location> {
        require_non_empty("name", &new.name)?;
        let location = self.conn.query_row(
            &format!(
                "INSERT INTO locations (adventure_id, name, description, notes, tags)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING {COLUMNS}"
            ),
            params![
                new.adventure_id,
                new.name,
                new.description,
                new.notes,
                json::encode(&new.tags)?,
            ],
            map_row,
        )?;
        Ok(location)
    }

    pub fn get_location(&self, id: i64) -> Result<Option<Location>> {
        let location = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM locations WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?;
        Ok(location)
    }

    pub fn list_locations(&self, adventure_id: Option<i64>) -> Result<Vec<Location>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM locations
             WHERE ?1 IS NULL OR adventure_id = ?1
             ORDER BY name COLLATE NOCASE"
        ))?;
        let rows = stmt.query_map(params![adventure_id], map_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_location(&self, id: i64, patch: LocationPatch) -> Result<Location> {
        require_patch_non_empty("name", &patch.name)?;
        let mut set = Assignments::default();
        set.nullable_int("adventure_id", patch.adventure_id);
        set.text("name", patch.name)?;
        set.nullable_text("description", patch.description);
        set.nullable_text("notes", patch.notes);
        set.json("tags", patch.tags)?;
        self.apply_update("location", "locations", id, set)?;
        self.get_location(id)?
            .ok_or(StoreError::NotFound { entity: "location", id })
    }

    pub fn delete_location(&self, id: i64) -> Result<()> {
        self.delete_by_id("location", "locations", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        let store = CampaignStore::open_in_memory().unwrap();
        let created = store
            .create_location(&NewLocation {
                adventure_id: Some(1),
                name: "Haunted House".into(),
                tags: vec!["haunted".into(), "smugglers".into()],
                ..NewLocation::default()
            })
            .unwrap();

        let read = store.get_location(created.id).unwrap().unwrap();
        assert_eq!(read.tags, vec!["haunted".to_string(), "smugglers".to_string()]);
    }

    #[test]
    fn test_malformed_tags_read_as_empty() {
        let store = CampaignStore::open_in_memory().unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO locations (id, name, tags) VALUES (7, 'Saltmarsh', '{oops')",
                [],
            )
            .unwrap();

        let read = store.get_location(7).unwrap().unwrap();
        assert!(read.tags.is_empty());
    }

    #[test]
    fn test_null_tags_patch_clears_column() {
        let store = CampaignStore::open_in_memory().unwrap();
        let created = store
            .create_location(&NewLocation {
                name: "Sea Ghost".into(),
                tags: vec!["ship".into()],
                ..NewLocation::default()
            })
            .unwrap();

        let patch: LocationPatch = serde_json::from_str(r#"{"tags": null}"#).unwrap();
        let updated = store.update_location(created.id, patch).unwrap();
        assert!(updated.tags.is_empty());

        let raw: Option<String> = store
            .connection()
            .query_row("SELECT tags FROM locations WHERE id = ?1", [created.id], |r| r.get(0))
            .unwrap();
        assert_eq!(raw, None);
    }

    #[test]
    fn test_list_without_filter_includes_global_locations() {
        let store = CampaignStore::open_in_memory().unwrap();
        store
            .create_location(&NewLocation {
                name: "Waterdeep".into(),
                ..NewLocation::default()
            })
            .unwrap();
        store
            .create_location(&NewLocation {
                adventure_id: Some(2),
                name: "Pyramid of Amun-Re".into(),
                ..NewLocation::default()
            })
            .unwrap();

        assert_eq!(store.list_locations(None).unwrap().len(), 2);
        assert_eq!(store.list_locations(Some(2)).unwrap().len(), 1);
    }
}
