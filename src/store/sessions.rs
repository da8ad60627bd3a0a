use rusqlite::{params, OptionalExtension, Row};

use super::{
    require_non_empty, require_patch_non_empty, Assignments, CampaignStore, Result, StoreError,
};
use crate::model::{NewSession, Session, SessionPatch};

const COLUMNS: &str = "id, adventure_id, title, date, text";

fn map_row(row: &Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        adventure_id: row.get(1)?,
        title: row.get(2)?,
        date: row.get(3)?,
        text: row.get(4)?,
    })
}

impl CampaignStore {
    pub fn create_session(&self, new: &NewSession) -> Result<Session> {
        require_non_empty("title", &new.title)?;
        require_non_empty("date", &new.date)?;
        let session = self.conn.query_row(
            &format!(
                "INSERT INTO sessions (adventure_id, title, date, text) VALUES (?1, ?2, ?3, ?4)
                 RETURNING {COLUMNS}"
            ),
            params![new.adventure_id, new.title, new.date, new.text],
            map_row,
        )?;
        Ok(session)
    }

    pub fn get_session(&self, id: i64) -> Result<Option<Session>> {
        let session = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM sessions WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?;
        Ok(session)
    }

    /// Sessions in play order, optionally restricted to one adventure.
    pub fn list_sessions(&self, adventure_id: Option<i64>) -> Result<Vec<Session>> {
        let rows = match adventure_id {
            Some(adventure) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM sessions WHERE adventure_id = ?1 ORDER BY date, id"
                ))?;
                let rows = stmt.query_map(params![adventure], map_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("SELECT {COLUMNS} FROM sessions ORDER BY date, id"))?;
                let rows = stmt.query_map([], map_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(rows)
    }

    pub fn update_session(&self, id: i64, patch: SessionPatch) -> Result<Session> {
        require_patch_non_empty("title", &patch.title)?;
        require_patch_non_empty("date", &patch.date)?;
        let mut set = Assignments::default();
        set.nullable_int("adventure_id", patch.adventure_id);
        set.text("title", patch.title)?;
        set.text("date", patch.date)?;
        set.text("text", patch.text)?;
        self.apply_update("session", "sessions", id, set)?;
        self.get_session(id)?
            .ok_or(StoreError::NotFound { entity: "session", id })
    }

    pub fn delete_session(&self, id: i64) -> Result<()> {
        self.delete_by_id("session", "sessions", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(adventure_id: Option<i64>, title: &str, date: &str) -> NewSession {
        NewSession {
            adventure_id,
            title: title.into(),
            date: date.into(),
            text: String::new(),
        }
    }

    #[test]
    fn test_list_filters_and_orders_by_date() {
        let store = CampaignStore::open_in_memory().unwrap();
        store.create_session(&session(Some(1), "Later", "2024-05-02")).unwrap();
        store.create_session(&session(Some(1), "Earlier", "2024-04-01")).unwrap();
        store.create_session(&session(Some(2), "Elsewhere", "2024-01-01")).unwrap();

        let titles: Vec<_> = store
            .list_sessions(Some(1))
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Earlier", "Later"]);
        assert_eq!(store.list_sessions(None).unwrap().len(), 3);
    }

    #[test]
    fn test_unknown_adventure_is_conflict() {
        let store = CampaignStore::open_in_memory().unwrap();
        let err = store
            .create_session(&session(Some(99), "Lost", "2024-01-01"))
            .unwrap_err();
        assert!(err.is_conflict(), "{err}");
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let store = CampaignStore::open_in_memory().unwrap();
        let created = store
            .create_session(&NewSession {
                text: "The party met the sea hag.".into(),
                ..session(Some(1), "Session 1", "2024-01-01")
            })
            .unwrap();

        let updated = store
            .update_session(
                created.id,
                SessionPatch {
                    title: Some(Some("The Sinister Secret".into())),
                    ..SessionPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "The Sinister Secret");
        assert_eq!(updated.text, "The party met the sea hag.");
        assert_eq!(updated.adventure_id, Some(1));

        let detached = store
            .update_session(
                created.id,
                SessionPatch {
                    adventure_id: Some(None),
                    ..SessionPatch::default()
                },
            )
            .unwrap();
        assert_eq!(detached.adventure_id, None);
    }

    #[test]
    fn test_update_missing_session() {
        let store = CampaignStore::open_in_memory().unwrap();
        let err = store.update_session(42, SessionPatch::default()).unwrap_err();
        assert!(err.is_not_found());
    }
}
