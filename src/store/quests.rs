use rusqlite::{params, OptionalExtension, Row};

use super::json;
use super::{
    require_non_empty, require_patch_non_empty, Assignments, CampaignStore, Result, StoreError,
};
use crate::model::{NewQuest, ObjectivePatch, Quest, QuestObjective, QuestPatch};

const COLUMNS: &str = "id, adventure_id, title, description, status, priority, type, due_date, \
    assigned_to, tags, created_at, updated_at";

const OBJECTIVE_COLUMNS: &str = "id, quest_id, description, completed, created_at, updated_at";

fn map_row(row: &Row) -> rusqlite::Result<Quest> {
    Ok(Quest {
        id: row.get(0)?,
        adventure_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        priority: row.get(5)?,
        quest_type: row.get(6)?,
        due_date: row.get(7)?,
        assigned_to: row.get(8)?,
        tags: json::decode_or_default("tags", row.get(9)?),
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn map_objective(row: &Row) -> rusqlite::Result<QuestObjective> {
    Ok(QuestObjective {
        id: row.get(0)?,
        quest_id: row.get(1)?,
        description: row.get(2)?,
        completed: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Filters for [`CampaignStore::list_quests`]. Unset fields match anything.
#[derive(Debug, Clone, Default)]
pub struct QuestFilter {
    pub adventure_id: Option<i64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub quest_type: Option<String>,
}

impl CampaignStore {
    pub fn create_quest(&self, new: &NewQuest) -> Result<Quest> {
        require_non_empty("title", &new.title)?;
        let quest = self.conn.query_row(
            &format!(
                "INSERT INTO quests
                 (adventure_id, title, description, status, priority, type, due_date,
                  assigned_to, tags)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 RETURNING {COLUMNS}"
            ),
            params![
                new.adventure_id,
                new.title,
                new.description,
                new.status,
                new.priority,
                new.quest_type,
                new.due_date,
                new.assigned_to,
                json::encode(&new.tags)?,
            ],
            map_row,
        )?;
        Ok(quest)
    }

    pub fn get_quest(&self, id: i64) -> Result<Option<Quest>> {
        let quest = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM quests WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?;
        Ok(quest)
    }

    /// Most recently updated first.
    pub fn list_quests(&self, filter: &QuestFilter) -> Result<Vec<Quest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM quests
             WHERE (?1 IS NULL OR adventure_id = ?1)
               AND (?2 IS NULL OR status = ?2)
               AND (?3 IS NULL OR priority = ?3)
               AND (?4 IS NULL OR type = ?4)
             ORDER BY updated_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(
            params![
                filter.adventure_id,
                filter.status,
                filter.priority,
                filter.quest_type
            ],
            map_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Applies the patch and refreshes `updated_at` when anything changed.
    pub fn update_quest(&self, id: i64, patch: QuestPatch) -> Result<Quest> {
        require_patch_non_empty("title", &patch.title)?;
        let mut set = Assignments::default();
        set.nullable_int("adventure_id", patch.adventure_id);
        set.text("title", patch.title)?;
        set.text("description", patch.description)?;
        set.text("status", patch.status)?;
        set.text("priority", patch.priority)?;
        set.text("type", patch.quest_type)?;
        set.nullable_text("due_date", patch.due_date);
        set.nullable_text("assigned_to", patch.assigned_to);
        set.json("tags", patch.tags)?;
        if !set.is_empty() {
            set.touch("updated_at");
        }
        self.apply_update("quest", "quests", id, set)?;
        self.get_quest(id)?
            .ok_or(StoreError::NotFound { entity: "quest", id })
    }

    /// Deletes a quest; its objectives go with it.
    pub fn delete_quest(&self, id: i64) -> Result<()> {
        self.delete_by_id("quest", "quests", id)
    }

    // ============================================
    // OBJECTIVES
    // ============================================

    pub fn add_objective(&self, quest_id: i64, description: &str) -> Result<QuestObjective> {
        require_non_empty("description", description)?;
        if self.get_quest(quest_id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "quest",
                id: quest_id,
            });
        }
        let objective = self.conn.query_row(
            &format!(
                "INSERT INTO quest_objectives (quest_id, description) VALUES (?1, ?2)
                 RETURNING {OBJECTIVE_COLUMNS}"
            ),
            params![quest_id, description],
            map_objective,
        )?;
        Ok(objective)
    }

    pub fn get_objective(&self, id: i64) -> Result<Option<QuestObjective>> {
        let objective = self
            .conn
            .query_row(
                &format!("SELECT {OBJECTIVE_COLUMNS} FROM quest_objectives WHERE id = ?1"),
                params![id],
                map_objective,
            )
            .optional()?;
        Ok(objective)
    }

    pub fn list_objectives(&self, quest_id: i64) -> Result<Vec<QuestObjective>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {OBJECTIVE_COLUMNS} FROM quest_objectives WHERE quest_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![quest_id], map_objective)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_objective(&self, id: i64, patch: ObjectivePatch) -> Result<QuestObjective> {
        require_patch_non_empty("description", &patch.description)?;
        let mut set = Assignments::default();
        set.text("description", patch.description)?;
        set.flag("completed", patch.completed)?;
        if !set.is_empty() {
            set.touch("updated_at");
        }
        self.apply_update("objective", "quest_objectives", id, set)?;
        self.get_objective(id)?
            .ok_or(StoreError::NotFound { entity: "objective", id })
    }

    pub fn delete_objective(&self, id: i64) -> Result<()> {
        self.delete_by_id("objective", "quest_objectives", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quest(store: &CampaignStore, title: &str) -> Quest {
        store
            .create_quest(&NewQuest {
                adventure_id: Some(1),
                title: title.into(),
                ..NewQuest::default()
            })
            .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let store = CampaignStore::open_in_memory().unwrap();
        let q = quest(&store, "Investigate the haunted house");
        assert_eq!(q.status, "active");
        assert_eq!(q.priority, "medium");
        assert_eq!(q.quest_type, "main");
        assert!(q.tags.is_empty());
        assert_eq!(q.created_at, q.updated_at);
    }

    #[test]
    fn test_delete_cascades_only_own_objectives() {
        let store = CampaignStore::open_in_memory().unwrap();
        let doomed = quest(&store, "Doomed");
        let kept = quest(&store, "Kept");
        store.add_objective(doomed.id, "Find the map").unwrap();
        store.add_objective(doomed.id, "Reach the island").unwrap();
        let survivor = store.add_objective(kept.id, "Talk to Eliander").unwrap();

        store.delete_quest(doomed.id).unwrap();

        let remaining: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM quest_objectives", [], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
        assert!(store.get_objective(survivor.id).unwrap().is_some());
    }

    #[test]
    fn test_filter_by_status() {
        let store = CampaignStore::open_in_memory().unwrap();
        let done = quest(&store, "Done");
        quest(&store, "Open");
        store
            .update_quest(
                done.id,
                QuestPatch {
                    status: Some(Some("completed".into())),
                    ..QuestPatch::default()
                },
            )
            .unwrap();

        let completed = store
            .list_quests(&QuestFilter {
                status: Some("completed".into()),
                ..QuestFilter::default()
            })
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].title, "Done");
        assert_eq!(store.list_quests(&QuestFilter::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_objective_completion() {
        let store = CampaignStore::open_in_memory().unwrap();
        let q = quest(&store, "Salvage the Sea Ghost");
        let objective = store.add_objective(q.id, "Board the ship").unwrap();
        assert!(!objective.completed);

        let done = store
            .update_objective(
                objective.id,
                ObjectivePatch {
                    completed: Some(Some(true)),
                    ..ObjectivePatch::default()
                },
            )
            .unwrap();
        assert!(done.completed);
        assert_eq!(done.description, "Board the ship");
    }

    #[test]
    fn test_objective_for_missing_quest() {
        let store = CampaignStore::open_in_memory().unwrap();
        let err = store.add_objective(12, "Nothing").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_clear_assignee_with_null() {
        let store = CampaignStore::open_in_memory().unwrap();
        let q = store
            .create_quest(&NewQuest {
                title: "Escort".into(),
                assigned_to: Some("Vela".into()),
                due_date: Some("2024-06-01".into()),
                ..NewQuest::default()
            })
            .unwrap();
        let patch: QuestPatch = serde_json::from_str(r#"{"assigned_to": null}"#).unwrap();
        let updated = store.update_quest(q.id, patch).unwrap();
        assert_eq!(updated.assigned_to, None);
        assert_eq!(updated.due_date.as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn test_null_on_required_field_rejected() {
        let store = CampaignStore::open_in_memory().unwrap();
        let q = quest(&store, "Escort");
        let patch: QuestPatch =
            serde_json::from_str(r#"{"title": null, "status": null}"#).unwrap();
        assert_eq!(patch.title, Some(None));

        let err = store.update_quest(q.id, patch).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)), "{err:?}");

        let unchanged = store.get_quest(q.id).unwrap().unwrap();
        assert_eq!(unchanged.title, "Escort");
        assert_eq!(unchanged.status, "active");
        assert_eq!(unchanged.updated_at, q.updated_at);

        let patch: ObjectivePatch = serde_json::from_str(r#"{"completed": null}"#).unwrap();
        let objective = store.add_objective(q.id, "Reach the keep").unwrap();
        assert!(store.update_objective(objective.id, patch).is_err());
    }
}
