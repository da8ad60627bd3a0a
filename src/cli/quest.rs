use anyhow::Result;

use super::{or_dash, parse_body, print_json, truncate};
use crate::model::{NewQuest, ObjectivePatch, QuestPatch};
use crate::store::{CampaignStore, QuestFilter};

pub fn list(store: &CampaignStore, filter: QuestFilter) -> Result<()> {
    let quests = store.list_quests(&filter)?;
    if quests.is_empty() {
        println!("No quests found.");
        return Ok(());
    }

    println!(
        "{:<5} {:<32} {:<10} {:<9} {:<9} {}",
        "ID", "Title", "Status", "Priority", "Type", "Assigned"
    );
    println!("{}", "-".repeat(85));
    for q in quests {
        println!(
            "{:<5} {:<32} {:<10} {:<9} {:<9} {}",
            q.id,
            truncate(&q.title, 32),
            q.status,
            q.priority,
            q.quest_type,
            or_dash(q.assigned_to.as_deref()),
        );
    }
    Ok(())
}

pub fn show(store: &CampaignStore, id: i64) -> Result<()> {
    let quest = store
        .get_quest(id)?
        .ok_or_else(|| anyhow::anyhow!("Quest not found: {}", id))?;

    println!("\n{}", "=".repeat(70));
    println!("Quest {}: {}", quest.id, quest.title);
    println!(
        "Status: {} | Priority: {} | Type: {}",
        quest.status, quest.priority, quest.quest_type
    );
    if let Some(due) = &quest.due_date {
        println!("Due: {}", due);
    }
    println!("{}", "=".repeat(70));
    if !quest.description.is_empty() {
        println!("{}\n", quest.description);
    }

    for o in store.list_objectives(id)? {
        let mark = if o.completed { "x" } else { " " };
        println!("  [{}] #{} {}", mark, o.id, o.description);
    }
    Ok(())
}

pub fn create(store: &CampaignStore, body: &str) -> Result<()> {
    let new: NewQuest = parse_body(body)?;
    let quest = store.create_quest(&new)?;
    println!("Quest '{}' created with ID: {}", quest.title, quest.id);
    Ok(())
}

pub fn update(store: &CampaignStore, id: i64, body: &str) -> Result<()> {
    let patch: QuestPatch = parse_body(body)?;
    let quest = store.update_quest(id, patch)?;
    print_json(&quest)
}

pub fn delete(store: &CampaignStore, id: i64) -> Result<()> {
    store.delete_quest(id)?;
    println!("Deleted quest {} and its objectives", id);
    Ok(())
}

pub fn add_objective(store: &CampaignStore, quest: i64, description: &str) -> Result<()> {
    let objective = store.add_objective(quest, description)?;
    println!("Objective #{} added to quest {}", objective.id, quest);
    Ok(())
}

pub fn complete_objective(store: &CampaignStore, id: i64, completed: bool) -> Result<()> {
    let objective = store.update_objective(
        id,
        ObjectivePatch {
            completed: Some(Some(completed)),
            ..ObjectivePatch::default()
        },
    )?;
    let state = if objective.completed { "complete" } else { "open" };
    println!("Objective #{} marked {}", objective.id, state);
    Ok(())
}

pub fn delete_objective(store: &CampaignStore, id: i64) -> Result<()> {
    store.delete_objective(id)?;
    println!("Deleted objective #{}", id);
    Ok(())
}
