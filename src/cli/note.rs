use anyhow::Result;

use super::{parse_body, print_json, truncate};
use crate::model::{GlobalNotePatch, NewGlobalNote};
use crate::store::CampaignStore;

pub fn list(store: &CampaignStore) -> Result<()> {
    let notes = store.list_global_notes()?;
    if notes.is_empty() {
        println!("No notes found.");
        return Ok(());
    }

    println!("{:<5} {:<20} {:<28} {}", "ID", "Created", "Title", "Text");
    println!("{}", "-".repeat(90));
    for n in notes {
        println!(
            "{:<5} {:<20} {:<28} {}",
            n.id,
            n.created_at,
            truncate(&n.title, 28),
            truncate(&n.text, 32),
        );
    }
    Ok(())
}

pub fn show(store: &CampaignStore, id: i64) -> Result<()> {
    let note = store
        .get_global_note(id)?
        .ok_or_else(|| anyhow::anyhow!("Note not found: {}", id))?;
    print_json(&note)
}

pub fn add(store: &CampaignStore, title: String, text: Option<String>) -> Result<()> {
    let note = store.create_global_note(&NewGlobalNote {
        title,
        text: text.unwrap_or_default(),
    })?;
    println!("Note '{}' added with ID: {}", note.title, note.id);
    Ok(())
}

pub fn update(store: &CampaignStore, id: i64, body: &str) -> Result<()> {
    let patch: GlobalNotePatch = parse_body(body)?;
    let note = store.update_global_note(id, patch)?;
    print_json(&note)
}

pub fn delete(store: &CampaignStore, id: i64) -> Result<()> {
    store.delete_global_note(id)?;
    println!("Deleted note {}", id);
    Ok(())
}
