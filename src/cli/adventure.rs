use anyhow::Result;

use super::{or_dash, parse_body, print_json, truncate};
use crate::model::{AdventurePatch, NewAdventure};
use crate::store::CampaignStore;

pub fn list(store: &CampaignStore) -> Result<()> {
    let adventures = store.list_adventures()?;
    if adventures.is_empty() {
        println!("No adventures found.");
        return Ok(());
    }

    println!("{:<5} {:<16} {:<30} {}", "ID", "Slug", "Title", "Description");
    println!("{}", "-".repeat(90));
    for a in adventures {
        println!(
            "{:<5} {:<16} {:<30} {}",
            a.id,
            or_dash(a.slug.as_deref()),
            truncate(&a.title, 30),
            truncate(a.description.as_deref().unwrap_or(""), 40),
        );
    }
    Ok(())
}

pub fn show(store: &CampaignStore, id: i64) -> Result<()> {
    let adventure = store
        .get_adventure(id)?
        .ok_or_else(|| anyhow::anyhow!("Adventure not found: {}", id))?;
    print_json(&adventure)
}

pub fn create(store: &CampaignStore, body: &str) -> Result<()> {
    let new: NewAdventure = parse_body(body)?;
    let adventure = store.create_adventure(&new)?;
    println!("Adventure '{}' created with ID: {}", adventure.title, adventure.id);
    Ok(())
}

pub fn update(store: &CampaignStore, id: i64, body: &str) -> Result<()> {
    let patch: AdventurePatch = parse_body(body)?;
    let adventure = store.update_adventure(id, patch)?;
    print_json(&adventure)
}

pub fn delete(store: &CampaignStore, id: i64) -> Result<()> {
    store.delete_adventure(id)?;
    println!("Deleted adventure {} (its content is kept without an adventure)", id);
    Ok(())
}
