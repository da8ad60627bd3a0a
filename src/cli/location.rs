use anyhow::Result;

use super::{parse_body, print_json, truncate};
use crate::model::{LocationPatch, NewLocation};
use crate::store::CampaignStore;

pub fn list(store: &CampaignStore, adventure: Option<i64>) -> Result<()> {
    let locations = store.list_locations(adventure)?;
    if locations.is_empty() {
        println!("No locations found.");
        return Ok(());
    }

    println!("{:<5} {:<28} {:<10} {}", "ID", "Name", "Adventure", "Tags");
    println!("{}", "-".repeat(70));
    for l in locations {
        println!(
            "{:<5} {:<28} {:<10} {}",
            l.id,
            truncate(&l.name, 28),
            l.adventure_id.map_or("-".to_string(), |a| a.to_string()),
            l.tags.join(", "),
        );
    }
    Ok(())
}

pub fn show(store: &CampaignStore, id: i64) -> Result<()> {
    let location = store
        .get_location(id)?
        .ok_or_else(|| anyhow::anyhow!("Location not found: {}", id))?;
    print_json(&location)
}

pub fn create(store: &CampaignStore, body: &str) -> Result<()> {
    let new: NewLocation = parse_body(body)?;
    let location = store.create_location(&new)?;
    println!("Location '{}' created with ID: {}", location.name, location.id);
    Ok(())
}

pub fn update(store: &CampaignStore, id: i64, body: &str) -> Result<()> {
    let patch: LocationPatch = parse_body(body)?;
    let location = store.update_location(id, patch)?;
    print_json(&location)
}

pub fn delete(store: &CampaignStore, id: i64) -> Result<()> {
    store.delete_location(id)?;
    println!("Deleted location {}", id);
    Ok(())
}
