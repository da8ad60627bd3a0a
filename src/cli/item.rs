//! Magic item commands

use anyhow::Result;

use super::{parse_body, print_json, truncate};
use crate::model::{MagicItemPatch, NewMagicItem};
use crate::store::CampaignStore;

pub fn list(store: &CampaignStore, rarity: Option<String>) -> Result<()> {
    let items = store.list_magic_items(rarity.as_deref())?;
    if items.is_empty() {
        println!("No magic items found.");
        return Ok(());
    }

    println!("{:<5} {:<28} {:<12} {:<18} {}", "ID", "Name", "Rarity", "Type", "Attune");
    println!("{}", "-".repeat(75));
    for i in items {
        println!(
            "{:<5} {:<28} {:<12} {:<18} {}",
            i.id,
            truncate(&i.name, 28),
            i.rarity,
            truncate(&i.item_type, 18),
            if i.attunement_required { "yes" } else { "no" },
        );
    }
    Ok(())
}

pub fn show(store: &CampaignStore, id: i64) -> Result<()> {
    let item = store
        .get_magic_item(id)?
        .ok_or_else(|| anyhow::anyhow!("Magic item not found: {}", id))?;
    print_json(&item)
}

pub fn create(store: &CampaignStore, body: &str) -> Result<()> {
    let new: NewMagicItem = parse_body(body)?;
    let item = store.create_magic_item(&new)?;
    println!("Magic item '{}' created with ID: {}", item.name, item.id);
    Ok(())
}

pub fn update(store: &CampaignStore, id: i64, body: &str) -> Result<()> {
    let patch: MagicItemPatch = parse_body(body)?;
    let item = store.update_magic_item(id, patch)?;
    print_json(&item)
}

pub fn delete(store: &CampaignStore, id: i64) -> Result<()> {
    store.delete_magic_item(id)?;
    println!("Deleted magic item {}", id);
    Ok(())
}

/// Assigns an item to one or more characters. A single character may be
/// equipped right away; several go through the bulk path in one transaction.
pub fn assign(store: &CampaignStore, item: i64, characters: &[i64], equipped: bool) -> Result<()> {
    match characters {
        [] => anyhow::bail!("At least one character is required"),
        [character] => {
            if store.assign_magic_item(*character, item, equipped)? {
                println!("Assigned magic item {} to character {}", item, character);
            } else {
                println!("Character {} already has magic item {}", character, item);
            }
        }
        many => {
            let added = store.bulk_assign_magic_item(item, many)?;
            println!(
                "Assigned magic item {} to {} of {} characters",
                item,
                added,
                many.len()
            );
        }
    }
    Ok(())
}

pub fn unassign(store: &CampaignStore, item: i64, character: i64) -> Result<()> {
    store.unassign_magic_item(character, item)?;
    println!("Removed magic item {} from character {}", item, character);
    Ok(())
}

pub fn equip(store: &CampaignStore, item: i64, character: i64, equipped: bool) -> Result<()> {
    store.set_magic_item_equipped(character, item, equipped)?;
    let verb = if equipped { "Equipped" } else { "Unequipped" };
    println!("{} magic item {} on character {}", verb, item, character);
    Ok(())
}
