//! Character (and legacy NPC) commands

use anyhow::Result;

use super::{or_dash, parse_body, print_json, truncate};
use crate::model::{AbilityScores, CharacterPatch, NewCharacter};
use crate::store::CampaignStore;

pub fn list(store: &CampaignStore, adventure: Option<i64>) -> Result<()> {
    let characters = store.list_characters(adventure)?;
    if characters.is_empty() {
        println!("No characters found.");
        return Ok(());
    }

    println!(
        "{:<5} {:<24} {:<12} {:<12} {:<4} {}",
        "ID", "Name", "Race", "Class", "Lvl", "Role"
    );
    println!("{}", "-".repeat(80));
    for c in characters {
        println!(
            "{:<5} {:<24} {:<12} {:<12} {:<4} {}",
            c.id,
            truncate(&c.name, 24),
            or_dash(c.race.as_deref()),
            or_dash(c.class.as_deref()),
            c.level,
            or_dash(c.role.as_deref()),
        );
    }
    Ok(())
}

pub fn show(store: &CampaignStore, id: i64, json: bool) -> Result<()> {
    let character = store
        .get_character(id)?
        .ok_or_else(|| anyhow::anyhow!("Character not found: {}", id))?;

    if json {
        return print_json(&character);
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "{}, level {} {} {}",
        character.name,
        character.level,
        or_dash(character.race.as_deref()),
        or_dash(character.class.as_deref())
    );
    println!(
        "HP {}/{} | AC {} | Speed {} | Prof +{}",
        character.hit_points,
        character.max_hit_points,
        character.armor_class,
        character.speed,
        character.proficiency_bonus
    );
    println!("{}", "=".repeat(60));

    let a = &character.abilities;
    for (label, score) in [
        ("STR", a.strength),
        ("DEX", a.dexterity),
        ("CON", a.constitution),
        ("INT", a.intelligence),
        ("WIS", a.wisdom),
        ("CHA", a.charisma),
    ] {
        println!("{} {:>2} ({:+})", label, score, AbilityScores::modifier(score));
    }

    let owned = store.character_magic_items(id)?;
    if !owned.is_empty() {
        println!("\nMagic items:");
        for o in owned {
            let marker = if o.equipped { "⚔" } else { " " };
            println!("  {} {} ({})", marker, o.item.name, o.item.rarity);
        }
    }

    if let Some(story) = &character.backstory {
        println!("\n{}", story);
    }
    Ok(())
}

pub fn create(store: &CampaignStore, body: &str) -> Result<()> {
    let new: NewCharacter = parse_body(body)?;
    let character = store.create_character(&new)?;
    println!("Character '{}' created with ID: {}", character.name, character.id);
    Ok(())
}

pub fn update(store: &CampaignStore, id: i64, body: &str) -> Result<()> {
    let patch: CharacterPatch = parse_body(body)?;
    let character = store.update_character(id, patch)?;
    print_json(&character)
}

pub fn delete(store: &CampaignStore, id: i64) -> Result<()> {
    store.delete_character(id)?;
    println!("Deleted character {}", id);
    Ok(())
}
