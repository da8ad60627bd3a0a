use anyhow::Result;

use super::{parse_body, print_json, truncate};
use crate::model::{NewSession, SessionPatch};
use crate::store::CampaignStore;

pub fn list(store: &CampaignStore, adventure: Option<i64>) -> Result<()> {
    let sessions = store.list_sessions(adventure)?;
    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    println!("{:<5} {:<12} {:<10} {}", "ID", "Date", "Adventure", "Title");
    println!("{}", "-".repeat(70));
    for s in sessions {
        println!(
            "{:<5} {:<12} {:<10} {}",
            s.id,
            s.date,
            s.adventure_id.map_or("-".to_string(), |a| a.to_string()),
            truncate(&s.title, 40),
        );
    }
    Ok(())
}

pub fn show(store: &CampaignStore, id: i64) -> Result<()> {
    let session = store
        .get_session(id)?
        .ok_or_else(|| anyhow::anyhow!("Session not found: {}", id))?;

    println!("\n{}", "=".repeat(80));
    println!("Session {}: {} ({})", session.id, session.title, session.date);
    if let Some(adventure_id) = session.adventure_id {
        if let Some(adventure) = store.get_adventure(adventure_id)? {
            println!("Adventure: {}", adventure.title);
        }
    }
    println!("{}", "=".repeat(80));
    println!("{}", session.text);
    Ok(())
}

pub fn create(store: &CampaignStore, body: &str) -> Result<()> {
    let new: NewSession = parse_body(body)?;
    let session = store.create_session(&new)?;
    println!("Session '{}' logged with ID: {}", session.title, session.id);
    Ok(())
}

pub fn update(store: &CampaignStore, id: i64, body: &str) -> Result<()> {
    let patch: SessionPatch = parse_body(body)?;
    let session = store.update_session(id, patch)?;
    print_json(&session)
}

pub fn delete(store: &CampaignStore, id: i64) -> Result<()> {
    store.delete_session(id)?;
    println!("Deleted session {}", id);
    Ok(())
}
