//! Command implementations for the `lorekeeper` binary.
//!
//! Create and update commands take JSON bodies shaped like the records they
//! produce; `@path` reads the body from a file instead.

pub mod adventure;
pub mod character;
pub mod item;
pub mod location;
pub mod note;
pub mod quest;
pub mod session;
pub mod status;
pub mod transfer;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Parses a JSON body given inline or as `@file`.
pub fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    let text = match body.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(shellexpand::tilde(path).as_ref())
            .with_context(|| format!("reading body from {path}"))?,
        None => body.to_string(),
    };
    serde_json::from_str(&text).context("invalid JSON body")
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Shortens free text to one line for table output.
fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewAdventure;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
        assert_eq!(truncate("first\nsecond", 20), "first");
    }

    #[test]
    fn test_parse_body_inline_and_file() {
        let inline: NewAdventure = parse_body(r#"{"title": "Dragon of Icespire Peak"}"#).unwrap();
        assert_eq!(inline.title, "Dragon of Icespire Peak");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.json");
        std::fs::write(&path, r#"{"title": "Storm King's Thunder", "slug": "skt"}"#).unwrap();
        let from_file: NewAdventure = parse_body(&format!("@{}", path.display())).unwrap();
        assert_eq!(from_file.slug.as_deref(), Some("skt"));

        assert!(parse_body::<NewAdventure>("{not json").is_err());
    }
}
