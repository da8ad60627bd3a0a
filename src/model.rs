//! Campaign entities, creation payloads and partial-update patches
//!
//! Patch fields follow one rule: `None` means "leave unchanged" and
//! `Some(None)` is an explicit null. Nullable columns are set to `NULL`;
//! for the rest the store rejects the patch with `StoreError::Invalid`.
//! When patches are deserialized from JSON an absent key maps to `None` and
//! an explicit `null` maps to `Some(None)`.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================
// ADVENTURES
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adventure {
    pub id: i64,
    pub slug: Option<String>,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewAdventure {
    pub slug: Option<String>,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdventurePatch {
    #[serde(deserialize_with = "nullable")]
    pub slug: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

// ============================================
// SESSIONS
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub adventure_id: Option<i64>,
    pub title: String,
    pub date: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewSession {
    pub adventure_id: Option<i64>,
    pub title: String,
    pub date: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionPatch {
    #[serde(deserialize_with = "nullable")]
    pub adventure_id: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub date: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub text: Option<Option<String>>,
}

// ============================================
// CHARACTERS
// ============================================

/// One entry of a multiclass breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassLevel {
    pub name: String,
    #[serde(default = "default_class_level")]
    pub level: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subclass: Option<String>,
}

fn default_class_level() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    #[serde(default)]
    pub attack_bonus: i64,
    #[serde(default)]
    pub damage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub prepared: bool,
}

/// Proficiency flags keyed by ability or skill name.
pub type Proficiencies = BTreeMap<String, bool>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i64,
    pub dexterity: i64,
    pub constitution: i64,
    pub intelligence: i64,
    pub wisdom: i64,
    pub charisma: i64,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl AbilityScores {
    /// Standard 5e modifier: `floor((score - 10) / 2)`.
    pub fn modifier(score: i64) -> i64 {
        (score - 10).div_euclid(2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: i64,
    pub adventure_id: Option<i64>,
    pub name: String,
    pub race: Option<String>,
    pub class: Option<String>,
    pub level: i64,
    pub background: Option<String>,
    pub alignment: Option<String>,
    pub experience: i64,
    pub classes: Vec<ClassLevel>,
    pub items: Vec<String>,
    pub abilities: AbilityScores,
    pub hit_points: i64,
    pub max_hit_points: i64,
    pub armor_class: i64,
    pub initiative: i64,
    pub speed: i64,
    pub proficiency_bonus: i64,
    pub saving_throws: Proficiencies,
    pub skills: Proficiencies,
    pub equipment: Vec<String>,
    pub weapons: Vec<Weapon>,
    pub spells: Vec<Spell>,
    pub spellcasting_ability: Option<String>,
    pub spell_save_dc: Option<i64>,
    pub spell_attack_bonus: Option<i64>,
    pub personality_traits: Vec<String>,
    pub ideals: Vec<String>,
    pub bonds: Vec<String>,
    pub flaws: Vec<String>,
    pub backstory: Option<String>,
    // Carried over from the npcs table
    pub role: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewCharacter {
    pub adventure_id: Option<i64>,
    pub name: String,
    pub race: Option<String>,
    pub class: Option<String>,
    pub level: i64,
    pub background: Option<String>,
    pub alignment: Option<String>,
    pub experience: i64,
    pub classes: Vec<ClassLevel>,
    pub items: Vec<String>,
    pub abilities: AbilityScores,
    pub hit_points: i64,
    pub max_hit_points: i64,
    pub armor_class: i64,
    pub initiative: i64,
    pub speed: i64,
    pub proficiency_bonus: i64,
    pub saving_throws: Proficiencies,
    pub skills: Proficiencies,
    pub equipment: Vec<String>,
    pub weapons: Vec<Weapon>,
    pub spells: Vec<Spell>,
    pub spellcasting_ability: Option<String>,
    pub spell_save_dc: Option<i64>,
    pub spell_attack_bonus: Option<i64>,
    pub personality_traits: Vec<String>,
    pub ideals: Vec<String>,
    pub bonds: Vec<String>,
    pub flaws: Vec<String>,
    pub backstory: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

// Mirrors the column defaults in the schema.
impl Default for NewCharacter {
    fn default() -> Self {
        Self {
            adventure_id: None,
            name: String::new(),
            race: None,
            class: None,
            level: 1,
            background: None,
            alignment: None,
            experience: 0,
            classes: Vec::new(),
            items: Vec::new(),
            abilities: AbilityScores::default(),
            hit_points: 10,
            max_hit_points: 10,
            armor_class: 10,
            initiative: 0,
            speed: 30,
            proficiency_bonus: 2,
            saving_throws: Proficiencies::new(),
            skills: Proficiencies::new(),
            equipment: Vec::new(),
            weapons: Vec::new(),
            spells: Vec::new(),
            spellcasting_ability: None,
            spell_save_dc: None,
            spell_attack_bonus: None,
            personality_traits: Vec::new(),
            ideals: Vec::new(),
            bonds: Vec::new(),
            flaws: Vec::new(),
            backstory: None,
            role: None,
            description: None,
            tags: Vec::new(),
        }
    }
}

impl NewCharacter {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a character. Ability scores are patched individually.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CharacterPatch {
    #[serde(deserialize_with = "nullable")]
    pub adventure_id: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub race: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub class: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub level: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub background: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub alignment: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub experience: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub classes: Option<Option<Vec<ClassLevel>>>,
    #[serde(deserialize_with = "nullable")]
    pub items: Option<Option<Vec<String>>>,
    #[serde(deserialize_with = "nullable")]
    pub strength: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub dexterity: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub constitution: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub intelligence: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub wisdom: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub charisma: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub hit_points: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub max_hit_points: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub armor_class: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub initiative: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub speed: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub proficiency_bonus: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub saving_throws: Option<Option<Proficiencies>>,
    #[serde(deserialize_with = "nullable")]
    pub skills: Option<Option<Proficiencies>>,
    #[serde(deserialize_with = "nullable")]
    pub equipment: Option<Option<Vec<String>>>,
    #[serde(deserialize_with = "nullable")]
    pub weapons: Option<Option<Vec<Weapon>>>,
    #[serde(deserialize_with = "nullable")]
    pub spells: Option<Option<Vec<Spell>>>,
    #[serde(deserialize_with = "nullable")]
    pub spellcasting_ability: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub spell_save_dc: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub spell_attack_bonus: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub personality_traits: Option<Option<Vec<String>>>,
    #[serde(deserialize_with = "nullable")]
    pub ideals: Option<Option<Vec<String>>>,
    #[serde(deserialize_with = "nullable")]
    pub bonds: Option<Option<Vec<String>>>,
    #[serde(deserialize_with = "nullable")]
    pub flaws: Option<Option<Vec<String>>>,
    #[serde(deserialize_with = "nullable")]
    pub backstory: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub role: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub tags: Option<Option<Vec<String>>>,
}

// ============================================
// LOCATIONS
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub adventure_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewLocation {
    pub adventure_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocationPatch {
    #[serde(deserialize_with = "nullable")]
    pub adventure_id: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub tags: Option<Option<Vec<String>>>,
}

// ============================================
// GLOBAL NOTES
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalNote {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewGlobalNote {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GlobalNotePatch {
    #[serde(deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub text: Option<Option<String>>,
}

// ============================================
// MAGIC ITEMS
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagicItem {
    pub id: i64,
    pub name: String,
    pub rarity: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub description: String,
    pub properties: Vec<String>,
    pub attunement_required: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewMagicItem {
    pub name: String,
    pub rarity: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub description: String,
    pub properties: Vec<String>,
    pub attunement_required: bool,
}

impl Default for NewMagicItem {
    fn default() -> Self {
        Self {
            name: String::new(),
            rarity: "common".to_string(),
            item_type: "wondrous item".to_string(),
            description: String::new(),
            properties: Vec::new(),
            attunement_required: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MagicItemPatch {
    #[serde(deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub rarity: Option<Option<String>>,
    #[serde(rename = "type")]
    #[serde(deserialize_with = "nullable")]
    pub item_type: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub properties: Option<Option<Vec<String>>>,
    #[serde(deserialize_with = "nullable")]
    pub attunement_required: Option<Option<bool>>,
}

/// A row of the character ↔ magic item join table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterMagicItem {
    pub character_id: i64,
    pub magic_item_id: i64,
    pub equipped: bool,
}

/// A magic item as owned by a particular character.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnedMagicItem {
    pub item: MagicItem,
    pub equipped: bool,
}

// ============================================
// QUESTS
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: i64,
    pub adventure_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    #[serde(rename = "type")]
    pub quest_type: String,
    pub due_date: Option<String>,
    pub assigned_to: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewQuest {
    pub adventure_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    #[serde(rename = "type")]
    pub quest_type: String,
    pub due_date: Option<String>,
    pub assigned_to: Option<String>,
    pub tags: Vec<String>,
}

impl Default for NewQuest {
    fn default() -> Self {
        Self {
            adventure_id: None,
            title: String::new(),
            description: String::new(),
            status: "active".to_string(),
            priority: "medium".to_string(),
            quest_type: "main".to_string(),
            due_date: None,
            assigned_to: None,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuestPatch {
    #[serde(deserialize_with = "nullable")]
    pub adventure_id: Option<Option<i64>>,
    #[serde(deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub status: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub priority: Option<Option<String>>,
    #[serde(rename = "type")]
    #[serde(deserialize_with = "nullable")]
    pub quest_type: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub due_date: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub assigned_to: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub tags: Option<Option<Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestObjective {
    pub id: i64,
    pub quest_id: i64,
    pub description: String,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObjectivePatch {
    #[serde(deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub completed: Option<Option<bool>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_distinguishes_absent_from_null() {
        let patch: CharacterPatch =
            serde_json::from_str(r#"{"race": "Elf", "alignment": null}"#).unwrap();
        assert_eq!(patch.race, Some(Some("Elf".to_string())));
        assert_eq!(patch.alignment, Some(None));
        assert_eq!(patch.background, None);
        assert_eq!(patch.level, None);
    }

    #[test]
    fn test_new_character_defaults() {
        let npc: NewCharacter = serde_json::from_str(r#"{"name": "Eliander"}"#).unwrap();
        assert_eq!(npc.name, "Eliander");
        assert_eq!(npc.level, 1);
        assert_eq!(npc.abilities.wisdom, 10);
        assert_eq!(npc.speed, 30);
        assert!(npc.tags.is_empty());
    }

    #[test]
    fn test_ability_modifier() {
        assert_eq!(AbilityScores::modifier(10), 0);
        assert_eq!(AbilityScores::modifier(15), 2);
        assert_eq!(AbilityScores::modifier(8), -1);
        assert_eq!(AbilityScores::modifier(1), -5);
    }

    #[test]
    fn test_magic_item_type_is_renamed() {
        let item: NewMagicItem =
            serde_json::from_str(r#"{"name": "Cloak of Elvenkind", "type": "wondrous item"}"#)
                .unwrap();
        assert_eq!(item.item_type, "wondrous item");
        assert_eq!(item.rarity, "common");
    }
}
