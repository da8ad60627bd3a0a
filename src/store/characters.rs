//! Characters: player characters and NPCs in one wide table.

use rusqlite::{named_params, params, OptionalExtension, Row};

use super::json;
use super::{
    require_non_empty, require_patch_non_empty, Assignments, CampaignStore, Result, StoreError,
};
use crate::model::{AbilityScores, Character, CharacterPatch, NewCharacter};

const COLUMNS: &str = "id, adventure_id, name, race, class, level, background, alignment, \
    experience, classes, items, strength, dexterity, constitution, intelligence, wisdom, \
    charisma, hit_points, max_hit_points, armor_class, initiative, speed, proficiency_bonus, \
    saving_throws, skills, equipment, weapons, spells, spellcasting_ability, spell_save_dc, \
    spell_attack_bonus, personality_traits, ideals, bonds, flaws, backstory, role, \
    description, tags";

fn map_row(row: &Row) -> rusqlite::Result<Character> {
    Ok(Character {
        id: row.get("id")?,
        adventure_id: row.get("adventure_id")?,
        name: row.get("name")?,
        race: row.get("race")?,
        class: row.get("class")?,
        level: row.get("level")?,
        background: row.get("background")?,
        alignment: row.get("alignment")?,
        experience: row.get("experience")?,
        classes: json::decode_or_default("classes", row.get("classes")?),
        items: json::decode_or_default("items", row.get("items")?),
        abilities: AbilityScores {
            strength: row.get("strength")?,
            dexterity: row.get("dexterity")?,
            constitution: row.get("constitution")?,
            intelligence: row.get("intelligence")?,
            wisdom: row.get("wisdom")?,
            charisma: row.get("charisma")?,
        },
        hit_points: row.get("hit_points")?,
        max_hit_points: row.get("max_hit_points")?,
        armor_class: row.get("armor_class")?,
        initiative: row.get("initiative")?,
        speed: row.get("speed")?,
        proficiency_bonus: row.get("proficiency_bonus")?,
        saving_throws: json::decode_or_default("saving_throws", row.get("saving_throws")?),
        skills: json::decode_or_default("skills", row.get("skills")?),
        equipment: json::decode_or_default("equipment", row.get("equipment")?),
        weapons: json::decode_or_default("weapons", row.get("weapons")?),
        spells: json::decode_or_default("spells", row.get("spells")?),
        spellcasting_ability: row.get("spellcasting_ability")?,
        spell_save_dc: row.get("spell_save_dc")?,
        spell_attack_bonus: row.get("spell_attack_bonus")?,
        personality_traits: json::decode_or_default(
            "personality_traits",
            row.get("personality_traits")?,
        ),
        ideals: json::decode_or_default("ideals", row.get("ideals")?),
        bonds: json::decode_or_default("bonds", row.get("bonds")?),
        flaws: json::decode_or_default("flaws", row.get("flaws")?),
        backstory: row.get("backstory")?,
        role: row.get("role")?,
        description: row.get("description")?,
        tags: json::decode_or_default("tags", row.get("tags")?),
    })
}

impl CampaignStore {
    pub fn create_character(&self, new: &NewCharacter) -> Result<Character> {
        require_non_empty("name", &new.name)?;
        let id: i64 = self.conn.query_row(
            r#"INSERT INTO characters
               (adventure_id, name, race, class, level, background, alignment, experience,
                classes, items, strength, dexterity, constitution, intelligence, wisdom,
                charisma, hit_points, max_hit_points, armor_class, initiative, speed,
                proficiency_bonus, saving_throws, skills, equipment, weapons, spells,
                spellcasting_ability, spell_save_dc, spell_attack_bonus, personality_traits,
                ideals, bonds, flaws, backstory, role, description, tags)
               VALUES
               (:adventure_id, :name, :race, :class, :level, :background, :alignment,
                :experience, :classes, :items, :strength, :dexterity, :constitution,
                :intelligence, :wisdom, :charisma, :hit_points, :max_hit_points,
                :armor_class, :initiative, :speed, :proficiency_bonus, :saving_throws,
                :skills, :equipment, :weapons, :spells, :spellcasting_ability,
                :spell_save_dc, :spell_attack_bonus, :personality_traits, :ideals, :bonds,
                :flaws, :backstory, :role, :description, :tags)
               RETURNING id"#,
            named_params! {
                ":adventure_id": new.adventure_id,
                ":name": new.name,
                ":race": new.race,
                ":class": new.class,
                ":level": new.level,
                ":background": new.background,
                ":alignment": new.alignment,
                ":experience": new.experience,
                ":classes": json::encode(&new.classes)?,
                ":items": json::encode(&new.items)?,
                ":strength": new.abilities.strength,
                ":dexterity": new.abilities.dexterity,
                ":constitution": new.abilities.constitution,
                ":intelligence": new.abilities.intelligence,
                ":wisdom": new.abilities.wisdom,
                ":charisma": new.abilities.charisma,
                ":hit_points": new.hit_points,
                ":max_hit_points": new.max_hit_points,
                ":armor_class": new.armor_class,
                ":initiative": new.initiative,
                ":speed": new.speed,
                ":proficiency_bonus": new.proficiency_bonus,
                ":saving_throws": json::encode(&new.saving_throws)?,
                ":skills": json::encode(&new.skills)?,
                ":equipment": json::encode(&new.equipment)?,
                ":weapons": json::encode(&new.weapons)?,
                ":spells": json::encode(&new.spells)?,
                ":spellcasting_ability": new.spellcasting_ability,
                ":spell_save_dc": new.spell_save_dc,
                ":spell_attack_bonus": new.spell_attack_bonus,
                ":personality_traits": json::encode(&new.personality_traits)?,
                ":ideals": json::encode(&new.ideals)?,
                ":bonds": json::encode(&new.bonds)?,
                ":flaws": json::encode(&new.flaws)?,
                ":backstory": new.backstory,
                ":role": new.role,
                ":description": new.description,
                ":tags": json::encode(&new.tags)?,
            },
            |row| row.get(0),
        )?;
        self.fetch_character(id)
    }

    pub fn get_character(&self, id: i64) -> Result<Option<Character>> {
        let character = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM characters WHERE id = ?1"),
                params![id],
                map_row,
            )
            .optional()?;
        Ok(character)
    }

    /// Characters sorted by name, optionally restricted to one adventure.
    pub fn list_characters(&self, adventure_id: Option<i64>) -> Result<Vec<Character>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM characters
             WHERE ?1 IS NULL OR adventure_id = ?1
             ORDER BY name COLLATE NOCASE, id"
        ))?;
        let rows = stmt.query_map(params![adventure_id], map_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_character(&self, id: i64, patch: CharacterPatch) -> Result<Character> {
        require_patch_non_empty("name", &patch.name)?;
        let mut set = Assignments::default();
        set.nullable_int("adventure_id", patch.adventure_id);
        set.text("name", patch.name)?;
        set.nullable_text("race", patch.race);
        set.nullable_text("class", patch.class);
        set.int("level", patch.level)?;
        set.nullable_text("background", patch.background);
        set.nullable_text("alignment", patch.alignment);
        set.int("experience", patch.experience)?;
        set.json("classes", patch.classes)?;
        set.json("items", patch.items)?;
        set.int("strength", patch.strength)?;
        set.int("dexterity", patch.dexterity)?;
        set.int("constitution", patch.constitution)?;
        set.int("intelligence", patch.intelligence)?;
        set.int("wisdom", patch.wisdom)?;
        set.int("charisma", patch.charisma)?;
        set.int("hit_points", patch.hit_points)?;
        set.int("max_hit_points", patch.max_hit_points)?;
        set.int("armor_class", patch.armor_class)?;
        set.int("initiative", patch.initiative)?;
        set.int("speed", patch.speed)?;
        set.int("proficiency_bonus", patch.proficiency_bonus)?;
        set.json("saving_throws", patch.saving_throws)?;
        set.json("skills", patch.skills)?;
        set.json("equipment", patch.equipment)?;
        set.json("weapons", patch.weapons)?;
        set.json("spells", patch.spells)?;
        set.nullable_text("spellcasting_ability", patch.spellcasting_ability);
        set.nullable_int("spell_save_dc", patch.spell_save_dc);
        set.nullable_int("spell_attack_bonus", patch.spell_attack_bonus);
        set.json("personality_traits", patch.personality_traits)?;
        set.json("ideals", patch.ideals)?;
        set.json("bonds", patch.bonds)?;
        set.json("flaws", patch.flaws)?;
        set.nullable_text("backstory", patch.backstory);
        set.nullable_text("role", patch.role);
        set.nullable_text("description", patch.description);
        set.json("tags", patch.tags)?;
        self.apply_update("character", "characters", id, set)?;
        self.fetch_character(id)
    }

    /// Deletes a character along with its magic item assignments.
    pub fn delete_character(&self, id: i64) -> Result<()> {
        self.delete_by_id("character", "characters", id)
    }

    fn fetch_character(&self, id: i64) -> Result<Character> {
        self.get_character(id)?.ok_or(StoreError::NotFound {
            entity: "character",
            id,
        })
    }
}
