//! SQLite schema definition
//!
//! Tables are created with `IF NOT EXISTS` so every statement here is safe to
//! run on each startup. Columns that older databases may lack are listed in
//! [`CHARACTER_COLUMNS`] and backfilled by the convergence routine instead of
//! being part of the `CREATE TABLE` text.

pub const TABLES: &str = r#"
-- ============================================
-- ADVENTURES
-- ============================================

CREATE TABLE IF NOT EXISTS adventures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT UNIQUE,                      -- 'saltmarsh', 'pharaoh', ...
    title TEXT NOT NULL,
    description TEXT
);

-- ============================================
-- SESSIONS
-- ============================================

CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    adventure_id INTEGER,
    title TEXT NOT NULL,
    date TEXT NOT NULL,                    -- ISO-8601 date of play
    text TEXT NOT NULL DEFAULT '',
    FOREIGN KEY(adventure_id) REFERENCES adventures(id) ON DELETE SET NULL
);

-- ============================================
-- CHARACTERS (formerly npcs)
-- ============================================

-- Only the columns inherited from the npcs table; everything else is added
-- by the column backfill.
CREATE TABLE IF NOT EXISTS characters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    adventure_id INTEGER,
    name TEXT NOT NULL,
    role TEXT,
    description TEXT,
    tags TEXT,                             -- JSON array
    FOREIGN KEY(adventure_id) REFERENCES adventures(id) ON DELETE SET NULL
);

-- ============================================
-- LOCATIONS
-- ============================================

CREATE TABLE IF NOT EXISTS locations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    adventure_id INTEGER,
    name TEXT NOT NULL,
    description TEXT,
    notes TEXT,
    tags TEXT,                             -- JSON array
    FOREIGN KEY(adventure_id) REFERENCES adventures(id) ON DELETE SET NULL
);

-- ============================================
-- GLOBAL NOTES
-- ============================================

CREATE TABLE IF NOT EXISTS global_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    text TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================
-- MAGIC ITEM OWNERSHIP
-- ============================================

CREATE TABLE IF NOT EXISTS character_magic_items (
    character_id INTEGER NOT NULL,
    magic_item_id INTEGER NOT NULL,
    equipped BOOLEAN NOT NULL DEFAULT 0,
    PRIMARY KEY(character_id, magic_item_id),
    FOREIGN KEY(character_id) REFERENCES characters(id) ON DELETE CASCADE,
    FOREIGN KEY(magic_item_id) REFERENCES magic_items(id) ON DELETE CASCADE
);

-- ============================================
-- QUESTS
-- ============================================

CREATE TABLE IF NOT EXISTS quests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    adventure_id INTEGER,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'active',     -- 'active', 'completed', 'failed', 'on_hold'
    priority TEXT NOT NULL DEFAULT 'medium',   -- 'low', 'medium', 'high', 'critical'
    type TEXT NOT NULL DEFAULT 'main',         -- 'main', 'side', 'personal', 'guild'
    due_date TEXT,
    assigned_to TEXT,
    tags TEXT,                                 -- JSON array
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY(adventure_id) REFERENCES adventures(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS quest_objectives (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    quest_id INTEGER NOT NULL,
    description TEXT NOT NULL,
    completed BOOLEAN NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    FOREIGN KEY(quest_id) REFERENCES quests(id) ON DELETE CASCADE
);

-- ============================================
-- MIGRATION LOG
-- ============================================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Current shape of `magic_items`. `{table}` is substituted so the same text
/// creates both the live table and the swap table used by the legacy rebuild.
pub const MAGIC_ITEMS_TEMPLATE: &str = r#"
CREATE TABLE IF NOT EXISTS {table} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    rarity TEXT NOT NULL DEFAULT 'common',
    type TEXT NOT NULL DEFAULT 'wondrous item',
    description TEXT NOT NULL DEFAULT '',
    properties TEXT,                       -- JSON array
    attunement_required BOOLEAN NOT NULL DEFAULT 0
);
"#;

pub fn magic_items_sql(table: &str) -> String {
    MAGIC_ITEMS_TEMPLATE.replace("{table}", table)
}

/// Columns backfilled onto `characters`, in the order they are added.
/// Each entry is `(column, declaration)`.
pub const CHARACTER_COLUMNS: &[(&str, &str)] = &[
    ("race", "TEXT"),
    ("class", "TEXT"),
    ("level", "INTEGER NOT NULL DEFAULT 1"),
    ("background", "TEXT"),
    ("alignment", "TEXT"),
    ("experience", "INTEGER NOT NULL DEFAULT 0"),
    ("classes", "TEXT"),
    ("items", "TEXT"),
    ("strength", "INTEGER NOT NULL DEFAULT 10"),
    ("dexterity", "INTEGER NOT NULL DEFAULT 10"),
    ("constitution", "INTEGER NOT NULL DEFAULT 10"),
    ("intelligence", "INTEGER NOT NULL DEFAULT 10"),
    ("wisdom", "INTEGER NOT NULL DEFAULT 10"),
    ("charisma", "INTEGER NOT NULL DEFAULT 10"),
    ("hit_points", "INTEGER NOT NULL DEFAULT 10"),
    ("max_hit_points", "INTEGER NOT NULL DEFAULT 10"),
    ("armor_class", "INTEGER NOT NULL DEFAULT 10"),
    ("initiative", "INTEGER NOT NULL DEFAULT 0"),
    ("speed", "INTEGER NOT NULL DEFAULT 30"),
    ("proficiency_bonus", "INTEGER NOT NULL DEFAULT 2"),
    ("saving_throws", "TEXT"),
    ("skills", "TEXT"),
    ("equipment", "TEXT"),
    ("weapons", "TEXT"),
    ("spells", "TEXT"),
    ("spellcasting_ability", "TEXT"),
    ("spell_save_dc", "INTEGER"),
    ("spell_attack_bonus", "INTEGER"),
    ("personality_traits", "TEXT"),
    ("ideals", "TEXT"),
    ("bonds", "TEXT"),
    ("flaws", "TEXT"),
    ("backstory", "TEXT"),
];

pub const INDEXES: &str = r#"
-- Characters
CREATE INDEX IF NOT EXISTS idx_characters_adventure ON characters(adventure_id);
CREATE INDEX IF NOT EXISTS idx_characters_name ON characters(name);

-- Sessions
CREATE INDEX IF NOT EXISTS idx_sessions_adventure ON sessions(adventure_id);
CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date);

-- Locations
CREATE INDEX IF NOT EXISTS idx_locations_adventure ON locations(adventure_id);

-- Magic items
CREATE INDEX IF NOT EXISTS idx_magic_items_rarity ON magic_items(rarity);
CREATE INDEX IF NOT EXISTS idx_magic_items_type ON magic_items(type);

-- Quests
CREATE INDEX IF NOT EXISTS idx_quests_adventure ON quests(adventure_id);
CREATE INDEX IF NOT EXISTS idx_quests_status ON quests(status);
CREATE INDEX IF NOT EXISTS idx_quests_priority ON quests(priority);
CREATE INDEX IF NOT EXISTS idx_quests_type ON quests(type);
CREATE INDEX IF NOT EXISTS idx_quest_objectives_quest ON quest_objectives(quest_id);
"#;

/// Older files created `character_magic_items` without a key. Convergence
/// removes duplicate pairs and then adds this index, which also serves as the
/// conflict target for import upserts.
pub const UNIQUE_ASSIGNMENT_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
    idx_character_magic_items_pair ON character_magic_items(character_id, magic_item_id);";

/// Adventures inserted into an empty database: `(slug, title, description)`.
pub const SEED_ADVENTURES: &[(&str, &str, &str)] = &[
    (
        "saltmarsh",
        "Ghosts of Saltmarsh",
        "Nautical adventures around the fishing town of Saltmarsh.",
    ),
    (
        "pharaoh",
        "Pharaoh",
        "Desert intrigue in the cursed pyramid of Amun-Re.",
    ),
];

/// One-time migrations tracked in `schema_migrations`.
pub const MIGRATION_NPCS_TO_CHARACTERS: (i64, &str) = (1, "npcs_to_characters");
pub const MIGRATION_MAGIC_ITEMS_OWNERSHIP: (i64, &str) = (2, "magic_items_drop_adventure_id");

/// Content tables, children before parents. Used for counts, export and
/// replace-mode import.
pub const CONTENT_TABLES: &[&str] = &[
    "quest_objectives",
    "quests",
    "character_magic_items",
    "magic_items",
    "global_notes",
    "locations",
    "characters",
    "sessions",
    "adventures",
];
