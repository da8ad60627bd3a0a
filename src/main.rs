use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use lorekeeper::cli::{adventure, character, item, location, note, quest, session, status, transfer};
use lorekeeper::config::Config;
use lorekeeper::store::{CampaignStore, QuestFilter};

#[derive(Parser)]
#[command(name = "lorekeeper")]
#[command(about = "Campaign manager for tabletop roleplaying games")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "lorekeeper.yaml")]
    config: String,

    /// Database file (overrides LOREKEEPER_DB_PATH and the config file)
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Converge the database schema and report what changed
    Migrate,

    /// Show row counts and applied migrations
    Status,

    /// Adventure management
    Adventure {
        #[command(subcommand)]
        command: AdventureCommands,
    },

    /// Session log management
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Character management
    #[command(alias = "npc")]
    Character {
        #[command(subcommand)]
        command: CharacterCommands,
    },

    /// Location management
    Location {
        #[command(subcommand)]
        command: LocationCommands,
    },

    /// Campaign-wide notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },

    /// Magic item catalog and ownership
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },

    /// Quest tracking
    Quest {
        #[command(subcommand)]
        command: QuestCommands,
    },

    /// Export all campaign data as a JSON bundle
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Compress the bundle with zstd
        #[arg(long)]
        compress: bool,
    },

    /// Import a bundle produced by `export`
    Import {
        /// Bundle file (plain or zstd-compressed JSON)
        input: PathBuf,

        /// Clear existing campaign data first
        #[arg(long)]
        replace: bool,
    },
}

#[derive(Subcommand)]
enum AdventureCommands {
    /// List adventures
    List,
    /// Show one adventure
    Show { id: i64 },
    /// Create an adventure from a JSON body (or @file)
    Create { body: String },
    /// Update fields named in a JSON body (or @file)
    Update { id: i64, body: String },
    /// Delete an adventure; its content is kept unassigned
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List sessions, newest first
    List {
        #[arg(short, long)]
        adventure: Option<i64>,
    },
    /// Show a session log
    Show { id: i64 },
    /// Log a session from a JSON body (or @file)
    Create { body: String },
    /// Update fields named in a JSON body (or @file)
    Update { id: i64, body: String },
    /// Delete a session
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum CharacterCommands {
    /// List characters
    List {
        #[arg(short, long)]
        adventure: Option<i64>,
    },
    /// Show a character sheet
    Show {
        id: i64,
        /// Print the full record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a character from a JSON body (or @file)
    Create { body: String },
    /// Update fields named in a JSON body (or @file)
    Update { id: i64, body: String },
    /// Delete a character and its item assignments
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum LocationCommands {
    /// List locations
    List {
        #[arg(short, long)]
        adventure: Option<i64>,
    },
    /// Show one location
    Show { id: i64 },
    /// Create a location from a JSON body (or @file)
    Create { body: String },
    /// Update fields named in a JSON body (or @file)
    Update { id: i64, body: String },
    /// Delete a location
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// List notes, newest first
    List,
    /// Show one note
    Show { id: i64 },
    /// Add a note
    Add {
        title: String,
        #[arg(short, long)]
        text: Option<String>,
    },
    /// Update fields named in a JSON body (or @file)
    Update { id: i64, body: String },
    /// Delete a note
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ItemCommands {
    /// List magic items
    List {
        #[arg(short, long)]
        rarity: Option<String>,
    },
    /// Show one magic item
    Show { id: i64 },
    /// Create a magic item from a JSON body (or @file)
    Create { body: String },
    /// Update fields named in a JSON body (or @file)
    Update { id: i64, body: String },
    /// Delete a magic item and its assignments
    Delete { id: i64 },
    /// Give an item to one or more characters
    Assign {
        item: i64,
        #[arg(required = true)]
        characters: Vec<i64>,
        /// Equip immediately (single character only)
        #[arg(long)]
        equipped: bool,
    },
    /// Take an item away from a character
    Unassign { item: i64, character: i64 },
    /// Equip or unequip an owned item
    Equip {
        item: i64,
        character: i64,
        /// Unequip instead
        #[arg(long)]
        off: bool,
    },
}

#[derive(Subcommand)]
enum QuestCommands {
    /// List quests, optionally filtered
    List {
        #[arg(short, long)]
        adventure: Option<i64>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(short = 't', long = "type")]
        quest_type: Option<String>,
    },
    /// Show a quest with its objectives
    Show { id: i64 },
    /// Create a quest from a JSON body (or @file)
    Create { body: String },
    /// Update fields named in a JSON body (or @file)
    Update { id: i64, body: String },
    /// Delete a quest and its objectives
    Delete { id: i64 },
    /// Add an objective to a quest
    Objective { quest: i64, description: String },
    /// Mark an objective complete
    Complete {
        id: i64,
        /// Reopen instead
        #[arg(long)]
        undo: bool,
    },
    /// Delete an objective
    DropObjective { id: i64 },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config
    let config = Config::load(&cli.config).unwrap_or_default();
    init_tracing(&config);

    let db_path = cli.database.unwrap_or_else(|| config.database_path());
    tracing::debug!(path = %db_path.display(), "opening campaign database");

    // Opening converges the schema
    let store = CampaignStore::open(&db_path)
        .with_context(|| format!("opening {}", db_path.display()))?;

    match cli.command {
        Commands::Migrate => status::migrate(&store)?,
        Commands::Status => status::run(&store)?,
        Commands::Adventure { command } => match command {
            AdventureCommands::List => adventure::list(&store)?,
            AdventureCommands::Show { id } => adventure::show(&store, id)?,
            AdventureCommands::Create { body } => adventure::create(&store, &body)?,
            AdventureCommands::Update { id, body } => adventure::update(&store, id, &body)?,
            AdventureCommands::Delete { id } => adventure::delete(&store, id)?,
        },
        Commands::Session { command } => match command {
            SessionCommands::List { adventure } => session::list(&store, adventure)?,
            SessionCommands::Show { id } => session::show(&store, id)?,
            SessionCommands::Create { body } => session::create(&store, &body)?,
            SessionCommands::Update { id, body } => session::update(&store, id, &body)?,
            SessionCommands::Delete { id } => session::delete(&store, id)?,
        },
        Commands::Character { command } => match command {
            CharacterCommands::List { adventure } => character::list(&store, adventure)?,
            CharacterCommands::Show { id, json } => character::show(&store, id, json)?,
            CharacterCommands::Create { body } => character::create(&store, &body)?,
            CharacterCommands::Update { id, body } => character::update(&store, id, &body)?,
            CharacterCommands::Delete { id } => character::delete(&store, id)?,
        },
        Commands::Location { command } => match command {
            LocationCommands::List { adventure } => location::list(&store, adventure)?,
            LocationCommands::Show { id } => location::show(&store, id)?,
            LocationCommands::Create { body } => location::create(&store, &body)?,
            LocationCommands::Update { id, body } => location::update(&store, id, &body)?,
            LocationCommands::Delete { id } => location::delete(&store, id)?,
        },
        Commands::Note { command } => match command {
            NoteCommands::List => note::list(&store)?,
            NoteCommands::Show { id } => note::show(&store, id)?,
            NoteCommands::Add { title, text } => note::add(&store, title, text)?,
            NoteCommands::Update { id, body } => note::update(&store, id, &body)?,
            NoteCommands::Delete { id } => note::delete(&store, id)?,
        },
        Commands::Item { command } => match command {
            ItemCommands::List { rarity } => item::list(&store, rarity)?,
            ItemCommands::Show { id } => item::show(&store, id)?,
            ItemCommands::Create { body } => item::create(&store, &body)?,
            ItemCommands::Update { id, body } => item::update(&store, id, &body)?,
            ItemCommands::Delete { id } => item::delete(&store, id)?,
            ItemCommands::Assign {
                item: item_id,
                characters,
                equipped,
            } => item::assign(&store, item_id, &characters, equipped)?,
            ItemCommands::Unassign {
                item: item_id,
                character,
            } => item::unassign(&store, item_id, character)?,
            ItemCommands::Equip {
                item: item_id,
                character,
                off,
            } => item::equip(&store, item_id, character, !off)?,
        },
        Commands::Quest { command } => match command {
            QuestCommands::List {
                adventure,
                status,
                priority,
                quest_type,
            } => quest::list(
                &store,
                QuestFilter {
                    adventure_id: adventure,
                    status,
                    priority,
                    quest_type,
                },
            )?,
            QuestCommands::Show { id } => quest::show(&store, id)?,
            QuestCommands::Create { body } => quest::create(&store, &body)?,
            QuestCommands::Update { id, body } => quest::update(&store, id, &body)?,
            QuestCommands::Delete { id } => quest::delete(&store, id)?,
            QuestCommands::Objective { quest: quest_id, description } => {
                quest::add_objective(&store, quest_id, &description)?
            }
            QuestCommands::Complete { id, undo } => quest::complete_objective(&store, id, !undo)?,
            QuestCommands::DropObjective { id } => quest::delete_objective(&store, id)?,
        },
        Commands::Export { output, compress } => {
            transfer::export(&store, output.as_deref(), compress)?
        }
        Commands::Import { input, replace } => transfer::import(&store, &input, replace)?,
    }

    Ok(())
}
