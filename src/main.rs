use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recap::utils::{ensure_database_directory, get_database_path, parse_tags};
use recap::{Item, ItemId, ItemStore, SqliteItemStore, StoreError};
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `recap=debug`.
const LOG_ENV: &str = "RECAP_LOG";

/// recap - tag-indexed note store
#[derive(Parser)]
#[command(name = "recap")]
#[command(about = "Store short notes and find them again by tag")]
#[command(version)]
struct Cli {
    /// Database file (defaults to $RECAP_DB, then the platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Create a new item
    Create(CreateCommand),
    /// Update an existing item
    Update(UpdateCommand),
    /// Read all items carrying any of the given tags
    Read(ReadCommand),
    /// List every known tag
    Tags,
    /// Move an item to the trash
    Trash(TrashCommand),
    /// List trashed items
    Trashed,
}

#[derive(Parser)]
struct CreateCommand {
    /// Title of the item
    #[arg(value_name = "TITLE")]
    title: String,

    /// Content of the item
    #[arg(value_name = "CONTENT")]
    content: String,

    /// Comma-separated tags to apply to the item
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,
}

#[derive(Parser)]
struct UpdateCommand {
    /// Id of the item to update
    #[arg(value_name = "ID")]
    id: i64,

    /// New title
    #[arg(long)]
    title: Option<String>,

    /// New content
    #[arg(long)]
    content: Option<String>,

    /// Comma-separated tags replacing the current set
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,
}

#[derive(Parser)]
struct ReadCommand {
    /// Comma-separated tags; items matching any of them are shown
    #[arg(value_name = "TAGS")]
    tags: String,

    /// Print items as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct TrashCommand {
    /// Id of the item to trash
    #[arg(value_name = "ID")]
    id: i64,
}

fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Installs the stderr log subscriber, filtered by `$RECAP_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines if an error is a user error (vs storage failure).
fn is_user_error(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<StoreError>()
        .is_some_and(StoreError::is_user_error)
}

/// Resolves the database, opens the store and runs the command.
fn run(cli: Cli) -> Result<()> {
    let db_path = match cli.database {
        Some(path) => path,
        None => get_database_path()?,
    };
    ensure_database_directory(&db_path)?;

    let mut store = SqliteItemStore::open(&db_path).context("Failed to open database")?;
    let mut stdout = std::io::stdout().lock();
    execute(&cli.command, &mut store, &mut stdout)?;
    store.close()?;
    Ok(())
}

/// Executes a command against any store.
///
/// Separated from `run` to allow testing with the in-memory store.
fn execute(command: &Commands, store: &mut dyn ItemStore, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Create(cmd) => {
            let tags = cmd.tags.as_deref().map(parse_tags).unwrap_or_default();
            let item = store
                .write(Item::new(&cmd.title, &cmd.content, tags))
                .context("Failed to create item")?;

            write!(out, "Item created (id: {})", display_id(&item))?;
            if !item.tags.is_empty() {
                write!(out, " with tags: {}", item.tags.join(", "))?;
            }
            writeln!(out)?;
        }
        Commands::Update(cmd) => {
            let id = ItemId::new(cmd.id);
            let mut item = store.get(id)?.ok_or(StoreError::NotFound(id))?;

            if let Some(title) = &cmd.title {
                item.title = title.clone();
            }
            if let Some(content) = &cmd.content {
                item.content = content.clone();
            }
            if let Some(tags) = &cmd.tags {
                item.tags = parse_tags(tags);
            }

            let item = store.write(item).context("Failed to update item")?;
            writeln!(out, "Item {} updated", display_id(&item))?;
        }
        Commands::Read(cmd) => {
            let tags = parse_tags(&cmd.tags);
            let tag_refs: Vec<&str> = tags.iter().map(String::as_str).collect();
            let items = store.read(&tag_refs).context("Failed to read items")?;

            if cmd.json {
                serde_json::to_writer_pretty(&mut *out, &items)?;
                writeln!(out)?;
            } else if items.is_empty() {
                writeln!(out, "No results found")?;
            } else {
                writeln!(out, "|Id\t|Title\t|Content\t|Tags\t|")?;
                for item in &items {
                    let content = if item.encrypted {
                        "<encrypted>"
                    } else {
                        item.content.as_str()
                    };
                    writeln!(
                        out,
                        "|{}\t|{}\t|{}\t|{}\t|",
                        display_id(item),
                        item.title,
                        content,
                        item.tags.join(", ")
                    )?;
                }
            }
        }
        Commands::Tags => {
            for tag in store.tags()? {
                writeln!(out, "{tag}")?;
            }
        }
        Commands::Trash(cmd) => {
            let id = ItemId::new(cmd.id);
            let item = store.get(id)?.ok_or(StoreError::NotFound(id))?;
            store.trash(&item).context("Failed to trash item")?;
            writeln!(out, "Item {id} moved to trash")?;
        }
        Commands::Trashed => {
            for trashed in store.trashed()? {
                writeln!(
                    out,
                    "{}\t{}\t[{}]\t{}",
                    trashed.trashed_at.format(&Rfc3339)?,
                    trashed.title,
                    trashed.tags,
                    if trashed.encrypted { "encrypted" } else { "" }
                )?;
            }
        }
    }

    Ok(())
}

fn display_id(item: &Item) -> String {
    item.id.map(|id| id.to_string()).unwrap_or_default()
}
