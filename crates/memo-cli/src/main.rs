//! CLI entry point for the memo note store (for dev, scripting and testing).

use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::Parser;
use memo_core::{
    app_data_dir, export_to_file, format_display_date, format_display_date_time, import_from_file,
    load_config, parse_timestamp, search_with_format, set_sort, NoteStore, SortDirection, SortField,
    SortState,
};

#[derive(Parser)]
#[command(name = "memo")]
#[command(about = "memo: local notes in a SQLite file")]
struct Cli {
    /// Note store to use instead of the configured one.
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show where the store is, its schema version and how many notes it holds.
    Status,
    /// Show where memo stores its config and notes (app data directory).
    DataDir,
    /// Bring the store up to the current schema.
    Migrate,
    /// Create a note and print its id.
    Add {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// RFC 3339 or YYYY-MM-DD. Defaults to now.
        #[arg(long, value_parser = parse_date)]
        date: Option<DateTime<Utc>>,
    },
    /// Change a note. Fields left out keep their current value.
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, value_parser = parse_date)]
        date: Option<DateTime<Utc>>,
    },
    /// Delete a note.
    Rm { id: i64 },
    /// Print one note.
    Show { id: i64 },
    /// List notes, sorted and optionally filtered.
    List {
        /// date, created_at or updated_at. Defaults to the remembered sort.
        #[arg(long)]
        sort: Option<SortField>,
        #[arg(long, conflicts_with = "desc")]
        asc: bool,
        #[arg(long)]
        desc: bool,
        /// Keep notes containing every word (title, content or date).
        #[arg(long, short)]
        query: Option<String>,
    },
    /// Pick the remembered sort field; picking the current one flips the direction.
    Sort { field: SortField },
    /// Write all notes to a JSON file.
    Export {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Replace all notes with the contents of a JSON export.
    Import {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(s).ok_or_else(|| format!("not a date: {s:?} (use RFC 3339 or YYYY-MM-DD)"))
}

fn open_store(db: Option<&Path>) -> Result<NoteStore, memo_core::StoreError> {
    log::debug!("store override: {:?}", db);
    match db {
        Some(path) => NoteStore::open(path),
        None => NoteStore::open_default(),
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let db = cli.db.as_deref();
    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => {
            let store = open_store(db)?;
            let location = match db {
                Some(p) => p.display().to_string(),
                None => memo_core::default_db_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "?".to_string()),
            };
            println!("memo");
            println!("  store:  {}", location);
            println!("  schema: v{}", store.schema_version()?);
            println!("  notes:  {}", store.count()?);
        }
        Commands::DataDir => match app_data_dir() {
            Some(p) => println!("{}", p.display()),
            None => eprintln!("Could not determine app data directory."),
        },
        Commands::Migrate => {
            let store = open_store(db)?;
            println!("Schema at version {}", store.schema_version()?);
        }
        Commands::Add { title, content, date } => {
            let mut store = open_store(db)?;
            let id = store.add(&title, &content, date.unwrap_or_else(Utc::now))?;
            println!("{}", id);
        }
        Commands::Edit { id, title, content, date } => {
            let mut store = open_store(db)?;
            let Some(note) = store.get(id)? else {
                eprintln!("No note with id {}.", id);
                return Ok(());
            };
            store.update(
                id,
                title.as_deref().unwrap_or(&note.title),
                content.as_deref().unwrap_or(&note.content),
                date.unwrap_or(note.date),
            )?;
        }
        Commands::Rm { id } => {
            open_store(db)?.delete(id)?;
        }
        Commands::Show { id } => {
            let store = open_store(db)?;
            match store.get(id)? {
                Some(n) => {
                    let locale = load_config().locale();
                    println!("#{}  {}", n.id, n.title);
                    println!("  date:    {}", format_display_date_time(&n.date, locale));
                    println!("  created: {}", format_display_date_time(&n.created_at, locale));
                    println!("  updated: {}", format_display_date_time(&n.updated_at, locale));
                    println!();
                    println!("{}", n.content);
                }
                None => eprintln!("No note with id {}.", id),
            }
        }
        Commands::List { sort, asc, desc, query } => {
            let config = load_config();
            let remembered = config.sort();
            let field = sort.unwrap_or(remembered.field);
            let direction = if asc {
                SortDirection::Asc
            } else if desc {
                SortDirection::Desc
            } else if field == remembered.field {
                remembered.direction
            } else {
                SortDirection::Desc
            };

            let store = open_store(db)?;
            let notes = store.list_sorted(SortState::new(field, direction))?;
            let display = config.date_display();
            let shown = search_with_format(&notes, query.as_deref().unwrap_or(""), display);
            println!("{} of {} note(s), by {} {}", shown.len(), notes.len(), field, direction);
            for n in shown {
                let title = if n.title.is_empty() {
                    n.content.lines().next().unwrap_or("").trim()
                } else {
                    n.title.as_str()
                };
                let preview = if title.chars().count() > 60 {
                    format!("{}...", title.chars().take(60).collect::<String>())
                } else {
                    title.to_string()
                };
                println!("  {:>4}  {}  {}", n.id, format_display_date(&n.date, display), preview);
            }
        }
        Commands::Sort { field } => {
            let next = load_config().sort().select(field);
            set_sort(next)?;
            println!("Sorting by {} {}", next.field, next.direction);
        }
        Commands::Export { path } => {
            let store = open_store(db)?;
            let n = export_to_file(&store, &path)?;
            println!("Exported {} note(s) to {}", n, path.display());
        }
        Commands::Import { path } => {
            let mut store = open_store(db)?;
            let n = import_from_file(&mut store, &path)?;
            println!("Imported {} note(s) from {}", n, path.display());
        }
    }
    Ok(())
}
