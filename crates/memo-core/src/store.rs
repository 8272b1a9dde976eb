//! SQLite-backed note repository.
//!
//! One [NoteStore] owns one connection. Opening a store always runs the schema migrator
//! first, so every handle sees the current `notes` shape. Mutating calls take `&mut self`:
//! the store assumes a single active caller.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::config;
use crate::migrate::{self, MigrateError};
use crate::note::{format_timestamp, parse_timestamp, truncate_to_millis, Note};
use crate::sort::{SortDirection, SortField, SortState};

const NOTE_COLUMNS: &str = "id, title, content, date, created_at, updated_at";

/// Handle to the persistent note collection.
#[derive(Debug)]
pub struct NoteStore {
    conn: Connection,
}

impl NoteStore {
    /// Opens (or creates) the store file at `path` and migrates it.
    /// Parent directories are created if needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        debug!("opening note store at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    /// Private in-memory store; gone when dropped.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Opens the store at the configured location (see [config::default_db_path]).
    pub fn open_default() -> Result<Self, StoreError> {
        let path = config::default_db_path().ok_or(StoreError::NoDataDir)?;
        Self::open(&path)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, StoreError> {
        migrate::migrate(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn schema_version(&self) -> Result<u32, StoreError> {
        Ok(migrate::schema_version(&self.conn)?)
    }

    /// Inserts a note stamped with the current time and returns its id.
    ///
    /// An empty title is fine; a note with neither title nor content (after trimming)
    /// is rejected before anything is written.
    pub fn add(&mut self, title: &str, content: &str, date: DateTime<Utc>) -> Result<i64, StoreError> {
        if title.trim().is_empty() && content.trim().is_empty() {
            return Err(StoreError::EmptyNote);
        }
        let now = format_timestamp(&Utc::now());
        self.conn.execute(
            "INSERT INTO notes (title, content, date, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
            params![title, content, format_timestamp(&date), now],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("added note {}", id);
        Ok(id)
    }

    /// Overwrites title, content and date of note `id` and refreshes `updated_at`.
    /// Does nothing if there is no such note.
    pub fn update(
        &mut self,
        id: i64,
        title: &str,
        content: &str,
        date: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let previous: Option<String> = tx
            .query_row("SELECT updated_at FROM notes WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        let Some(previous) = previous else {
            debug!("update of missing note {} ignored", id);
            return Ok(());
        };
        let previous = parse_column("updated_at", &previous)?;
        let updated_at = next_updated_at(previous, Utc::now());
        tx.execute(
            "UPDATE notes SET title = ?1, content = ?2, date = ?3, updated_at = ?4 WHERE id = ?5",
            params![title, content, format_timestamp(&date), format_timestamp(&updated_at), id],
        )?;
        tx.commit()?;
        debug!("updated note {}", id);
        Ok(())
    }

    /// Removes note `id`. Missing ids are not an error.
    pub fn delete(&mut self, id: i64) -> Result<(), StoreError> {
        let n = self.conn.execute("DELETE FROM notes WHERE id = ?1", params![id])?;
        debug!("deleted note {} ({} row(s))", id, n);
        Ok(())
    }

    /// Point lookup; `None` when the note does not exist.
    pub fn get(&self, id: i64) -> Result<Option<Note>, StoreError> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1"),
                params![id],
                RawNote::from_row,
            )
            .optional()?;
        raw.map(RawNote::into_note).transpose()
    }

    /// Every note, ordered by `field` as a date/time value. Ties break on id in the
    /// same direction, so the descending list is exactly the reverse of the ascending one.
    ///
    /// A row whose timestamp cannot be parsed fails the whole read with
    /// [StoreError::InvalidTimestamp] instead of being left out, so an export never
    /// silently drops notes.
    pub fn list(&self, field: SortField, direction: SortDirection) -> Result<Vec<Note>, StoreError> {
        let dir = direction.keyword();
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes ORDER BY julianday({}) {dir}, id {dir}",
            field.column()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let raw = stmt
            .query_map([], RawNote::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawNote::into_note).collect()
    }

    pub fn list_sorted(&self, sort: SortState) -> Result<Vec<Note>, StoreError> {
        self.list(sort.field, sort.direction)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Replaces the whole collection with `notes`, keeping their ids and timestamps.
    ///
    /// Runs in one exclusive transaction: either every note lands or the previous
    /// collection is left untouched. A note with `created_at` after `updated_at` is
    /// rejected before the table is touched.
    pub fn replace_all(&mut self, notes: &[Note]) -> Result<(), StoreError> {
        if let Some(bad) = notes.iter().find(|n| n.created_at > n.updated_at) {
            return Err(StoreError::InvalidNote {
                id: bad.id,
                reason: "created_at is later than updated_at".to_string(),
            });
        }
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Exclusive)?;
        let removed = tx.execute("DELETE FROM notes", [])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO notes ({NOTE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ))?;
            for note in notes {
                stmt.execute(params![
                    note.id,
                    note.title,
                    note.content,
                    format_timestamp(&note.date),
                    format_timestamp(&note.created_at),
                    format_timestamp(&note.updated_at),
                ])?;
            }
        }
        tx.commit()?;
        debug!("replaced {} note(s) with {}", removed, notes.len());
        Ok(())
    }
}

/// `updated_at` for an update happening at `now`: never earlier than, nor equal to, the previous value.
fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = truncate_to_millis(now);
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

/// A row as stored: text timestamps, nullable legacy columns.
struct RawNote {
    id: i64,
    title: Option<String>,
    content: Option<String>,
    date: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RawNote {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            date: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_note(self) -> Result<Note, StoreError> {
        let created_at = parse_column("created_at", &self.created_at)?;
        let updated_at = parse_column("updated_at", &self.updated_at)?;
        let date = match self.date {
            Some(d) => parse_column("date", &d)?,
            None => created_at,
        };
        Ok(Note {
            id: self.id,
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            date,
            created_at,
            updated_at,
        })
    }
}

fn parse_column(column: &'static str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    parse_timestamp(value).ok_or_else(|| StoreError::InvalidTimestamp {
        column,
        value: value.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("note needs a title or some content")]
    EmptyNote,
    #[error("note {id} is invalid: {reason}")]
    InvalidNote { id: i64, reason: String },
    #[error("could not determine app data directory")]
    NoDataDir,
    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("schema migration failed: {0}")]
    Migrate(#[from] MigrateError),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid timestamp in column {column}: {value:?}")]
    InvalidTimestamp { column: &'static str, value: String },
}
