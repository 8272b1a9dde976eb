//! Schema migration: brings a store from its recorded `user_version` up to [CURRENT_VERSION].
//!
//! Steps are keyed by the version they upgrade from and applied in order inside a single
//! transaction together with the final version bump. A failure anywhere rolls the whole run
//! back, so the stored version only ever moves after every pending step succeeded.

use chrono::Utc;
use log::{debug, info};
use rusqlite::{params, Connection};

use crate::note::format_timestamp;

/// Schema version this build expects.
pub const CURRENT_VERSION: u32 = 3;

/// One rung of the ladder.
pub(crate) struct Step {
    /// Version this step upgrades from; the store is at `from + 1` afterwards.
    pub from: u32,
    pub description: &'static str,
    /// `(name, value)` pragmas applied before the ladder's transaction opens.
    /// Journal mode cannot change inside a transaction.
    pub pragmas: &'static [(&'static str, &'static str)],
    pub apply: fn(&Connection) -> rusqlite::Result<()>,
}

pub(crate) const STEPS: &[Step] = &[
    Step {
        from: 0,
        description: "legacy items table, write-ahead log",
        pragmas: &[("journal_mode", "wal")],
        apply: create_items_table,
    },
    Step {
        from: 1,
        description: "notes table replaces items",
        pragmas: &[],
        apply: create_notes_table,
    },
    Step {
        from: 2,
        description: "backfill missing note dates",
        pragmas: &[],
        apply: backfill_note_dates,
    },
];

fn create_items_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS items (id INTEGER PRIMARY KEY NOT NULL, done INT, value TEXT);",
    )
}

fn create_notes_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS notes (
  id INTEGER PRIMARY KEY NOT NULL,
  title TEXT,
  content TEXT,
  created_at DATETIME DEFAULT CURRENT_TIMESTAMP NOT NULL,
  updated_at DATETIME DEFAULT CURRENT_TIMESTAMP NOT NULL,
  date DATETIME
);
DROP TABLE IF EXISTS items;
"#,
    )
}

fn backfill_note_dates(conn: &Connection) -> rusqlite::Result<()> {
    let now = format_timestamp(&Utc::now());
    let n = conn.execute("UPDATE notes SET date = ?1 WHERE date IS NULL", params![now])?;
    debug!("backfilled date on {} note(s)", n);
    Ok(())
}

/// Reads the store's schema version (`PRAGMA user_version`).
pub fn schema_version(conn: &Connection) -> Result<u32, MigrateError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(MigrateError::ReadVersion)
}

/// Runs every pending step. A no-op when the store is already at (or past) [CURRENT_VERSION].
pub fn migrate(conn: &mut Connection) -> Result<(), MigrateError> {
    run_ladder(conn, STEPS, CURRENT_VERSION)
}

pub(crate) fn run_ladder(conn: &mut Connection, steps: &[Step], target: u32) -> Result<(), MigrateError> {
    let current = schema_version(conn)?;
    if current >= target {
        debug!("schema at version {}, nothing to migrate", current);
        return Ok(());
    }

    let pending = plan(steps, current, target)?;
    for step in &pending {
        for (name, value) in step.pragmas {
            let mode: String = conn.pragma_update_and_check(None, name, value, |row| row.get(0))?;
            debug!("pragma {} = {} (now {})", name, value, mode);
        }
    }

    let tx = conn.transaction()?;
    for step in pending {
        (step.apply)(&tx).map_err(|source| MigrateError::Step {
            from: step.from,
            source,
        })?;
        info!("migrated schema v{} -> v{}: {}", step.from, step.from + 1, step.description);
    }
    tx.pragma_update(None, "user_version", target)?;
    tx.commit()?;
    info!("schema now at version {}", target);
    Ok(())
}

/// Steps needed to go from `current` to `target`, in order. Fails on a gap in the ladder.
fn plan(steps: &[Step], current: u32, target: u32) -> Result<Vec<&Step>, MigrateError> {
    (current..target)
        .map(|from| {
            steps
                .iter()
                .find(|s| s.from == from)
                .ok_or(MigrateError::MissingStep { from })
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("could not read schema version: {0}")]
    ReadVersion(rusqlite::Error),
    #[error("no migration step from schema version {from}")]
    MissingStep { from: u32 },
    #[error("migration from schema version {from} failed: {source}")]
    Step {
        from: u32,
        #[source]
        source: rusqlite::Error,
    },
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
