//! JSON export and import of the whole note collection.
//!
//! Export writes a flat array of records with ISO-8601 date strings. Import checks every
//! record before touching the store and then swaps the collection in one transaction,
//! so a bad payload never leaves a half-imported store behind.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::note::{format_timestamp, parse_timestamp, Note};
use crate::sort::{SortDirection, SortField};
use crate::store::{NoteStore, StoreError};

/// One note on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub date: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Note> for NoteRecord {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            content: note.content.clone(),
            date: format_timestamp(&note.date),
            created_at: format_timestamp(&note.created_at),
            updated_at: format_timestamp(&note.updated_at),
        }
    }
}

impl NoteRecord {
    fn into_note(self) -> Result<Note, String> {
        let parse = |field: &str, value: &str| {
            parse_timestamp(value).ok_or_else(|| format!("{field} is not a date: {value:?}"))
        };
        let date = parse("date", &self.date)?;
        let created_at = parse("created_at", &self.created_at)?;
        let updated_at = parse("updated_at", &self.updated_at)?;
        if created_at > updated_at {
            return Err("created_at is later than updated_at".to_string());
        }
        Ok(Note {
            id: self.id,
            title: self.title,
            content: self.content,
            date,
            created_at,
            updated_at,
        })
    }
}

/// Serializes every note, oldest first, as pretty-printed JSON.
pub fn export_json(store: &NoteStore) -> Result<String, TransferError> {
    let notes = store.list(SortField::CreatedAt, SortDirection::Asc)?;
    let records: Vec<NoteRecord> = notes.iter().map(NoteRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Writes [export_json] output to `path`. Returns the number of exported notes.
pub fn export_to_file(store: &NoteStore, path: &Path) -> Result<usize, TransferError> {
    let json = export_json(store)?;
    std::fs::write(path, json).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let n = store.count()?;
    info!("exported {} note(s) to {}", n, path.display());
    Ok(n)
}

/// Validates an import payload. Any bad record rejects the whole batch.
pub fn parse_import(json: &str) -> Result<Vec<Note>, TransferError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let serde_json::Value::Array(items) = value else {
        return Err(TransferError::NotAnArray);
    };
    let mut seen = HashSet::new();
    let mut notes = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            return Err(TransferError::InvalidRecord {
                index,
                reason: "not an object".to_string(),
            });
        }
        let record: NoteRecord = serde_json::from_value(item).map_err(|e| TransferError::InvalidRecord {
            index,
            reason: e.to_string(),
        })?;
        let note = record
            .into_note()
            .map_err(|reason| TransferError::InvalidRecord { index, reason })?;
        if !seen.insert(note.id) {
            return Err(TransferError::DuplicateId { index, id: note.id });
        }
        notes.push(note);
    }
    Ok(notes)
}

/// Replaces the store's notes with the payload. Returns the number of imported notes.
pub fn import_json(store: &mut NoteStore, json: &str) -> Result<usize, TransferError> {
    let notes = parse_import(json).inspect_err(|e| warn!("import rejected: {}", e))?;
    store.replace_all(&notes)?;
    info!("imported {} note(s)", notes.len());
    Ok(notes.len())
}

pub fn import_from_file(store: &mut NoteStore, path: &Path) -> Result<usize, TransferError> {
    let json = std::fs::read_to_string(path).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    import_json(store, &json)
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("import payload must be a JSON array of notes")]
    NotAnArray,
    #[error("record {index} is invalid: {reason}")]
    InvalidRecord { index: usize, reason: String },
    #[error("record {index} repeats note id {id}")]
    DuplicateId { index: usize, id: i64 },
    #[error("i/o error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn seeded() -> NoteStore {
        let mut store = NoteStore::open_in_memory().unwrap();
        store
            .add("first", "hello", Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap())
            .unwrap();
        store
            .add("second", "world", Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap())
            .unwrap();
        store
    }

    fn all(store: &NoteStore) -> Vec<Note> {
        store.list(SortField::CreatedAt, SortDirection::Asc).unwrap()
    }

    const VALID: &str = r#"[
        {"id": 3, "title": "a", "content": "x", "date": "2024-01-01T00:00:00.000Z",
         "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-02T00:00:00Z"},
        {"id": 9, "title": "", "content": "y", "date": "2023-12-31T10:00:00+02:00",
         "created_at": "2023-12-31 08:00:00", "updated_at": "2023-12-31 08:00:00"}
    ]"#;

    #[test]
    fn export_then_import_into_fresh_store() {
        let source = seeded();
        let json = export_json(&source).unwrap();
        let mut target = NoteStore::open_in_memory().unwrap();
        assert_eq!(import_json(&mut target, &json).unwrap(), 2);
        assert_eq!(all(&target), all(&source));
    }

    #[test]
    fn export_uses_iso_strings() {
        let store = seeded();
        let records: Vec<NoteRecord> = serde_json::from_str(&export_json(&store).unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "first");
        assert_eq!(records[0].date, "2024-01-01T08:00:00.000Z");
    }

    #[test]
    fn import_replaces_existing_notes() {
        let mut store = seeded();
        assert_eq!(import_json(&mut store, VALID).unwrap(), 2);
        let notes = all(&store);
        assert_eq!(notes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![9, 3]);
        assert_eq!(notes[0].date, Utc.with_ymd_and_hms(2023, 12, 31, 8, 0, 0).unwrap());
    }

    #[test]
    fn empty_array_clears_store() {
        let mut store = seeded();
        assert_eq!(import_json(&mut store, "[]").unwrap(), 0);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn content_must_be_a_string() {
        let mut store = seeded();
        let before = all(&store);
        let payload = r#"[
            {"id": 1, "title": "ok", "content": "fine", "date": "2024-01-01T00:00:00Z",
             "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"},
            {"id": 2, "title": "bad", "content": 42, "date": "2024-01-01T00:00:00Z",
             "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"}
        ]"#;
        let err = import_json(&mut store, payload).unwrap_err();
        assert!(matches!(err, TransferError::InvalidRecord { index: 1, .. }));
        assert_eq!(all(&store), before);
    }

    #[test]
    fn rejects_missing_field_bad_date_and_shape() {
        let missing = r#"[{"id": 1, "title": "t", "date": "2024-01-01T00:00:00Z",
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"}]"#;
        assert!(matches!(parse_import(missing), Err(TransferError::InvalidRecord { index: 0, .. })));

        let bad_date = r#"[{"id": 1, "title": "t", "content": "c", "date": "yesterday",
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"}]"#;
        match parse_import(bad_date) {
            Err(TransferError::InvalidRecord { index: 0, reason }) => assert!(reason.contains("date")),
            other => panic!("unexpected: {other:?}"),
        }

        let backwards = r#"[{"id": 1, "title": "t", "content": "c", "date": "2024-01-01T00:00:00Z",
            "created_at": "2024-02-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"}]"#;
        assert!(matches!(parse_import(backwards), Err(TransferError::InvalidRecord { .. })));

        assert!(matches!(parse_import(r#"{"id": 1}"#), Err(TransferError::NotAnArray)));
        assert!(matches!(parse_import("[1]"), Err(TransferError::InvalidRecord { index: 0, .. })));
        assert!(matches!(parse_import("not json"), Err(TransferError::Json(_))));
    }

    #[test]
    fn duplicate_ids_rejected_before_store_is_touched() {
        let mut store = seeded();
        let before = all(&store);
        let payload = r#"[
            {"id": 5, "title": "a", "content": "", "date": "2024-01-01T00:00:00Z",
             "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"},
            {"id": 5, "title": "b", "content": "", "date": "2024-01-01T00:00:00Z",
             "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"}
        ]"#;
        let err = import_json(&mut store, payload).unwrap_err();
        assert!(matches!(err, TransferError::DuplicateId { index: 1, id: 5 }));
        assert_eq!(all(&store), before);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        let source = seeded();
        assert_eq!(export_to_file(&source, &path).unwrap(), 2);
        let mut target = NoteStore::open(&dir.path().join("target.db")).unwrap();
        assert_eq!(import_from_file(&mut target, &path).unwrap(), 2);
        assert_eq!(all(&target), all(&source));
        assert!(matches!(
            import_from_file(&mut target, &dir.path().join("missing.json")),
            Err(TransferError::Io { .. })
        ));
    }
}
