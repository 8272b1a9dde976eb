//! The note data layer, independent of what drives it (CLI or an app UI).
//!
//! Notes live in a single SQLite file (see [app_data] and [config] for where). Opening a
//! [NoteStore] migrates the file to the current schema; sorting, searching and the
//! displayed list are pure functions over the notes it returns.

pub mod app_data;
pub mod config;
pub mod migrate;
pub mod note;
pub mod search;
pub mod sort;
pub mod store;
pub mod transfer;

pub use app_data::app_data_dir;
pub use config::{default_db_path, load_config, save_config, set_sort, Config, ConfigError};
pub use migrate::{migrate, schema_version, MigrateError, CURRENT_VERSION};
pub use note::{format_timestamp, parse_timestamp, Note};
pub use search::{
    format_display_date, format_display_date_time, search, search_with_format, view, view_with_format,
    DateDisplay, DEFAULT_DATE_FORMAT, DEFAULT_LOCALE,
};
pub use sort::{sort_notes, ParseSortError, SortDirection, SortField, SortState};
pub use store::{NoteStore, StoreError};
pub use transfer::{
    export_json, export_to_file, import_from_file, import_json, parse_import, NoteRecord, TransferError,
};
