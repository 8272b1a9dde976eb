//! Persisted config (store location, list sort, date format) in the app data directory.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::Locale;
use serde::{Deserialize, Serialize};

use crate::app_data;
use crate::search::{DateDisplay, DEFAULT_DATE_FORMAT, DEFAULT_LOCALE};
use crate::sort::{SortDirection, SortField, SortState};

const CONFIG_FILENAME: &str = "config.toml";
const DB_FILENAME: &str = "notes.db";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the note store lives. Defaults to `notes.db` in the app data directory.
    pub db_path: Option<String>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    /// strftime-style format for displayed (and searched) note dates.
    pub date_format: Option<String>,
    /// Locale for month and weekday names, e.g. `ru_RU` or `en_US`.
    pub locale: Option<String>,
}

impl Config {
    pub fn sort(&self) -> SortState {
        SortState::new(self.sort_field, self.sort_direction)
    }

    /// The configured date format, or the default when unset or not a valid strftime string.
    pub fn date_format(&self) -> &str {
        self.date_format
            .as_deref()
            .filter(|s| !s.is_empty() && is_valid_format(s))
            .unwrap_or(DEFAULT_DATE_FORMAT)
    }

    /// The configured locale, or `ru_RU` when unset or unknown.
    pub fn locale(&self) -> Locale {
        match self.locale.as_deref().filter(|s| !s.is_empty()) {
            Some(name) => Locale::try_from(name).unwrap_or_else(|_| {
                log::warn!("unknown locale {:?}, using {:?}", name, DEFAULT_LOCALE);
                DEFAULT_LOCALE
            }),
            None => DEFAULT_LOCALE,
        }
    }

    /// How lists render (and search matches) note dates.
    pub fn date_display(&self) -> DateDisplay<'_> {
        DateDisplay::new(self.date_format(), self.locale())
    }
}

fn is_valid_format(format: &str) -> bool {
    StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

/// Load config from the app data directory. Returns default config if missing or invalid.
pub fn load_config() -> Config {
    let Some(data_dir) = app_data::app_data_dir() else {
        return Config::default();
    };
    load_config_from(&data_dir.join(CONFIG_FILENAME))
}

/// Load config from an explicit file. Returns default config if missing or invalid.
pub fn load_config_from(path: &Path) -> Config {
    let Ok(s) = std::fs::read_to_string(path) else {
        return Config::default();
    };
    match toml::from_str(&s) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring invalid config {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Save config to the app data directory.
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    let data_dir = app_data::app_data_dir().ok_or(ConfigError::NoDataDir)?;
    save_config_to(&data_dir.join(CONFIG_FILENAME), config)
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let s = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    std::fs::write(path, s).map_err(ConfigError::Write)
}

/// Path of the note store: the configured `db_path`, else `notes.db` in the app data directory.
pub fn default_db_path() -> Option<PathBuf> {
    db_path_for(&load_config(), app_data::app_data_dir())
}

fn db_path_for(config: &Config, data_dir: Option<PathBuf>) -> Option<PathBuf> {
    match config.db_path.as_deref().filter(|s| !s.is_empty()) {
        Some(p) => Some(PathBuf::from(p)),
        None => data_dir.map(|d| d.join(DB_FILENAME)),
    }
}

/// Persist the list sort so the next session starts with it.
pub fn set_sort(sort: SortState) -> Result<(), ConfigError> {
    let mut config = load_config();
    config.sort_field = sort.field;
    config.sort_direction = sort.direction;
    save_config(&config)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine app data directory")]
    NoDataDir,
    #[error("failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(std::io::Error),
}
