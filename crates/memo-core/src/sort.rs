//! Sort fields, directions, and the toggle rule collaborators use when the user picks a field.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::note::Note;

/// Date/time column a note list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Date,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::Date, SortField::CreatedAt, SortField::UpdatedAt];

    /// Column name in the `notes` table.
    pub fn column(self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }

    fn key(self, note: &Note) -> DateTime<Utc> {
        match self {
            SortField::Date => note.date,
            SortField::CreatedAt => note.created_at,
            SortField::UpdatedAt => note.updated_at,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SortField {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "date" => Ok(SortField::Date),
            "created_at" | "created" => Ok(SortField::CreatedAt),
            "updated_at" | "updated" => Ok(SortField::UpdatedAt),
            _ => Err(ParseSortError::Field(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// SQL keyword for `ORDER BY`.
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for SortDirection {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ParseSortError::Direction(s.to_string())),
        }
    }
}

/// Active sort of a note list. Defaults to newest logical date first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Picking the active field again flips the direction; picking another field
    /// switches to it, descending.
    pub fn select(self, field: SortField) -> Self {
        if field == self.field {
            Self::new(field, self.direction.reversed())
        } else {
            Self::new(field, SortDirection::Desc)
        }
    }

    /// Ordering between two notes, ties broken by id in the same direction.
    pub fn compare(&self, a: &Note, b: &Note) -> Ordering {
        let ord = self
            .field
            .key(a)
            .cmp(&self.field.key(b))
            .then_with(|| a.id.cmp(&b.id));
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// Orders `notes` in place the same way `NoteStore::list` orders rows.
pub fn sort_notes(notes: &mut [Note], state: SortState) {
    notes.sort_by(|a, b| state.compare(a, b));
}

#[derive(Debug, thiserror::Error)]
pub enum ParseSortError {
    #[error("unknown sort field: {0} (expected date, created_at or updated_at)")]
    Field(String),
    #[error("unknown sort direction: {0} (expected asc or desc)")]
    Direction(String),
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn note(id: i64, day: u32) -> Note {
        let ts = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
        Note {
            id,
            title: format!("n{id}"),
            content: String::new(),
            date: ts,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn select_same_field_flips() {
        let s = SortState::default();
        assert_eq!(s.select(SortField::Date), SortState::new(SortField::Date, SortDirection::Asc));
        assert_eq!(
            s.select(SortField::Date).select(SortField::Date),
            SortState::new(SortField::Date, SortDirection::Desc)
        );
    }

    #[test]
    fn select_other_field_resets_to_desc() {
        let s = SortState::new(SortField::Date, SortDirection::Asc);
        assert_eq!(
            s.select(SortField::UpdatedAt),
            SortState::new(SortField::UpdatedAt, SortDirection::Desc)
        );
    }

    #[test]
    fn parse_fields_and_directions() {
        assert_eq!("created_at".parse::<SortField>().unwrap(), SortField::CreatedAt);
        assert_eq!("updated-at".parse::<SortField>().unwrap(), SortField::UpdatedAt);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("title".parse::<SortField>().is_err());
        assert!("up".parse::<SortDirection>().is_err());
    }

    #[test]
    fn sort_desc_is_reverse_of_asc_with_ties() {
        let notes = vec![note(1, 5), note(2, 3), note(3, 5), note(4, 1)];
        let mut asc = notes.clone();
        sort_notes(&mut asc, SortState::new(SortField::Date, SortDirection::Asc));
        let mut desc = notes;
        sort_notes(&mut desc, SortState::new(SortField::Date, SortDirection::Desc));
        desc.reverse();
        assert_eq!(asc, desc);
        let ids: Vec<i64> = asc.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![4, 2, 1, 3]);
    }
}
