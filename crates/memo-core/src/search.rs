//! Client-side text search over an already loaded (and sorted) note list.
//!
//! Search never queries the store and never reorders: it keeps the notes whose title,
//! content, or displayed date contain every term of the query.

use chrono::{DateTime, Locale, Utc};

use crate::note::Note;
use crate::sort::{sort_notes, SortState};

/// Date format shown in note lists and matched by search, e.g. `15 января 2024 г.`.
pub const DEFAULT_DATE_FORMAT: &str = "%-d %B %Y г.";

/// Long form used on the detail view, e.g. `15 января 2024 г., 09:30`.
pub const DEFAULT_DATE_TIME_FORMAT: &str = "%-d %B %Y г., %H:%M";

/// Month and weekday names follow this locale unless configured otherwise.
pub const DEFAULT_LOCALE: Locale = Locale::ru_RU;

/// How note dates are rendered for display and for matching search terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateDisplay<'a> {
    /// strftime-style format.
    pub format: &'a str,
    pub locale: Locale,
}

impl<'a> DateDisplay<'a> {
    pub fn new(format: &'a str, locale: Locale) -> Self {
        Self { format, locale }
    }

    pub fn render(&self, date: &DateTime<Utc>) -> String {
        date.format_localized(self.format, self.locale).to_string()
    }
}

impl Default for DateDisplay<'static> {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT, DEFAULT_LOCALE)
    }
}

pub fn format_display_date(date: &DateTime<Utc>, display: DateDisplay<'_>) -> String {
    display.render(date)
}

pub fn format_display_date_time(date: &DateTime<Utc>, locale: Locale) -> String {
    DateDisplay::new(DEFAULT_DATE_TIME_FORMAT, locale).render(date)
}

/// Filters `notes` by `query` using the default date display.
pub fn search(notes: &[Note], query: &str) -> Vec<Note> {
    search_with_format(notes, query, DateDisplay::default())
}

/// Filters `notes` by `query`, matching dates as rendered by `display`.
/// An empty or whitespace-only query returns every note, in the given order.
pub fn search_with_format(notes: &[Note], query: &str, display: DateDisplay<'_>) -> Vec<Note> {
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if terms.is_empty() {
        return notes.to_vec();
    }
    notes
        .iter()
        .filter(|note| matches_all(note, &terms, display))
        .cloned()
        .collect()
}

fn matches_all(note: &Note, terms: &[String], display: DateDisplay<'_>) -> bool {
    let haystacks = [
        note.title.to_lowercase(),
        note.content.to_lowercase(),
        display.render(&note.date).to_lowercase(),
    ];
    terms
        .iter()
        .all(|term| haystacks.iter().any(|h| h.contains(term.as_str())))
}

/// The list a collaborator displays: `notes` ordered by `sort`, then filtered by `query`.
/// Pure; recompute whenever any input changes.
pub fn view(notes: &[Note], query: &str, sort: SortState) -> Vec<Note> {
    view_with_format(notes, query, sort, DateDisplay::default())
}

/// [view] with dates matched as `display` renders them, so the filter agrees with what is shown.
pub fn view_with_format(notes: &[Note], query: &str, sort: SortState, display: DateDisplay<'_>) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    sort_notes(&mut sorted, sort);
    search_with_format(&sorted, query, display)
}
