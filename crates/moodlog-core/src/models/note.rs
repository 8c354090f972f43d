//! Note model

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Mood;

/// Identity shared by a note's local and remote representations.
///
/// Locally generated identities are UUID v7 (time-sortable), but any
/// non-empty string coming from the remote store is accepted verbatim.
/// An empty identity means "not yet assigned".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generate a fresh unique identity
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// The unassigned identity
    #[must_use]
    pub const fn unassigned() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether an identity has been assigned (non-blank)
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A journal note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Identity, stable once assigned
    pub id: NoteId,
    /// Title (required, never blank)
    pub title: String,
    /// Optional free-form body
    pub body: Option<String>,
    /// When the note was written or last edited
    pub timestamp: DateTime<Utc>,
    /// Mood at the time of writing
    pub mood: Mood,
}

impl Note {
    /// Get the body, or an empty string when absent
    #[must_use]
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// Get the title truncated to `max_len` characters
    #[must_use]
    pub fn title_preview(&self, max_len: usize) -> String {
        self.title.chars().take(max_len).collect()
    }
}

/// Current time, truncated to milliseconds.
#[must_use]
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Input for creating a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub id: NoteId,
    pub title: String,
    pub body: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub mood: Mood,
}

impl NewNote {
    /// Start a new note with the given title and default everything else
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: NoteId::unassigned(),
            title: title.into(),
            body: None,
            timestamp: None,
            mood: Mood::default(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<NoteId>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub const fn with_mood(mut self, mood: Mood) -> Self {
        self.mood = mood;
        self
    }

    /// Build the note, stamping the current time when no timestamp was given.
    #[must_use]
    pub fn into_note(self) -> Note {
        Note {
            id: self.id,
            title: self.title,
            body: self.body,
            timestamp: self.timestamp.unwrap_or_else(current_timestamp),
            mood: self.mood,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_note_id_generate_unique() {
        let id1 = NoteId::generate();
        let id2 = NoteId::generate();
        assert_ne!(id1, id2);
        assert!(id1.is_assigned());
    }

    #[test]
    fn test_note_id_unassigned() {
        assert!(!NoteId::unassigned().is_assigned());
        assert!(!NoteId::from("  ").is_assigned());
        assert!(NoteId::from("a1").is_assigned());
    }

    #[test]
    fn test_new_note_defaults() {
        let note = NewNote::new("Hello").into_note();
        assert_eq!(note.title, "Hello");
        assert_eq!(note.mood, Mood::Neutral);
        assert!(note.body.is_none());
        assert!(!note.id.is_assigned());
        assert_eq!(note.timestamp.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_new_note_keeps_explicit_fields() {
        let ts = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let note = NewNote::new("T")
            .with_id("a1")
            .with_body("body")
            .with_timestamp(ts)
            .with_mood(Mood::Happy)
            .into_note();
        assert_eq!(note.id.as_str(), "a1");
        assert_eq!(note.body_text(), "body");
        assert_eq!(note.timestamp, ts);
        assert_eq!(note.mood, Mood::Happy);
    }

    #[test]
    fn test_title_preview() {
        let note = NewNote::new("First line of a title").into_note();
        assert_eq!(note.title_preview(5), "First");
    }
}
