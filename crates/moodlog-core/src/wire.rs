//! Wire representation of a note for the remote JSON document store.
//!
//! The mapping is pure: no I/O, no identity generation. Structural decoding
//! (`WireNote::from_value`) is lenient about optional fields; semantic
//! decoding (`from_wire`) rejects anything that cannot become a valid `Note`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Mood, Note, NoteId};
use crate::{Error, Result};

/// JSON payload exchanged with the remote store for a single note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNote {
    #[serde(default)]
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub body_text: Option<String>,
    pub timestamp: String,
    pub mood: String,
}

impl WireNote {
    /// Read one collection entry, failing only on a structurally wrong shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|error| Error::Decode(error.to_string()))
    }
}

/// Convert a note into its wire form.
///
/// The identity is copied as-is and may be empty; callers that push must
/// assign one first.
pub fn to_wire(note: &Note) -> Result<WireNote> {
    if note.title.trim().is_empty() {
        return Err(Error::InvalidInput("Note title cannot be empty".to_string()));
    }

    Ok(WireNote {
        identifier: note.id.as_str().to_string(),
        title: note.title.clone(),
        body_text: note.body.clone(),
        timestamp: format_timestamp(note.timestamp),
        mood: note.mood.tag().to_string(),
    })
}

/// Convert a wire entry into a note.
pub fn from_wire(wire: WireNote) -> Result<Note> {
    let id = NoteId::from(wire.identifier);
    if !id.is_assigned() {
        return Err(Error::Decode("entry has an empty identifier".to_string()));
    }
    if wire.title.trim().is_empty() {
        return Err(Error::Decode(format!("entry '{id}' has an empty title")));
    }

    let mood = wire
        .mood
        .parse::<Mood>()
        .map_err(|error| Error::Decode(format!("entry '{id}': {error}")))?;
    let timestamp = parse_timestamp(&wire.timestamp)
        .map_err(|error| Error::Decode(format!("entry '{id}': {error}")))?;

    Ok(Note {
        id,
        title: wire.title,
        body: wire.body_text,
        timestamp,
        mood,
    })
}

/// ISO-8601 UTC with a `Z` suffix; sub-second digits only when non-zero.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an ISO-8601 timestamp, keeping every sub-second digit it carries.
pub fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| format!("invalid timestamp '{raw}': {error}"))
}
