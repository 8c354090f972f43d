use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use moodlog_core::config::RemoteConfig;
use moodlog_core::db::{LocalStore, SqliteLocalStore};
use moodlog_core::remote::HttpRemoteStore;
use moodlog_core::util::normalize_text_option;
use moodlog_core::{Note, NoteId, RemoteTask, SyncEngine};
use serde::Serialize;

use crate::error::CliError;

/// Resolved settings shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub db_path: PathBuf,
    pub remote: Option<RemoteConfig>,
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    pub mood: String,
    pub timestamp: String,
    pub relative_time: String,
}

pub fn open_engine(context: &CommandContext) -> Result<SyncEngine<SqliteLocalStore>, CliError> {
    let store = SqliteLocalStore::open(&context.db_path)?;

    if let Some(config) = context.remote.clone() {
        tracing::debug!(url = %config.collection_url(), "Remote store configured");
        let remote = HttpRemoteStore::new(config)?;
        Ok(SyncEngine::new(store, Arc::new(remote)))
    } else {
        tracing::debug!("No remote store configured; running local-only");
        Ok(SyncEngine::local_only(store))
    }
}

/// Wait for a remote push/delete and report failure without failing the command.
pub async fn finish_remote_task(task: RemoteTask, action: &str) {
    if let Err(error) = task.wait().await {
        eprintln!("Warning: {action} was saved locally but not on the remote: {error}");
    }
}

pub fn resolve_note<S: LocalStore>(
    note_query: &str,
    engine: &SyncEngine<S>,
) -> Result<Note, CliError> {
    let note_query = normalize_note_identifier(note_query)?;
    if let Some(note) = engine.note(&NoteId::from(note_query.as_str()))? {
        return Ok(note);
    }

    let mut matching = engine
        .notes()?
        .into_iter()
        .filter(|note| note.id.as_str().starts_with(&note_query))
        .collect::<Vec<_>>();

    match matching.len() {
        0 => Err(CliError::NoteNotFound(note_query)),
        1 => Ok(matching.remove(0)),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|note| short_id(&note.id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{note_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let short_id = short_id(&note.id);
            let preview = note_preview(note, 40);
            let relative_time = format_relative_time(note.timestamp.timestamp_millis(), now_ms);
            format!(
                "{short_id:<13}  {:<7}  {preview:<40}  {relative_time}",
                note.mood.tag()
            )
        })
        .collect()
}

pub fn format_note_detail(note: &Note) -> String {
    let mut detail = format!(
        "id:     {}\ntitle:  {}\nmood:   {}\nwhen:   {}",
        note.id,
        note.title,
        note.mood,
        note.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(body) = note.body.as_deref().filter(|body| !body.trim().is_empty()) {
        detail.push_str("\n\n");
        detail.push_str(body);
    }
    detail
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        body: note.body.clone(),
        mood: note.mood.tag().to_string(),
        timestamp: note.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        relative_time: format_relative_time(note.timestamp.timestamp_millis(), now_ms),
    }
}

pub fn short_id(id: &NoteId) -> String {
    id.as_str().chars().take(13).collect()
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let collapsed = note.title.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_title(title_parts: &[String]) -> Result<String, CliError> {
    normalize_text_option(Some(title_parts.join(" "))).ok_or(CliError::EmptyTitle)
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    normalize_text_option(Some(id.to_string())).ok_or(CliError::EmptyNoteId)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("MOODLOG_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moodlog")
        .join("moodlog.db")
}
