//! `SQLite` implementation of [`LocalStore`]

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection};
use tokio::sync::broadcast;

use super::migrations;
use super::store::{LocalStore, StoreChange};
use crate::error::Result;
use crate::models::{Mood, Note, NoteId};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

const SELECT_COLUMNS: &str =
    "SELECT id, title, body, timestamp_ms, mood, timestamp_sub_ms_ns FROM notes";

const NANOS_PER_MILLI: u32 = 1_000_000;

/// A change staged in the working set.
#[derive(Debug, Clone)]
enum Pending {
    Put(Note),
    Delete,
}

/// Local store backed by a `SQLite` file (or memory, for tests).
pub struct SqliteLocalStore {
    conn: Connection,
    pending: BTreeMap<NoteId, Pending>,
    changes: broadcast::Sender<StoreChange>,
}

impl SqliteLocalStore {
    /// Open a store at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory store (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::run(&conn)?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            conn,
            pending: BTreeMap::new(),
            changes,
        })
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(())
    }

    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
        let id: String = row.get(0)?;
        let timestamp_ms: i64 = row.get(3)?;
        let mood: String = row.get(4)?;
        let sub_ms_ns: i64 = row.get(5)?;

        let timestamp = DateTime::from_timestamp_millis(timestamp_ms)
            .and_then(|millis| millis.checked_add_signed(Duration::nanoseconds(sub_ms_ns)))
            .ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    Type::Integer,
                    format!("timestamp out of range: {timestamp_ms}").into(),
                )
            })?;
        let mood = mood.parse::<Mood>().map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(error))
        })?;

        Ok(Note {
            id: NoteId::from(id),
            title: row.get(1)?,
            body: row.get(2)?,
            timestamp,
            mood,
        })
    }

    fn query_committed(&self, ids: Option<&BTreeSet<NoteId>>) -> Result<Vec<Note>> {
        let notes = match ids {
            None => {
                let mut stmt = self.conn.prepare(SELECT_COLUMNS)?;
                let rows = stmt.query_map([], Self::parse_note)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            Some(ids) if ids.is_empty() => Vec::new(),
            Some(ids) => {
                let placeholders = vec!["?"; ids.len()].join(", ");
                let sql = format!("{SELECT_COLUMNS} WHERE id IN ({placeholders})");
                let mut stmt = self.conn.prepare(&sql)?;
                let params = params_from_iter(ids.iter().map(NoteId::as_str));
                let rows = stmt.query_map(params, Self::parse_note)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(notes)
    }

    /// Apply the working set on top of committed rows and sort newest first.
    fn overlay(&self, committed: Vec<Note>, ids: Option<&BTreeSet<NoteId>>) -> Vec<Note> {
        let mut merged: BTreeMap<NoteId, Note> = committed
            .into_iter()
            .map(|note| (note.id.clone(), note))
            .collect();

        for (id, change) in &self.pending {
            if ids.is_some_and(|ids| !ids.contains(id)) {
                continue;
            }
            match change {
                Pending::Put(note) => {
                    merged.insert(id.clone(), note.clone());
                }
                Pending::Delete => {
                    merged.remove(id);
                }
            }
        }

        let mut notes: Vec<Note> = merged.into_values().collect();
        notes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        notes
    }

    fn commit_pending(&mut self) -> Result<Vec<StoreChange>> {
        let tx = self.conn.transaction()?;
        let mut changes = Vec::with_capacity(self.pending.len());

        for (id, change) in &self.pending {
            match change {
                Pending::Put(note) => {
                    let existed: bool = tx.query_row(
                        "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1)",
                        params![id.as_str()],
                        |row| row.get(0),
                    )?;
                    let (timestamp_ms, sub_ms_ns) = split_timestamp(note.timestamp);
                    tx.execute(
                        "INSERT INTO notes (id, title, body, timestamp_ms, mood, timestamp_sub_ms_ns)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                         ON CONFLICT(id) DO UPDATE SET
                            title = excluded.title,
                            body = excluded.body,
                            timestamp_ms = excluded.timestamp_ms,
                            mood = excluded.mood,
                            timestamp_sub_ms_ns = excluded.timestamp_sub_ms_ns",
                        params![
                            note.id.as_str(),
                            note.title,
                            note.body,
                            timestamp_ms,
                            note.mood.tag(),
                            sub_ms_ns
                        ],
                    )?;
                    changes.push(if existed {
                        StoreChange::Updated(id.clone())
                    } else {
                        StoreChange::Inserted(id.clone())
                    });
                }
                Pending::Delete => {
                    let rows = tx.execute("DELETE FROM notes WHERE id = ?", params![id.as_str()])?;
                    if rows > 0 {
                        changes.push(StoreChange::Deleted(id.clone()));
                    }
                }
            }
        }

        tx.commit()?;
        Ok(changes)
    }
}

/// Whole milliseconds plus the nanoseconds below them.
fn split_timestamp(timestamp: DateTime<Utc>) -> (i64, i64) {
    let sub_ms_ns = timestamp.timestamp_subsec_nanos() % NANOS_PER_MILLI;
    (timestamp.timestamp_millis(), i64::from(sub_ms_ns))
}

impl LocalStore for SqliteLocalStore {
    fn fetch_by_identities(&self, ids: &BTreeSet<NoteId>) -> Result<Vec<Note>> {
        let committed = self.query_committed(Some(ids))?;
        Ok(self.overlay(committed, Some(ids)))
    }

    fn fetch_all(&self) -> Result<Vec<Note>> {
        let committed = self.query_committed(None)?;
        Ok(self.overlay(committed, None))
    }

    fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        let ids = BTreeSet::from([id.clone()]);
        Ok(self.fetch_by_identities(&ids)?.into_iter().next())
    }

    fn insert(&mut self, note: Note) -> Note {
        self.pending.insert(note.id.clone(), Pending::Put(note.clone()));
        note
    }

    fn update(&mut self, note: &Note) {
        self.pending.insert(note.id.clone(), Pending::Put(note.clone()));
    }

    fn delete(&mut self, id: &NoteId) {
        self.pending.insert(id.clone(), Pending::Delete);
    }

    fn save(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let changes = self.commit_pending()?;
        self.pending.clear();
        tracing::debug!(changes = changes.len(), "Saved local store");

        for change in changes {
            // No subscribers is fine.
            let _ = self.changes.send(change);
        }
        Ok(())
    }

    fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn note(id: &str, title: &str, minute: u32) -> Note {
        Note {
            id: NoteId::from(id),
            title: title.to_string(),
            body: None,
            timestamp: Utc.with_ymd_and_hms(2020, 1, 1, 0, minute, 0).unwrap(),
            mood: Mood::Neutral,
        }
    }

    #[test]
    fn test_insert_is_visible_before_and_after_save() {
        let mut store = SqliteLocalStore::open_in_memory().unwrap();
        store.insert(note("a1", "First", 0));

        assert!(store.has_changes());
        assert_eq!(store.fetch_all().unwrap().len(), 1);

        store.save().unwrap();
        assert!(!store.has_changes());
        assert_eq!(store.get(&NoteId::from("a1")).unwrap(), Some(note("a1", "First", 0)));
    }

    #[test]
    fn test_fetch_all_is_newest_first() {
        let mut store = SqliteLocalStore::open_in_memory().unwrap();
        store.insert(note("old", "Old", 0));
        store.insert(note("new", "New", 30));
        store.save().unwrap();
        store.insert(note("mid", "Mid", 15));

        let titles: Vec<String> = store
            .fetch_all()
            .unwrap()
            .into_iter()
            .map(|note| note.title)
            .collect();
        assert_eq!(titles, vec!["New", "Mid", "Old"]);
    }

    #[test]
    fn test_fetch_by_identities_filters_committed_and_pending() {
        let mut store = SqliteLocalStore::open_in_memory().unwrap();
        store.insert(note("a1", "A", 0));
        store.insert(note("b2", "B", 1));
        store.save().unwrap();
        store.insert(note("c3", "C", 2));

        let ids = BTreeSet::from([NoteId::from("a1"), NoteId::from("c3"), NoteId::from("zz")]);
        let found: Vec<String> = store
            .fetch_by_identities(&ids)
            .unwrap()
            .into_iter()
            .map(|note| note.id.to_string())
            .collect();
        assert_eq!(found, vec!["c3", "a1"]);
        assert!(store.fetch_by_identities(&BTreeSet::new()).unwrap().is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let mut store = SqliteLocalStore::open_in_memory().unwrap();
        let mut first = store.insert(note("a1", "Old", 0));
        store.save().unwrap();

        first.title = "New".to_string();
        first.mood = Mood::Sad;
        store.update(&first);
        store.save().unwrap();
        assert_eq!(store.get(&first.id).unwrap(), Some(first.clone()));

        store.delete(&first.id);
        assert_eq!(store.get(&first.id).unwrap(), None);
        store.save().unwrap();
        assert!(store.fetch_all().unwrap().is_empty());
    }

    #[test]
    fn test_save_emits_changes() {
        let mut store = SqliteLocalStore::open_in_memory().unwrap();
        let mut changes = store.subscribe();

        let mut first = store.insert(note("a1", "A", 0));
        store.save().unwrap();
        first.title = "B".to_string();
        store.update(&first);
        store.save().unwrap();
        store.delete(&first.id);
        store.delete(&NoteId::from("never-stored"));
        store.save().unwrap();

        let id = NoteId::from("a1");
        assert_eq!(changes.try_recv().unwrap(), StoreChange::Inserted(id.clone()));
        assert_eq!(changes.try_recv().unwrap(), StoreChange::Updated(id.clone()));
        assert_eq!(changes.try_recv().unwrap(), StoreChange::Deleted(id));
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn test_failed_save_keeps_pending_changes() {
        let mut store = SqliteLocalStore::open_in_memory().unwrap();
        store.insert(note("  ", "Blank identity", 0));

        assert!(store.save().is_err());
        assert!(store.has_changes());

        store.delete(&NoteId::from("  "));
        store.save().unwrap();
        assert!(store.fetch_all().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_saved_notes() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("moodlog.db");

        {
            let mut store = SqliteLocalStore::open(&path).unwrap();
            let mut saved = note("a1", "Persisted", 0);
            saved.body = Some("body".to_string());
            saved.mood = Mood::Happy;
            store.insert(saved);
            store.save().unwrap();
            store.insert(note("b2", "Unsaved", 1));
        }

        let store = SqliteLocalStore::open(&path).unwrap();
        let notes = store.fetch_all().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Persisted");
        assert_eq!(notes[0].body.as_deref(), Some("body"));
        assert_eq!(notes[0].mood, Mood::Happy);
    }

    #[test]
    fn test_change_kind_follows_committed_rows() {
        let mut store = SqliteLocalStore::open_in_memory().unwrap();
        let mut changes = store.subscribe();

        store.update(&note("fresh", "Never stored", 0));
        store.save().unwrap();
        store.insert(note("fresh", "Stored now", 1));
        store.save().unwrap();

        let id = NoteId::from("fresh");
        assert_eq!(changes.try_recv().unwrap(), StoreChange::Inserted(id.clone()));
        assert_eq!(changes.try_recv().unwrap(), StoreChange::Updated(id));
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn test_timestamps_keep_sub_millisecond_precision() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("moodlog.db");
        let mut precise = note("a1", "Precise", 0);
        precise.timestamp = Utc
            .with_ymd_and_hms(2021, 3, 4, 5, 6, 7)
            .unwrap()
            .with_nanosecond(250_123_456)
            .unwrap();

        {
            let mut store = SqliteLocalStore::open(&path).unwrap();
            store.insert(precise.clone());
            store.save().unwrap();
        }

        let store = SqliteLocalStore::open(&path).unwrap();
        assert_eq!(store.get(&precise.id).unwrap(), Some(precise));
    }
}
