//! Sync engine: keeps the local store convergent with the remote store.
//!
//! The engine is the single owner of the local store; every method that
//! touches it takes `&mut self`. Remote pushes and deletes run on spawned
//! tasks that only talk to the remote store, so no store access ever happens
//! off the owner. A full reconciliation (`sync_from_remote`) suspends the
//! caller while fetching and then merges and commits sequentially.
//!
//! Policy: remote wins on field conflicts for identities it returns, but a
//! note missing from the remote listing is never deleted locally.

mod task;


use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::db::{LocalStore, StoreChange};
use crate::models::{current_timestamp, Mood, NewNote, Note, NoteId};
use crate::remote::{RemoteCollection, RemoteStore};
use crate::wire::{from_wire, to_wire};
use crate::{Error, Result};

pub use task::RemoteTask;

/// Counts from one reconciliation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Local notes overwritten with remote fields
    pub updated: usize,
    /// Remote notes inserted locally
    pub created: usize,
    /// Local notes already equal to the remote copy
    pub unchanged: usize,
    /// Remote entries discarded as undecodable
    pub skipped: usize,
}

/// Reconciles a local store with an optional remote store.
pub struct SyncEngine<S> {
    store: S,
    remote: Option<Arc<dyn RemoteStore>>,
}

impl<S: LocalStore> SyncEngine<S> {
    /// Create an engine that pushes to and syncs from `remote`.
    pub fn new(store: S, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            remote: Some(remote),
        }
    }

    /// Create an engine with no remote store; mutations stay local.
    pub const fn local_only(store: S) -> Self {
        Self {
            store,
            remote: None,
        }
    }

    pub const fn is_connected(&self) -> bool {
        self.remote.is_some()
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Subscribe to local store change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.store.subscribe()
    }

    /// All notes, newest first.
    pub fn notes(&self) -> Result<Vec<Note>> {
        self.store.fetch_all()
    }

    pub fn note(&self, id: &NoteId) -> Result<Option<Note>> {
        self.store.get(id)
    }

    /// Create a note locally, then push it.
    ///
    /// A failed local save is logged and does not stop the push. An identity
    /// that is already stored is rejected before anything is written.
    pub fn create(&mut self, new_note: NewNote) -> Result<(Note, RemoteTask)> {
        if new_note.title.trim().is_empty() {
            return Err(Error::InvalidInput("Note title cannot be empty".to_string()));
        }

        let mut note = new_note.into_note();
        assign_identity(&mut note);
        if self.store.get(&note.id)?.is_some() {
            return Err(Error::AlreadyExists(note.id.to_string()));
        }
        let mut note = self.store.insert(note);
        self.save_logged("create");

        let task = self.push(&mut note);
        Ok((note, task))
    }

    /// Edit a note in place, stamp the current time, push it, then save.
    pub fn update(
        &mut self,
        note: &mut Note,
        title: impl Into<String>,
        body: Option<String>,
        mood: Mood,
    ) -> Result<RemoteTask> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("Note title cannot be empty".to_string()));
        }

        note.title = title;
        note.body = body;
        note.mood = mood;
        note.timestamp = current_timestamp();

        let task = self.push(note);
        self.store.update(note);
        self.save_logged("update");
        Ok(task)
    }

    /// Remove a note locally and from the remote store.
    pub fn delete(&mut self, note: &Note) -> RemoteTask {
        self.store.delete(&note.id);

        let task = match &self.remote {
            None => RemoteTask::skipped(),
            Some(_) if !note.id.is_assigned() => {
                RemoteTask::failed("delete", &note.id, Error::MissingIdentity)
            }
            Some(remote) => {
                let remote = Arc::clone(remote);
                let id = note.id.clone();
                RemoteTask::spawn("delete", id.clone(), async move { remote.delete(&id).await })
            }
        };

        self.save_logged("delete");
        task
    }

    /// Push one note to the remote store, assigning an identity if it has none.
    ///
    /// The assigned identity is written back onto `note` before any network
    /// call so later pushes target the same remote resource.
    pub fn push(&self, note: &mut Note) -> RemoteTask {
        assign_identity(note);

        let wire = match to_wire(note) {
            Ok(wire) => wire,
            Err(error) => return RemoteTask::failed("push", &note.id, error),
        };

        let Some(remote) = &self.remote else {
            return RemoteTask::skipped();
        };
        let remote = Arc::clone(remote);
        let id = note.id.clone();
        RemoteTask::spawn("push", id.clone(), async move { remote.put(&id, &wire).await })
    }

    /// Fetch the full remote collection and merge it into the local store.
    ///
    /// A fetch failure leaves the store untouched. Undecodable entries are
    /// skipped. Everything merged is committed in one save whose failure is
    /// returned.
    pub async fn sync_from_remote(&mut self) -> Result<SyncReport> {
        let remote = self
            .remote
            .clone()
            .ok_or_else(|| Error::InvalidInput("No remote store configured".to_string()))?;

        let fetched = remote.fetch_all().await.inspect_err(|error| {
            tracing::warn!(%error, "Remote fetch failed; local store left untouched");
        })?;

        let (mut to_create, skipped) = decode_collection(fetched);
        let ids: BTreeSet<NoteId> = to_create.keys().cloned().collect();
        let existing = self.store.fetch_by_identities(&ids)?;

        let mut report = SyncReport {
            skipped,
            ..SyncReport::default()
        };

        for mut local in existing {
            let Some(incoming) = to_create.remove(&local.id) else {
                continue;
            };
            if local == incoming {
                report.unchanged += 1;
                continue;
            }

            local.title = incoming.title;
            local.body = incoming.body;
            local.timestamp = incoming.timestamp;
            local.mood = incoming.mood;
            self.store.update(&local);
            report.updated += 1;
        }

        for note in to_create.into_values() {
            self.store.insert(note);
            report.created += 1;
        }

        self.store.save().inspect_err(|error| {
            tracing::warn!(%error, "Failed to save synced notes");
        })?;

        tracing::info!(
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            "Sync from remote completed"
        );
        Ok(report)
    }

    fn save_logged(&mut self, operation: &'static str) {
        if let Err(error) = self.store.save() {
            tracing::warn!(operation, %error, "Local save failed; changes remain pending");
        }
    }
}

fn assign_identity(note: &mut Note) {
    if !note.id.is_assigned() {
        note.id = NoteId::generate();
        tracing::debug!(note = %note.id, "Assigned new note identity");
    }
}

/// Decode remote entries, keeping only valid notes keyed by identity.
fn decode_collection(collection: RemoteCollection) -> (BTreeMap<NoteId, Note>, usize) {
    let mut notes = BTreeMap::new();
    let mut skipped = 0;

    for (key, wire) in collection {
        match from_wire(wire) {
            Ok(note) => {
                if note.id.as_str() != key {
                    tracing::warn!(
                        key = %key,
                        identifier = %note.id,
                        "Remote entry key differs from its identifier; using identifier"
                    );
                }
                notes.insert(note.id.clone(), note);
            }
            Err(error) => {
                tracing::warn!(key = %key, %error, "Skipping undecodable remote entry");
                skipped += 1;
            }
        }
    }

    (notes, skipped)
}
