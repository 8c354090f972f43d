//! Local store contract consumed by the sync engine.

use std::collections::BTreeSet;

use tokio::sync::broadcast;

use crate::models::{Note, NoteId};
use crate::Result;

/// Change notification emitted after a successful save, one per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Inserted(NoteId),
    Updated(NoteId),
    Deleted(NoteId),
}

impl StoreChange {
    #[must_use]
    pub const fn id(&self) -> &NoteId {
        match self {
            Self::Inserted(id) | Self::Updated(id) | Self::Deleted(id) => id,
        }
    }
}

/// Durable note storage with a pending working set.
///
/// `insert`, `update` and `delete` only stage changes; reads already see
/// them. `save` commits everything staged in one transaction and then
/// notifies subscribers. A failed save keeps the staged changes.
pub trait LocalStore {
    /// Notes whose identity is in `ids`, newest first.
    fn fetch_by_identities(&self, ids: &BTreeSet<NoteId>) -> Result<Vec<Note>>;

    /// All notes, newest first.
    fn fetch_all(&self) -> Result<Vec<Note>>;

    /// A single note by identity.
    fn get(&self, id: &NoteId) -> Result<Option<Note>>;

    /// Stage a new note and return it as stored.
    fn insert(&mut self, note: Note) -> Note;

    /// Stage new field values for an existing note.
    fn update(&mut self, note: &Note);

    /// Stage removal of a note.
    fn delete(&mut self, id: &NoteId);

    /// Commit staged changes in one transaction.
    fn save(&mut self) -> Result<()>;

    /// Whether anything is staged and not yet saved.
    fn has_changes(&self) -> bool;

    /// Subscribe to change notifications emitted by `save`.
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}
