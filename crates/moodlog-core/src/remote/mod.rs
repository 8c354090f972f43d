//! Remote JSON document store.
//!
//! One resource per note, addressed by identity, plus a collection endpoint
//! that returns every note keyed by identity.

mod http;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::models::NoteId;
use crate::wire::WireNote;
use crate::Result;

pub use http::HttpRemoteStore;

/// Full remote collection keyed by identity.
pub type RemoteCollection = BTreeMap<String, WireNote>;

/// Operations against the remote store.
///
/// Implementations must be safe to call from spawned tasks. `put` and
/// `delete` are idempotent: repeating a call leaves the remote in the same
/// state as making it once.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the full collection. An absent or empty collection is an empty map.
    async fn fetch_all(&self) -> Result<RemoteCollection>;

    /// Create or replace the resource for `id`.
    async fn put(&self, id: &NoteId, wire: &WireNote) -> Result<()>;

    /// Delete the resource for `id`; an already-absent resource is success.
    async fn delete(&self, id: &NoteId) -> Result<()>;
}
