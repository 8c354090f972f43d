//! moodlog-core - Core library for Moodlog
//!
//! This crate contains the note models, the wire mapping for the remote JSON
//! document store, the local SQLite store, and the sync engine that keeps the
//! two convergent. Front ends (currently the CLI) only wire these together.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod sync;
pub mod util;
pub mod wire;

pub use error::{Error, Result};
pub use models::{Mood, NewNote, Note, NoteId};
pub use sync::{RemoteTask, SyncEngine, SyncReport};
