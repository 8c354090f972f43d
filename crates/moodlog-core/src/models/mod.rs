//! Data models for Moodlog

mod mood;
mod note;

pub use mood::{Mood, UnknownMood};
pub use note::{current_timestamp, NewNote, Note, NoteId};
