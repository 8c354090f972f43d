use moodlog_core::util::normalize_text_option;
use moodlog_core::Mood;

use crate::commands::common::{finish_remote_task, open_engine, resolve_note, CommandContext};
use crate::error::CliError;

/// Field changes requested on the command line.
#[derive(Debug, Default)]
pub struct NoteEdits {
    pub title: Option<String>,
    pub body: Option<String>,
    pub clear_body: bool,
    pub mood: Option<Mood>,
}

impl NoteEdits {
    const fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && !self.clear_body && self.mood.is_none()
    }
}

pub async fn run_edit(
    id: &str,
    edits: NoteEdits,
    context: &CommandContext,
) -> Result<(), CliError> {
    if edits.is_empty() {
        return Err(CliError::NothingToEdit);
    }

    let mut engine = open_engine(context)?;
    let mut note = resolve_note(id, &engine)?;

    let title = match edits.title {
        Some(title) => normalize_text_option(Some(title)).ok_or(CliError::EmptyTitle)?,
        None => note.title.clone(),
    };
    let body = if edits.clear_body {
        None
    } else {
        edits
            .body
            .map_or_else(|| note.body.clone(), |body| normalize_text_option(Some(body)))
    };
    let mood = edits.mood.unwrap_or(note.mood);

    let task = engine.update(&mut note, title, body, mood)?;
    finish_remote_task(task, "Edit").await;

    println!("{}", note.id);
    Ok(())
}
