use moodlog_core::util::normalize_text_option;
use moodlog_core::{Mood, NewNote};

use crate::commands::common::{finish_remote_task, normalize_title, open_engine, CommandContext};
use crate::error::CliError;

pub async fn run_add(
    title_parts: &[String],
    body: Option<&str>,
    mood: Mood,
    id: Option<&str>,
    context: &CommandContext,
) -> Result<(), CliError> {
    let title = normalize_title(title_parts)?;

    let mut new_note = NewNote::new(title).with_mood(mood);
    if let Some(body) = normalize_text_option(body.map(str::to_string)) {
        new_note = new_note.with_body(body);
    }
    if let Some(id) = normalize_text_option(id.map(str::to_string)) {
        new_note = new_note.with_id(id);
    }

    let mut engine = open_engine(context)?;
    let (note, task) = engine.create(new_note)?;
    finish_remote_task(task, "Note").await;

    println!("{}", note.id);
    Ok(())
}
