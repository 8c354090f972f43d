use crate::commands::common::{finish_remote_task, open_engine, resolve_note, CommandContext};
use crate::error::CliError;

pub async fn run_delete(id: &str, context: &CommandContext) -> Result<(), CliError> {
    let mut engine = open_engine(context)?;
    let note = resolve_note(id, &engine)?;

    let task = engine.delete(&note);
    finish_remote_task(task, "Deletion").await;

    println!("{}", note.id);
    Ok(())
}
