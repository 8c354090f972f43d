use crate::commands::common::{
    format_note_lines, note_to_list_item, open_engine, CommandContext, NoteListItem,
};
use crate::error::CliError;

pub fn run_list(limit: usize, as_json: bool, context: &CommandContext) -> Result<(), CliError> {
    let engine = open_engine(context)?;
    let notes = engine.notes()?.into_iter().take(limit).collect::<Vec<_>>();

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if notes.is_empty() {
        println!("No notes yet.");
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
