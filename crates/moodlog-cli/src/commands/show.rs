use crate::commands::common::{
    format_note_detail, note_to_list_item, open_engine, resolve_note, CommandContext,
};
use crate::error::CliError;

pub fn run_show(id: &str, as_json: bool, context: &CommandContext) -> Result<(), CliError> {
    let engine = open_engine(context)?;
    let note = resolve_note(id, &engine)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note_to_list_item(&note))?);
    } else {
        println!("{}", format_note_detail(&note));
    }
    Ok(())
}
