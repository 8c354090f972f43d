use crate::commands::common::{open_engine, CommandContext};
use crate::error::CliError;

pub async fn run_sync(context: &CommandContext) -> Result<(), CliError> {
    if context.remote.is_none() {
        return Err(CliError::SyncNotConfigured);
    }

    let mut engine = open_engine(context)?;
    let report = engine.sync_from_remote().await?;

    println!(
        "Sync completed: {} created, {} updated, {} unchanged, {} skipped",
        report.created, report.updated, report.unchanged, report.skipped
    );
    Ok(())
}
