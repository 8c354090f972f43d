//! Moodlog CLI - keep a mood journal on the command line
//!
//! Notes are written to a local database first and pushed to the remote
//! document store when one is configured.

mod cli;
mod commands;
mod config_file;
mod error;


use std::env;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::{resolve_db_path, CommandContext};
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_edit, NoteEdits};
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::commands::sync::run_sync;
use crate::config_file::CliConfig;
use crate::error::CliError;

const DEFAULT_LOG_DIRECTIVE: &str = "moodlog=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let context = build_context(&cli)?;

    match cli.command {
        Commands::Add {
            title,
            body,
            mood,
            id,
        } => run_add(&title, body.as_deref(), mood.into(), id.as_deref(), &context).await?,
        Commands::List { limit, json } => run_list(limit, json, &context)?,
        Commands::Show { id, json } => run_show(&id, json, &context)?,
        Commands::Edit {
            id,
            title,
            body,
            clear_body,
            mood,
        } => {
            let edits = NoteEdits {
                title,
                body,
                clear_body,
                mood: mood.map(Into::into),
            };
            run_edit(&id, edits, &context).await?;
        }
        Commands::Delete { id } => run_delete(&id, &context).await?,
        Commands::Sync => run_sync(&context).await?,
        Commands::Config { command } => run_config(command, &context)?,
    }

    Ok(())
}

fn build_context(cli: &Cli) -> Result<CommandContext, CliError> {
    let db_path = resolve_db_path(cli.db_path.clone());
    let resolved = CliConfig::load().and_then(|config| {
        config.resolve_remote(cli.remote_url.clone(), |key| env::var(key).ok())
    });

    let remote = match resolved {
        Ok(remote) => remote,
        // A broken config must not block `config set` from repairing it.
        Err(error) if matches!(cli.command, Commands::Config { .. }) => {
            eprintln!("Warning: {error}");
            None
        }
        Err(error) => return Err(CliError::Config(error)),
    };

    Ok(CommandContext { db_path, remote })
}
