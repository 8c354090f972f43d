use moodlog_core::config::RemoteConfig;

use crate::cli::ConfigCommands;
use crate::commands::common::CommandContext;
use crate::config_file::{default_config_path, CliConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, context: &CommandContext) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => {
            run_config_show(context);
            Ok(())
        }
        ConfigCommands::Set {
            remote_url,
            collection,
            timeout_secs,
        } => run_config_set(remote_url, collection, timeout_secs),
    }
}

fn run_config_show(context: &CommandContext) {
    println!("config file:  {}", default_config_path().display());
    println!("database:     {}", context.db_path.display());
    match &context.remote {
        Some(remote) => {
            println!("remote:       {}", remote.collection_url());
            println!("timeout:      {}s", remote.timeout.as_secs());
        }
        None => println!("remote:       (not configured, local-only)"),
    }
}

fn run_config_set(
    remote_url: Option<String>,
    collection: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<(), CliError> {
    let mut config = CliConfig::load().map_err(CliError::Config)?;

    if let Some(remote_url) = remote_url {
        config.remote_url = Some(remote_url);
    }
    if let Some(collection) = collection {
        config.collection = Some(collection);
    }
    if let Some(timeout_secs) = timeout_secs {
        config.http_timeout_secs = Some(timeout_secs);
    }

    validate_config(&config)?;
    let path = config.save().map_err(CliError::Config)?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

/// Reject a config that would fail to resolve once saved.
pub fn validate_config(config: &CliConfig) -> Result<(), CliError> {
    RemoteConfig::from_parts(
        config.remote_url.clone(),
        config.collection.clone(),
        config.http_timeout_secs,
    )
    .map(|_| ())
    .map_err(|error| CliError::Config(error.to_string()))
}
