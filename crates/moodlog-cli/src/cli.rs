use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use moodlog_core::Mood;

#[derive(Parser)]
#[command(name = "moodlog")]
#[command(about = "Keep a mood journal in sync with your remote store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Remote store base URL (overrides MOODLOG_REMOTE_URL and the config file)
    #[arg(long, global = true, value_name = "URL")]
    pub remote_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note title
        title: Vec<String>,
        /// Optional note body
        #[arg(short, long)]
        body: Option<String>,
        /// Mood for the note
        #[arg(short, long, value_enum, default_value_t = MoodArg::Neutral)]
        mood: MoodArg,
        /// Explicit identity (generated when omitted)
        #[arg(long, value_name = "ID")]
        id: Option<String>,
    },
    /// List recent notes
    List {
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single note
    Show {
        /// Note ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing note
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New body
        #[arg(short, long, conflicts_with = "clear_body")]
        body: Option<String>,
        /// Remove the body
        #[arg(long)]
        clear_body: bool,
        /// New mood
        #[arg(short, long, value_enum)]
        mood: Option<MoodArg>,
    },
    /// Delete an existing note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Pull the full remote collection into the local store
    Sync,
    /// Show or change persisted CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Persist remote settings to the config file
    Set {
        /// Remote store base URL
        #[arg(long, value_name = "URL")]
        remote_url: Option<String>,
        /// Remote collection name
        #[arg(long, value_name = "NAME")]
        collection: Option<String>,
        /// HTTP timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum MoodArg {
    Happy,
    Neutral,
    Sad,
}

impl From<MoodArg> for Mood {
    fn from(value: MoodArg) -> Self {
        match value {
            MoodArg::Happy => Self::Happy,
            MoodArg::Neutral => Self::Neutral,
            MoodArg::Sad => Self::Sad,
        }
    }
}
