use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use duesync_core::SyncTarget;

#[derive(Debug, Parser)]
#[command(name = "duesync")]
#[command(about = "Copy course due dates into Google Calendar or Google Tasks")]
pub struct Cli {
    /// Path to the RON configuration file
    #[arg(short, long, env = "DUESYNC_CONFIG", default_value = "duesync.ron")]
    pub config: PathBuf,

    /// Course page holding the schedule table
    #[arg(long, env = "DUESYNC_PAGE_URL", conflicts_with = "page_file")]
    pub page_url: Option<String>,

    /// Saved copy of the course page
    #[arg(long)]
    pub page_file: Option<PathBuf>,

    /// File caching the access token
    #[arg(long, env = "DUESYNC_TOKEN_CACHE")]
    pub token_cache: Option<PathBuf>,

    /// Also log to the terminal, at debug level
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report whether a session is cached, without prompting
    Status,
    /// Sign in, prompting for a token if none is cached
    Authorize,
    /// Revoke the token and clear the cache
    SignOut,
    /// Add every due date on the course page to Calendar or Tasks
    Sync {
        #[arg(long, value_enum, default_value_t = TargetArg::Calendar)]
        target: TargetArg,
    },
    /// Add a single calendar event
    AddEvent {
        #[arg(long)]
        title: String,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Start time as HH:MM
        #[arg(long)]
        time: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetArg {
    Calendar,
    Tasks,
}

impl From<TargetArg> for SyncTarget {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Calendar => SyncTarget::Calendar,
            TargetArg::Tasks => SyncTarget::Tasks,
        }
    }
}
