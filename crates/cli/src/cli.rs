use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "swcache", about = "Offline cache worker for the Fakturownia web app", version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SWCACHE_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show entry counts per store
    Status,

    /// Delete every store
    Clear,

    /// Precache the install manifest, then activate
    Install,

    /// Delete stores that do not belong to the current version
    Activate,

    /// Check whether the worker script changed
    Update {
        /// Digest of the previously deployed script
        #[arg(long)]
        since: Option<String>,
    },

    /// Show how a request would be routed
    Classify {
        /// URL or path relative to the app origin
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Accept header
        #[arg(short = 'A', long)]
        accept: Option<String>,
    },

    /// Run a request through the cache strategies
    Fetch {
        /// URL or path relative to the app origin
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Accept header
        #[arg(short = 'A', long)]
        accept: Option<String>,

        /// Request body
        #[arg(short, long)]
        data: Option<String>,

        /// Print the response body
        #[arg(long)]
        body: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}
