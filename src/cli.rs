mod help_text;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Synchronize local file trees with a ZooKeeper namespace
#[derive(Parser, Debug)]
#[command(name = "zktree", version, about, long_about = help_text::ROOT_LONG_ABOUT)]
pub struct Cli {
    /// Increase logging verbosity (-v for info, -vv for debug). Takes precedence over RUST_LOG.
    #[arg(short, long, action = ArgAction::Count, global = true, conflicts_with = "log_level")]
    pub verbose: u8,

    /// Set the log level explicitly. Takes precedence over RUST_LOG.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Comma-separated ZooKeeper servers [default: localhost:2181]
    #[arg(long, value_name = "HOSTS", value_delimiter = ',', global = true)]
    pub servers: Option<Vec<String>>,

    /// Digest credentials added to the session
    #[arg(long, value_name = "USER:PASSWORD", global = true)]
    pub auth: Option<String>,

    /// Session timeout in seconds [default: 5]
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Read settings from a TOML file
    #[arg(
        short,
        long,
        value_name = "FILE",
        global = true,
        long_help = help_text::CONFIG_LONG_HELP
    )]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Push a local tree to the remote namespace
    #[command(long_about = help_text::UPLOAD_LONG_ABOUT)]
    Upload {
        /// Remote root node, e.g. /fleet/conf
        #[arg(value_name = "REMOTE")]
        remote: String,

        /// Local directory (or single file) to upload
        #[arg(value_name = "LOCAL")]
        local: PathBuf,

        /// Recursively delete the remote root before uploading
        #[arg(long)]
        delete: bool,
    },

    /// Pull a remote subtree into a local directory
    #[command(long_about = help_text::DOWNLOAD_LONG_ABOUT)]
    Download {
        /// Remote root node, e.g. /fleet/conf
        #[arg(value_name = "REMOTE")]
        remote: String,

        /// Local directory to download into
        #[arg(value_name = "LOCAL")]
        local: PathBuf,
    },

    /// Recursively remove a remote subtree
    #[command(long_about = help_text::DELETE_LONG_ABOUT)]
    Delete {
        /// Remote root node to delete
        #[arg(value_name = "REMOTE")]
        remote: String,
    },
}

impl Command {
    pub fn remote(&self) -> &str {
        match self {
            Command::Upload { remote, .. }
            | Command::Download { remote, .. }
            | Command::Delete { remote } => remote,
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
