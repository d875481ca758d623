//! dropsync - Two-way sync between a local directory and a Dropbox folder
//!
//! A single run performs an upload pass, a download pass, or both, asking
//! before every transfer unless an answer mode is given.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser};

mod logging;
mod output;
mod prompt;
mod run;

use dropsync_sync::engine::SyncMode;
use output::{OutputFormat, OutputFormatter};

/// Token value shipped in sample configurations; never a real token
pub const PLACEHOLDER_TOKEN: &str = "[YOUR_OAUTH2_TOKEN]";

#[derive(Debug, Parser)]
#[command(
    name = "dropsync",
    version,
    about = "Sync a local directory with a Dropbox folder"
)]
#[command(group(
    ArgGroup::new("direction")
        .required(true)
        .args(["upload", "download", "sync"])
))]
#[command(group(ArgGroup::new("answers").args(["yes", "no", "default"])))]
pub struct Cli {
    /// Dropbox OAuth2 access token
    #[arg(short, long, default_value = PLACEHOLDER_TOKEN, hide_default_value = true)]
    token: String,

    /// Answer yes to all questions
    #[arg(short, long)]
    yes: bool,

    /// Answer no to all questions
    #[arg(short, long)]
    no: bool,

    /// Take the default answer for all questions
    #[arg(long)]
    default: bool,

    /// Include hidden files
    #[arg(short = 'i', long)]
    hidden: bool,

    /// Upload local files to Dropbox
    #[arg(short, long)]
    upload: bool,

    /// Download remote files to the local directory
    #[arg(short, long)]
    download: bool,

    /// Upload, then download
    #[arg(short, long)]
    sync: bool,

    /// Use alternate config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Minimal output
    #[arg(short, long)]
    quiet: bool,

    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Folder in Dropbox to sync with [default: Downloads]
    remote_folder: Option<String>,

    /// Local directory to sync with [default: ~/Downloads]
    local_folder: Option<PathBuf>,
}

impl Cli {
    pub fn mode(&self) -> SyncMode {
        if self.sync {
            SyncMode::Full
        } else if self.download {
            SyncMode::Download
        } else {
            SyncMode::Upload
        }
    }

    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let formatter = output::get_formatter(cli.format());

    match run::execute(&cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            ExitCode::from(e.exit_code())
        }
    }
}
