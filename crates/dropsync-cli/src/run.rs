//! Run command - wires configuration, adapters and the engine together
//!
//! 1. Loads the configuration file and applies command-line overrides
//! 2. Checks the token and the local root, then takes the per-root lock
//! 3. Creates the Dropbox adapter and probes the token
//! 4. Runs the SyncEngine and prints the counters, however the run ended

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dropsync_core::config::{expand_tilde, Config, ConfigBuilder};
use dropsync_core::domain::RemotePath;
use dropsync_core::ports::{AnswerMode, FixedAnswerPolicy, IConfirmationPolicy, IProgressReporter};
use dropsync_dropbox::client::DropboxClient;
use dropsync_dropbox::provider::DropboxRemoteStore;
use dropsync_sync::context::{format_runtime, RunContext};
use dropsync_sync::engine::{RunStatus, SyncEngine};
use dropsync_sync::filesystem::LocalFileSystemAdapter;
use dropsync_sync::lock::{LockError, ProcessLock};
use thiserror::Error;
use tracing::{error, info};

use crate::output::{get_formatter, ConsoleReporter, JsonReporter, OutputFormat, RunSummary};
use crate::prompt::InteractivePolicy;
use crate::{Cli, PLACEHOLDER_TOKEN};

/// Everything that ends a run before or instead of a normal finish
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid local folder: {0}")]
    InvalidLocalPath(String),

    #[error("Invalid access token: {0}")]
    Auth(String),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("Sync terminated early: {0:#}")]
    Unhandled(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::InvalidLocalPath(_) | CliError::Auth(_) => 1,
            CliError::Config(_) => 2,
            CliError::Lock(LockError::AlreadyHeld(_)) => 3,
            CliError::Lock(_) | CliError::Unhandled(_) => 4,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Loads the config file: an explicit path must parse, the default path
/// may be missing
pub fn load_config(explicit: Option<&Path>) -> Result<Config, CliError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (Config::default_path(), false),
    };
    if !required && !path.exists() {
        return Ok(Config::default());
    }
    Config::load(&path).map_err(|e| CliError::Config(format!("{}: {e:#}", path.display())))
}

/// Applies command-line arguments on top of `config` and validates the result
pub fn resolve_config(cli: &Cli, config: Config) -> Result<Config, CliError> {
    let include_hidden = cli.hidden || config.sync.include_hidden;
    let mut builder = ConfigBuilder::from_config(config).include_hidden(include_hidden);
    if let Some(remote) = &cli.remote_folder {
        builder = builder.remote_folder(remote.clone());
    }
    if let Some(local) = &cli.local_folder {
        builder = builder.local_folder(local.clone());
    }

    builder.build_validated().map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        CliError::Config(messages.join("; "))
    })
}

/// Rejects an empty or placeholder token
pub fn check_token(token: &str) -> Result<&str, CliError> {
    let token = token.trim();
    if token.is_empty() || token == PLACEHOLDER_TOKEN {
        return Err(CliError::Config(
            "an access token is required (--token)".to_string(),
        ));
    }
    Ok(token)
}

/// Expands `~` and resolves the folder to its canonical absolute path,
/// which must be an existing directory
pub fn resolve_local_root(folder: &Path) -> Result<PathBuf, CliError> {
    let expanded = expand_tilde(folder);
    let root = std::fs::canonicalize(&expanded).map_err(|e| {
        CliError::InvalidLocalPath(format!("{}: {e}", expanded.display()))
    })?;
    if !root.is_dir() {
        return Err(CliError::InvalidLocalPath(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    Ok(root)
}

fn confirmation_policy(cli: &Cli) -> Arc<dyn IConfirmationPolicy + Send + Sync> {
    let mode = if cli.yes {
        AnswerMode::Yes
    } else if cli.no {
        AnswerMode::No
    } else if cli.default {
        AnswerMode::Default
    } else {
        return Arc::new(InteractivePolicy::stdio());
    };
    info!(mode = %mode, "Answering all questions automatically");
    Arc::new(FixedAnswerPolicy::new(mode))
}

fn progress_reporter(cli: &Cli) -> Arc<dyn IProgressReporter + Send + Sync> {
    match cli.format() {
        OutputFormat::Json => Arc::new(JsonReporter),
        OutputFormat::Human => Arc::new(ConsoleReporter::new(cli.quiet)),
    }
}

// ============================================================================
// execute
// ============================================================================

/// Runs one sync from parsed arguments
///
/// # Errors
/// Returns a [`CliError`] whose [`CliError::exit_code`] is the process exit code
pub async fn execute(cli: &Cli) -> Result<RunStatus, CliError> {
    let config = resolve_config(cli, load_config(cli.config.as_deref())?)?;
    let token = check_token(&cli.token)?.to_string();

    let (_guard, log_file) = crate::logging::init(&config.logging, cli.verbose, cli.quiet)
        .map_err(|e| CliError::Config(format!("{e:#}")))?;
    info!(log_file = %log_file.display(), mode = ?cli.mode(), "Starting dropsync");

    let local_root = resolve_local_root(&config.sync.local_folder)?;
    let remote_root = RemotePath::from_user_folder(&config.sync.remote_folder);

    let lock = ProcessLock::acquire(&expand_tilde(&config.lock.directory), &local_root)?;
    info!(lock = %lock.path().display(), "Acquired lock");

    let timeout = Duration::from_secs(config.transfer.request_timeout_secs);
    let client = DropboxClient::with_timeout(token, timeout)?;
    let engine = SyncEngine::new(
        Arc::new(DropboxRemoteStore::new(client)),
        Arc::new(LocalFileSystemAdapter::new()),
        confirmation_policy(cli),
        progress_reporter(cli),
        &config,
        cli.mode(),
    );

    engine
        .authenticate()
        .await
        .map_err(|e| CliError::Auth(e.to_string()))?;

    let mut ctx = RunContext::new(&local_root, remote_root);
    info!(
        local = %ctx.local_root().display(),
        remote = %ctx.remote_root(),
        "Syncing"
    );

    let result = engine
        .run(&mut ctx)
        .await
        .with_context(|| format!("sync of {} failed", local_root.display()));

    ctx.log_summary();
    let format = cli.format();
    let summary = RunSummary::new(
        result.as_ref().ok().copied(),
        &ctx.counters,
        format_runtime(ctx.elapsed()),
    );
    summary.print(get_formatter(format).as_ref(), format);

    match result {
        Ok(status) => Ok(status),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Sync terminated early");
            Err(CliError::Unhandled(e))
        }
    }
}
