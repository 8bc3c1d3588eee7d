mod cli;
mod config;
mod local_tree;
mod namespace;
mod path_map;
mod sync;

use anyhow::Context;
use cli::{Cli, Command, LogLevel};
use config::{ConfigFile, Overrides, Settings};
use namespace::zk::ZkNamespace;
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr};
use std::path::Path;
use std::process::ExitCode;
use sync::{DeleteResult, DownloadResult, UploadOptions, UploadResult};
use tracing::{Event, Level, Subscriber, debug, error, info, warn};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

struct SyncExitCode;

impl SyncExitCode {
    /// Exit code used for any fatal error (connection, conflicts, I/O, etc.).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            SyncExitCode::any_error()
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let file = match &cli.connection.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let settings = Settings::resolve(
        file,
        Overrides {
            servers: cli.connection.servers,
            auth: cli.connection.auth,
            timeout_secs: cli.connection.timeout,
        },
    )?;
    debug!(
        "Resolved settings: servers {}, timeout {:?}, acl {:?}",
        settings.servers.join(","),
        settings.timeout,
        settings.policy.acl
    );

    // Reject bad remote roots before opening a session.
    let remote = path_map::normalize_remote(cli.command.remote())?;
    let deletes_root = matches!(
        cli.command,
        Command::Delete { .. } | Command::Upload { delete: true, .. }
    );
    if deletes_root && remote == path_map::REMOTE_ROOT {
        return Err(sync::SyncError::RootDeletion.into());
    }

    let ns = ZkNamespace::connect(&settings).context("Failed to connect to ZooKeeper")?;

    let outcome = match &cli.command {
        Command::Upload { local, delete, .. } => {
            handle_upload(&ns, &remote, local, *delete, &settings)
        }
        Command::Download { local, .. } => handle_download(&ns, &remote, local, &settings),
        Command::Delete { .. } => handle_delete(&ns, &remote),
    };

    if let Err(e) = ns.close() {
        warn!("Failed to close ZooKeeper session: {}", e);
    }

    outcome?;
    info!("All done");
    Ok(())
}

fn handle_upload(
    ns: &ZkNamespace,
    remote: &str,
    local: &Path,
    delete_first: bool,
    settings: &Settings,
) -> anyhow::Result<()> {
    let options = UploadOptions {
        delete_first,
        policy: settings.policy,
    };

    let result = sync::upload(ns, remote, local, &options)
        .with_context(|| format!("Upload of {} to {} failed", local.display(), remote))?;

    println!("{}", upload_summary(&result));
    Ok(())
}

fn handle_download(
    ns: &ZkNamespace,
    remote: &str,
    local: &Path,
    settings: &Settings,
) -> anyhow::Result<()> {
    let result = sync::download(ns, remote, local, &settings.policy)
        .with_context(|| format!("Download of {} to {} failed", remote, local.display()))?;

    println!("{}", download_summary(remote, &result));
    Ok(())
}

fn handle_delete(ns: &ZkNamespace, remote: &str) -> anyhow::Result<()> {
    let result =
        sync::delete_tree(ns, remote).with_context(|| format!("Delete of {} failed", remote))?;

    println!("{}", delete_summary(remote, &result));
    Ok(())
}

fn upload_summary(result: &UploadResult) -> String {
    let mut summary = format!(
        "upload: {} copied, {} overwritten, {} unchanged, {} dirs already present, {} skipped",
        result.copied, result.overwritten, result.unchanged, result.already_present, result.skipped
    );
    if result.deleted > 0 {
        summary.push_str(&format!(", {} deleted first", result.deleted));
    }
    summary
}

fn download_summary(remote: &str, result: &DownloadResult) -> String {
    if !result.root_found {
        return format!("download: {remote} not found, nothing downloaded");
    }
    format!(
        "download: {} files written, {} in sync, {} locally newer, {} dirs created, {} dirs present",
        result.files_written,
        result.files_in_sync,
        result.local_newer,
        result.dirs_created,
        result.dirs_present
    )
}

fn delete_summary(remote: &str, result: &DeleteResult) -> String {
    if !result.root_found {
        return format!("delete: {remote} not found, nothing deleted");
    }
    format!("delete: {} nodes deleted", result.nodes_deleted)
}

fn init_tracing(verbose: u8, log_level: Option<LogLevel>) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    // Explicit flags win over RUST_LOG; without them RUST_LOG decides.
    let explicit = match (log_level, verbose) {
        (Some(level), _) => Some(level.as_filter()),
        (None, 0) => None,
        (None, 1) => Some("info"),
        (None, _) => Some("debug"),
    };

    let filter = match explicit {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

struct EmojiFormatter {
    stderr_is_terminal: bool,
}

impl<S, N> FormatEvent<S, N> for EmojiFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.stderr_is_terminal {
            match *event.metadata().level() {
                Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌️ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => {}
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
