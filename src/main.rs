//! treewatch - stream normalized filesystem changes as JSON lines
//!
//! Each change under the watched directory is written to stdout as one JSON
//! object. A backend failure is written as a log event and ends the process
//! with a non-zero status; the caller is expected to rescan and restart.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use treewatch::config::DEFAULT_BUFFER_CAPACITY;
use treewatch::observability::{init_tracing, TracingConfig};
use treewatch::watcher::BoundaryCheck;
use treewatch::{ChangeEvent, Config, EventStream, SessionMessage};

/// Watch a directory tree and print normalized change events
#[derive(Parser, Debug)]
#[command(name = "treewatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to watch recursively
    #[arg(env = "TREEWATCH_ROOT")]
    path: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TREEWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output on stderr
    #[arg(long, env = "TREEWATCH_LOG_JSON")]
    log_json: bool,

    /// Capacity of the raw notification queue
    #[arg(
        long,
        env = "TREEWATCH_BUFFER_CAPACITY",
        default_value_t = DEFAULT_BUFFER_CAPACITY
    )]
    buffer_capacity: usize,

    /// Milliseconds to wait for the second half of a split rename
    #[arg(long, env = "TREEWATCH_RENAME_WINDOW_MS", default_value = "50")]
    rename_window_ms: u64,

    /// Use literal string-prefix containment instead of whole path components
    #[arg(long, env = "TREEWATCH_PREFIX_BOUNDARY")]
    prefix_boundary: bool,

    /// Backfill directories moved into the tree, not just created ones
    #[arg(long, env = "TREEWATCH_BACKFILL_MOVED_IN")]
    backfill_moved_in: bool,

    /// Maximum depth of backfill below a created directory
    #[arg(long, env = "TREEWATCH_BACKFILL_MAX_DEPTH")]
    backfill_max_depth: Option<usize>,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            root: self.path.clone(),
            buffer_capacity: self.buffer_capacity,
            rename_window: Duration::from_millis(self.rename_window_ms),
            boundary: if self.prefix_boundary {
                BoundaryCheck::Prefix
            } else {
                BoundaryCheck::Component
            },
            backfill_moved_in: self.backfill_moved_in,
            backfill_max_depth: self.backfill_max_depth,
            log_level: self.log_level.clone(),
        }
    }
}

fn write_event(out: &mut impl Write, event: &ChangeEvent) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    let config = cli.config();
    tracing::debug!(?config, "Configuration loaded");
    config.validate()?;

    let mut stream = EventStream::open(&config)
        .with_context(|| format!("failed to watch {}", config.root.display()))?;

    let stdout = std::io::stdout();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let outcome = loop {
        tokio::select! {
            message = stream.recv() => match message {
                Some(SessionMessage::Event(event)) => {
                    write_event(&mut stdout.lock(), &event)?;
                }
                Some(SessionMessage::Error(error)) => {
                    write_event(&mut stdout.lock(), &ChangeEvent::log(&error))?;
                    break Err(error);
                }
                None => break Ok(()),
            },
            _ = &mut shutdown => {
                tracing::info!("Interrupted, stopping");
                break Ok(());
            }
        }
    };

    let stats = stream.session().stats();
    stream.dispose();
    tracing::info!(
        records = stats.records_received,
        emitted = stats.events_emitted,
        backfilled = stats.events_backfilled,
        "Watcher finished"
    );

    outcome.context("watch session failed")
}
