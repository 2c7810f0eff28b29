//! Watch sessions.
//!
//! A [`Session`] owns one OS subscription and one delivery thread. The
//! backend pushes notifications into a bounded FIFO; the delivery thread
//! drains it, normalizes each record to completion, and hands events to the
//! consumer's callback in order. Backend failures go to the error callback
//! unchanged, after which the session stops delivering.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use notify::RecommendedWatcher;
use parking_lot::Mutex;

use super::boundary::WatchRoot;
use super::events::{ChangeEvent, ChangeKind, RawEvent};
use super::feed::{self, RawFeed, RawMessage};
use super::normalizer::EventNormalizer;
use crate::config::Config;
use crate::error::{BackendError, WatcherError};
use crate::observability::spans;
use crate::Result;

/// Counters for a running session.
#[derive(Debug, Default)]
pub struct SessionStats {
    pub records_received: AtomicU64,
    pub events_emitted: AtomicU64,
    pub events_backfilled: AtomicU64,
    pub backend_errors: AtomicU64,
}

impl SessionStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> SessionStatsSnapshot {
        SessionStatsSnapshot {
            records_received: self.records_received.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            events_backfilled: self.events_backfilled.load(Ordering::Relaxed),
            backend_errors: self.backend_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of session stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatsSnapshot {
    pub records_received: u64,
    pub events_emitted: u64,
    pub events_backfilled: u64,
    pub backend_errors: u64,
}

struct Running {
    watcher: RecommendedWatcher,
    worker: JoinHandle<()>,
}

/// A live subscription on one directory tree.
///
/// Dropping the session disposes it.
pub struct Session {
    root: WatchRoot,
    stats: Arc<SessionStats>,
    active: Arc<AtomicBool>,
    running: Mutex<Option<Running>>,
}

/// Start a session on `root` with default settings.
///
/// # Errors
///
/// Returns a subscription error if the root is missing, inaccessible, not a
/// directory, or the OS refuses the watch.
pub fn create_session<E, F>(root: impl AsRef<Path>, on_event: E, on_error: F) -> Result<Session>
where
    E: FnMut(ChangeEvent) + Send + 'static,
    F: FnMut(BackendError) + Send + 'static,
{
    Session::start(&Config::for_root(root.as_ref()), on_event, on_error)
}

impl Session {
    /// Start a session described by `config`.
    ///
    /// Nothing is left running if this fails: a subscription created before
    /// the failing step is released on return.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid settings, or a watcher
    /// error if the subscription or delivery thread cannot be created.
    pub fn start<E, F>(config: &Config, on_event: E, on_error: F) -> Result<Self>
    where
        E: FnMut(ChangeEvent) + Send + 'static,
        F: FnMut(BackendError) + Send + 'static,
    {
        config.validate()?;
        let root = WatchRoot::resolve(&config.root, config.boundary)?;

        let (tx, rx) = crossbeam_channel::bounded(config.buffer_capacity);
        let watcher = feed::subscribe(&root, tx)?;

        let active = Arc::new(AtomicBool::new(true));
        let stats = SessionStats::new();

        let delivery = Delivery {
            rx,
            feed: RawFeed::new(),
            normalizer: EventNormalizer::from_config(root.clone(), config),
            on_event,
            on_error,
            active: Arc::clone(&active),
            stats: Arc::clone(&stats),
            window: config.rename_window,
        };

        let worker = thread::Builder::new()
            .name("treewatch-delivery".to_string())
            .spawn(move || delivery.run())
            .map_err(|e| WatcherError::Spawn(e.to_string()))?;

        tracing::info!(
            root = %root.path().display(),
            boundary = ?root.check(),
            buffer = config.buffer_capacity,
            "Watch session started"
        );

        Ok(Self {
            root,
            stats,
            active,
            running: Mutex::new(Some(Running { watcher, worker })),
        })
    }

    /// The resolved root being watched.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Whether events are still being delivered.
    ///
    /// Turns false after [`dispose`](Self::dispose) or a backend error.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> SessionStatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop delivery and release the OS subscription.
    ///
    /// Safe to call any number of times, from any thread, including from
    /// inside the session's own callbacks (the delivery thread is then left
    /// to exit on its own instead of being joined).
    pub fn dispose(&self) {
        self.active.store(false, Ordering::Release);

        let Some(Running { watcher, worker }) = self.running.lock().take() else {
            return;
        };

        drop(watcher);

        if worker.thread().id() == thread::current().id() {
            tracing::debug!("Session disposed from its delivery thread");
        } else if worker.join().is_err() {
            tracing::warn!(root = %self.root.path().display(), "Delivery thread panicked");
        }

        tracing::info!(root = %self.root.path().display(), "Watch session stopped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("root", &self.root)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// State owned by the delivery thread.
struct Delivery<E, F> {
    rx: Receiver<RawMessage>,
    feed: RawFeed,
    normalizer: EventNormalizer,
    on_event: E,
    on_error: F,
    active: Arc<AtomicBool>,
    stats: Arc<SessionStats>,
    window: Duration,
}

impl<E, F> Delivery<E, F>
where
    E: FnMut(ChangeEvent),
    F: FnMut(BackendError),
{
    fn run(mut self) {
        let _span = spans::session_span(self.normalizer.root().path()).entered();

        while self.is_active() {
            let keep_going = match self.rx.recv_timeout(self.window) {
                Ok(RawMessage::Event(event)) => match self.feed.push(event) {
                    Ok(records) => records.into_iter().all(|record| self.deliver(record)),
                    Err(e) => self.fail(e),
                },
                Ok(RawMessage::Error(e)) => self.fail(BackendError::from(e)),
                Err(RecvTimeoutError::Timeout) => self.flush_pending(),
                Err(RecvTimeoutError::Disconnected) => {
                    self.flush_pending();
                    false
                }
            };

            if !keep_going {
                break;
            }
        }

        self.active.store(false, Ordering::Release);
        tracing::debug!("Delivery thread exiting");
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn flush_pending(&mut self) -> bool {
        match self.feed.flush() {
            Some(record) => self.deliver(record),
            None => true,
        }
    }

    /// Normalize and dispatch one record. Returns false once delivery must stop.
    fn deliver(&mut self, record: RawEvent) -> bool {
        if !self.is_active() {
            return false;
        }

        self.stats.records_received.fetch_add(1, Ordering::Relaxed);

        let Self {
            normalizer,
            on_event,
            active,
            stats,
            ..
        } = self;

        // A deleted root or a root renamed away both surface as Deleted(root).
        let root = normalizer.root().path();
        let mut root_removed = false;
        let backfilled = normalizer.normalize(record, &mut |event| {
            if event.kind == ChangeKind::Deleted && event.path == root {
                root_removed = true;
            }
            if active.load(Ordering::Acquire) {
                stats.events_emitted.fetch_add(1, Ordering::Relaxed);
                on_event(event);
            }
        });
        self.stats
            .events_backfilled
            .fetch_add(backfilled as u64, Ordering::Relaxed);

        if root_removed {
            let root = self.normalizer.root().path().to_path_buf();
            return self.fail(BackendError::root_removed(&root));
        }

        true
    }

    /// Relay a backend failure and stop. Always returns false.
    fn fail(&mut self, error: BackendError) -> bool {
        if self.feed.has_pending() {
            self.flush_pending();
        }

        if !self.is_active() {
            tracing::debug!(%error, "Backend error after dispose, not relayed");
            return false;
        }

        tracing::warn!(%error, "Backend error, stopping session");
        self.stats.backend_errors.fetch_add(1, Ordering::Relaxed);
        (self.on_error)(error);
        self.active.store(false, Ordering::Release);
        false
    }
}
