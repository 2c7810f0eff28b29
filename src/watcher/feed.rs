//! Raw feed adapter over `notify`.
//!
//! [`subscribe`] opens a recursive OS subscription and pushes every backend
//! notification into a bounded queue. [`RawFeed`] turns those notifications
//! into [`RawEvent`]s on the delivery thread, pairing split rename halves.

use std::path::PathBuf;

use crossbeam_channel::Sender;
use notify::event::{MetadataKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::boundary::WatchRoot;
use super::events::RawEvent;
use crate::error::{BackendError, WatcherError};
use crate::Result;

/// A notification as it leaves the backend thread.
#[derive(Debug)]
pub enum RawMessage {
    /// Filesystem notification.
    Event(Event),
    /// Backend failure.
    Error(notify::Error),
}

/// Subscribe to `root` and everything below it.
///
/// Notifications are sent into `tx`; a full queue blocks the backend thread
/// rather than dropping records. Dropping the returned watcher releases the
/// OS subscription.
///
/// # Errors
///
/// Returns a subscription error if the backend cannot be created or refuses
/// to watch the root (missing path, watch limit reached, permissions).
pub fn subscribe(root: &WatchRoot, tx: Sender<RawMessage>) -> Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
        let message = match result {
            Ok(event) => RawMessage::Event(event),
            Err(e) => RawMessage::Error(e),
        };
        if tx.send(message).is_err() {
            tracing::trace!("Raw feed receiver gone, dropping notification");
        }
    })
    .map_err(|e| WatcherError::subscription(root.path(), e))?;

    watcher
        .watch(root.path(), RecursiveMode::Recursive)
        .map_err(|e| WatcherError::subscription(root.path(), e))?;

    tracing::debug!(root = %root.path().display(), "Subscribed to raw feed");
    Ok(watcher)
}

#[derive(Debug)]
struct PendingFrom {
    tracker: Option<usize>,
    path: PathBuf,
}

/// Stateful translator from `notify` events to raw records.
///
/// Backends report a rename as a "from" half and a "to" half sharing a
/// tracker cookie, and inotify follows a matched pair with a combined
/// "both" event. A lone "to" is a move into the tree; a "from" that is not
/// matched before the next notification (or before [`flush`](Self::flush))
/// is a move out of it.
#[derive(Debug, Default)]
pub struct RawFeed {
    pending_from: Option<PendingFrom>,
    last_paired: Option<usize>,
}

impl RawFeed {
    /// Create an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a "from" half is waiting for its partner.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending_from.is_some()
    }

    /// Translate one backend event.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Overflow`] when the backend flags that events
    /// were lost and the tree must be rescanned.
    pub fn push(&mut self, event: Event) -> std::result::Result<Vec<RawEvent>, BackendError> {
        if event.need_rescan() {
            return Err(BackendError::Overflow);
        }

        let tracker = event.tracker();
        let mut out = Vec::new();

        match event.kind {
            EventKind::Modify(ModifyKind::Name(mode)) => {
                self.push_rename(mode, tracker, event.paths, &mut out);
            }
            kind => {
                self.flush_into(&mut out);
                if let Some(make) = classify(kind) {
                    out.extend(event.paths.into_iter().map(make));
                }
            }
        }

        Ok(out)
    }

    /// Release an unmatched "from" half as a move out of the tree.
    pub fn flush(&mut self) -> Option<RawEvent> {
        self.pending_from.take().map(|pending| RawEvent::Renamed {
            from: Some(pending.path),
            to: None,
        })
    }

    fn flush_into(&mut self, out: &mut Vec<RawEvent>) {
        out.extend(self.flush());
    }

    fn push_rename(
        &mut self,
        mode: RenameMode,
        tracker: Option<usize>,
        paths: Vec<PathBuf>,
        out: &mut Vec<RawEvent>,
    ) {
        match mode {
            RenameMode::From => {
                for path in paths {
                    self.flush_into(out);
                    self.pending_from = Some(PendingFrom { tracker, path });
                }
            }
            RenameMode::To => {
                for path in paths {
                    match self.pending_from.take() {
                        Some(pending) if pending.tracker == tracker => {
                            tracing::debug!(
                                from = %pending.path.display(),
                                to = %path.display(),
                                "Paired rename halves"
                            );
                            out.push(RawEvent::Renamed {
                                from: Some(pending.path),
                                to: Some(path),
                            });
                            self.last_paired = tracker;
                        }
                        unmatched => {
                            if let Some(pending) = unmatched {
                                out.push(RawEvent::Renamed {
                                    from: Some(pending.path),
                                    to: None,
                                });
                            }
                            out.push(RawEvent::Renamed {
                                from: None,
                                to: Some(path),
                            });
                        }
                    }
                }
            }
            RenameMode::Both => {
                if tracker.is_some() && tracker == self.last_paired {
                    self.last_paired = None;
                    return;
                }
                if tracker.is_some()
                    && self.pending_from.as_ref().map(|p| p.tracker) == Some(tracker)
                {
                    self.pending_from = None;
                } else {
                    self.flush_into(out);
                }

                let mut paths = paths.into_iter();
                match (paths.next(), paths.next()) {
                    (Some(from), Some(to)) => out.push(RawEvent::Renamed {
                        from: Some(from),
                        to: Some(to),
                    }),
                    (Some(lone), None) => out.push(probe_rename(lone)),
                    _ => {}
                }
            }
            RenameMode::Any | RenameMode::Other => {
                self.flush_into(out);
                out.extend(paths.into_iter().map(probe_rename));
            }
        }
    }
}

/// Map a non-rename event kind to a raw record constructor.
fn classify(kind: EventKind) -> Option<fn(PathBuf) -> RawEvent> {
    let make: fn(PathBuf) -> RawEvent = match kind {
        EventKind::Create(_) => RawEvent::Created,
        EventKind::Remove(_) => RawEvent::Deleted,
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime))
        | EventKind::Access(_)
        | EventKind::Other => return None,
        EventKind::Modify(_) | EventKind::Any => RawEvent::Changed,
    };
    Some(make)
}

/// Resolve a rename half of unknown direction by checking whether it exists.
fn probe_rename(path: PathBuf) -> RawEvent {
    if path.symlink_metadata().is_ok() {
        RawEvent::Renamed {
            from: None,
            to: Some(path),
        }
    } else {
        RawEvent::Renamed {
            from: Some(path),
            to: None,
        }
    }
}
