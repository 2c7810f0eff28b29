//! Turns raw backend records into the public change stream.
//!
//! Non-rename records pass through as a single event. A `Created` directory is
//! followed by synthetic `Created` events for everything already inside it,
//! since backends report only the top of a tree that appears in one step.
//! Renames are split against the watch root: an endpoint outside the root
//! turns the rename into a create or a delete.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::boundary::WatchRoot;
use super::events::{ChangeEvent, RawEvent};
use crate::config::Config;

/// Stateless converter from [`RawEvent`] to [`ChangeEvent`]s.
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    root: WatchRoot,
    backfill_moved_in: bool,
    backfill_max_depth: Option<usize>,
}

impl EventNormalizer {
    /// Create a normalizer with default options for `root`.
    #[must_use]
    pub const fn new(root: WatchRoot) -> Self {
        Self {
            root,
            backfill_moved_in: false,
            backfill_max_depth: None,
        }
    }

    /// Create a normalizer using the backfill options from `config`.
    #[must_use]
    pub fn from_config(root: WatchRoot, config: &Config) -> Self {
        Self {
            root,
            backfill_moved_in: config.backfill_moved_in,
            backfill_max_depth: config.backfill_max_depth,
        }
    }

    /// Also backfill directories renamed into the root.
    #[must_use]
    pub fn with_backfill_moved_in(mut self, enabled: bool) -> Self {
        self.backfill_moved_in = enabled;
        self
    }

    /// Limit how deep backfill descends below a created directory.
    #[must_use]
    pub fn with_backfill_max_depth(mut self, depth: Option<usize>) -> Self {
        self.backfill_max_depth = depth;
        self
    }

    /// The root this normalizer checks against.
    #[must_use]
    pub const fn root(&self) -> &WatchRoot {
        &self.root
    }

    /// Normalize one record, passing every resulting event to `emit` in order.
    ///
    /// Returns the number of synthetic backfill events emitted.
    pub fn normalize<F>(&self, raw: RawEvent, emit: &mut F) -> usize
    where
        F: FnMut(ChangeEvent),
    {
        match raw {
            RawEvent::Changed(path) => {
                emit(ChangeEvent::changed(path));
                0
            }
            RawEvent::Deleted(path) => {
                emit(ChangeEvent::deleted(path));
                0
            }
            RawEvent::Created(path) => {
                emit(ChangeEvent::created(path.clone()));
                self.backfill(&path, emit)
            }
            RawEvent::Renamed { from, to } => self.split_rename(from, to, emit),
        }
    }

    /// Convenience wrapper collecting the output of [`normalize`](Self::normalize).
    #[must_use]
    pub fn normalize_to_vec(&self, raw: RawEvent) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        self.normalize(raw, &mut |event| events.push(event));
        events
    }

    fn split_rename<F>(&self, from: Option<PathBuf>, to: Option<PathBuf>, emit: &mut F) -> usize
    where
        F: FnMut(ChangeEvent),
    {
        let new_inside = self.root.contains_opt(to.as_deref());
        let old_inside = self.root.contains_opt(from.as_deref());

        if new_inside && old_inside {
            if let (Some(from), Some(to)) = (from, to) {
                emit(ChangeEvent::renamed(from, to));
            }
            return 0;
        }

        if !new_inside && !old_inside {
            tracing::debug!(?from, ?to, "Dropping rename outside watch root");
            return 0;
        }

        let mut backfilled = 0;

        if let Some(to) = to.filter(|_| new_inside) {
            emit(ChangeEvent::created(to.clone()));
            if self.backfill_moved_in {
                backfilled += self.backfill(&to, emit);
            }
        }

        if let Some(from) = from.filter(|_| old_inside) {
            emit(ChangeEvent::deleted(from));
        }

        backfilled
    }

    /// Emit `Created` for every entry under `dir`, parents before children.
    fn backfill<F>(&self, dir: &Path, emit: &mut F) -> usize
    where
        F: FnMut(ChangeEvent),
    {
        // symlink_metadata so a link to a directory outside the root is not walked
        let is_dir = fs::symlink_metadata(dir).is_ok_and(|meta| meta.is_dir());
        if !is_dir {
            return 0;
        }

        let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
        if let Some(depth) = self.backfill_max_depth {
            walker = walker.max_depth(depth);
        }

        let mut count = 0;
        for entry in walker {
            match entry {
                Ok(entry) => {
                    emit(ChangeEvent::created(entry.into_path()));
                    count += 1;
                }
                Err(e) => {
                    tracing::trace!(dir = %dir.display(), error = %e, "Skipping backfill entry");
                }
            }
        }

        if count > 0 {
            tracing::debug!(dir = %dir.display(), count, "Backfilled created directory");
        }
        count
    }
}
