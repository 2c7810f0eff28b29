//! Error types and Result aliases for treewatch.
//!
//! This module defines the error hierarchy used throughout the crate.
//! Fallible public functions return `Result<T, Error>` or `Result<T>`.
//! Backend failures that happen after a session is running are not returned
//! from any call; they reach the consumer through the session's error callback
//! as a [`BackendError`].

use std::path::Path;

use thiserror::Error;

/// Result type alias using treewatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for treewatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Session setup error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),
}

/// Errors raised while setting up a watch session.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// The OS subscription for the root could not be created.
    #[error("failed to subscribe to '{path}': {reason}")]
    SubscriptionFailed { path: String, reason: String },

    /// The delivery thread could not be started.
    #[error("failed to start delivery thread: {0}")]
    Spawn(String),
}

/// Failures reported by the notification backend for a running session.
///
/// Every variant is fatal to the session: events may have been lost, and the
/// expected recovery is to dispose the session and rebuild it with a fresh
/// scan of the tree.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend's queue overflowed or asked for a rescan.
    #[error("event queue overflowed, changes may have been missed")]
    Overflow,

    /// The watch root itself was deleted or moved away.
    #[error("watch root '{path}' was removed")]
    RootRemoved { path: String },

    /// Error surfaced verbatim from `notify`.
    #[error(transparent)]
    Notify(#[from] notify::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl WatcherError {
    /// Create a subscription error for `path`.
    pub fn subscription(path: &Path, reason: impl ToString) -> Self {
        Self::SubscriptionFailed {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl BackendError {
    /// Create a root-removed error for `path`.
    #[must_use]
    pub fn root_removed(path: &Path) -> Self {
        Self::RootRemoved {
            path: path.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
