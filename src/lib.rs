//! treewatch
//!
//! Watches a directory tree and turns raw filesystem notifications into an
//! ordered stream of changed, created, deleted and renamed events.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod observability;
pub mod watcher;

pub use config::Config;
pub use error::{BackendError, Error, Result, WatcherError};
pub use watcher::{create_session, ChangeEvent, ChangeKind, EventStream, Session, SessionMessage};
