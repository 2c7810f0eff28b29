//! Recursive directory watching with normalized events.
//!
//! This module provides:
//! - A raw feed over notify-rs with rename pairing
//! - Boundary-aware rename splitting and recursive backfill of created directories
//! - Callback sessions and an async stream front-end

mod boundary;
mod events;
mod feed;
mod normalizer;
mod session;
mod stream;

pub use boundary::{BoundaryCheck, WatchRoot};
pub use events::{ChangeEvent, ChangeKind, RawEvent};
pub use feed::{subscribe, RawFeed, RawMessage};
pub use normalizer::EventNormalizer;
pub use session::{create_session, Session, SessionStats, SessionStatsSnapshot};
pub use stream::{EventStream, SessionMessage};
