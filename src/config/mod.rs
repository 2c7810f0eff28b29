//! Configuration management for treewatch.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - Built-in defaults (lowest priority)

mod settings;

pub use settings::{Config, DEFAULT_BUFFER_CAPACITY, DEFAULT_RENAME_WINDOW, MAX_BUFFER_CAPACITY};
