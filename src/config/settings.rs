//! Configuration settings and validation.

use std::path::PathBuf;
use std::time::Duration;

use crate::watcher::BoundaryCheck;
use crate::{Error, Result};

/// Default number of raw notifications queued between the backend and the
/// delivery thread.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Upper bound on the raw notification queue.
///
/// Very large backend buffers are unstable on some network filesystems, so
/// the queue is capped instead of grown to fit any burst.
pub const MAX_BUFFER_CAPACITY: usize = 65_536;

/// How long an unpaired "rename from" notification waits for its "rename to"
/// half before it is treated as a move out of the tree.
pub const DEFAULT_RENAME_WINDOW: Duration = Duration::from_millis(50);

const MAX_RENAME_WINDOW: Duration = Duration::from_secs(5);

/// Configuration for a watch session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory to watch, including all descendants.
    pub root: PathBuf,

    /// Capacity of the raw notification queue.
    pub buffer_capacity: usize,

    /// Pairing window for split rename notifications.
    pub rename_window: Duration,

    /// How paths are tested for containment in the root.
    pub boundary: BoundaryCheck,

    /// Also backfill directories that were renamed into the root.
    pub backfill_moved_in: bool,

    /// Maximum depth of backfill traversal below a created directory.
    pub backfill_max_depth: Option<usize>,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            rename_window: DEFAULT_RENAME_WINDOW,
            boundary: BoundaryCheck::default(),
            backfill_moved_in: false,
            backfill_max_depth: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Create a default configuration watching `root`.
    #[must_use]
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::config("root cannot be empty"));
        }

        if self.buffer_capacity == 0 {
            return Err(Error::config("buffer_capacity cannot be 0"));
        }

        if self.buffer_capacity > MAX_BUFFER_CAPACITY {
            return Err(Error::config(format!(
                "buffer_capacity cannot exceed {MAX_BUFFER_CAPACITY}"
            )));
        }

        if self.rename_window.is_zero() {
            return Err(Error::config("rename_window cannot be 0"));
        }

        if self.rename_window > MAX_RENAME_WINDOW {
            return Err(Error::config(format!(
                "rename_window cannot exceed {}s",
                MAX_RENAME_WINDOW.as_secs()
            )));
        }

        if self.backfill_max_depth == Some(0) {
            return Err(Error::config("backfill_max_depth must be at least 1"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert_eq!(config.rename_window, DEFAULT_RENAME_WINDOW);
        assert_eq!(config.boundary, BoundaryCheck::Component);
        assert!(!config.backfill_moved_in);
        assert!(config.backfill_max_depth.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_for_root() {
        let config = Config::for_root("/srv/data");
        assert_eq!(config.root, PathBuf::from("/srv/data"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_root() {
        let config = Config::for_root("");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("root"));
    }

    #[test]
    fn test_validate_zero_buffer() {
        let config = Config {
            buffer_capacity: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("buffer_capacity"));
    }

    #[test]
    fn test_validate_buffer_over_cap() {
        let config = Config {
            buffer_capacity: MAX_BUFFER_CAPACITY + 1,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("65536"));

        let at_cap = Config {
            buffer_capacity: MAX_BUFFER_CAPACITY,
            ..Default::default()
        };
        assert!(at_cap.validate().is_ok());
    }

    #[test]
    fn test_validate_rename_window_bounds() {
        let zero = Config {
            rename_window: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero.validate().unwrap_err().to_string().contains("rename_window"));

        let long = Config {
            rename_window: Duration::from_secs(10),
            ..Default::default()
        };
        assert!(long.validate().unwrap_err().to_string().contains("5s"));
    }

    #[test]
    fn test_validate_zero_backfill_depth() {
        let config = Config {
            backfill_max_depth: Some(0),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backfill_max_depth"));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "invalid".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_log_level_case_insensitive() {
        for level in ["TRACE", "Debug", "INFO", "Warn", "ERROR"] {
            let config = Config {
                log_level: level.to_string(),
                ..Default::default()
            };
            assert!(
                config.validate().is_ok(),
                "Level '{level}' should be valid (case insensitive)"
            );
        }
    }
}
