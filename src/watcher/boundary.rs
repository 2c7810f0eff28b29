//! Watch root and path containment checks.

use std::path::{Path, PathBuf};

use crate::error::WatcherError;
use crate::Result;

/// How a path is tested for containment in the watch root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoundaryCheck {
    /// Literal string prefix. `/watched-other` counts as inside `/watch`.
    Prefix,
    /// Whole path components only.
    #[default]
    Component,
}

/// The directory a session monitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRoot {
    path: PathBuf,
    check: BoundaryCheck,
}

impl WatchRoot {
    /// Resolve `path` to a canonical directory suitable for watching.
    ///
    /// # Errors
    ///
    /// Returns a subscription error if the path does not exist, cannot be
    /// accessed, or is not a directory.
    pub fn resolve(path: impl AsRef<Path>, check: BoundaryCheck) -> Result<Self> {
        let path = path.as_ref();

        let canonical = path
            .canonicalize()
            .map_err(|e| WatcherError::subscription(path, e))?;

        if !canonical.is_dir() {
            return Err(WatcherError::subscription(path, "not a directory").into());
        }

        Ok(Self::new(canonical, check))
    }

    /// Use `path` as given, without touching the filesystem.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, check: BoundaryCheck) -> Self {
        Self {
            path: path.into(),
            check,
        }
    }

    /// The root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Containment mode.
    #[must_use]
    pub const fn check(&self) -> BoundaryCheck {
        self.check
    }

    /// Whether `candidate` lies inside the root. The root itself counts.
    #[must_use]
    pub fn contains(&self, candidate: &Path) -> bool {
        match self.check {
            BoundaryCheck::Prefix => candidate
                .as_os_str()
                .as_encoded_bytes()
                .starts_with(self.path.as_os_str().as_encoded_bytes()),
            BoundaryCheck::Component => candidate.starts_with(&self.path),
        }
    }

    /// Like [`contains`](Self::contains), with an unknown path counting as outside.
    #[must_use]
    pub fn contains_opt(&self, candidate: Option<&Path>) -> bool {
        candidate.is_some_and(|p| self.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_component_containment() {
        let root = WatchRoot::new("/w", BoundaryCheck::Component);
        assert!(root.contains(Path::new("/w")));
        assert!(root.contains(Path::new("/w/a.txt")));
        assert!(root.contains(Path::new("/w/deep/nested/file")));
        assert!(!root.contains(Path::new("/outside/a.txt")));
        assert!(!root.contains(Path::new("/wx/a.txt")));
    }

    #[test]
    fn test_prefix_matches_sibling_sharing_prefix() {
        let root = WatchRoot::new("/watch", BoundaryCheck::Prefix);
        assert!(root.contains(Path::new("/watch/a.txt")));
        assert!(root.contains(Path::new("/watched-other/a.txt")));
        assert!(!root.contains(Path::new("/other/a.txt")));

        let strict = WatchRoot::new("/watch", BoundaryCheck::Component);
        assert!(!strict.contains(Path::new("/watched-other/a.txt")));
    }

    #[test]
    fn test_unknown_path_is_outside() {
        let root = WatchRoot::new("/w", BoundaryCheck::Component);
        assert!(!root.contains_opt(None));
        assert!(root.contains_opt(Some(Path::new("/w/a"))));
    }

    #[test]
    fn test_resolve_existing_dir() {
        let tmp = TempDir::new().unwrap();
        let root = WatchRoot::resolve(tmp.path(), BoundaryCheck::Component).unwrap();
        assert_eq!(root.path(), tmp.path().canonicalize().unwrap());
        assert_eq!(root.check(), BoundaryCheck::Component);
    }

    #[test]
    fn test_resolve_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let err = WatchRoot::resolve(tmp.path().join("missing"), BoundaryCheck::Component)
            .unwrap_err();
        assert!(err.to_string().contains("failed to subscribe"));
    }

    #[test]
    fn test_resolve_rejects_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let err = WatchRoot::resolve(&file, BoundaryCheck::Prefix).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
