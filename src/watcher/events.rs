//! Raw records and normalized change events.

#![allow(clippy::missing_const_for_fn)]

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of a normalized change event.
///
/// The discriminants are the wire values consumers see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum ChangeKind {
    /// Contents or metadata of an entry changed.
    Changed = 0,
    /// Entry was created.
    Created = 1,
    /// Entry was deleted.
    Deleted = 2,
    /// Entry was renamed within the root.
    Renamed = 3,
    /// Out-of-band diagnostic, not a filesystem mutation.
    Log = 4,
}

impl From<ChangeKind> for u8 {
    fn from(kind: ChangeKind) -> Self {
        kind as Self
    }
}

impl TryFrom<u8> for ChangeKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Changed),
            1 => Ok(Self::Created),
            2 => Ok(Self::Deleted),
            3 => Ok(Self::Renamed),
            4 => Ok(Self::Log),
            other => Err(format!("unknown change type {other}")),
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Changed => "changed",
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::Renamed => "renamed",
            Self::Log => "log",
        };
        f.write_str(name)
    }
}

/// A normalized event delivered to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// What happened.
    #[serde(rename = "changeType")]
    pub kind: ChangeKind,
    /// Affected entry. For `Log` events this carries the message text.
    pub path: PathBuf,
    /// Previous location, only for `Renamed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<PathBuf>,
}

impl ChangeEvent {
    /// Create a `Changed` event.
    #[must_use]
    pub fn changed(path: impl Into<PathBuf>) -> Self {
        Self::single(ChangeKind::Changed, path.into())
    }

    /// Create a `Created` event.
    #[must_use]
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::single(ChangeKind::Created, path.into())
    }

    /// Create a `Deleted` event.
    #[must_use]
    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::single(ChangeKind::Deleted, path.into())
    }

    /// Create a `Renamed` event.
    #[must_use]
    pub fn renamed(old_path: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ChangeKind::Renamed,
            path: path.into(),
            old_path: Some(old_path.into()),
        }
    }

    /// Create a `Log` event carrying a diagnostic message.
    #[must_use]
    pub fn log(message: impl fmt::Display) -> Self {
        Self::single(ChangeKind::Log, PathBuf::from(message.to_string()))
    }

    fn single(kind: ChangeKind, path: PathBuf) -> Self {
        Self {
            kind,
            path,
            old_path: None,
        }
    }

    /// Path of the affected entry.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Previous path of a renamed entry.
    #[must_use]
    pub fn old_path(&self) -> Option<&Path> {
        self.old_path.as_deref()
    }
}

/// An unprocessed record from the notification backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// Contents or metadata changed.
    Changed(PathBuf),
    /// Entry appeared.
    Created(PathBuf),
    /// Entry disappeared.
    Deleted(PathBuf),
    /// Entry moved. An endpoint the backend could not observe is `None`.
    Renamed {
        from: Option<PathBuf>,
        to: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_kind_wire_values() {
        assert_eq!(u8::from(ChangeKind::Changed), 0);
        assert_eq!(u8::from(ChangeKind::Created), 1);
        assert_eq!(u8::from(ChangeKind::Deleted), 2);
        assert_eq!(u8::from(ChangeKind::Renamed), 3);
        assert_eq!(u8::from(ChangeKind::Log), 4);
        assert!(ChangeKind::try_from(5).is_err());
    }

    #[test]
    fn test_event_constructors() {
        let created = ChangeEvent::created("/w/a.txt");
        assert_eq!(created.kind, ChangeKind::Created);
        assert_eq!(created.path(), Path::new("/w/a.txt"));
        assert!(created.old_path().is_none());

        let renamed = ChangeEvent::renamed("/w/a.txt", "/w/b.txt");
        assert_eq!(renamed.kind, ChangeKind::Renamed);
        assert_eq!(renamed.path(), Path::new("/w/b.txt"));
        assert_eq!(renamed.old_path(), Some(Path::new("/w/a.txt")));
    }

    #[test]
    fn test_rename_serializes_wire_shape() {
        let event = ChangeEvent::renamed("/w/a.txt", "/w/b.txt");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"changeType": 3, "path": "/w/b.txt", "oldPath": "/w/a.txt"})
        );
    }

    #[test]
    fn test_single_path_event_omits_old_path() {
        let json = serde_json::to_string(&ChangeEvent::deleted("/w/gone")).unwrap();
        assert_eq!(json, r#"{"changeType":2,"path":"/w/gone"}"#);
    }

    #[test]
    fn test_log_event_carries_message() {
        let event = ChangeEvent::log("queue overflowed");
        assert_eq!(event.kind, ChangeKind::Log);
        assert_eq!(event.path(), Path::new("queue overflowed"));
    }

    #[test]
    fn test_deserialize_rejects_unknown_kind() {
        let result: Result<ChangeEvent, _> =
            serde_json::from_str(r#"{"changeType":9,"path":"/w/x"}"#);
        assert!(result.is_err());
    }
}
