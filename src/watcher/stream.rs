//! Async front-end over a [`Session`].

use tokio::sync::mpsc;

use super::events::ChangeEvent;
use super::session::Session;
use crate::config::Config;
use crate::error::BackendError;
use crate::Result;

/// Item produced by an [`EventStream`].
#[derive(Debug)]
pub enum SessionMessage {
    /// A normalized change.
    Event(ChangeEvent),
    /// The backend failed; no further events follow.
    Error(BackendError),
}

/// Session whose output is read with `recv().await` instead of callbacks.
pub struct EventStream {
    // Declared before `session` so the receiver is dropped first, which
    // unblocks a delivery thread stuck on a full channel before it is joined.
    rx: mpsc::Receiver<SessionMessage>,
    session: Session,
}

impl EventStream {
    /// Start a session described by `config`.
    ///
    /// The channel has the same capacity as the raw notification queue.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid settings, or an error if
    /// the session cannot be started.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;

        let (event_tx, rx) = mpsc::channel(config.buffer_capacity);
        let error_tx = event_tx.clone();

        let session = Session::start(
            config,
            move |event| {
                if event_tx.blocking_send(SessionMessage::Event(event)).is_err() {
                    tracing::trace!("Event stream closed, dropping event");
                }
            },
            move |error| {
                if error_tx.blocking_send(SessionMessage::Error(error)).is_err() {
                    tracing::trace!("Event stream closed, dropping backend error");
                }
            },
        )?;

        Ok(Self { rx, session })
    }

    /// Receive the next message.
    ///
    /// Returns `None` once the session has stopped and everything it sent
    /// has been received.
    pub async fn recv(&mut self) -> Option<SessionMessage> {
        self.rx.recv().await
    }

    /// The underlying session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Stop the session. Messages already queued can still be received.
    pub fn dispose(&mut self) {
        self.rx.close();
        self.session.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::ChangeKind;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_stream_receives_created_file() {
        let tmp = TempDir::new().unwrap();
        let mut stream = EventStream::open(&Config::for_root(tmp.path())).unwrap();
        let file = stream.session().root().join("hello.txt");

        std::fs::write(&file, "hi").unwrap();

        let found = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(message) = stream.recv().await {
                if let SessionMessage::Event(event) = message {
                    if event.kind == ChangeKind::Created && event.path == file {
                        return true;
                    }
                }
            }
            false
        })
        .await
        .unwrap_or(false);

        assert!(found, "expected a Created event for {}", file.display());
        stream.dispose();
    }

    #[tokio::test]
    async fn test_stream_ends_after_dispose() {
        let tmp = TempDir::new().unwrap();
        let mut stream = EventStream::open(&Config::for_root(tmp.path())).unwrap();

        stream.dispose();
        assert!(!stream.session().is_running());

        let end = tokio::time::timeout(Duration::from_secs(5), async {
            while stream.recv().await.is_some() {}
        })
        .await;
        assert!(end.is_ok());
    }

    #[test]
    fn test_open_rejects_zero_capacity() {
        let tmp = TempDir::new().unwrap();
        let config = Config {
            buffer_capacity: 0,
            ..Config::for_root(tmp.path())
        };
        let err = EventStream::open(&config).err().unwrap();
        assert!(matches!(err, crate::Error::Config(_)));
        assert!(err.to_string().contains("buffer_capacity"));
    }

    #[test]
    fn test_open_missing_root_fails() {
        let tmp = TempDir::new().unwrap();
        let result = EventStream::open(&Config::for_root(tmp.path().join("missing")));
        assert!(result.is_err());
    }
}
