//! Tests for error types.

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_display() {
        let err = Error::config("invalid buffer capacity");
        assert_eq!(
            err.to_string(),
            "configuration error: invalid buffer capacity"
        );
    }

    #[test]
    fn test_subscription_failed_display() {
        let err = WatcherError::subscription(&PathBuf::from("/tmp/missing"), "not found");
        assert_eq!(
            err.to_string(),
            "failed to subscribe to '/tmp/missing': not found"
        );
    }

    #[test]
    fn test_watcher_error_conversion() {
        let watch_err = WatcherError::SubscriptionFailed {
            path: "/tmp/test".to_string(),
            reason: "permission denied".to_string(),
        };
        let err: Error = watch_err.into();
        assert!(matches!(err, Error::Watcher(_)));
    }

    #[test]
    fn test_spawn_error_display() {
        let err = WatcherError::Spawn("resource temporarily unavailable".to_string());
        assert_eq!(
            err.to_string(),
            "failed to start delivery thread: resource temporarily unavailable"
        );
    }

    #[test]
    fn test_backend_error_overflow() {
        let err = BackendError::Overflow;
        assert_eq!(
            err.to_string(),
            "event queue overflowed, changes may have been missed"
        );
    }

    #[test]
    fn test_backend_error_root_removed() {
        let err = BackendError::root_removed(&PathBuf::from("/w"));
        assert_eq!(err.to_string(), "watch root '/w' was removed");
    }

    #[test]
    fn test_backend_error_notify_is_transparent() {
        let notify_err = notify::Error::generic("watch handle invalidated");
        let expected = notify_err.to_string();
        let err = BackendError::from(notify_err);
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::config("something went wrong");
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Config"));
        assert!(debug_str.contains("something went wrong"));
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn inner() -> Result<i32> {
            Err(Error::config("inner error"))
        }

        fn outer() -> Result<i32> {
            let _ = inner()?;
            Ok(0)
        }

        let result = outer();
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "configuration error: inner error"
        );
    }
}
