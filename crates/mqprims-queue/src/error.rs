use std::time::Duration;

/// Errors that can occur in message queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The queue name does not follow the platform naming rules.
    #[error("invalid queue name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// Capacity or message size is not usable.
    #[error("invalid queue attributes: {0}")]
    InvalidAttributes(&'static str),

    /// The facility refused the operation.
    #[error("{op} failed: {source}")]
    Os {
        op: &'static str,
        source: std::io::Error,
    },

    /// A timed send or receive hit its deadline.
    #[error("queue operation timed out after {0:?}")]
    TimedOut(Duration),

    /// The queue descriptor has already been closed.
    #[error("queue closed")]
    Closed,

    /// POSIX message queues are not available on this platform.
    #[error("POSIX message queues are not supported on this platform")]
    Unsupported,
}

impl QueueError {
    /// Capture `errno` for the failed operation.
    pub(crate) fn last_os(op: &'static str) -> Self {
        Self::Os {
            op,
            source: std::io::Error::last_os_error(),
        }
    }

    /// Platform error code, when the failure came from the OS.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::Os { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_code_is_exposed_for_os_errors() {
        let err = QueueError::Os {
            op: "mq_open",
            source: std::io::Error::from_raw_os_error(13),
        };
        assert_eq!(err.os_code(), Some(13));
        assert!(err.to_string().starts_with("mq_open failed"));
    }

    #[test]
    fn os_code_is_none_for_local_errors() {
        assert_eq!(QueueError::Closed.os_code(), None);
        assert_eq!(
            QueueError::TimedOut(Duration::from_millis(5)).os_code(),
            None
        );
    }
}
