use std::io;
use std::time::Duration;

use mqprims_frame::FrameError;
use mqprims_queue::{AccessMode, QueueError};

/// Errors that can occur in channel operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Construction parameters are unusable; no queue was opened.
    #[error("invalid channel configuration: {0}")]
    Configuration(String),

    /// The message queue facility refused an operation.
    #[error("queue error: {0}")]
    Queue(QueueError),

    /// The operation needs a direction this channel was not opened for.
    #[error("{operation} not permitted on a {access} channel")]
    Permission {
        operation: &'static str,
        access: AccessMode,
    },

    /// A received frame does not match this channel's record type.
    #[error("framing error: {0}")]
    Framing(#[from] FrameError),

    /// A timed operation hit its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ChannelError {
    /// Platform error code for OS failures.
    pub fn os_code(&self) -> Option<i32> {
        match self {
            Self::Queue(err) => err.os_code(),
            _ => None,
        }
    }

    /// Whether repeating the same call may succeed.
    ///
    /// Configuration, permission and framing errors never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Queue(QueueError::Os { source, .. }) => matches!(
                source.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

impl From<QueueError> for ChannelError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::InvalidName { .. } | QueueError::InvalidAttributes(_) => {
                Self::Configuration(err.to_string())
            }
            QueueError::TimedOut(after) => Self::Timeout(after),
            other => Self::Queue(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
