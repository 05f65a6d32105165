use std::time::Duration;

use mqprims_queue::{AccessMode, MessageQueue};

use crate::error::{ChannelError, Result};

/// Default number of frames the queue buffers before a sender blocks.
///
/// Linux caps unprivileged queues at `/proc/sys/fs/mqueue/msg_max` (10).
pub const DEFAULT_MAX_BACKLOG: usize = 10;

/// Default bound on the end-of-stream send during teardown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for a [`Channel`](crate::Channel).
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Frames the queue buffers before `send` blocks.
    pub max_backlog: usize,
    /// Open for receiving.
    pub read: bool,
    /// Open for sending. Write-enabled channels send END on teardown.
    pub write: bool,
    /// Bound on each `receive`. `None` blocks until a frame arrives.
    pub receive_timeout: Option<Duration>,
    /// Bound on each `send` while the queue is full. `None` blocks.
    pub send_timeout: Option<Duration>,
    /// Bound on the end-of-stream send during teardown.
    pub shutdown_timeout: Duration,
    /// Permission bits used if this channel creates the queue.
    pub mode: u32,
}

impl ChannelConfig {
    /// Configuration for a receiving-only channel.
    pub fn reader(max_backlog: usize) -> Self {
        Self {
            max_backlog,
            read: true,
            write: false,
            ..Self::default()
        }
    }

    /// Configuration for a sending-only channel.
    pub fn writer(max_backlog: usize) -> Self {
        Self {
            max_backlog,
            read: false,
            write: true,
            ..Self::default()
        }
    }

    /// Check the parameters that can be checked without touching the OS.
    pub fn access(&self) -> Result<AccessMode> {
        let access = AccessMode::from_flags(self.read, self.write).ok_or_else(|| {
            ChannelError::Configuration("channel needs read or write enabled".to_string())
        })?;
        if self.max_backlog == 0 {
            return Err(ChannelError::Configuration(
                "max_backlog must be positive".to_string(),
            ));
        }
        Ok(access)
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_backlog: DEFAULT_MAX_BACKLOG,
            read: true,
            write: true,
            receive_timeout: None,
            send_timeout: None,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            mode: MessageQueue::DEFAULT_QUEUE_MODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_and_writer_presets() {
        assert_eq!(ChannelConfig::reader(5).access().unwrap(), AccessMode::ReadOnly);
        assert_eq!(ChannelConfig::writer(5).access().unwrap(), AccessMode::WriteOnly);
        assert_eq!(ChannelConfig::default().access().unwrap(), AccessMode::ReadWrite);
    }

    #[test]
    fn no_access_is_configuration_error() {
        let config = ChannelConfig {
            read: false,
            write: false,
            ..ChannelConfig::default()
        };
        assert!(matches!(config.access(), Err(ChannelError::Configuration(_))));
    }

    #[test]
    fn zero_backlog_is_configuration_error() {
        assert!(matches!(
            ChannelConfig::reader(0).access(),
            Err(ChannelError::Configuration(_))
        ));
    }

    #[test]
    fn default_mode_has_no_execute_bits() {
        let mode = ChannelConfig::default().mode;
        assert_eq!(mode & 0o111, 0);
        assert_eq!(mode & 0o660, 0o660);
    }
}
