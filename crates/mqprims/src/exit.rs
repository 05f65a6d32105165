use std::fmt;
use std::io;

use mqprims_channel::ChannelError;
use mqprims_queue::QueueError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const QUEUE_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_exit_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => QUEUE_ERROR,
    }
}

pub fn queue_error(context: &str, err: QueueError) -> CliError {
    let code = match &err {
        QueueError::InvalidName { .. } | QueueError::InvalidAttributes(_) => USAGE,
        QueueError::Os { source, .. } => io_exit_code(source),
        QueueError::TimedOut(_) => TIMEOUT,
        QueueError::Closed => INTERNAL,
        QueueError::Unsupported => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    match err {
        ChannelError::Queue(err) => queue_error(context, err),
        ChannelError::Configuration(_) => CliError::new(USAGE, format!("{context}: {err}")),
        ChannelError::Permission { .. } => {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        ChannelError::Framing(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        ChannelError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mqprims_frame::FrameError;

    use super::*;

    #[test]
    fn framing_errors_are_data_invalid() {
        let err = channel_error(
            "receive failed",
            ChannelError::Framing(FrameError::InvalidMarker(9)),
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("receive failed: "));
    }

    #[test]
    fn os_permission_denied_maps_to_permission_code() {
        let err = channel_error(
            "open failed",
            ChannelError::Queue(QueueError::Os {
                op: "mq_open",
                source: io::Error::from_raw_os_error(13),
            }),
        );
        assert_eq!(err.code, PERMISSION_DENIED);
    }

    #[test]
    fn configuration_and_timeout_codes() {
        assert_eq!(
            channel_error("open", ChannelError::Configuration("x".into())).code,
            USAGE
        );
        assert_eq!(
            channel_error("recv", ChannelError::Timeout(Duration::from_secs(1))).code,
            TIMEOUT
        );
    }
}
