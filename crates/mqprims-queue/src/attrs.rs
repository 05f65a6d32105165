use std::ffi::CString;
use std::fmt;

use crate::error::{QueueError, Result};

/// Maximum queue name length, including the leading slash (`NAME_MAX`).
pub const MAX_NAME_LEN: usize = 255;

/// Which directions a queue descriptor is opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    /// Derive a mode from read/write flags. Returns `None` when neither is set.
    pub fn from_flags(read: bool, write: bool) -> Option<Self> {
        match (read, write) {
            (true, true) => Some(Self::ReadWrite),
            (true, false) => Some(Self::ReadOnly),
            (false, true) => Some(Self::WriteOnly),
            (false, false) => None,
        }
    }

    pub fn can_read(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "read-only",
            Self::WriteOnly => "write-only",
            Self::ReadWrite => "read-write",
        }
    }

    #[cfg(target_os = "linux")]
    pub(crate) fn open_flags(self) -> nix::mqueue::MQ_OFlag {
        use nix::mqueue::MQ_OFlag;

        let access = match self {
            Self::ReadOnly => MQ_OFlag::O_RDONLY,
            Self::WriteOnly => MQ_OFlag::O_WRONLY,
            Self::ReadWrite => MQ_OFlag::O_RDWR,
        };
        access | MQ_OFlag::O_CREAT | MQ_OFlag::O_CLOEXEC
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated message queue name (`/name`).
#[derive(Clone, PartialEq, Eq)]
pub struct QueueName {
    name: String,
    c_name: CString,
}

impl QueueName {
    /// Validate `name` against the Linux mqueue naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason| QueueError::InvalidName {
            name: name.clone(),
            reason,
        };

        let Some(rest) = name.strip_prefix('/') else {
            return Err(invalid("must start with '/'"));
        };
        if rest.is_empty() {
            return Err(invalid("must not be empty after '/'"));
        }
        if rest.contains('/') {
            return Err(invalid("must not contain '/' after the first character"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(invalid("longer than 255 bytes"));
        }
        let c_name = CString::new(name.as_bytes()).map_err(|_| invalid("contains a NUL byte"))?;

        Ok(Self { name, c_name })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    pub(crate) fn as_c_str(&self) -> &std::ffi::CStr {
        &self.c_name
    }
}

impl fmt::Debug for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QueueName").field(&self.name).finish()
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Capacity requested when the queue is created.
///
/// Ignored by the OS if the queue already exists; the adapter reads back the
/// real values after opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueAttributes {
    /// Number of messages buffered before senders block.
    pub max_messages: usize,
    /// Size in bytes of every message slot.
    pub message_size: usize,
}

impl QueueAttributes {
    pub fn new(max_messages: usize, message_size: usize) -> Result<Self> {
        if max_messages == 0 {
            return Err(QueueError::InvalidAttributes("max_messages must be positive"));
        }
        if message_size == 0 {
            return Err(QueueError::InvalidAttributes("message_size must be positive"));
        }
        Ok(Self {
            max_messages,
            message_size,
        })
    }
}

/// Metadata for one received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    /// Number of bytes written into the receive buffer.
    pub len: usize,
    /// Priority the sender attached to the message.
    pub priority: u32,
}
