use std::time::Duration;

use crate::attrs::{AccessMode, QueueAttributes, QueueName, Received};
use crate::error::{QueueError, Result};

/// Placeholder for targets without POSIX message queues.
///
/// Every operation fails with [`QueueError::Unsupported`].
#[derive(Debug)]
pub struct MessageQueue {
    name: QueueName,
    access: AccessMode,
    attributes: QueueAttributes,
}

impl MessageQueue {
    pub const DEFAULT_QUEUE_MODE: u32 = 0o660;

    pub const TRANSPORT_NAME: &'static str = "unsupported";

    pub fn open(name: &QueueName, access: AccessMode, attributes: QueueAttributes) -> Result<Self> {
        Self::open_with_mode(name, access, attributes, Self::DEFAULT_QUEUE_MODE)
    }

    pub fn open_with_mode(
        _name: &QueueName,
        _access: AccessMode,
        _attributes: QueueAttributes,
        _mode: u32,
    ) -> Result<Self> {
        Err(QueueError::Unsupported)
    }

    pub fn send(&self, _msg: &[u8], _priority: u32, _timeout: Option<Duration>) -> Result<()> {
        Err(QueueError::Unsupported)
    }

    pub fn receive(&self, _buf: &mut [u8], _timeout: Option<Duration>) -> Result<Received> {
        Err(QueueError::Unsupported)
    }

    pub fn close(self) -> Result<()> {
        Ok(())
    }

    pub fn unlink(_name: &QueueName) -> Result<bool> {
        Err(QueueError::Unsupported)
    }

    pub fn name(&self) -> &QueueName {
        &self.name
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn attributes(&self) -> QueueAttributes {
        self.attributes
    }
}
