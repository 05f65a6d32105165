use std::io;
use std::os::fd::AsRawFd;
use std::time::Duration;

use nix::errno::Errno;
use nix::mqueue::{mq_close, mq_getattr, mq_open, mq_receive, mq_send, mq_unlink, MqAttr, MqdT};
use nix::sys::stat::Mode;
use tracing::{debug, info, warn};

use crate::attrs::{AccessMode, QueueAttributes, QueueName, Received};
use crate::error::{QueueError, Result};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// POSIX message queue descriptor.
///
/// Opens (creating if absent) a named queue with `mq_open` and closes the
/// descriptor on `Drop`. Removing the name is a separate step,
/// [`MessageQueue::unlink`], because the name outlives any one descriptor.
pub struct MessageQueue {
    descriptor: Option<MqdT>,
    name: QueueName,
    access: AccessMode,
    attributes: QueueAttributes,
}

impl MessageQueue {
    /// Default permission mode for created queues: owner and group read-write.
    pub const DEFAULT_QUEUE_MODE: u32 = 0o660;

    /// Transport name for diagnostics.
    pub const TRANSPORT_NAME: &'static str = "posix-mqueue";

    /// Create or open `name` with the default mode.
    pub fn open(name: &QueueName, access: AccessMode, attributes: QueueAttributes) -> Result<Self> {
        Self::open_with_mode(name, access, attributes, Self::DEFAULT_QUEUE_MODE)
    }

    /// Create or open `name` with an explicit creation mode.
    ///
    /// `mode` and `attributes` only apply when this call creates the queue.
    pub fn open_with_mode(
        name: &QueueName,
        access: AccessMode,
        attributes: QueueAttributes,
        mode: u32,
    ) -> Result<Self> {
        let max_messages = attributes
            .max_messages
            .try_into()
            .map_err(|_| QueueError::InvalidAttributes("max_messages out of range"))?;
        let message_size = attributes
            .message_size
            .try_into()
            .map_err(|_| QueueError::InvalidAttributes("message_size out of range"))?;
        let attr = MqAttr::new(0, max_messages, message_size, 0);
        let mode = Mode::from_bits_truncate(mode as libc::mode_t);

        let descriptor = loop {
            match mq_open(name.as_c_str(), access.open_flags(), mode, Some(&attr)) {
                Ok(mqd) => break mqd,
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(os_error("mq_open", errno)),
            }
        };

        let mut queue = Self {
            descriptor: Some(descriptor),
            name: name.clone(),
            access,
            attributes,
        };
        // The queue may predate us with different attributes.
        queue.attributes = queue.read_attributes()?;

        if queue.attributes != attributes {
            debug!(
                name = %queue.name,
                requested = ?attributes,
                actual = ?queue.attributes,
                "opened existing queue with different attributes"
            );
        }
        info!(name = %queue.name, access = %access, "opened message queue");

        Ok(queue)
    }

    /// Enqueue one message, blocking while the queue is full.
    ///
    /// With `timeout`, gives up with [`QueueError::TimedOut`] once it elapses.
    pub fn send(&self, msg: &[u8], priority: u32, timeout: Option<Duration>) -> Result<()> {
        let mqd = self.descriptor()?;
        let deadline = timeout.map(abs_deadline).transpose()?;

        loop {
            let sent = match &deadline {
                Some(ts) => timed_send(mqd, msg, priority, ts),
                None => mq_send(mqd, msg, priority),
            };
            match sent {
                Ok(()) => return Ok(()),
                Err(errno) => match failure("mq_send", errno, timeout) {
                    None => continue,
                    Some(err) => return Err(err),
                },
            }
        }
    }

    /// Dequeue the oldest highest-priority message into `buf`.
    ///
    /// `buf` must be at least [`QueueAttributes::message_size`] bytes long.
    pub fn receive(&self, buf: &mut [u8], timeout: Option<Duration>) -> Result<Received> {
        let mqd = self.descriptor()?;
        let deadline = timeout.map(abs_deadline).transpose()?;
        let mut priority: u32 = 0;

        loop {
            let received = match &deadline {
                Some(ts) => timed_receive(mqd, buf, &mut priority, ts),
                None => mq_receive(mqd, buf, &mut priority),
            };
            match received {
                Ok(len) => return Ok(Received { len, priority }),
                Err(errno) => match failure("mq_receive", errno, timeout) {
                    None => continue,
                    Some(err) => return Err(err),
                },
            }
        }
    }

    /// Close the descriptor, reporting failure. The name is left in place.
    pub fn close(mut self) -> Result<()> {
        match self.descriptor.take() {
            Some(mqd) => close_descriptor(&self.name, mqd),
            None => Ok(()),
        }
    }

    /// Remove `name` from the system.
    ///
    /// Returns `Ok(false)` when no queue by that name exists. Open
    /// descriptors stay usable until closed.
    pub fn unlink(name: &QueueName) -> Result<bool> {
        match mq_unlink(name.as_c_str()) {
            Ok(()) => {
                debug!(%name, "unlinked message queue");
                Ok(true)
            }
            Err(Errno::ENOENT) => {
                debug!(%name, "message queue already unlinked");
                Ok(false)
            }
            Err(errno) => Err(os_error("mq_unlink", errno)),
        }
    }

    /// The queue's name.
    pub fn name(&self) -> &QueueName {
        &self.name
    }

    /// Direction(s) this descriptor was opened for.
    pub fn access(&self) -> AccessMode {
        self.access
    }

    /// Attributes of the queue as it exists on the system.
    pub fn attributes(&self) -> QueueAttributes {
        self.attributes
    }

    fn descriptor(&self) -> Result<&MqdT> {
        self.descriptor.as_ref().ok_or(QueueError::Closed)
    }

    fn read_attributes(&self) -> Result<QueueAttributes> {
        let attr = mq_getattr(self.descriptor()?).map_err(|errno| os_error("mq_getattr", errno))?;
        Ok(QueueAttributes {
            max_messages: usize::try_from(attr.maxmsg()).unwrap_or(0),
            message_size: usize::try_from(attr.msgsize()).unwrap_or(0),
        })
    }
}

impl Drop for MessageQueue {
    fn drop(&mut self) {
        if let Some(mqd) = self.descriptor.take() {
            if let Err(err) = close_descriptor(&self.name, mqd) {
                warn!(name = %self.name, error = %err, "failed to close message queue");
            }
        }
    }
}

impl std::fmt::Debug for MessageQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageQueue")
            .field("name", &self.name)
            .field("access", &self.access)
            .field("attributes", &self.attributes)
            .field("open", &self.descriptor.is_some())
            .finish()
    }
}

fn close_descriptor(name: &QueueName, mqd: MqdT) -> Result<()> {
    mq_close(mqd).map_err(|errno| os_error("mq_close", errno))?;
    debug!(%name, "closed message queue");
    Ok(())
}

// nix has no wrappers for the timed calls.
fn timed_send(
    mqd: &MqdT,
    msg: &[u8],
    priority: u32,
    deadline: &libc::timespec,
) -> nix::Result<()> {
    // SAFETY: `msg` is valid for `msg.len()` bytes, the descriptor is open
    // for as long as `mqd` is borrowed and `deadline` outlives the call.
    let rc = unsafe {
        libc::mq_timedsend(
            mqd.as_raw_fd(),
            msg.as_ptr().cast::<libc::c_char>(),
            msg.len(),
            priority as libc::c_uint,
            deadline,
        )
    };
    Errno::result(rc).map(drop)
}

fn timed_receive(
    mqd: &MqdT,
    buf: &mut [u8],
    priority: &mut u32,
    deadline: &libc::timespec,
) -> nix::Result<usize> {
    // SAFETY: `buf` is valid for writes of `buf.len()` bytes, `priority` is
    // a valid out-pointer and `deadline` outlives the call.
    let received = unsafe {
        libc::mq_timedreceive(
            mqd.as_raw_fd(),
            buf.as_mut_ptr().cast::<libc::c_char>(),
            buf.len(),
            priority as *mut u32 as *mut libc::c_uint,
            deadline,
        )
    };
    Errno::result(received).map(|len| len as usize)
}

fn os_error(op: &'static str, errno: Errno) -> QueueError {
    QueueError::Os {
        op,
        source: io::Error::from(errno),
    }
}

/// Classify a failed call. `None` means the call was interrupted by a
/// signal and should be restarted.
fn failure(op: &'static str, errno: Errno, timeout: Option<Duration>) -> Option<QueueError> {
    match errno {
        Errno::EINTR => None,
        Errno::ETIMEDOUT => Some(QueueError::TimedOut(timeout.unwrap_or_default())),
        _ => Some(os_error(op, errno)),
    }
}

/// Convert a relative timeout into the absolute `CLOCK_REALTIME` deadline
/// the timed mq calls expect.
fn abs_deadline(timeout: Duration) -> Result<libc::timespec> {
    // SAFETY: all-zero is a valid `timespec`.
    let mut now: libc::timespec = unsafe { std::mem::zeroed() };
    // SAFETY: `now` is a valid out-pointer.
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut now) } != 0 {
        return Err(QueueError::last_os("clock_gettime"));
    }

    let nanos = now.tv_nsec as u64 + u64::from(timeout.subsec_nanos());
    let secs = timeout.as_secs().saturating_add(nanos / NANOS_PER_SEC);
    let secs = libc::time_t::try_from(secs).unwrap_or(libc::time_t::MAX);

    let mut deadline = now;
    deadline.tv_sec = now.tv_sec.saturating_add(secs);
    deadline.tv_nsec = (nanos % NANOS_PER_SEC) as _;
    Ok(deadline)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_name(tag: &str) -> QueueName {
        QueueName::new(format!("/mqprims-test-{}-{tag}", std::process::id())).unwrap()
    }

    fn attrs(max_messages: usize, message_size: usize) -> QueueAttributes {
        QueueAttributes::new(max_messages, message_size).unwrap()
    }

    #[test]
    fn test_send_receive_roundtrip() {
        let name = unique_name("roundtrip");
        let queue = MessageQueue::open(&name, AccessMode::ReadWrite, attrs(4, 8)).unwrap();

        queue.send(b"hello", 0, None).unwrap();

        let mut buf = [0u8; 8];
        let received = queue.receive(&mut buf, None).unwrap();
        assert_eq!(received.len, 5);
        assert_eq!(received.priority, 0);
        assert_eq!(&buf[..5], b"hello");

        queue.close().unwrap();
        assert!(MessageQueue::unlink(&name).unwrap());
    }

    #[test]
    fn test_reopen_reports_existing_attributes() {
        let name = unique_name("reopen");
        let first = MessageQueue::open(&name, AccessMode::WriteOnly, attrs(3, 10)).unwrap();
        let second = MessageQueue::open(&name, AccessMode::ReadOnly, attrs(5, 18)).unwrap();

        assert_eq!(first.attributes(), attrs(3, 10));
        assert_eq!(second.attributes(), attrs(3, 10));

        drop(first);
        drop(second);
        MessageQueue::unlink(&name).unwrap();
    }

    #[test]
    fn test_priority_order() {
        let name = unique_name("priority");
        let queue = MessageQueue::open(&name, AccessMode::ReadWrite, attrs(4, 4)).unwrap();

        queue.send(b"low", 1, None).unwrap();
        queue.send(b"high", 9, None).unwrap();

        let mut buf = [0u8; 4];
        let first = queue.receive(&mut buf, None).unwrap();
        assert_eq!((first.priority, &buf[..first.len]), (9, b"high".as_ref()));
        let second = queue.receive(&mut buf, None).unwrap();
        assert_eq!((second.priority, &buf[..second.len]), (1, b"low".as_ref()));

        drop(queue);
        MessageQueue::unlink(&name).unwrap();
    }

    #[test]
    fn test_receive_timeout_on_empty_queue() {
        let name = unique_name("timeout");
        let queue = MessageQueue::open(&name, AccessMode::ReadOnly, attrs(2, 4)).unwrap();

        let mut buf = [0u8; 4];
        let err = queue
            .receive(&mut buf, Some(Duration::from_millis(20)))
            .unwrap_err();
        assert!(matches!(err, QueueError::TimedOut(_)));

        drop(queue);
        MessageQueue::unlink(&name).unwrap();
    }

    #[test]
    fn test_send_timeout_on_full_queue() {
        let name = unique_name("full");
        let queue = MessageQueue::open(&name, AccessMode::WriteOnly, attrs(1, 4)).unwrap();

        queue.send(b"one", 0, None).unwrap();
        let err = queue
            .send(b"two", 0, Some(Duration::from_millis(20)))
            .unwrap_err();
        assert!(matches!(err, QueueError::TimedOut(_)));

        drop(queue);
        MessageQueue::unlink(&name).unwrap();
    }

    #[test]
    fn test_short_buffer_is_os_error() {
        let name = unique_name("msgsize");
        let queue = MessageQueue::open(&name, AccessMode::ReadWrite, attrs(2, 8)).unwrap();
        queue.send(b"x", 0, None).unwrap();

        let mut buf = [0u8; 4];
        let err = queue.receive(&mut buf, None).unwrap_err();
        assert_eq!(err.os_code(), Some(libc::EMSGSIZE));

        drop(queue);
        MessageQueue::unlink(&name).unwrap();
    }

    #[test]
    fn test_unlink_missing_queue() {
        let name = unique_name("missing");
        assert!(!MessageQueue::unlink(&name).unwrap());
    }

    #[test]
    fn test_transport_name() {
        assert_eq!(MessageQueue::TRANSPORT_NAME, "posix-mqueue");
    }

    #[test]
    fn test_timed_calls_share_the_untimed_queue() {
        let name = unique_name("timed-mix");
        let queue = MessageQueue::open(&name, AccessMode::ReadWrite, attrs(2, 8)).unwrap();

        queue.send(b"timed", 4, Some(Duration::from_secs(1))).unwrap();
        queue.send(b"plain", 2, None).unwrap();

        let mut buf = [0u8; 8];
        let first = queue.receive(&mut buf, None).unwrap();
        assert_eq!((first.priority, &buf[..first.len]), (4, b"timed".as_ref()));
        let second = queue.receive(&mut buf, Some(Duration::from_secs(1))).unwrap();
        assert_eq!((second.priority, &buf[..second.len]), (2, b"plain".as_ref()));

        queue.close().unwrap();
        assert!(MessageQueue::unlink(&name).unwrap());
    }

    #[test]
    fn test_abs_deadline_is_in_the_future() {
        let deadline = abs_deadline(Duration::from_millis(1500)).unwrap();
        assert!(deadline.tv_nsec >= 0);
        assert!((deadline.tv_nsec as u64) < NANOS_PER_SEC);
    }
}
