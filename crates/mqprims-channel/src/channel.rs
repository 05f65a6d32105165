use std::fmt;
use std::marker::PhantomData;

use bytes::BytesMut;
use mqprims_frame::{
    decode_frame, decode_frame_into, encode_end, encode_record, frame_size, Frame, FrameError,
    Record,
};
use mqprims_queue::{AccessMode, MessageQueue, QueueAttributes, QueueName, Received};
use tracing::{debug, trace, warn};

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    /// END observed. Terminal.
    Closed,
}

/// A typed, framed channel over a named message queue.
///
/// One writer and one reader open the same identifier. The writer calls
/// [`send`](Channel::send) per record; the reader calls
/// [`receive`](Channel::receive) until it returns `false`.
///
/// Dropping the channel tears it down: a write-enabled channel sends one
/// END frame (bounded by [`ChannelConfig::shutdown_timeout`]), then the
/// descriptor is closed and the queue name unlinked. Teardown failures are
/// logged, never raised; use [`close`](Channel::close) to observe them.
///
/// Both peers must use the same record type. The queue keeps the slot size
/// of whichever side created it, and a mismatch surfaces as
/// [`ChannelError::Framing`]:
/// - a writer whose frames do not fit the existing slot fails to open
/// - a reader that finds frames of another size fails on `receive`
///
/// The one order the reader cannot be told about is a reader that creates
/// the queue with a smaller record than the writer's: the writer refuses to
/// open, so no frame ever arrives and the reader waits until its receive
/// timeout (forever without one).
///
/// A blocked `receive` cannot be cancelled from another thread. It returns
/// when a frame arrives, the receive timeout elapses or the process exits.
/// Multiple writers or readers on one identifier are not detected; their
/// frames interleave.
pub struct Channel<T: Record> {
    queue: Option<MessageQueue>,
    identifier: QueueName,
    access: AccessMode,
    config: ChannelConfig,
    state: State,
    send_buf: BytesMut,
    recv_buf: Vec<u8>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Channel<T> {
    /// Create or open the queue `identifier`.
    ///
    /// At least one of `read_enabled` / `write_enabled` must be set.
    pub fn open(
        identifier: &str,
        max_backlog: usize,
        read_enabled: bool,
        write_enabled: bool,
    ) -> Result<Self> {
        Self::with_config(
            identifier,
            ChannelConfig {
                max_backlog,
                read: read_enabled,
                write: write_enabled,
                ..ChannelConfig::default()
            },
        )
    }

    /// Open a receive-only channel.
    pub fn reader(identifier: &str, max_backlog: usize) -> Result<Self> {
        Self::with_config(identifier, ChannelConfig::reader(max_backlog))
    }

    /// Open a send-only channel.
    pub fn writer(identifier: &str, max_backlog: usize) -> Result<Self> {
        Self::with_config(identifier, ChannelConfig::writer(max_backlog))
    }

    /// Create or open the queue `identifier` with explicit configuration.
    pub fn with_config(identifier: &str, config: ChannelConfig) -> Result<Self> {
        let access = config.access()?;
        let identifier = QueueName::new(identifier)?;
        let attributes = QueueAttributes::new(config.max_backlog, frame_size::<T>())?;

        let queue = MessageQueue::open_with_mode(&identifier, access, attributes, config.mode)?;
        let slot = queue.attributes().message_size;

        // A frame larger than the slot would fail every send with EMSGSIZE.
        if access.can_write() && slot < frame_size::<T>() {
            warn!(
                %identifier,
                frame_size = frame_size::<T>(),
                slot,
                "queue slot too small for this record type"
            );
            return Err(FrameError::SizeMismatch {
                expected: frame_size::<T>(),
                actual: slot,
            }
            .into());
        }

        // Sized for the queue as it exists, so a peer using a larger record
        // is reported as a framing error rather than EMSGSIZE.
        let recv_len = slot.max(frame_size::<T>());

        debug!(
            %identifier,
            %access,
            frame_size = frame_size::<T>(),
            max_backlog = config.max_backlog,
            "channel opened"
        );

        Ok(Self {
            queue: Some(queue),
            identifier,
            access,
            config,
            state: State::Active,
            send_buf: BytesMut::with_capacity(frame_size::<T>()),
            recv_buf: vec![0u8; recv_len],
            _record: PhantomData,
        })
    }

    /// Enqueue `record`.
    ///
    /// `priority` is passed through to the queue: higher priorities are
    /// delivered first, equal priorities in send order.
    pub fn send(&mut self, record: &T, priority: u32) -> Result<()> {
        if !self.access.can_write() {
            return Err(ChannelError::Permission {
                operation: "send",
                access: self.access,
            });
        }

        self.send_buf.clear();
        encode_record(record, &mut self.send_buf)?;

        let queue = self.queue.as_ref().ok_or(mqprims_queue::QueueError::Closed)?;
        queue.send(&self.send_buf, priority, self.config.send_timeout)?;
        trace!(identifier = %self.identifier, priority, "sent record");
        Ok(())
    }

    /// Receive the next record into `destination`.
    ///
    /// Returns `Ok(false)` once the writer's END frame has been seen, and on
    /// every call after that; `destination` is left untouched in that case.
    pub fn receive(&mut self, destination: &mut T) -> Result<bool> {
        let Some(received) = self.next_frame()? else {
            return Ok(false);
        };

        if decode_frame_into(&self.recv_buf[..received.len], destination)? {
            trace!(identifier = %self.identifier, priority = received.priority, "received record");
            Ok(true)
        } else {
            self.end_of_stream();
            Ok(false)
        }
    }

    /// Receive the next record, or `None` at end of stream.
    pub fn recv(&mut self) -> Result<Option<T>> {
        let Some(received) = self.next_frame()? else {
            return Ok(None);
        };

        match decode_frame::<T>(&self.recv_buf[..received.len])? {
            Frame::Record(record) => {
                trace!(identifier = %self.identifier, priority = received.priority, "received record");
                Ok(Some(record))
            }
            Frame::End => {
                self.end_of_stream();
                Ok(None)
            }
        }
    }

    /// Iterate over received records until end of stream.
    pub fn records(&mut self) -> Records<'_, T> {
        Records { channel: self }
    }

    /// Tear the channel down, reporting the first failure.
    ///
    /// Every step is attempted even if an earlier one fails.
    pub fn close(mut self) -> Result<()> {
        self.teardown()
    }

    /// The queue name this channel is bound to.
    pub fn identifier(&self) -> &str {
        self.identifier.as_str()
    }

    /// Declared backlog used when creating the queue.
    pub fn max_backlog(&self) -> usize {
        self.config.max_backlog
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    /// `false` once END has been received.
    pub fn is_active(&self) -> bool {
        self.state == State::Active
    }

    /// Bytes per frame on the wire (`T::SIZE + 1`).
    pub fn frame_size(&self) -> usize {
        frame_size::<T>()
    }

    /// Current configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Pull one raw frame into `recv_buf`. `None` once END has been seen.
    fn next_frame(&mut self) -> Result<Option<Received>> {
        if !self.access.can_read() {
            return Err(ChannelError::Permission {
                operation: "receive",
                access: self.access,
            });
        }
        if self.state == State::Closed {
            return Ok(None);
        }

        let queue = self.queue.as_ref().ok_or(mqprims_queue::QueueError::Closed)?;
        let received = queue.receive(&mut self.recv_buf, self.config.receive_timeout)?;
        Ok(Some(received))
    }

    fn end_of_stream(&mut self) {
        debug!(identifier = %self.identifier, "end of stream");
        self.state = State::Closed;
    }

    fn teardown(&mut self) -> Result<()> {
        let Some(queue) = self.queue.take() else {
            return Ok(());
        };
        let mut first_error: Option<ChannelError> = None;

        if self.access.can_write() {
            self.send_buf.clear();
            encode_end::<T>(&mut self.send_buf);
            match queue.send(&self.send_buf, 0, Some(self.config.shutdown_timeout)) {
                Ok(()) => debug!(identifier = %self.identifier, "sent end of stream"),
                Err(err) => {
                    warn!(identifier = %self.identifier, error = %err, "failed to send end of stream");
                    first_error.get_or_insert(err.into());
                }
            }
        }

        if let Err(err) = queue.close() {
            warn!(identifier = %self.identifier, error = %err, "failed to close queue");
            first_error.get_or_insert(err.into());
        }

        if let Err(err) = MessageQueue::unlink(&self.identifier) {
            warn!(identifier = %self.identifier, error = %err, "failed to unlink queue");
            first_error.get_or_insert(err.into());
        }

        self.state = State::Closed;
        first_error.map_or(Ok(()), Err)
    }
}

impl<T: Record> Drop for Channel<T> {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}

impl<T: Record> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("identifier", &self.identifier)
            .field("access", &self.access)
            .field("state", &self.state)
            .field("frame_size", &frame_size::<T>())
            .finish()
    }
}

/// Iterator over a channel's records. See [`Channel::records`].
pub struct Records<'a, T: Record> {
    channel: &'a mut Channel<T>,
}

impl<T: Record> Iterator for Records<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.channel.recv().transpose()
    }
}
