//! Typed record channels over POSIX message queues.
//!
//! mqprims moves fixed-size structured records between two processes
//! through a named OS message queue, with priorities, a bounded backlog and
//! an end-of-stream handshake when the writer goes away.
//!
//! # Crate Structure
//!
//! - [`queue`] — Named message queue adapter (`mq_open` and friends)
//! - [`frame`] — Record contract and tagged frame codec
//! - [`channel`] — Typed channel with scoped teardown
//! - [`records`] — Sample memory-reference records
//!
//! ```no_run
//! use mqprims::channel::Channel;
//! use mqprims::records::MemAccess;
//!
//! # fn main() -> mqprims::channel::Result<()> {
//! let mut writer = Channel::<MemAccess>::writer("/test_queue", 5)?;
//! for i in 0..20 {
//!     writer.send(&MemAccess::sample(i), 0)?;
//! }
//! // Dropping `writer` sends end-of-stream and unlinks the queue.
//! # Ok(())
//! # }
//! ```

pub mod records;

/// Re-export queue adapter types.
pub mod queue {
    pub use mqprims_queue::*;
}

/// Re-export record and frame types.
pub mod frame {
    pub use mqprims_frame::*;
}

/// Re-export channel types.
pub mod channel {
    pub use mqprims_channel::*;
}

pub use mqprims_channel::{Channel, ChannelConfig, ChannelError};
pub use mqprims_frame::{record, Record};
