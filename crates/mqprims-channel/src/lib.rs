//! Typed record channels over named message queues.
//!
//! This is the "just works" layer. Open a [`Channel`] on a shared queue
//! name, send fixed-size [`Record`]s from one process and receive them in
//! another. The writer's drop sends an end-of-stream frame, after which the
//! reader's `receive` returns `false`.
//!
//! ```no_run
//! use mqprims_channel::Channel;
//!
//! # fn main() -> mqprims_channel::Result<()> {
//! let mut reader = Channel::<u64>::reader("/trace_events", 5)?;
//! let mut value = 0u64;
//! while reader.receive(&mut value)? {
//!     println!("{value:#x}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod error;

pub use channel::{Channel, Records};
pub use config::{ChannelConfig, DEFAULT_MAX_BACKLOG, DEFAULT_SHUTDOWN_TIMEOUT};
pub use error::{ChannelError, Result};
pub use mqprims_frame::Record;
pub use mqprims_queue::AccessMode;
