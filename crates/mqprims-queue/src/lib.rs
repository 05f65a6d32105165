//! Named OS message queue adapter.
//!
//! The lowest layer of mqprims: create-or-open, send, receive, close and
//! unlink a named POSIX message queue. Ordering, priority, capacity and
//! blocking all belong to the OS facility; this crate only translates
//! {name, access, capacity} into a descriptor and surfaces `errno` as
//! [`QueueError`].
//!
//! - Linux: `mq_open(3)` family via `nix::mqueue`, with `libc` for the
//!   timed send/receive calls
//! - Other targets: every operation fails with [`QueueError::Unsupported`]

pub mod attrs;
pub mod error;

#[cfg(target_os = "linux")]
mod posix;
#[cfg(not(target_os = "linux"))]
mod unsupported;

pub use attrs::{AccessMode, QueueAttributes, QueueName, Received, MAX_NAME_LEN};
pub use error::{QueueError, Result};

#[cfg(target_os = "linux")]
pub use posix::MessageQueue;
#[cfg(not(target_os = "linux"))]
pub use unsupported::MessageQueue;
