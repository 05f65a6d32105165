//! Fixed-size records and tagged framing for message queues.
//!
//! Every message on the queue is one frame:
//! - A 1-byte control marker: `0x01` (CONTINUE) or `0x00` (END)
//! - The record, encoded field by field in little-endian order
//!
//! Frames for a given record type are all the same size, so a queue created
//! with `message_size = frame_size::<T>()` holds exactly one frame per slot.

pub mod codec;
pub mod error;
pub mod record;

pub use codec::{
    decode_frame, decode_frame_into, encode_end, encode_record, frame_size, Frame, CONTINUE, END,
    MARKER_SIZE,
};
pub use error::{FrameError, Result};
pub use record::Record;

#[doc(hidden)]
pub use bytes;
