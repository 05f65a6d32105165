use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::record::Record;

/// Control byte preceding a record.
pub const CONTINUE: u8 = 0x01;

/// Control byte of the end-of-stream frame.
pub const END: u8 = 0x00;

/// Bytes of framing in front of every record.
pub const MARKER_SIZE: usize = 1;

/// Wire size of every frame carrying `T`.
pub const fn frame_size<T: Record>() -> usize {
    T::SIZE + MARKER_SIZE
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame<T> {
    /// A record follows; the stream continues.
    Record(T),
    /// The writer is done; no further records will arrive.
    End,
}

impl<T> Frame<T> {
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

/// Encode a CONTINUE frame carrying `record`.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────────────┐
/// │ Marker (1B)  │ Record (T::SIZE bytes)   │
/// │ 0x01         │ little-endian fields     │
/// └──────────────┴──────────────────────────┘
/// ```
///
/// On error nothing is left appended to `dst`.
pub fn encode_record<T: Record>(record: &T, dst: &mut BytesMut) -> Result<()> {
    let start = dst.len();
    dst.reserve(frame_size::<T>());
    dst.put_u8(CONTINUE);
    record.encode(dst);

    let written = dst.len() - start - MARKER_SIZE;
    if written != T::SIZE {
        dst.truncate(start);
        return Err(FrameError::RecordSize {
            declared: T::SIZE,
            actual: written,
        });
    }
    Ok(())
}

/// Encode the END frame for a stream of `T`.
///
/// The record area is zero-filled so END frames are the same size as every
/// other frame on the queue.
pub fn encode_end<T: Record>(dst: &mut BytesMut) {
    dst.reserve(frame_size::<T>());
    dst.put_u8(END);
    dst.put_bytes(0, T::SIZE);
}

/// Decode exactly one frame from `src`.
///
/// `src` must be the whole message as received from the queue.
pub fn decode_frame<T: Record>(src: &[u8]) -> Result<Frame<T>> {
    match split_frame::<T>(src)? {
        None => Ok(Frame::End),
        Some(mut body) => {
            let record = T::decode(&mut body);
            check_consumed::<T>(body)?;
            Ok(Frame::Record(record))
        }
    }
}

/// Decode exactly one frame from `src` into `dest`.
///
/// Returns `Ok(true)` for a record frame and `Ok(false)` for END, in which
/// case `dest` is left untouched.
pub fn decode_frame_into<T: Record>(src: &[u8], dest: &mut T) -> Result<bool> {
    match split_frame::<T>(src)? {
        None => Ok(false),
        Some(mut body) => {
            dest.decode_into(&mut body);
            check_consumed::<T>(body)?;
            Ok(true)
        }
    }
}

/// Validate length and marker; `None` is END, `Some` is the record body.
fn split_frame<T: Record>(src: &[u8]) -> Result<Option<&[u8]>> {
    let expected = frame_size::<T>();
    if src.len() != expected {
        return Err(FrameError::SizeMismatch {
            expected,
            actual: src.len(),
        });
    }

    match src[0] {
        END => Ok(None),
        CONTINUE => Ok(Some(&src[MARKER_SIZE..])),
        other => Err(FrameError::InvalidMarker(other)),
    }
}

fn check_consumed<T: Record>(body: &[u8]) -> Result<()> {
    if body.has_remaining() {
        return Err(FrameError::RecordSize {
            declared: T::SIZE,
            actual: T::SIZE - body.remaining(),
        });
    }
    Ok(())
}
