/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame length does not match `record size + 1`.
    ///
    /// Almost always means the two peers use different record types.
    #[error("frame size mismatch ({actual} bytes, expected {expected})")]
    SizeMismatch { expected: usize, actual: usize },

    /// The control byte is neither CONTINUE nor END.
    #[error("invalid frame marker 0x{0:02x}")]
    InvalidMarker(u8),

    /// A `Record` implementation wrote or read a different number of bytes
    /// than its declared `SIZE`.
    #[error("record used {actual} bytes, declared size is {declared}")]
    RecordSize { declared: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
