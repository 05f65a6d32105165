//! Sample records for a memory-tracing producer and an analysis consumer.
//!
//! These show how a payload type is declared with [`record!`](crate::record);
//! nothing in the channel depends on them.

/// `kind` value of a load.
pub const READ: u8 = b'r';

/// `kind` value of a store.
pub const WRITE: u8 = b'w';

mqprims_frame::record! {
    /// A single memory access (9 bytes on the wire).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MemAccess {
        /// [`READ`] or [`WRITE`].
        pub kind: u8,
        pub addr: u64,
    }
}

mqprims_frame::record! {
    /// A memory access with the program counter that issued it (17 bytes).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MemRef {
        pub addr: u64,
        /// [`READ`] or [`WRITE`].
        pub kind: u8,
        pub pc: u64,
    }
}

impl MemAccess {
    /// The `i`-th access of the demo stream: stores on even `i`, loads on
    /// odd `i`, at `0x1000 + i * 0x10`.
    pub fn sample(i: u64) -> Self {
        Self {
            kind: kind_for(i),
            addr: 0x1000 + i * 0x10,
        }
    }
}

impl MemRef {
    /// Like [`MemAccess::sample`], issued from `0x400000 + i * 4`.
    pub fn sample(i: u64) -> Self {
        Self {
            addr: 0x1000 + i * 0x10,
            kind: kind_for(i),
            pc: 0x40_0000 + i * 4,
        }
    }
}

fn kind_for(i: u64) -> u8 {
    if i % 2 == 1 {
        READ
    } else {
        WRITE
    }
}
