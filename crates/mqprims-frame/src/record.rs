//! The fixed-size record contract.
//!
//! A [`Record`] knows its encoded size up front and converts itself to and
//! from exactly that many bytes. Every value is encoded field by field in
//! little-endian order; a type's in-memory layout never reaches the wire.

use bytes::{Buf, BufMut};

/// A value that can be carried in one message queue frame.
///
/// Implementations must:
/// - write exactly [`Record::SIZE`] bytes in `encode`
/// - read exactly [`Record::SIZE`] bytes in `decode`
/// - carry everything needed to rebuild the value inside those bytes (no
///   pointers, handles or lengths into out-of-band memory)
///
/// Encoding an in-memory value never fails. Use [`record!`](crate::record)
/// to implement this for structs made of other records.
pub trait Record: Sized {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Append the encoded form to `dst`.
    fn encode<B: BufMut>(&self, dst: &mut B);

    /// Read one value from the front of `src`.
    fn decode<B: Buf>(src: &mut B) -> Self;

    /// Overwrite `self` with a value read from `src`.
    fn decode_into<B: Buf>(&mut self, src: &mut B) {
        *self = Self::decode(src);
    }
}

macro_rules! impl_scalar_record {
    ($($ty:ty => $put:ident, $get:ident;)*) => {
        $(
            impl Record for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn encode<B: BufMut>(&self, dst: &mut B) {
                    dst.$put(*self);
                }

                #[inline]
                fn decode<B: Buf>(src: &mut B) -> Self {
                    src.$get()
                }
            }
        )*
    };
}

impl_scalar_record! {
    u8 => put_u8, get_u8;
    i8 => put_i8, get_i8;
    u16 => put_u16_le, get_u16_le;
    i16 => put_i16_le, get_i16_le;
    u32 => put_u32_le, get_u32_le;
    i32 => put_i32_le, get_i32_le;
    u64 => put_u64_le, get_u64_le;
    i64 => put_i64_le, get_i64_le;
    u128 => put_u128_le, get_u128_le;
    i128 => put_i128_le, get_i128_le;
    f32 => put_f32_le, get_f32_le;
    f64 => put_f64_le, get_f64_le;
}

/// One byte; any non-zero value decodes as `true`.
impl Record for bool {
    const SIZE: usize = 1;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(u8::from(*self));
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        src.get_u8() != 0
    }
}

/// Four bytes (the scalar value). Invalid scalars decode as U+FFFD.
impl Record for char {
    const SIZE: usize = 4;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u32_le(u32::from(*self));
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        char::from_u32(src.get_u32_le()).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

impl Record for () {
    const SIZE: usize = 0;

    fn encode<B: BufMut>(&self, _dst: &mut B) {}

    fn decode<B: Buf>(_src: &mut B) -> Self {}
}

impl<T: Record, const N: usize> Record for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn encode<B: BufMut>(&self, dst: &mut B) {
        for item in self {
            item.encode(dst);
        }
    }

    fn decode<B: Buf>(src: &mut B) -> Self {
        std::array::from_fn(|_| T::decode(src))
    }
}

macro_rules! impl_tuple_record {
    ($(($($name:ident : $idx:tt),+))*) => {
        $(
            impl<$($name: Record),+> Record for ($($name,)+) {
                const SIZE: usize = 0 $(+ $name::SIZE)+;

                fn encode<B: BufMut>(&self, dst: &mut B) {
                    $(self.$idx.encode(dst);)+
                }

                fn decode<B: Buf>(src: &mut B) -> Self {
                    ($($name::decode(src),)+)
                }
            }
        )*
    };
}

// Element parameters must not collide with the `B` buffer parameter.
impl_tuple_record! {
    (T0: 0)
    (T0: 0, T1: 1)
    (T0: 0, T1: 1, T2: 2)
    (T0: 0, T1: 1, T2: 2, T3: 3)
}

/// Declare a struct and implement [`Record`] for it.
///
/// Fields are encoded in declaration order, each with its own `Record`
/// impl, so the encoded size is the sum of the field sizes.
///
/// ```
/// mqprims_frame::record! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
///     pub struct Sample {
///         pub kind: u8,
///         pub addr: u64,
///     }
/// }
///
/// use mqprims_frame::Record;
/// assert_eq!(Sample::SIZE, 9);
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            const SIZE: usize = 0 $(+ <$ty as $crate::Record>::SIZE)*;

            fn encode<B: $crate::bytes::BufMut>(&self, dst: &mut B) {
                $(<$ty as $crate::Record>::encode(&self.$field, dst);)*
            }

            fn decode<B: $crate::bytes::Buf>(src: &mut B) -> Self {
                Self {
                    $($field: <$ty as $crate::Record>::decode(src),)*
                }
            }
        }
    };
}
