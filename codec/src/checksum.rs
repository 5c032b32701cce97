//! Frame check sequences.
//!
//! A [`Checksum`] is a type-level strategy: codecs and frame functions take it
//! as a type parameter, so sender and receiver agree on the algorithm at
//! compile time. [`Fcs16`] is the default. [`NullChecksum`] always produces
//! `00 00` and exists for peers that never computed a real FCS.

use smallvec::SmallVec;

pub type Array = SmallVec<[u8; 8]>;

pub trait Checksum {
    type Output: num_traits::PrimInt;

    /// Checksum the concatenation of `parts`.
    fn checksum_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self::Output;

    /// Wire representation of a checksum value.
    fn to_array(val: Self::Output) -> Array;

    #[inline]
    fn checksum(vals: &[u8]) -> Self::Output {
        Self::checksum_parts([vals])
    }

    #[inline]
    fn checksum_array(vals: &[u8]) -> Array {
        Self::to_array(Self::checksum(vals))
    }
}

#[inline]
pub const fn size<T>() -> usize
where
    T: Checksum,
{
    std::mem::size_of::<T::Output>()
}

#[doc(hidden)]
pub mod __private {
    pub use ::byteorder;
    pub use ::crc;
    pub use ::paste;
    pub use ::smallvec;
}

#[macro_export]
macro_rules! impl_checksum {
    ($vis:vis $name:ident, u8, $algo:expr) => {
        $crate::impl_checksum!($vis $name, u8, $algo, val, {
            let mut ret = $crate::checksum::__private::smallvec::SmallVec::new();
            ret.push(val);

            ret
        });
    };

    ($vis:vis $name:ident, $ty:ty, $algo:expr) => {
        $crate::impl_checksum!($vis $name, $ty, $algo, $crate::checksum::__private::byteorder::BE);
    };

    ($vis:vis $name:ident, $ty:ty, $algo:expr, $endian:ty) => {
        $crate::impl_checksum!($vis $name, $ty, $algo, val, {
            $crate::checksum::__private::paste::paste! {
                let mut ret = $crate::checksum::__private::smallvec::smallvec![0u8; ::std::mem::size_of::<$ty>()];

                <$endian as $crate::checksum::__private::byteorder::ByteOrder>::[< write_ $ty >](&mut ret[..], val);
                ret
            }
        });
    };

    ($vis:vis $name:ident, $ty:ty, $algo:expr, $val:ident, $array_body:expr) => {
        #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $crate::checksum::Checksum for $name {
            type Output = $ty;

            fn checksum_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self::Output {
                use $crate::checksum::__private::crc;

                const INSTANCE: crc::Crc<$ty> = crc::Crc::<$ty>::new(&$algo);

                let mut digest = INSTANCE.digest();
                for part in parts {
                    digest.update(part);
                }

                digest.finalize()
            }

            fn to_array($val: Self::Output) -> $crate::checksum::Array {
                $array_body
            }
        }
    };
}

pub use impl_checksum;

// CRC-16/IBM-SDLC: the X.25 HDLC frame check sequence, sent low byte first.
impl_checksum!(pub Fcs16, u16, crc::CRC_16_IBM_SDLC, byteorder::LittleEndian);

/// Always `00 00`. Matches peers whose FCS was never implemented; integrity is
/// not checked at all in this mode.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NullChecksum;

impl Checksum for NullChecksum {
    type Output = u16;

    #[inline]
    fn checksum_parts<'a>(_parts: impl IntoIterator<Item = &'a [u8]>) -> Self::Output {
        0
    }

    #[inline]
    fn to_array(val: Self::Output) -> Array {
        SmallVec::from_slice(&val.to_le_bytes())
    }
}
