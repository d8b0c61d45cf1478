//! Fixed-width integer and float codecs, little-endian by default.

use crate::{
    codec::{check_remaining, CodecSize, Decoder, Encoder},
    error::Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

macro_rules! number_codec {
    ($name:ident, $ty:ty) => {
        #[doc = concat!("Codec for `", stringify!($ty), "` values.")]
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name {
            pub endianness: Endianness,
        }

        impl $name {
            pub const fn new() -> Self {
                Self {
                    endianness: Endianness::Little,
                }
            }

            pub const fn big_endian() -> Self {
                Self {
                    endianness: Endianness::Big,
                }
            }
        }

        impl CodecSize for $name {
            fn fixed_size(&self) -> Option<usize> {
                Some(std::mem::size_of::<$ty>())
            }
        }

        impl Encoder<$ty> for $name {
            fn encoded_size(&self, _value: &$ty) -> usize {
                std::mem::size_of::<$ty>()
            }

            fn write(&self, value: &$ty, buf: &mut [u8], offset: usize) -> Result<usize> {
                let size = std::mem::size_of::<$ty>();
                check_remaining(buf, offset, size)?;
                let bytes = match self.endianness {
                    Endianness::Little => value.to_le_bytes(),
                    Endianness::Big => value.to_be_bytes(),
                };
                buf[offset..offset + size].copy_from_slice(&bytes);
                Ok(offset + size)
            }
        }

        impl Decoder<$ty> for $name {
            fn read(&self, buf: &[u8], offset: usize) -> Result<($ty, usize)> {
                let size = std::mem::size_of::<$ty>();
                check_remaining(buf, offset, size)?;
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                bytes.copy_from_slice(&buf[offset..offset + size]);
                let value = match self.endianness {
                    Endianness::Little => <$ty>::from_le_bytes(bytes),
                    Endianness::Big => <$ty>::from_be_bytes(bytes),
                };
                Ok((value, offset + size))
            }
        }
    };
}

number_codec!(U8Codec, u8);
number_codec!(U16Codec, u16);
number_codec!(U32Codec, u32);
number_codec!(U64Codec, u64);
number_codec!(U128Codec, u128);
number_codec!(I8Codec, i8);
number_codec!(I16Codec, i16);
number_codec!(I32Codec, i32);
number_codec!(I64Codec, i64);
number_codec!(I128Codec, i128);
number_codec!(F32Codec, f32);
number_codec!(F64Codec, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[test]
    fn test_u32_little_endian_round_trip() {
        let codec = U32Codec::new();
        let bytes = codec.encode(&0x0403_0201).unwrap();
        assert_eq!(bytes, vec![0x01, 0x02, 0x03, 0x04]);
        assert_eq!(codec.decode(&bytes).unwrap(), 0x0403_0201);
    }

    #[test]
    fn test_u64_big_endian() {
        let codec = U64Codec::big_endian();
        let bytes = codec.encode(&1).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_i16_negative_round_trip() {
        let codec = I16Codec::new();
        let bytes = codec.encode(&-2).unwrap();
        assert_eq!(bytes, vec![0xfe, 0xff]);
        assert_eq!(codec.decode(&bytes).unwrap(), -2);
    }

    #[test]
    fn test_u128_round_trip() {
        let codec = U128Codec::new();
        let value = u128::MAX - 7;
        assert_eq!(codec.decode(&codec.encode(&value).unwrap()).unwrap(), value);
    }

    #[test]
    fn test_f64_round_trip() {
        let codec = F64Codec::new();
        let bytes = codec.encode(&-1.5f64).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), -1.5f64);
    }

    #[test]
    fn test_short_buffer_fails() {
        let codec = U32Codec::new();
        assert_eq!(
            codec.decode(&[1, 2]),
            Err(CodecError::InvalidByteLength {
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn test_write_respects_offset() {
        let codec = U16Codec::new();
        let mut buf = [0xaau8; 4];
        let end = codec.write(&0x0201, &mut buf, 1).unwrap();
        assert_eq!(end, 3);
        assert_eq!(buf, [0xaa, 0x01, 0x02, 0xaa]);
    }
}
