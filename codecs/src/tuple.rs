//! Struct-shaped codecs: a tuple of codecs encodes a tuple of values
//! field-by-field, in order, with no padding between fields.

use crate::{
    codec::{CodecSize, Decoder, Encoder},
    error::Result,
};

/// The unit codec: zero bytes, used for payload-free enum variants.
impl CodecSize for () {
    fn fixed_size(&self) -> Option<usize> {
        Some(0)
    }
}

impl Encoder<()> for () {
    fn encoded_size(&self, _value: &()) -> usize {
        0
    }

    fn write(&self, _value: &(), _buf: &mut [u8], offset: usize) -> Result<usize> {
        Ok(offset)
    }
}

impl Decoder<()> for () {
    fn read(&self, _buf: &[u8], offset: usize) -> Result<((), usize)> {
        Ok(((), offset))
    }
}

macro_rules! tuple_codec {
    ($(($C:ident, $T:ident, $codec:ident, $value:ident)),+) => {
        impl<$($C: CodecSize),+> CodecSize for ($($C,)+) {
            fn fixed_size(&self) -> Option<usize> {
                let ($($codec,)+) = self;
                Some(0 $(+ $codec.fixed_size()?)+)
            }

            fn max_size(&self) -> Option<usize> {
                let ($($codec,)+) = self;
                Some(0 $(+ $codec.max_size()?)+)
            }
        }

        impl<$($T,)+ $($C: Encoder<$T>),+> Encoder<($($T,)+)> for ($($C,)+) {
            fn encoded_size(&self, value: &($($T,)+)) -> usize {
                let ($($codec,)+) = self;
                let ($($value,)+) = value;
                0 $(+ $codec.encoded_size($value))+
            }

            fn write(
                &self,
                value: &($($T,)+),
                buf: &mut [u8],
                mut offset: usize,
            ) -> Result<usize> {
                let ($($codec,)+) = self;
                let ($($value,)+) = value;
                $(offset = $codec.write($value, buf, offset)?;)+
                Ok(offset)
            }
        }

        impl<$($T,)+ $($C: Decoder<$T>),+> Decoder<($($T,)+)> for ($($C,)+) {
            fn read(&self, buf: &[u8], mut offset: usize) -> Result<(($($T,)+), usize)> {
                let ($($codec,)+) = self;
                $(
                    let ($value, end) = $codec.read(buf, offset)?;
                    offset = end;
                )+
                Ok((($($value,)+), offset))
            }
        }
    };
}

tuple_codec!((C1, T1, c1, v1));
tuple_codec!((C1, T1, c1, v1), (C2, T2, c2, v2));
tuple_codec!((C1, T1, c1, v1), (C2, T2, c2, v2), (C3, T3, c3, v3));
tuple_codec!(
    (C1, T1, c1, v1),
    (C2, T2, c2, v2),
    (C3, T3, c3, v3),
    (C4, T4, c4, v4)
);
tuple_codec!(
    (C1, T1, c1, v1),
    (C2, T2, c2, v2),
    (C3, T3, c3, v3),
    (C4, T4, c4, v4),
    (C5, T5, c5, v5)
);
tuple_codec!(
    (C1, T1, c1, v1),
    (C2, T2, c2, v2),
    (C3, T3, c3, v3),
    (C4, T4, c4, v4),
    (C5, T5, c5, v5),
    (C6, T6, c6, v6)
);

#[cfg(test)]
mod tests {
    use crate::{
        codec::{CodecSize, Decoder, Encoder},
        error::CodecError,
        numbers::{U16Codec, U32Codec, U8Codec},
        short_u16::ShortU16Codec,
    };

    #[test]
    fn test_pair_round_trip() {
        let codec = (U8Codec::new(), U16Codec::new());
        let bytes = codec.encode(&(7u8, 0x0201u16)).unwrap();
        assert_eq!(bytes, vec![7, 0x01, 0x02]);
        assert_eq!(codec.decode(&bytes).unwrap(), (7, 0x0201));
        assert_eq!(codec.fixed_size(), Some(3));
    }

    #[test]
    fn test_triple_with_variable_field() {
        let codec = (U8Codec::new(), ShortU16Codec::new(), U32Codec::new());
        let value = (1u8, 300u16, 9u32);
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(bytes, vec![1, 0xac, 0x02, 9, 0, 0, 0]);
        assert_eq!(codec.decode(&bytes).unwrap(), value);
        // A variable field makes the whole tuple variable.
        assert_eq!(codec.fixed_size(), None);
        assert_eq!(codec.max_size(), Some(8));
    }

    #[test]
    fn test_truncated_field_fails() {
        let codec = (U16Codec::new(), U16Codec::new());
        assert!(matches!(
            codec.decode(&[1, 0, 2]),
            Err(CodecError::InvalidByteLength { .. })
        ));
    }
}
