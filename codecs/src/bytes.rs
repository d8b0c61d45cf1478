//! Raw byte codecs.

use crate::{
    codec::{check_remaining, CodecSize, Decoder, Encoder},
    error::Result,
};

/// Exactly `N` bytes, copied verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedBytesCodec<const N: usize>;

pub const fn fixed_bytes<const N: usize>() -> FixedBytesCodec<N> {
    FixedBytesCodec
}

impl<const N: usize> CodecSize for FixedBytesCodec<N> {
    fn fixed_size(&self) -> Option<usize> {
        Some(N)
    }
}

impl<const N: usize> Encoder<[u8; N]> for FixedBytesCodec<N> {
    fn encoded_size(&self, _value: &[u8; N]) -> usize {
        N
    }

    fn write(&self, value: &[u8; N], buf: &mut [u8], offset: usize) -> Result<usize> {
        check_remaining(buf, offset, N)?;
        buf[offset..offset + N].copy_from_slice(value);
        Ok(offset + N)
    }
}

impl<const N: usize> Decoder<[u8; N]> for FixedBytesCodec<N> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<([u8; N], usize)> {
        check_remaining(buf, offset, N)?;
        let mut value = [0u8; N];
        value.copy_from_slice(&buf[offset..offset + N]);
        Ok((value, offset + N))
    }
}

/// All remaining bytes, copied verbatim. Wrap with `size_prefix` or
/// `fix_size` when the field is not last.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

pub const fn bytes() -> BytesCodec {
    BytesCodec
}

impl CodecSize for BytesCodec {}

impl Encoder<Vec<u8>> for BytesCodec {
    fn encoded_size(&self, value: &Vec<u8>) -> usize {
        value.len()
    }

    fn write(&self, value: &Vec<u8>, buf: &mut [u8], offset: usize) -> Result<usize> {
        check_remaining(buf, offset, value.len())?;
        buf[offset..offset + value.len()].copy_from_slice(value);
        Ok(offset + value.len())
    }
}

impl Decoder<Vec<u8>> for BytesCodec {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(Vec<u8>, usize)> {
        check_remaining(buf, offset, 0)?;
        Ok((buf[offset..].to_vec(), buf.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collections::LenPrefix,
        combinators::size_prefix,
        error::CodecError,
    };

    #[test]
    fn test_fixed_bytes_round_trip() {
        let codec = fixed_bytes::<4>();
        let value = [1u8, 2, 3, 4];
        assert_eq!(codec.encode(&value).unwrap(), value.to_vec());
        let (read, end) = codec.read(&[9, 1, 2, 3, 4], 1).unwrap();
        assert_eq!((read, end), (value, 5));
        assert!(matches!(
            codec.decode(&[1, 2]),
            Err(CodecError::InvalidByteLength { .. })
        ));
    }

    #[test]
    fn test_bytes_consume_remainder() {
        let codec = bytes();
        let (value, end) = codec.read(&[1, 2, 3], 1).unwrap();
        assert_eq!((value, end), (vec![2, 3], 3));
    }

    #[test]
    fn test_bytes_with_size_prefix() {
        let codec = size_prefix(bytes(), LenPrefix::ShortU16);
        let bytes = codec.encode(&vec![7, 8]).unwrap();
        assert_eq!(bytes, vec![2, 7, 8]);
        assert_eq!(codec.decode(&bytes).unwrap(), vec![7, 8]);
    }
}
