//! Combinators that compose codecs into new codecs.
//!
//! Each constructor is a pure function over immutable codec values; none
//! retain state across calls.

use std::marker::PhantomData;

use crate::{
    codec::{check_remaining, Codec, CodecSize, Decoder, Encoder},
    error::{CodecError, Result},
};

/// Lift a codec over `A` to operate on `B` through a pair of pure functions.
pub struct Transform<A, C, F, G> {
    inner: C,
    unmap: F,
    map: G,
    _marker: PhantomData<fn() -> A>,
}

pub fn transform<A, B, C, F, G>(inner: C, unmap: F, map: G) -> Transform<A, C, F, G>
where
    F: Fn(&B) -> A,
    G: Fn(A) -> B,
{
    Transform {
        inner,
        unmap,
        map,
        _marker: PhantomData,
    }
}

impl<A, C: CodecSize, F, G> CodecSize for Transform<A, C, F, G> {
    fn fixed_size(&self) -> Option<usize> {
        self.inner.fixed_size()
    }

    fn max_size(&self) -> Option<usize> {
        self.inner.max_size()
    }
}

impl<A, B, C, F, G> Encoder<B> for Transform<A, C, F, G>
where
    C: Encoder<A>,
    F: Fn(&B) -> A,
{
    fn encoded_size(&self, value: &B) -> usize {
        self.inner.encoded_size(&(self.unmap)(value))
    }

    fn write(&self, value: &B, buf: &mut [u8], offset: usize) -> Result<usize> {
        self.inner.write(&(self.unmap)(value), buf, offset)
    }
}

impl<A, B, C, F, G> Decoder<B> for Transform<A, C, F, G>
where
    C: Decoder<A>,
    G: Fn(A) -> B,
{
    fn read(&self, buf: &[u8], offset: usize) -> Result<(B, usize)> {
        let (value, end) = self.inner.read(buf, offset)?;
        Ok(((self.map)(value), end))
    }
}

/// Force a codec into exactly `size` bytes: truncating or zero-padding on
/// encode, zero-padding the inner codec's view on decode.
pub struct FixCodec<C> {
    inner: C,
    size: usize,
}

pub fn fix_size<C>(inner: C, size: usize) -> FixCodec<C> {
    FixCodec { inner, size }
}

impl<C> CodecSize for FixCodec<C> {
    fn fixed_size(&self) -> Option<usize> {
        Some(self.size)
    }
}

impl<T, C: Encoder<T>> Encoder<T> for FixCodec<C> {
    fn encoded_size(&self, _value: &T) -> usize {
        self.size
    }

    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize> {
        check_remaining(buf, offset, self.size)?;
        let mut scratch = vec![0u8; self.inner.encoded_size(value).max(self.size)];
        let written = self.inner.write(value, &mut scratch, 0)?;
        let take = written.min(self.size);
        buf[offset..offset + take].copy_from_slice(&scratch[..take]);
        buf[offset + take..offset + self.size].fill(0);
        Ok(offset + self.size)
    }
}

impl<T, C: Decoder<T>> Decoder<T> for FixCodec<C> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)> {
        check_remaining(buf, offset, self.size)?;
        let window = &buf[offset..offset + self.size];
        match self.inner.fixed_size() {
            Some(n) if n > self.size => {
                let mut padded = vec![0u8; n];
                padded[..self.size].copy_from_slice(window);
                let (value, _) = self.inner.read(&padded, 0)?;
                Ok((value, offset + self.size))
            }
            _ => {
                let (value, _) = self.inner.read(window, 0)?;
                Ok((value, offset + self.size))
            }
        }
    }
}

/// Prefix a payload with its byte length.
pub struct SizePrefixCodec<C> {
    inner: C,
    prefix: crate::collections::LenPrefix,
}

pub fn size_prefix<C>(inner: C, prefix: crate::collections::LenPrefix) -> SizePrefixCodec<C> {
    SizePrefixCodec { inner, prefix }
}

impl<C: CodecSize> CodecSize for SizePrefixCodec<C> {
    fn max_size(&self) -> Option<usize> {
        Some(self.inner.max_size()? + self.prefix.max_len_size())
    }
}

impl<T, C: Encoder<T>> Encoder<T> for SizePrefixCodec<C> {
    fn encoded_size(&self, value: &T) -> usize {
        let payload = self.inner.encoded_size(value);
        self.prefix.len_size(payload) + payload
    }

    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize> {
        let payload = self.inner.encoded_size(value);
        let offset = self.prefix.write_len(payload, buf, offset)?;
        check_remaining(buf, offset, payload)?;
        let end = self.inner.write(value, buf, offset)?;
        if end != offset + payload {
            return Err(CodecError::EncodedSizeMismatch {
                expected: payload,
                actual: end - offset,
            });
        }
        Ok(end)
    }
}

impl<T, C: Decoder<T>> Decoder<T> for SizePrefixCodec<C> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)> {
        let (payload, offset) = self.prefix.read_len(buf, offset)?;
        check_remaining(buf, offset, payload)?;
        let (value, _) = self.inner.read(&buf[offset..offset + payload], 0)?;
        Ok((value, offset + payload))
    }
}

/// Terminate a payload with a marker byte sequence instead of a length prefix.
pub struct SentinelCodec<C> {
    inner: C,
    sentinel: Vec<u8>,
}

pub fn sentinel<C>(inner: C, sentinel: Vec<u8>) -> SentinelCodec<C> {
    debug_assert!(!sentinel.is_empty());
    SentinelCodec { inner, sentinel }
}

impl<C: CodecSize> CodecSize for SentinelCodec<C> {
    fn max_size(&self) -> Option<usize> {
        Some(self.inner.max_size()? + self.sentinel.len())
    }
}

impl<T, C: Encoder<T>> Encoder<T> for SentinelCodec<C> {
    fn encoded_size(&self, value: &T) -> usize {
        self.inner.encoded_size(value) + self.sentinel.len()
    }

    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize> {
        let payload = self.inner.encode(value)?;
        if payload
            .windows(self.sentinel.len())
            .any(|window| window == self.sentinel)
        {
            return Err(CodecError::SentinelInPayload);
        }
        check_remaining(buf, offset, payload.len() + self.sentinel.len())?;
        buf[offset..offset + payload.len()].copy_from_slice(&payload);
        let offset = offset + payload.len();
        buf[offset..offset + self.sentinel.len()].copy_from_slice(&self.sentinel);
        Ok(offset + self.sentinel.len())
    }
}

impl<T, C: Decoder<T>> Decoder<T> for SentinelCodec<C> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)> {
        check_remaining(buf, offset, 0)?;
        let remaining = &buf[offset..];
        let position = if remaining.len() < self.sentinel.len() {
            None
        } else {
            remaining
                .windows(self.sentinel.len())
                .position(|window| window == self.sentinel)
        };
        let position = position.ok_or(CodecError::SentinelMissing)?;
        let (value, _) = self.inner.read(&remaining[..position], 0)?;
        Ok((value, offset + position + self.sentinel.len()))
    }
}

/// Displace where a codec writes and reads within a larger buffer, without
/// moving the caller's cursor. Used to build fixed-layout records with gaps.
pub struct OffsetCodec<C> {
    inner: C,
    delta: isize,
}

pub fn offset<C>(inner: C, delta: isize) -> OffsetCodec<C> {
    OffsetCodec { inner, delta }
}

impl<C> OffsetCodec<C> {
    fn displace(&self, offset: usize, len: usize) -> Result<usize> {
        let target = offset as isize + self.delta;
        if target < 0 || target as usize > len {
            return Err(CodecError::OffsetOutOfRange { offset, len });
        }
        Ok(target as usize)
    }
}

impl<C: CodecSize> CodecSize for OffsetCodec<C> {
    fn fixed_size(&self) -> Option<usize> {
        self.inner.fixed_size()
    }

    fn max_size(&self) -> Option<usize> {
        self.inner.max_size()
    }
}

impl<T, C: Encoder<T>> Encoder<T> for OffsetCodec<C> {
    fn encoded_size(&self, value: &T) -> usize {
        self.inner.encoded_size(value)
    }

    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize> {
        let target = self.displace(offset, buf.len())?;
        let end = self.inner.write(value, buf, target)?;
        Ok(offset + (end - target))
    }
}

impl<T, C: Decoder<T>> Decoder<T> for OffsetCodec<C> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)> {
        let target = self.displace(offset, buf.len())?;
        let (value, end) = self.inner.read(buf, target)?;
        Ok((value, offset + (end - target)))
    }
}

/// Reshape the number of bytes a codec claims, zero-filling any tail it does
/// not populate.
pub struct ResizeCodec<C, F> {
    inner: C,
    resize: F,
}

pub fn resize<C, F: Fn(usize) -> usize>(inner: C, resize: F) -> ResizeCodec<C, F> {
    ResizeCodec { inner, resize }
}

impl<C: CodecSize, F: Fn(usize) -> usize> CodecSize for ResizeCodec<C, F> {
    fn fixed_size(&self) -> Option<usize> {
        self.inner.fixed_size().map(&self.resize)
    }

    fn max_size(&self) -> Option<usize> {
        self.inner.max_size().map(&self.resize)
    }
}

impl<T, C: Encoder<T>, F: Fn(usize) -> usize> Encoder<T> for ResizeCodec<C, F> {
    fn encoded_size(&self, value: &T) -> usize {
        (self.resize)(self.inner.encoded_size(value))
    }

    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize> {
        let natural = self.inner.encoded_size(value);
        let size = (self.resize)(natural);
        if natural > size {
            return Err(CodecError::EncodedSizeMismatch {
                expected: size,
                actual: natural,
            });
        }
        check_remaining(buf, offset, size)?;
        let end = self.inner.write(value, buf, offset)?;
        buf[end..offset + size].fill(0);
        Ok(offset + size)
    }
}

impl<T, C: Decoder<T>, F: Fn(usize) -> usize> Decoder<T> for ResizeCodec<C, F> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)> {
        let (value, end) = self.inner.read(buf, offset)?;
        let size = (self.resize)(end - offset);
        check_remaining(buf, offset, size)?;
        Ok((value, offset + size))
    }
}

/// Prepend `padding` zero bytes before the payload.
pub struct PadLeftCodec<C> {
    inner: C,
    padding: usize,
}

pub fn pad_left<C>(inner: C, padding: usize) -> PadLeftCodec<C> {
    PadLeftCodec { inner, padding }
}

impl<C: CodecSize> CodecSize for PadLeftCodec<C> {
    fn fixed_size(&self) -> Option<usize> {
        Some(self.inner.fixed_size()? + self.padding)
    }

    fn max_size(&self) -> Option<usize> {
        Some(self.inner.max_size()? + self.padding)
    }
}

impl<T, C: Encoder<T>> Encoder<T> for PadLeftCodec<C> {
    fn encoded_size(&self, value: &T) -> usize {
        self.inner.encoded_size(value) + self.padding
    }

    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize> {
        check_remaining(buf, offset, self.padding)?;
        buf[offset..offset + self.padding].fill(0);
        self.inner.write(value, buf, offset + self.padding)
    }
}

impl<T, C: Decoder<T>> Decoder<T> for PadLeftCodec<C> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)> {
        check_remaining(buf, offset, self.padding)?;
        self.inner.read(buf, offset + self.padding)
    }
}

/// Append `padding` zero bytes after the payload.
pub struct PadRightCodec<C> {
    inner: C,
    padding: usize,
}

pub fn pad_right<C>(inner: C, padding: usize) -> PadRightCodec<C> {
    PadRightCodec { inner, padding }
}

impl<C: CodecSize> CodecSize for PadRightCodec<C> {
    fn fixed_size(&self) -> Option<usize> {
        Some(self.inner.fixed_size()? + self.padding)
    }

    fn max_size(&self) -> Option<usize> {
        Some(self.inner.max_size()? + self.padding)
    }
}

impl<T, C: Encoder<T>> Encoder<T> for PadRightCodec<C> {
    fn encoded_size(&self, value: &T) -> usize {
        self.inner.encoded_size(value) + self.padding
    }

    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize> {
        let end = self.inner.write(value, buf, offset)?;
        check_remaining(buf, end, self.padding)?;
        buf[end..end + self.padding].fill(0);
        Ok(end + self.padding)
    }
}

impl<T, C: Decoder<T>> Decoder<T> for PadRightCodec<C> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)> {
        let (value, end) = self.inner.read(buf, offset)?;
        check_remaining(buf, end, self.padding)?;
        Ok((value, end + self.padding))
    }
}

/// Byte-reverse a fixed-size payload in place: endian conversion for
/// encodings whose natural byte order is reversed from the wire order.
pub struct ReverseCodec<C> {
    inner: C,
}

pub fn reverse<C>(inner: C) -> ReverseCodec<C> {
    ReverseCodec { inner }
}

impl<C: CodecSize> CodecSize for ReverseCodec<C> {
    fn fixed_size(&self) -> Option<usize> {
        self.inner.fixed_size()
    }
}

impl<T, C: Encoder<T>> Encoder<T> for ReverseCodec<C> {
    fn encoded_size(&self, value: &T) -> usize {
        self.inner.encoded_size(value)
    }

    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize> {
        let size = self.inner.fixed_size().ok_or(CodecError::ExpectedFixedSize)?;
        let end = self.inner.write(value, buf, offset)?;
        buf[offset..offset + size].reverse();
        Ok(end)
    }
}

impl<T, C: Decoder<T>> Decoder<T> for ReverseCodec<C> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)> {
        let size = self.inner.fixed_size().ok_or(CodecError::ExpectedFixedSize)?;
        check_remaining(buf, offset, size)?;
        let mut reversed = buf[offset..offset + size].to_vec();
        reversed.reverse();
        let (value, _) = self.inner.read(&reversed, 0)?;
        Ok((value, offset + size))
    }
}

/// Convenience alias used by the collection helpers that return opaque
/// transformed codecs.
pub fn boxed<T, C: Codec<T> + 'static>(codec: C) -> Box<dyn Codec<T>> {
    Box::new(codec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collections::LenPrefix,
        numbers::{U16Codec, U32Codec, U64Codec, U8Codec},
    };

    #[test]
    fn test_transform_round_trip() {
        // A bool carried over a u8 codec.
        let codec = transform(
            U8Codec::new(),
            |value: &bool| u8::from(*value),
            |raw: u8| raw != 0,
        );
        let bytes = codec.encode(&true).unwrap();
        assert_eq!(bytes, vec![1]);
        assert!(codec.decode(&bytes).unwrap());
        assert_eq!(codec.fixed_size(), Some(1));
    }

    #[test]
    fn test_fix_size_truncates_and_pads() {
        let codec = fix_size(U64Codec::new(), 2);
        assert_eq!(codec.encode(&0x0403_0201).unwrap(), vec![0x01, 0x02]);
        // Decode zero-extends the two bytes back into a u64.
        assert_eq!(codec.decode(&[0x01, 0x02]).unwrap(), 0x0201);
        assert!(matches!(
            codec.decode(&[0x01]),
            Err(CodecError::InvalidByteLength { .. })
        ));
    }

    #[test]
    fn test_fix_size_pads_encode() {
        let codec = fix_size(U8Codec::new(), 4);
        assert_eq!(codec.encode(&7).unwrap(), vec![7, 0, 0, 0]);
    }

    #[test]
    fn test_size_prefix_round_trip() {
        let codec = size_prefix(U32Codec::new(), LenPrefix::ShortU16);
        let bytes = codec.encode(&0x0403_0201).unwrap();
        assert_eq!(bytes, vec![4, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(codec.decode(&bytes).unwrap(), 0x0403_0201);
    }

    #[test]
    fn test_size_prefix_insufficient_payload() {
        let codec = size_prefix(U32Codec::new(), LenPrefix::U8);
        assert!(matches!(
            codec.decode(&[4, 1, 2]),
            Err(CodecError::InvalidByteLength { .. })
        ));
    }

    #[test]
    fn test_sentinel_round_trip() {
        let codec = sentinel(U16Codec::new(), vec![0xff, 0xff]);
        let bytes = codec.encode(&0x0201).unwrap();
        assert_eq!(bytes, vec![0x01, 0x02, 0xff, 0xff]);
        let (value, end) = codec.read(&bytes, 0).unwrap();
        assert_eq!((value, end), (0x0201, 4));
    }

    #[test]
    fn test_sentinel_in_payload_fails() {
        let codec = sentinel(U16Codec::new(), vec![0xff, 0xff]);
        assert_eq!(codec.encode(&0xffff), Err(CodecError::SentinelInPayload));
    }

    #[test]
    fn test_sentinel_missing_fails() {
        let codec = sentinel(U16Codec::new(), vec![0xff, 0xff]);
        assert_eq!(codec.decode(&[1, 2, 3]), Err(CodecError::SentinelMissing));
    }

    #[test]
    fn test_offset_writes_into_gap() {
        let codec = offset(U8Codec::new(), 2);
        let mut buf = [0u8; 4];
        let end = codec.write(&9, &mut buf, 0).unwrap();
        // Cursor advanced by the codec's own size, the byte landed at +2.
        assert_eq!(end, 1);
        assert_eq!(buf, [0, 0, 9, 0]);
        let (value, end) = codec.read(&buf, 0).unwrap();
        assert_eq!((value, end), (9, 1));
    }

    #[test]
    fn test_offset_out_of_range() {
        let codec = offset(U8Codec::new(), -1);
        let mut buf = [0u8; 2];
        assert!(matches!(
            codec.write(&1, &mut buf, 0),
            Err(CodecError::OffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn test_pad_left_and_right() {
        let left = pad_left(U8Codec::new(), 3);
        assert_eq!(left.encode(&7).unwrap(), vec![0, 0, 0, 7]);
        assert_eq!(left.decode(&[0, 0, 0, 7]).unwrap(), 7);
        assert_eq!(left.fixed_size(), Some(4));

        let right = pad_right(U8Codec::new(), 2);
        assert_eq!(right.encode(&7).unwrap(), vec![7, 0, 0]);
        assert_eq!(right.decode(&[7, 0, 0]).unwrap(), 7);
    }

    #[test]
    fn test_resize_grows_with_zero_fill() {
        let codec = resize(U16Codec::new(), |size| size + 2);
        assert_eq!(codec.encode(&0x0201).unwrap(), vec![1, 2, 0, 0]);
        assert_eq!(codec.decode(&[1, 2, 0, 0]).unwrap(), 0x0201);
        assert_eq!(codec.fixed_size(), Some(4));
    }

    #[test]
    fn test_resize_shrink_fails_on_write() {
        let codec = resize(U16Codec::new(), |size| size - 1);
        let mut buf = [0u8; 2];
        assert!(matches!(
            codec.write(&1, &mut buf, 0),
            Err(CodecError::EncodedSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_reverse_round_trip() {
        let codec = reverse(U32Codec::new());
        // Little-endian payload reversed on the wire is big-endian.
        let bytes = codec.encode(&0x0403_0201).unwrap();
        assert_eq!(bytes, vec![0x04, 0x03, 0x02, 0x01]);
        assert_eq!(codec.decode(&bytes).unwrap(), 0x0403_0201);
    }
}
