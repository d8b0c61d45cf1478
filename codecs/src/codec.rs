//! The core encode/decode algebra.
//!
//! A codec is either *fixed-size* (every value occupies the same number of
//! bytes) or *variable-size* (the size depends on the value, with an optional
//! upper bound). Encoders write into a caller-supplied buffer at an offset and
//! return the offset one past the last byte written; decoders read from an
//! offset and return the value together with the new offset. Neither ever
//! touches bytes outside the region it was given.

use crate::error::{CodecError, Result};

/// Size metadata shared by encoders and decoders.
pub trait CodecSize {
    /// `Some(n)` if every value encodes to exactly `n` bytes.
    fn fixed_size(&self) -> Option<usize> {
        None
    }

    /// An upper bound on the encoded size, if one exists.
    fn max_size(&self) -> Option<usize> {
        self.fixed_size()
    }
}

pub trait Encoder<T>: CodecSize {
    /// The exact number of bytes `value` occupies once encoded.
    fn encoded_size(&self, value: &T) -> usize;

    /// Write `value` into `buf` starting at `offset`.
    ///
    /// Returns the offset one past the last byte written. Implementations
    /// never write outside `[offset, offset + encoded_size(value))`.
    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize>;

    /// Encode `value` into a freshly allocated buffer.
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.encoded_size(value)];
        let end = self.write(value, &mut buf, 0)?;
        buf.truncate(end);
        Ok(buf)
    }
}

pub trait Decoder<T>: CodecSize {
    /// Read a value from `buf` starting at `offset`.
    ///
    /// Returns the value and the offset one past the last byte read.
    /// Implementations never read outside the supplied buffer.
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)>;

    /// Decode a value from the start of `buf`.
    fn decode(&self, buf: &[u8]) -> Result<T> {
        self.read(buf, 0).map(|(value, _)| value)
    }
}

/// A bidirectional codec. Blanket-implemented for anything that can both
/// encode and decode `T`, and usable as a trait object.
pub trait Codec<T>: Encoder<T> + Decoder<T> {}

impl<T, C: Encoder<T> + Decoder<T> + ?Sized> Codec<T> for C {}

impl<C: CodecSize + ?Sized> CodecSize for Box<C> {
    fn fixed_size(&self) -> Option<usize> {
        (**self).fixed_size()
    }

    fn max_size(&self) -> Option<usize> {
        (**self).max_size()
    }
}

impl<T, C: Encoder<T> + ?Sized> Encoder<T> for Box<C> {
    fn encoded_size(&self, value: &T) -> usize {
        (**self).encoded_size(value)
    }

    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize> {
        (**self).write(value, buf, offset)
    }
}

impl<T, C: Decoder<T> + ?Sized> Decoder<T> for Box<C> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)> {
        (**self).read(buf, offset)
    }
}

impl<C: CodecSize + ?Sized> CodecSize for &C {
    fn fixed_size(&self) -> Option<usize> {
        (**self).fixed_size()
    }

    fn max_size(&self) -> Option<usize> {
        (**self).max_size()
    }
}

impl<T, C: Encoder<T> + ?Sized> Encoder<T> for &C {
    fn encoded_size(&self, value: &T) -> usize {
        (**self).encoded_size(value)
    }

    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize> {
        (**self).write(value, buf, offset)
    }
}

impl<T, C: Decoder<T> + ?Sized> Decoder<T> for &C {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)> {
        (**self).read(buf, offset)
    }
}

/// Bounds check shared by the primitive codecs: `needed` more bytes must be
/// available at `offset`.
pub(crate) fn check_remaining(buf: &[u8], offset: usize, needed: usize) -> Result<()> {
    if offset > buf.len() {
        return Err(CodecError::OffsetOutOfRange {
            offset,
            len: buf.len(),
        });
    }
    let actual = buf.len() - offset;
    if actual < needed {
        return Err(CodecError::InvalidByteLength {
            expected: needed,
            actual,
        });
    }
    Ok(())
}
