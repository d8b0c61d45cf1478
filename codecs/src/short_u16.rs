//! The 1-3 byte variable-length encoding used for every repeated-field count
//! on the wire.
//!
//! Each byte carries 7 value bits plus a continuation bit set on all but the
//! last byte, with the least significant group first. Values above `u16::MAX`
//! are a hard range error, never saturated.

use crate::{
    codec::{check_remaining, CodecSize, Decoder, Encoder},
    error::{CodecError, Result},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ShortU16Codec;

impl ShortU16Codec {
    pub const fn new() -> Self {
        Self
    }
}

impl CodecSize for ShortU16Codec {
    fn max_size(&self) -> Option<usize> {
        Some(3)
    }
}

impl Encoder<u16> for ShortU16Codec {
    fn encoded_size(&self, value: &u16) -> usize {
        match *value {
            0..=0x7f => 1,
            0x80..=0x3fff => 2,
            _ => 3,
        }
    }

    fn write(&self, value: &u16, buf: &mut [u8], offset: usize) -> Result<usize> {
        check_remaining(buf, offset, self.encoded_size(value))?;
        let mut rem = u32::from(*value);
        let mut pos = offset;
        loop {
            let mut byte = (rem & 0x7f) as u8;
            rem >>= 7;
            if rem != 0 {
                byte |= 0x80;
            }
            buf[pos] = byte;
            pos += 1;
            if rem == 0 {
                break;
            }
        }
        Ok(pos)
    }
}

impl Decoder<u16> for ShortU16Codec {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(u16, usize)> {
        let mut value: u32 = 0;
        let mut pos = offset;
        for group in 0..3u32 {
            check_remaining(buf, pos, 1)?;
            let byte = buf[pos];
            pos += 1;
            // A zero byte after the first group is an aliased encoding: the
            // encoder never emits a continuation just to carry zero bits.
            if group > 0 && byte == 0 {
                return Err(CodecError::AliasedLength);
            }
            value |= u32::from(byte & 0x7f) << (group * 7);
            if byte & 0x80 == 0 {
                if value > u32::from(u16::MAX) {
                    return Err(out_of_range(value as usize));
                }
                return Ok((value as u16, pos));
            }
        }
        // Continuation bit still set after three groups.
        Err(out_of_range(value as usize))
    }
}

fn out_of_range(value: usize) -> CodecError {
    CodecError::NumberOutOfRange {
        value: value as i128,
        min: 0,
        max: i128::from(u16::MAX),
    }
}

/// Write a collection length, failing if it exceeds `u16::MAX`.
pub fn write_len(len: usize, buf: &mut [u8], offset: usize) -> Result<usize> {
    let value = u16::try_from(len).map_err(|_| out_of_range(len))?;
    ShortU16Codec.write(&value, buf, offset)
}

/// Read a collection length.
pub fn read_len(buf: &[u8], offset: usize) -> Result<(usize, usize)> {
    ShortU16Codec
        .read(buf, offset)
        .map(|(value, end)| (usize::from(value), end))
}

/// Number of bytes `write_len` will produce for `len` (saturating above the
/// encodable range; `write_len` itself reports the range error).
pub fn len_size(len: usize) -> usize {
    match len {
        0..=0x7f => 1,
        0x80..=0x3fff => 2,
        _ => 3,
    }
}
