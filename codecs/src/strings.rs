//! String codecs: utf-8 plus the positional base-N encodings where the
//! *string* is the in-memory value and the compact binary form is the wire
//! representation.
//!
//! The base-N codecs are variable-size and consume the rest of the buffer on
//! read; wrap them with [`size_prefix`] or [`fix_size`] when they are not the
//! final field.
//!
//! [`size_prefix`]: crate::combinators::size_prefix
//! [`fix_size`]: crate::combinators::fix_size

use base64::{engine::general_purpose::STANDARD, DecodeError, Engine};

use crate::{
    codec::{check_remaining, CodecSize, Decoder, Encoder},
    error::{CodecError, Result},
};

pub const BASE10_ALPHABET: &str = "0123456789";
pub const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Positional numeral codec over an arbitrary alphabet.
///
/// Leading occurrences of the alphabet's zero character map to leading zero
/// bytes one-for-one; the remainder is converted as one big integer, most
/// significant byte first.
#[derive(Debug, Clone, Copy)]
pub struct BaseXCodec {
    alphabet: &'static str,
}

pub const fn base_x(alphabet: &'static str) -> BaseXCodec {
    BaseXCodec { alphabet }
}

pub const fn base10() -> BaseXCodec {
    base_x(BASE10_ALPHABET)
}

pub const fn base58() -> BaseXCodec {
    base_x(BASE58_ALPHABET)
}

impl BaseXCodec {
    fn base(&self) -> u32 {
        self.alphabet.chars().count() as u32
    }

    fn zero(&self) -> char {
        self.alphabet.chars().next().unwrap_or('\0')
    }

    fn string_to_bytes(&self, value: &str) -> Result<Vec<u8>> {
        let base = self.base();
        let leading = value.chars().take_while(|ch| *ch == self.zero()).count();
        // Big-endian base-256 accumulator: digits = digits * base + index.
        let mut digits: Vec<u8> = Vec::new();
        for ch in value.chars() {
            let index = self
                .alphabet
                .chars()
                .position(|candidate| candidate == ch)
                .ok_or(CodecError::InvalidBaseString { ch, base })?
                as u32;
            let mut carry = index;
            for digit in digits.iter_mut().rev() {
                let acc = u32::from(*digit) * base + carry;
                *digit = (acc & 0xff) as u8;
                carry = acc >> 8;
            }
            while carry > 0 {
                digits.insert(0, (carry & 0xff) as u8);
                carry >>= 8;
            }
        }
        let mut bytes = vec![0u8; leading];
        bytes.extend(digits);
        Ok(bytes)
    }

    fn bytes_to_string(&self, bytes: &[u8]) -> String {
        let base = self.base();
        let leading = bytes.iter().take_while(|byte| **byte == 0).count();
        let mut num = bytes[leading..].to_vec();
        let mut digits: Vec<u32> = Vec::new();
        while !num.is_empty() {
            let mut rem: u32 = 0;
            let mut quot = Vec::with_capacity(num.len());
            for digit in &num {
                let acc = rem * 256 + u32::from(*digit);
                quot.push((acc / base) as u8);
                rem = acc % base;
            }
            digits.push(rem);
            let first_nonzero = quot.iter().position(|digit| *digit != 0);
            num = match first_nonzero {
                Some(index) => quot.split_off(index),
                None => Vec::new(),
            };
        }
        let mut out: String = std::iter::repeat(self.zero()).take(leading).collect();
        for digit in digits.into_iter().rev() {
            out.push(self.alphabet.chars().nth(digit as usize).unwrap_or('\0'));
        }
        out
    }
}

impl CodecSize for BaseXCodec {}

impl Encoder<String> for BaseXCodec {
    fn encoded_size(&self, value: &String) -> usize {
        self.string_to_bytes(value).map(|bytes| bytes.len()).unwrap_or(0)
    }

    fn write(&self, value: &String, buf: &mut [u8], offset: usize) -> Result<usize> {
        let bytes = self.string_to_bytes(value)?;
        check_remaining(buf, offset, bytes.len())?;
        buf[offset..offset + bytes.len()].copy_from_slice(&bytes);
        Ok(offset + bytes.len())
    }
}

impl Decoder<String> for BaseXCodec {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(String, usize)> {
        check_remaining(buf, offset, 0)?;
        Ok((self.bytes_to_string(&buf[offset..]), buf.len()))
    }
}

/// Hexadecimal. Odd-length strings carry their first digit as a lone low
/// nibble.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base16Codec;

pub const fn base16() -> Base16Codec {
    Base16Codec
}

impl Base16Codec {
    fn string_to_bytes(&self, value: &str) -> Result<Vec<u8>> {
        let mut nibbles = Vec::with_capacity(value.len());
        for ch in value.chars() {
            let nibble = ch
                .to_digit(16)
                .ok_or(CodecError::InvalidBaseString { ch, base: 16 })?;
            nibbles.push(nibble as u8);
        }
        let mut bytes = Vec::with_capacity((nibbles.len() + 1) / 2);
        let mut rest = nibbles.as_slice();
        if rest.len() % 2 == 1 {
            bytes.push(rest[0]);
            rest = &rest[1..];
        }
        for pair in rest.chunks_exact(2) {
            bytes.push(pair[0] << 4 | pair[1]);
        }
        Ok(bytes)
    }
}

impl CodecSize for Base16Codec {}

impl Encoder<String> for Base16Codec {
    fn encoded_size(&self, value: &String) -> usize {
        (value.chars().count() + 1) / 2
    }

    fn write(&self, value: &String, buf: &mut [u8], offset: usize) -> Result<usize> {
        let bytes = self.string_to_bytes(value)?;
        check_remaining(buf, offset, bytes.len())?;
        buf[offset..offset + bytes.len()].copy_from_slice(&bytes);
        Ok(offset + bytes.len())
    }
}

impl Decoder<String> for Base16Codec {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(String, usize)> {
        check_remaining(buf, offset, 0)?;
        let mut out = String::with_capacity((buf.len() - offset) * 2);
        for byte in &buf[offset..] {
            out.push(char::from_digit(u32::from(byte >> 4), 16).unwrap_or('0'));
            out.push(char::from_digit(u32::from(byte & 0x0f), 16).unwrap_or('0'));
        }
        Ok((out, buf.len()))
    }
}

/// Standard base64 with padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec;

pub const fn base64_codec() -> Base64Codec {
    Base64Codec
}

impl CodecSize for Base64Codec {}

impl Encoder<String> for Base64Codec {
    fn encoded_size(&self, value: &String) -> usize {
        STANDARD.decode(value).map(|bytes| bytes.len()).unwrap_or(0)
    }

    fn write(&self, value: &String, buf: &mut [u8], offset: usize) -> Result<usize> {
        let bytes = STANDARD.decode(value).map_err(|err| match err {
            DecodeError::InvalidByte(_, byte) => CodecError::InvalidBaseString {
                ch: char::from(byte),
                base: 64,
            },
            _ => CodecError::InvalidBaseString { ch: '=', base: 64 },
        })?;
        check_remaining(buf, offset, bytes.len())?;
        buf[offset..offset + bytes.len()].copy_from_slice(&bytes);
        Ok(offset + bytes.len())
    }
}

impl Decoder<String> for Base64Codec {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(String, usize)> {
        check_remaining(buf, offset, 0)?;
        Ok((STANDARD.encode(&buf[offset..]), buf.len()))
    }
}

/// Raw utf-8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

pub const fn utf8() -> Utf8Codec {
    Utf8Codec
}

impl CodecSize for Utf8Codec {}

impl Encoder<String> for Utf8Codec {
    fn encoded_size(&self, value: &String) -> usize {
        value.len()
    }

    fn write(&self, value: &String, buf: &mut [u8], offset: usize) -> Result<usize> {
        let bytes = value.as_bytes();
        check_remaining(buf, offset, bytes.len())?;
        buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(offset + bytes.len())
    }
}

impl Decoder<String> for Utf8Codec {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(String, usize)> {
        check_remaining(buf, offset, 0)?;
        let value =
            String::from_utf8(buf[offset..].to_vec()).map_err(|_| CodecError::InvalidUtf8)?;
        Ok((value, buf.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::{Decoder, Encoder},
        collections::LenPrefix,
        combinators::size_prefix,
    };

    #[test]
    fn test_base58_known_values() {
        let codec = base58();
        assert_eq!(codec.encode(&"2".to_string()).unwrap(), vec![1]);
        assert_eq!(
            codec.encode(&"heLLo".to_string()).unwrap(),
            vec![27, 106, 48, 112]
        );
        // Leading zero characters survive as leading zero bytes.
        assert_eq!(
            codec.encode(&"11abc".to_string()).unwrap(),
            vec![0, 0, 1, 185, 123]
        );
        assert_eq!(
            codec.decode(&[0, 0, 1, 185, 123]).unwrap(),
            "11abc".to_string()
        );
    }

    #[test]
    fn test_base58_rejects_foreign_characters() {
        let codec = base58();
        // Zero, uppercase i, uppercase o and lowercase l are not in the
        // alphabet.
        assert_eq!(
            codec.encode(&"0".to_string()),
            Err(CodecError::InvalidBaseString { ch: '0', base: 58 })
        );
        assert!(codec.encode(&"l".to_string()).is_err());
    }

    #[test]
    fn test_base10_known_values() {
        let codec = base10();
        assert_eq!(codec.encode(&"512".to_string()).unwrap(), vec![2, 0]);
        assert_eq!(codec.encode(&"0511".to_string()).unwrap(), vec![0, 1, 255]);
        assert_eq!(codec.decode(&[2, 0]).unwrap(), "512".to_string());
        assert_eq!(codec.decode(&[0, 1, 255]).unwrap(), "0511".to_string());
    }

    #[test]
    fn test_base16_round_trip() {
        let codec = base16();
        assert_eq!(codec.encode(&"deadbeef".to_string()).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(codec.decode(&[0xde, 0xad, 0xbe, 0xef]).unwrap(), "deadbeef");
        // Odd length: lone leading nibble.
        assert_eq!(codec.encode(&"f0d".to_string()).unwrap(), vec![0x0f, 0x0d]);
        assert_eq!(
            codec.encode(&"fg".to_string()),
            Err(CodecError::InvalidBaseString { ch: 'g', base: 16 })
        );
    }

    #[test]
    fn test_base64_round_trip() {
        let codec = base64_codec();
        assert_eq!(codec.encode(&"aGVsbG8=".to_string()).unwrap(), b"hello".to_vec());
        assert_eq!(codec.decode(b"hello").unwrap(), "aGVsbG8=");
    }

    #[test]
    fn test_utf8_with_size_prefix() {
        let codec = size_prefix(utf8(), LenPrefix::ShortU16);
        let bytes = codec.encode(&"abc".to_string()).unwrap();
        assert_eq!(bytes, vec![3, b'a', b'b', b'c']);
        assert_eq!(codec.decode(&bytes).unwrap(), "abc");
    }

    #[test]
    fn test_utf8_rejects_invalid_bytes() {
        let codec = utf8();
        assert_eq!(codec.decode(&[0xff, 0xfe]), Err(CodecError::InvalidUtf8));
    }
}
