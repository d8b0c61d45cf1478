//! The network's smallest currency unit, an unsigned 64-bit quantity.

use {
    quill_codecs::{CodecSize, Decoder, Encoder, U64Codec},
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Lamports(pub u64);

impl Lamports {
    pub const ZERO: Self = Self(0);

    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(diff) => Some(Self(diff)),
            None => None,
        }
    }
}

impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Lamports {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Little-endian u64 wire codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct LamportsCodec;

impl CodecSize for LamportsCodec {
    fn fixed_size(&self) -> Option<usize> {
        Some(8)
    }
}

impl Encoder<Lamports> for LamportsCodec {
    fn encoded_size(&self, _value: &Lamports) -> usize {
        8
    }

    fn write(
        &self,
        value: &Lamports,
        buf: &mut [u8],
        offset: usize,
    ) -> quill_codecs::Result<usize> {
        U64Codec::new().write(&value.0, buf, offset)
    }
}

impl Decoder<Lamports> for LamportsCodec {
    fn read(&self, buf: &[u8], offset: usize) -> quill_codecs::Result<(Lamports, usize)> {
        let (value, end) = U64Codec::new().read(buf, offset)?;
        Ok((Lamports(value), end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(
            Lamports(1).checked_add(Lamports(2)),
            Some(Lamports(3))
        );
        assert_eq!(Lamports(u64::MAX).checked_add(Lamports(1)), None);
        assert_eq!(Lamports(1).checked_sub(Lamports(2)), None);
    }

    #[test]
    fn test_codec_round_trip() {
        let value = Lamports(0x0102_0304_0506_0708);
        let bytes = LamportsCodec.encode(&value).unwrap();
        assert_eq!(bytes, vec![8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(LamportsCodec.decode(&bytes).unwrap(), value);
    }
}
