//! 64-byte ed25519 signatures.

use {
    crate::address::Address,
    ed25519_dalek::{Verifier, VerifyingKey},
    quill_codecs::{fixed_bytes, CodecSize, Decoder, Encoder},
    serde::{de, Deserialize, Deserializer, Serialize, Serializer},
    std::{fmt, str::FromStr},
    thiserror::Error,
};

pub const SIGNATURE_BYTES: usize = 64;
const MAX_BASE58_LEN: usize = 88;

#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Signature([u8; SIGNATURE_BYTES]);

impl Signature {
    pub const fn new_from_array(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; SIGNATURE_BYTES] {
        self.0
    }

    pub fn new_unique() -> Self {
        let mut bytes = [0u8; SIGNATURE_BYTES];
        bytes[..32].copy_from_slice(&Address::new_unique().to_bytes());
        Self(bytes)
    }

    /// True when `message` was signed by the key behind `address`.
    pub fn verify(&self, address: &Address, message: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(address.as_array()) else {
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(&self.0);
        key.verify(message, &signature).is_ok()
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_BYTES])
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; SIGNATURE_BYTES]> for Signature {
    fn from(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = ParseSignatureError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; SIGNATURE_BYTES]>::try_from(bytes)
            .map(Self)
            .map_err(|_| ParseSignatureError::WrongSize)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseSignatureError {
    #[error("string decoded to wrong size for signature")]
    WrongSize,
    #[error("invalid base58 string")]
    Invalid,
}

impl FromStr for Signature {
    type Err = ParseSignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LEN {
            return Err(ParseSignatureError::WrongSize);
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ParseSignatureError::Invalid)?;
        Self::try_from(bytes.as_slice())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SignatureVisitor;

        impl<'de> de::Visitor<'de> for SignatureVisitor {
            type Value = Signature;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a base58 string or 64 bytes")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Signature, E> {
                value.parse().map_err(E::custom)
            }

            fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Signature, E> {
                Signature::try_from(value).map_err(E::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(SignatureVisitor)
        } else {
            deserializer.deserialize_bytes(SignatureVisitor)
        }
    }
}

/// Fixed 64-byte wire codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureCodec;

impl CodecSize for SignatureCodec {
    fn fixed_size(&self) -> Option<usize> {
        Some(SIGNATURE_BYTES)
    }
}

impl Encoder<Signature> for SignatureCodec {
    fn encoded_size(&self, _value: &Signature) -> usize {
        SIGNATURE_BYTES
    }

    fn write(
        &self,
        value: &Signature,
        buf: &mut [u8],
        offset: usize,
    ) -> quill_codecs::Result<usize> {
        fixed_bytes::<SIGNATURE_BYTES>().write(&value.0, buf, offset)
    }
}

impl Decoder<Signature> for SignatureCodec {
    fn read(&self, buf: &[u8], offset: usize) -> quill_codecs::Result<(Signature, usize)> {
        let (bytes, end) = fixed_bytes::<SIGNATURE_BYTES>().read(buf, offset)?;
        Ok((Signature(bytes), end))
    }
}
