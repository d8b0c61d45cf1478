//! 32-byte account addresses and the collation order the account resolver
//! sorts them with.

use {
    quill_codecs::{fixed_bytes, CodecSize, Decoder, Encoder},
    serde::{de, Deserialize, Deserializer, Serialize, Serializer},
    std::{cmp::Ordering, fmt, str::FromStr},
    thiserror::Error,
};

pub const ADDRESS_BYTES: usize = 32;
/// Longest base58 rendering of 32 bytes.
pub const MAX_BASE58_LEN: usize = 44;

#[derive(Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Address([u8; ADDRESS_BYTES]);

impl Address {
    pub const fn new_from_array(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; ADDRESS_BYTES] {
        self.0
    }

    pub const fn as_array(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    /// A distinct address on every call. Test-oriented helper.
    pub fn new_unique() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let mut bytes = [0u8; ADDRESS_BYTES];
        bytes[..8].copy_from_slice(&COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; ADDRESS_BYTES]> for Address {
    fn from(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = ParseAddressError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; ADDRESS_BYTES]>::try_from(bytes)
            .map(Self)
            .map_err(|_| ParseAddressError::WrongSize)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseAddressError {
    #[error("string decoded to wrong size for address")]
    WrongSize,
    #[error("invalid base58 string")]
    Invalid,
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LEN {
            return Err(ParseAddressError::WrongSize);
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ParseAddressError::Invalid)?;
        Self::try_from(bytes.as_slice())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AddressVisitor;

        impl<'de> de::Visitor<'de> for AddressVisitor {
            type Value = Address;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a base58 string or 32 bytes")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Address, E> {
                value.parse().map_err(E::custom)
            }

            fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Address, E> {
                Address::try_from(value).map_err(E::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(AddressVisitor)
        } else {
            deserializer.deserialize_bytes(AddressVisitor)
        }
    }
}

/// Fixed 32-byte wire codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressCodec;

impl CodecSize for AddressCodec {
    fn fixed_size(&self) -> Option<usize> {
        Some(ADDRESS_BYTES)
    }
}

impl Encoder<Address> for AddressCodec {
    fn encoded_size(&self, _value: &Address) -> usize {
        ADDRESS_BYTES
    }

    fn write(
        &self,
        value: &Address,
        buf: &mut [u8],
        offset: usize,
    ) -> quill_codecs::Result<usize> {
        fixed_bytes::<ADDRESS_BYTES>().write(&value.0, buf, offset)
    }
}

impl Decoder<Address> for AddressCodec {
    fn read(&self, buf: &[u8], offset: usize) -> quill_codecs::Result<(Address, usize)> {
        let (bytes, end) = fixed_bytes::<ADDRESS_BYTES>().read(buf, offset)?;
        Ok((Address(bytes), end))
    }
}

/// Collation used for every address tie-break in account resolution: a
/// case-insensitive primary pass over the base58 strings (digits sort before
/// letters), then lowercase before uppercase at the first position where only
/// case differs.
pub fn compare_addresses(a: &Address, b: &Address) -> Ordering {
    compare_base58(&a.to_string(), &b.to_string())
}

fn compare_base58(a: &str, b: &str) -> Ordering {
    let primary = a
        .bytes()
        .map(|ch| ch.to_ascii_lowercase())
        .cmp(b.bytes().map(|ch| ch.to_ascii_lowercase()));
    if primary != Ordering::Equal {
        return primary;
    }
    for (ca, cb) in a.bytes().zip(b.bytes()) {
        if ca != cb {
            return if ca.is_ascii_lowercase() {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
    }
    Ordering::Equal
}
