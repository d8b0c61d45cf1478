//! 32-byte lifetime tokens: recent blockhashes and durable nonce values.
//!
//! Both are structurally an [`Address`]-sized byte array but are kept as
//! distinct types; a blockhash is never an account identity.
//!
//! [`Address`]: crate::address::Address

use {
    serde::{de, Deserialize, Deserializer, Serialize, Serializer},
    std::{fmt, str::FromStr},
    thiserror::Error,
};

pub const TOKEN_BYTES: usize = 32;
const MAX_BASE58_LEN: usize = 44;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseTokenError {
    #[error("string decoded to wrong size for a 32-byte token")]
    WrongSize,
    #[error("invalid base58 string")]
    Invalid,
}

macro_rules! lifetime_token {
    ($name:ident, $expecting:literal) => {
        #[derive(Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name([u8; TOKEN_BYTES]);

        impl $name {
            pub const fn new_from_array(bytes: [u8; TOKEN_BYTES]) -> Self {
                Self(bytes)
            }

            pub const fn to_bytes(self) -> [u8; TOKEN_BYTES] {
                self.0
            }

            pub fn new_unique() -> Self {
                Self(crate::address::Address::new_unique().to_bytes())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<[u8; TOKEN_BYTES]> for $name {
            fn from(bytes: [u8; TOKEN_BYTES]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(&bs58::encode(self.0).into_string())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }

        impl FromStr for $name {
            type Err = ParseTokenError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.len() > MAX_BASE58_LEN {
                    return Err(ParseTokenError::WrongSize);
                }
                let bytes = bs58::decode(s)
                    .into_vec()
                    .map_err(|_| ParseTokenError::Invalid)?;
                <[u8; TOKEN_BYTES]>::try_from(bytes.as_slice())
                    .map(Self)
                    .map_err(|_| ParseTokenError::WrongSize)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&self.to_string())
                } else {
                    serializer.serialize_bytes(&self.0)
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct TokenVisitor;

                impl<'de> de::Visitor<'de> for TokenVisitor {
                    type Value = $name;

                    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        f.write_str($expecting)
                    }

                    fn visit_str<E: de::Error>(self, value: &str) -> Result<$name, E> {
                        value.parse().map_err(E::custom)
                    }

                    fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<$name, E> {
                        <[u8; TOKEN_BYTES]>::try_from(value)
                            .map($name)
                            .map_err(|_| E::custom(ParseTokenError::WrongSize))
                    }
                }

                if deserializer.is_human_readable() {
                    deserializer.deserialize_str(TokenVisitor)
                } else {
                    deserializer.deserialize_bytes(TokenVisitor)
                }
            }
        }
    };
}

lifetime_token!(Blockhash, "a base58 blockhash");
lifetime_token!(Nonce, "a base58 durable nonce value");
