use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodecError>;

/// Failures raised while encoding or decoding byte buffers.
///
/// Every error is terminal: the first failure aborts the whole operation and
/// no partial value is returned. Range violations always fail, never truncate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("expected at least {expected} more bytes, got {actual}")]
    InvalidByteLength { expected: usize, actual: usize },

    #[error("offset {offset} is out of range for a buffer of {len} bytes")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("operation requires a fixed-size codec")]
    ExpectedFixedSize,

    #[error("encoder produced {actual} bytes, expected {expected}")]
    EncodedSizeMismatch { expected: usize, actual: usize },

    #[error("expected {expected} items, got {actual}")]
    InvalidNumberOfItems { expected: usize, actual: usize },

    #[error("invalid discriminator `{0}`")]
    InvalidDiscriminator(u64),

    #[error("number {value} is out of the range {min}..={max}")]
    NumberOutOfRange { value: i128, min: i128, max: i128 },

    #[error("non-canonical variable-length quantity")]
    AliasedLength,

    #[error("sentinel byte sequence occurs inside the payload")]
    SentinelInPayload,

    #[error("sentinel byte sequence missing from the byte buffer")]
    SentinelMissing,

    #[error("invalid character `{ch}` for a base-{base} string")]
    InvalidBaseString { ch: char, base: u32 },

    #[error("item codec consumed no bytes")]
    EmptyItem,

    #[error("byte buffer is not valid utf-8")]
    InvalidUtf8,
}
