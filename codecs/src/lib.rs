//! Composable binary codecs.
//!
//! The building blocks here pair an encoder and a decoder for the same type
//! behind the [`Codec`] trait and compose into wire formats without any
//! intermediate allocations: encoders write into a caller-supplied buffer at
//! an offset, decoders read from one, and both report the offset one past the
//! bytes they touched.

pub mod bytes;
pub mod codec;
pub mod collections;
pub mod combinators;
pub mod error;
pub mod numbers;
pub mod short_u16;
pub mod strings;
pub mod tuple;
pub mod union;

pub use {
    bytes::{bytes, fixed_bytes, BytesCodec, FixedBytesCodec},
    codec::{Codec, CodecSize, Decoder, Encoder},
    collections::{array, bit_array, map, set, ArrayCodec, ArrayLen, BitOrder, LenPrefix},
    combinators::{
        boxed, fix_size, offset, pad_left, pad_right, resize, reverse, sentinel, size_prefix,
        transform,
    },
    error::{CodecError, Result},
    numbers::{
        Endianness, F32Codec, F64Codec, I128Codec, I16Codec, I32Codec, I64Codec, I8Codec,
        U128Codec, U16Codec, U32Codec, U64Codec, U8Codec,
    },
    short_u16::ShortU16Codec,
    strings::{base10, base16, base58, base64_codec, base_x, utf8},
    union::{
        boolean, option, tagged_enum, union, DiscriminatorSize, EnumCodec, EnumVariant, NoneValue,
        OptionCodec, UnionCodec,
    },
};
