//! Codecs for sum types: open unions, discriminated enums and options.

use crate::{
    codec::{check_remaining, Codec, CodecSize, Decoder, Encoder},
    error::{CodecError, Result},
    numbers::{U16Codec, U32Codec, U8Codec},
};

/// Selects between variant codecs with caller-supplied discriminator
/// functions. Nothing is written for the discriminator itself; the variant
/// must be recoverable from the encoded bytes.
pub struct UnionCodec<T> {
    variants: Vec<Box<dyn Codec<T>>>,
    index_from_value: Box<dyn Fn(&T) -> usize>,
    index_from_bytes: Box<dyn Fn(&[u8], usize) -> usize>,
}

pub fn union<T>(
    variants: Vec<Box<dyn Codec<T>>>,
    index_from_value: impl Fn(&T) -> usize + 'static,
    index_from_bytes: impl Fn(&[u8], usize) -> usize + 'static,
) -> UnionCodec<T> {
    UnionCodec {
        variants,
        index_from_value: Box::new(index_from_value),
        index_from_bytes: Box::new(index_from_bytes),
    }
}

impl<T> UnionCodec<T> {
    fn variant(&self, index: usize) -> Result<&dyn Codec<T>> {
        self.variants
            .get(index)
            .map(|codec| codec.as_ref())
            .ok_or(CodecError::InvalidDiscriminator(index as u64))
    }
}

impl<T> CodecSize for UnionCodec<T> {
    fn fixed_size(&self) -> Option<usize> {
        let first = self.variants.first()?.fixed_size()?;
        self.variants
            .iter()
            .all(|codec| codec.fixed_size() == Some(first))
            .then_some(first)
    }

    fn max_size(&self) -> Option<usize> {
        self.variants
            .iter()
            .map(|codec| codec.max_size())
            .try_fold(0usize, |acc, size| Some(acc.max(size?)))
    }
}

impl<T> Encoder<T> for UnionCodec<T> {
    fn encoded_size(&self, value: &T) -> usize {
        let index = (self.index_from_value)(value);
        self.variants
            .get(index)
            .map(|codec| codec.encoded_size(value))
            .unwrap_or(0)
    }

    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize> {
        let codec = self.variant((self.index_from_value)(value))?;
        codec.write(value, buf, offset)
    }
}

impl<T> Decoder<T> for UnionCodec<T> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)> {
        let codec = self.variant((self.index_from_bytes)(buf, offset))?;
        codec.read(buf, offset)
    }
}

/// Width of the numeric tag written before each [`EnumCodec`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscriminatorSize {
    #[default]
    U8,
    U16,
    U32,
}

impl DiscriminatorSize {
    fn size(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    fn write(&self, tag: u32, buf: &mut [u8], offset: usize) -> Result<usize> {
        match self {
            Self::U8 => {
                let tag = u8::try_from(tag).map_err(|_| tag_out_of_range(tag, u8::MAX as i128))?;
                U8Codec::new().write(&tag, buf, offset)
            }
            Self::U16 => {
                let tag =
                    u16::try_from(tag).map_err(|_| tag_out_of_range(tag, u16::MAX as i128))?;
                U16Codec::new().write(&tag, buf, offset)
            }
            Self::U32 => U32Codec::new().write(&tag, buf, offset),
        }
    }

    fn read(&self, buf: &[u8], offset: usize) -> Result<(u32, usize)> {
        match self {
            Self::U8 => U8Codec::new()
                .read(buf, offset)
                .map(|(tag, end)| (u32::from(tag), end)),
            Self::U16 => U16Codec::new()
                .read(buf, offset)
                .map(|(tag, end)| (u32::from(tag), end)),
            Self::U32 => U32Codec::new().read(buf, offset),
        }
    }
}

fn tag_out_of_range(tag: u32, max: i128) -> CodecError {
    CodecError::NumberOutOfRange {
        value: i128::from(tag),
        min: 0,
        max,
    }
}

pub struct EnumVariant<T> {
    pub tag: u32,
    pub codec: Box<dyn Codec<T>>,
    pub matches: Box<dyn Fn(&T) -> bool>,
}

/// A tagged union: each value is written as a numeric tag followed by the
/// matching variant's payload. Tags need not be contiguous.
pub struct EnumCodec<T> {
    discriminator: DiscriminatorSize,
    variants: Vec<EnumVariant<T>>,
}

pub fn tagged_enum<T>(
    discriminator: DiscriminatorSize,
    variants: Vec<EnumVariant<T>>,
) -> EnumCodec<T> {
    EnumCodec {
        discriminator,
        variants,
    }
}

impl<T> EnumCodec<T> {
    fn variant_for_value(&self, value: &T) -> Result<&EnumVariant<T>> {
        self.variants
            .iter()
            .find(|variant| (variant.matches)(value))
            .ok_or(CodecError::InvalidDiscriminator(u64::MAX))
    }

    fn variant_for_tag(&self, tag: u32) -> Result<&EnumVariant<T>> {
        self.variants
            .iter()
            .find(|variant| variant.tag == tag)
            .ok_or(CodecError::InvalidDiscriminator(u64::from(tag)))
    }
}

impl<T> CodecSize for EnumCodec<T> {
    fn fixed_size(&self) -> Option<usize> {
        let first = self.variants.first()?.codec.fixed_size()?;
        self.variants
            .iter()
            .all(|variant| variant.codec.fixed_size() == Some(first))
            .then_some(first + self.discriminator.size())
    }

    fn max_size(&self) -> Option<usize> {
        let payload = self
            .variants
            .iter()
            .map(|variant| variant.codec.max_size())
            .try_fold(0usize, |acc, size| Some(acc.max(size?)))?;
        Some(payload + self.discriminator.size())
    }
}

impl<T> Encoder<T> for EnumCodec<T> {
    fn encoded_size(&self, value: &T) -> usize {
        let payload = self
            .variant_for_value(value)
            .map(|variant| variant.codec.encoded_size(value))
            .unwrap_or(0);
        self.discriminator.size() + payload
    }

    fn write(&self, value: &T, buf: &mut [u8], offset: usize) -> Result<usize> {
        let variant = self.variant_for_value(value)?;
        let offset = self.discriminator.write(variant.tag, buf, offset)?;
        variant.codec.write(value, buf, offset)
    }
}

impl<T> Decoder<T> for EnumCodec<T> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(T, usize)> {
        let (tag, offset) = self.discriminator.read(buf, offset)?;
        let variant = self.variant_for_tag(tag)?;
        variant.codec.read(buf, offset)
    }
}

/// How `None` appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NoneValue {
    /// Nothing at all (variable size).
    #[default]
    Omitted,
    /// The payload slot filled with zeroes (requires a fixed-size inner
    /// codec).
    Zeroes,
    /// A literal marker in place of the payload.
    Bytes(Vec<u8>),
}

/// `Option<T>` over an inner codec. By default a one-byte boolean prefix
/// distinguishes the variants and `None` carries no payload.
pub struct OptionCodec<C> {
    inner: C,
    prefix: bool,
    none: NoneValue,
}

pub fn option<C>(inner: C) -> OptionCodec<C> {
    OptionCodec {
        inner,
        prefix: true,
        none: NoneValue::Omitted,
    }
}

impl<C> OptionCodec<C> {
    /// Drop the boolean prefix; the variant is inferred from the bytes.
    pub fn without_prefix(mut self) -> Self {
        self.prefix = false;
        self
    }

    pub fn with_none_value(mut self, none: NoneValue) -> Self {
        self.none = none;
        self
    }
}

impl<C: CodecSize> OptionCodec<C> {
    fn none_size(&self) -> Result<usize> {
        match &self.none {
            NoneValue::Omitted => Ok(0),
            NoneValue::Zeroes => self.inner.fixed_size().ok_or(CodecError::ExpectedFixedSize),
            NoneValue::Bytes(marker) => Ok(marker.len()),
        }
    }
}

impl<C: CodecSize> CodecSize for OptionCodec<C> {
    fn fixed_size(&self) -> Option<usize> {
        let payload = self.inner.fixed_size()?;
        let prefix = usize::from(self.prefix);
        match &self.none {
            NoneValue::Omitted => None,
            NoneValue::Zeroes => Some(prefix + payload),
            NoneValue::Bytes(marker) => (marker.len() == payload).then_some(prefix + payload),
        }
    }

    fn max_size(&self) -> Option<usize> {
        let payload = self.inner.max_size()?;
        let none = match &self.none {
            NoneValue::Omitted => 0,
            NoneValue::Zeroes => self.inner.fixed_size()?,
            NoneValue::Bytes(marker) => marker.len(),
        };
        Some(usize::from(self.prefix) + payload.max(none))
    }
}

impl<T, C: Encoder<T>> Encoder<Option<T>> for OptionCodec<C> {
    fn encoded_size(&self, value: &Option<T>) -> usize {
        let prefix = usize::from(self.prefix);
        match value {
            Some(inner) => prefix + self.inner.encoded_size(inner),
            None => prefix + self.none_size().unwrap_or(0),
        }
    }

    fn write(&self, value: &Option<T>, buf: &mut [u8], offset: usize) -> Result<usize> {
        let offset = if self.prefix {
            U8Codec::new().write(&u8::from(value.is_some()), buf, offset)?
        } else {
            offset
        };
        match value {
            Some(inner) => self.inner.write(inner, buf, offset),
            None => {
                let size = self.none_size()?;
                check_remaining(buf, offset, size)?;
                match &self.none {
                    NoneValue::Bytes(marker) => {
                        buf[offset..offset + size].copy_from_slice(marker);
                    }
                    _ => buf[offset..offset + size].fill(0),
                }
                Ok(offset + size)
            }
        }
    }
}

impl<T, C: Decoder<T>> Decoder<Option<T>> for OptionCodec<C> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(Option<T>, usize)> {
        if self.prefix {
            let (flag, offset) = U8Codec::new().read(buf, offset)?;
            return if flag == 0 {
                let size = self.none_size()?;
                check_remaining(buf, offset, size)?;
                Ok((None, offset + size))
            } else {
                let (value, end) = self.inner.read(buf, offset)?;
                Ok((Some(value), end))
            };
        }
        // Without a prefix the variant is inferred from what the bytes hold.
        match &self.none {
            NoneValue::Omitted => {
                check_remaining(buf, offset, 0)?;
                if offset == buf.len() {
                    Ok((None, offset))
                } else {
                    let (value, end) = self.inner.read(buf, offset)?;
                    Ok((Some(value), end))
                }
            }
            NoneValue::Zeroes => {
                let size = self.none_size()?;
                check_remaining(buf, offset, size)?;
                if buf[offset..offset + size].iter().all(|byte| *byte == 0) {
                    Ok((None, offset + size))
                } else {
                    let (value, end) = self.inner.read(buf, offset)?;
                    Ok((Some(value), end))
                }
            }
            NoneValue::Bytes(marker) => {
                check_remaining(buf, offset, marker.len())?;
                if &buf[offset..offset + marker.len()] == marker.as_slice() {
                    Ok((None, offset + marker.len()))
                } else {
                    let (value, end) = self.inner.read(buf, offset)?;
                    Ok((Some(value), end))
                }
            }
        }
    }
}

/// A one-byte boolean.
pub fn boolean() -> impl Codec<bool> {
    crate::combinators::transform(
        U8Codec::new(),
        |value: &bool| u8::from(*value),
        |raw: u8| raw != 0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        combinators::boxed,
        numbers::{U16Codec, U8Codec},
    };

    fn sample_union() -> UnionCodec<u16> {
        // Values below 256 travel as one byte, the rest as two; the first
        // byte of the two-byte form is always 0xff.
        let narrow = crate::combinators::transform(
            U8Codec::new(),
            |value: &u16| *value as u8,
            u16::from,
        );
        let wide = crate::combinators::transform(
            (U8Codec::new(), U16Codec::new()),
            |value: &u16| (0xffu8, *value),
            |(_, value): (u8, u16)| value,
        );
        union(
            vec![boxed(narrow), boxed(wide)],
            |value| usize::from(*value > 0xff),
            |buf, offset| usize::from(buf.get(offset) == Some(&0xff)),
        )
    }

    #[test]
    fn test_union_selects_variant() {
        let codec = sample_union();
        assert_eq!(codec.encode(&7).unwrap(), vec![7]);
        assert_eq!(codec.encode(&0x1234).unwrap(), vec![0xff, 0x34, 0x12]);
        assert_eq!(codec.decode(&[7]).unwrap(), 7);
        assert_eq!(codec.decode(&[0xff, 0x34, 0x12]).unwrap(), 0x1234);
        assert_eq!(codec.fixed_size(), None);
        assert_eq!(codec.max_size(), Some(3));
    }

    #[test]
    fn test_union_bad_index_fails() {
        let codec = union::<u8>(
            vec![boxed(U8Codec::new())],
            |_| 3,
            |_, _| 0,
        );
        let mut buf = [0u8; 4];
        assert_eq!(
            codec.write(&1, &mut buf, 0),
            Err(CodecError::InvalidDiscriminator(3))
        );
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shape {
        Dot,
        Line(u16),
    }

    fn shape_codec() -> EnumCodec<Shape> {
        let dot = crate::combinators::transform(
            (),
            |_: &Shape| (),
            |()| Shape::Dot,
        );
        let line = crate::combinators::transform(
            U16Codec::new(),
            |value: &Shape| match value {
                Shape::Line(len) => *len,
                Shape::Dot => 0,
            },
            Shape::Line,
        );
        tagged_enum(
            DiscriminatorSize::U8,
            vec![
                EnumVariant {
                    tag: 0,
                    codec: boxed(dot),
                    matches: Box::new(|value| matches!(value, Shape::Dot)),
                },
                EnumVariant {
                    tag: 5,
                    codec: boxed(line),
                    matches: Box::new(|value| matches!(value, Shape::Line(_))),
                },
            ],
        )
    }

    #[test]
    fn test_enum_round_trip_with_sparse_tags() {
        let codec = shape_codec();
        assert_eq!(codec.encode(&Shape::Dot).unwrap(), vec![0]);
        assert_eq!(codec.encode(&Shape::Line(0x0201)).unwrap(), vec![5, 1, 2]);
        assert_eq!(codec.decode(&[0]).unwrap(), Shape::Dot);
        assert_eq!(codec.decode(&[5, 1, 2]).unwrap(), Shape::Line(0x0201));
    }

    #[test]
    fn test_enum_unknown_tag_fails() {
        let codec = shape_codec();
        assert_eq!(
            codec.decode(&[9]),
            Err(CodecError::InvalidDiscriminator(9))
        );
    }

    #[test]
    fn test_option_prefixed() {
        let codec = option(U16Codec::new());
        assert_eq!(codec.encode(&Some(0x0201)).unwrap(), vec![1, 1, 2]);
        assert_eq!(codec.encode(&None).unwrap(), vec![0]);
        assert_eq!(codec.decode(&[1, 1, 2]).unwrap(), Some(0x0201));
        assert_eq!(codec.decode(&[0]).unwrap(), None);
        assert_eq!(codec.fixed_size(), None);
    }

    #[test]
    fn test_option_fixed_with_zeroes() {
        let codec = option(U16Codec::new()).with_none_value(NoneValue::Zeroes);
        assert_eq!(codec.encode(&None).unwrap(), vec![0, 0, 0]);
        assert_eq!(codec.encode(&Some(7)).unwrap(), vec![1, 7, 0]);
        assert_eq!(codec.decode(&[0, 0, 0]).unwrap(), None);
        assert_eq!(codec.fixed_size(), Some(3));
    }

    #[test]
    fn test_option_unprefixed_zeroes() {
        let codec = option(U16Codec::new())
            .without_prefix()
            .with_none_value(NoneValue::Zeroes);
        assert_eq!(codec.encode(&None).unwrap(), vec![0, 0]);
        assert_eq!(codec.decode(&[0, 0]).unwrap(), None);
        assert_eq!(codec.decode(&[7, 0]).unwrap(), Some(7));
    }

    #[test]
    fn test_option_unprefixed_omitted() {
        let codec = option(U16Codec::new()).without_prefix();
        assert_eq!(codec.encode(&None).unwrap(), Vec::<u8>::new());
        assert_eq!(codec.decode(&[]).unwrap(), None);
        assert_eq!(codec.decode(&[1, 2]).unwrap(), Some(0x0201));
    }

    #[test]
    fn test_boolean() {
        let codec = boolean();
        assert_eq!(codec.encode(&true).unwrap(), vec![1]);
        assert!(!codec.decode(&[0]).unwrap());
    }
}
