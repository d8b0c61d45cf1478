//! Repeated-field codecs: arrays, sets, maps and packed bit arrays.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    codec::{check_remaining, Codec, CodecSize, Decoder, Encoder},
    combinators::transform,
    error::{CodecError, Result},
    numbers::{U16Codec, U32Codec, U8Codec},
    short_u16,
};

/// The closed set of length-prefix encodings used by [`size_prefix`] and the
/// collection codecs.
///
/// [`size_prefix`]: crate::combinators::size_prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LenPrefix {
    U8,
    U16,
    U32,
    #[default]
    ShortU16,
}

impl LenPrefix {
    /// Bytes needed to encode `len`.
    pub fn len_size(&self, len: usize) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::ShortU16 => short_u16::len_size(len),
        }
    }

    /// Largest possible prefix width.
    pub fn max_len_size(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::ShortU16 => 3,
        }
    }

    pub fn write_len(&self, len: usize, buf: &mut [u8], offset: usize) -> Result<usize> {
        match self {
            Self::U8 => {
                let value = u8::try_from(len).map_err(|_| out_of_range(len, u8::MAX as i128))?;
                U8Codec::new().write(&value, buf, offset)
            }
            Self::U16 => {
                let value = u16::try_from(len).map_err(|_| out_of_range(len, u16::MAX as i128))?;
                U16Codec::new().write(&value, buf, offset)
            }
            Self::U32 => {
                let value = u32::try_from(len).map_err(|_| out_of_range(len, u32::MAX as i128))?;
                U32Codec::new().write(&value, buf, offset)
            }
            Self::ShortU16 => short_u16::write_len(len, buf, offset),
        }
    }

    pub fn read_len(&self, buf: &[u8], offset: usize) -> Result<(usize, usize)> {
        match self {
            Self::U8 => U8Codec::new()
                .read(buf, offset)
                .map(|(value, end)| (usize::from(value), end)),
            Self::U16 => U16Codec::new()
                .read(buf, offset)
                .map(|(value, end)| (usize::from(value), end)),
            Self::U32 => U32Codec::new()
                .read(buf, offset)
                .map(|(value, end)| (value as usize, end)),
            Self::ShortU16 => short_u16::read_len(buf, offset),
        }
    }
}

fn out_of_range(value: usize, max: i128) -> CodecError {
    CodecError::NumberOutOfRange {
        value: value as i128,
        min: 0,
        max,
    }
}

/// How the number of repetitions is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayLen {
    /// Exactly this many items; nothing is written for the count.
    Fixed(usize),
    /// The count precedes the items.
    Prefixed(LenPrefix),
    /// Items repeat until the buffer is exhausted.
    Remainder,
}

pub struct ArrayCodec<C> {
    item: C,
    len: ArrayLen,
}

pub fn array<C>(item: C, len: ArrayLen) -> ArrayCodec<C> {
    ArrayCodec { item, len }
}

impl<C: CodecSize> CodecSize for ArrayCodec<C> {
    fn fixed_size(&self) -> Option<usize> {
        match self.len {
            ArrayLen::Fixed(0) => Some(0),
            ArrayLen::Fixed(count) => Some(count * self.item.fixed_size()?),
            _ => None,
        }
    }
}

impl<T, C: Encoder<T>> Encoder<Vec<T>> for ArrayCodec<C> {
    fn encoded_size(&self, value: &Vec<T>) -> usize {
        let items: usize = value.iter().map(|item| self.item.encoded_size(item)).sum();
        match self.len {
            ArrayLen::Prefixed(prefix) => prefix.len_size(value.len()) + items,
            _ => items,
        }
    }

    fn write(&self, value: &Vec<T>, buf: &mut [u8], offset: usize) -> Result<usize> {
        let mut offset = match self.len {
            ArrayLen::Fixed(count) => {
                if value.len() != count {
                    return Err(CodecError::InvalidNumberOfItems {
                        expected: count,
                        actual: value.len(),
                    });
                }
                offset
            }
            ArrayLen::Prefixed(prefix) => prefix.write_len(value.len(), buf, offset)?,
            ArrayLen::Remainder => offset,
        };
        for item in value {
            offset = self.item.write(item, buf, offset)?;
        }
        Ok(offset)
    }
}

impl<T, C: Decoder<T>> Decoder<Vec<T>> for ArrayCodec<C> {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(Vec<T>, usize)> {
        match self.len {
            ArrayLen::Fixed(count) => self.read_exact(buf, offset, count),
            ArrayLen::Prefixed(prefix) => {
                let (count, offset) = prefix.read_len(buf, offset)?;
                self.read_exact(buf, offset, count)
            }
            ArrayLen::Remainder => {
                let mut items = Vec::new();
                let mut offset = offset;
                check_remaining(buf, offset, 0)?;
                while offset < buf.len() {
                    let (item, end) = self.item.read(buf, offset)?;
                    if end == offset {
                        return Err(CodecError::EmptyItem);
                    }
                    items.push(item);
                    offset = end;
                }
                Ok((items, offset))
            }
        }
    }
}

impl<C> ArrayCodec<C> {
    fn read_exact<T>(&self, buf: &[u8], mut offset: usize, count: usize) -> Result<(Vec<T>, usize)>
    where
        C: Decoder<T>,
    {
        let mut items = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let (item, end) = self.item.read(buf, offset)?;
            items.push(item);
            offset = end;
        }
        Ok((items, offset))
    }
}

/// An ordered set carried as an array of items.
pub fn set<T, C>(item: C, len: ArrayLen) -> impl Codec<BTreeSet<T>>
where
    T: Ord + Clone,
    C: Codec<T>,
{
    transform(
        array(item, len),
        |value: &BTreeSet<T>| value.iter().cloned().collect::<Vec<T>>(),
        |items: Vec<T>| items.into_iter().collect(),
    )
}

/// An ordered map carried as an array of key/value pairs.
pub fn map<K, V, KC, VC>(key: KC, value: VC, len: ArrayLen) -> impl Codec<BTreeMap<K, V>>
where
    K: Ord + Clone,
    V: Clone,
    KC: Codec<K>,
    VC: Codec<V>,
{
    transform(
        array((key, value), len),
        |entries: &BTreeMap<K, V>| {
            entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Vec<(K, V)>>()
        },
        |entries: Vec<(K, V)>| entries.into_iter().collect(),
    )
}

/// Bit order within each byte of a [`BitArrayCodec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// Most significant bit first.
    #[default]
    Forward,
    /// Least significant bit first.
    Backward,
}

/// Packs `size * 8` booleans into `size` bytes.
#[derive(Debug, Clone, Copy)]
pub struct BitArrayCodec {
    size: usize,
    order: BitOrder,
}

pub fn bit_array(size: usize, order: BitOrder) -> BitArrayCodec {
    BitArrayCodec { size, order }
}

impl BitArrayCodec {
    fn bit_position(&self, index: usize) -> (usize, u8) {
        let byte = index / 8;
        let bit = index % 8;
        let mask = match self.order {
            BitOrder::Forward => 1u8 << (7 - bit),
            BitOrder::Backward => 1u8 << bit,
        };
        (byte, mask)
    }
}

impl CodecSize for BitArrayCodec {
    fn fixed_size(&self) -> Option<usize> {
        Some(self.size)
    }
}

impl Encoder<Vec<bool>> for BitArrayCodec {
    fn encoded_size(&self, _value: &Vec<bool>) -> usize {
        self.size
    }

    fn write(&self, value: &Vec<bool>, buf: &mut [u8], offset: usize) -> Result<usize> {
        if value.len() != self.size * 8 {
            return Err(CodecError::InvalidNumberOfItems {
                expected: self.size * 8,
                actual: value.len(),
            });
        }
        check_remaining(buf, offset, self.size)?;
        buf[offset..offset + self.size].fill(0);
        for (index, bit) in value.iter().enumerate() {
            if *bit {
                let (byte, mask) = self.bit_position(index);
                buf[offset + byte] |= mask;
            }
        }
        Ok(offset + self.size)
    }
}

impl Decoder<Vec<bool>> for BitArrayCodec {
    fn read(&self, buf: &[u8], offset: usize) -> Result<(Vec<bool>, usize)> {
        check_remaining(buf, offset, self.size)?;
        let mut bits = Vec::with_capacity(self.size * 8);
        for index in 0..self.size * 8 {
            let (byte, mask) = self.bit_position(index);
            bits.push(buf[offset + byte] & mask != 0);
        }
        Ok((bits, offset + self.size))
    }
}
