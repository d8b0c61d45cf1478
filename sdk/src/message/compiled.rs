//! The compiled, byte-encodable form of a transaction message and its exact
//! wire layout.
//!
//! ```text
//! version            0 bytes if legacy, else 1 byte = 0x80 | n
//! header             3 bytes
//! static accounts    shortU16 count, then count * 32 bytes
//! lifetime token     32 raw bytes
//! instructions       shortU16 count, then count * instruction
//! table lookups      shortU16 count, then count * lookup (versioned only)
//! ```

use {
    crate::{
        address::{Address, AddressCodec},
        message::{
            compiled_keys::{CompileError, CompiledKeys},
            TransactionMessage, TransactionVersion,
        },
    },
    quill_codecs::{
        array, bytes, fixed_bytes, size_prefix, transform, ArrayLen, Codec, CodecError, CodecSize,
        Decoder, Encoder, LenPrefix, U8Codec,
    },
    serde::{Deserialize, Serialize},
};

/// Three counts that, with the static-account order, encode every static
/// account's role.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Static accounts that must sign, always leading the account table.
    pub num_signer_accounts: u8,
    /// Of the signers, how many trail the writable ones as read-only.
    pub num_readonly_signer_accounts: u8,
    /// Of the non-signers, how many trail as read-only.
    pub num_readonly_non_signer_accounts: u8,
}

/// An instruction with every address replaced by its index into the resolved
/// account table.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CompiledInstruction {
    pub program_address_index: u8,
    pub account_indices: Vec<u8>,
    pub data: Vec<u8>,
}

/// Indices into one lookup table's own address list, writable bucket first.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AddressTableLookup {
    pub lookup_table_address: Address,
    pub writable_indices: Vec<u8>,
    pub readonly_indices: Vec<u8>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CompiledTransactionMessage {
    pub version: TransactionVersion,
    pub header: MessageHeader,
    pub static_accounts: Vec<Address>,
    pub lifetime_token: [u8; 32],
    pub instructions: Vec<CompiledInstruction>,
    /// Always empty for legacy messages.
    pub address_table_lookups: Vec<AddressTableLookup>,
}

impl CompiledTransactionMessage {
    /// Resolve and order a message's accounts, then index its instructions.
    pub fn compile(message: &TransactionMessage) -> Result<Self, CompileError> {
        let fee_payer = message.fee_payer().ok_or(CompileError::MissingFeePayer)?;
        let lifetime = message.lifetime().ok_or(CompileError::MissingLifetime)?;
        let components = CompiledKeys::compile(fee_payer, message.instructions())?
            .try_into_message_components()?;
        if message.version() == TransactionVersion::Legacy
            && !components.address_table_lookups.is_empty()
        {
            return Err(CompileError::LegacyMessageCannotUseLookupTables);
        }

        let instructions = message
            .instructions()
            .iter()
            .map(|instruction| {
                Ok(CompiledInstruction {
                    program_address_index: components.index_of(&instruction.program_address)?,
                    account_indices: instruction
                        .accounts()
                        .iter()
                        .map(|account| components.index_of(account.address()))
                        .collect::<Result<_, _>>()?,
                    data: instruction.data().to_vec(),
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        Ok(Self {
            version: message.version(),
            header: components.header,
            static_accounts: components.static_accounts,
            lifetime_token: lifetime.token(),
            instructions,
            address_table_lookups: components.address_table_lookups,
        })
    }

    /// The addresses that must sign, in signature-slot order.
    pub fn signer_addresses(&self) -> &[Address] {
        let count = usize::from(self.header.num_signer_accounts).min(self.static_accounts.len());
        &self.static_accounts[..count]
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        MessageCodec.encode(self)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        MessageCodec.decode(buf)
    }
}

fn header_codec() -> impl Codec<MessageHeader> {
    transform(
        fixed_bytes::<3>(),
        |header: &MessageHeader| {
            [
                header.num_signer_accounts,
                header.num_readonly_signer_accounts,
                header.num_readonly_non_signer_accounts,
            ]
        },
        |[a, b, c]: [u8; 3]| MessageHeader {
            num_signer_accounts: a,
            num_readonly_signer_accounts: b,
            num_readonly_non_signer_accounts: c,
        },
    )
}

fn indices_codec() -> impl Codec<Vec<u8>> {
    array(U8Codec::new(), ArrayLen::Prefixed(LenPrefix::ShortU16))
}

fn instruction_codec() -> impl Codec<CompiledInstruction> {
    transform(
        (
            U8Codec::new(),
            indices_codec(),
            size_prefix(bytes(), LenPrefix::ShortU16),
        ),
        |instruction: &CompiledInstruction| {
            (
                instruction.program_address_index,
                instruction.account_indices.clone(),
                instruction.data.clone(),
            )
        },
        |(program_address_index, account_indices, data)| CompiledInstruction {
            program_address_index,
            account_indices,
            data,
        },
    )
}

fn lookup_codec() -> impl Codec<AddressTableLookup> {
    transform(
        (AddressCodec, indices_codec(), indices_codec()),
        |lookup: &AddressTableLookup| {
            (
                lookup.lookup_table_address,
                lookup.writable_indices.clone(),
                lookup.readonly_indices.clone(),
            )
        },
        |(lookup_table_address, writable_indices, readonly_indices)| AddressTableLookup {
            lookup_table_address,
            writable_indices,
            readonly_indices,
        },
    )
}

fn accounts_codec() -> impl Codec<Vec<Address>> {
    array(AddressCodec, ArrayLen::Prefixed(LenPrefix::ShortU16))
}

fn instructions_codec() -> impl Codec<Vec<CompiledInstruction>> {
    array(instruction_codec(), ArrayLen::Prefixed(LenPrefix::ShortU16))
}

fn lookups_codec() -> impl Codec<Vec<AddressTableLookup>> {
    array(lookup_codec(), ArrayLen::Prefixed(LenPrefix::ShortU16))
}

const VERSION_PREFIX_FLAG: u8 = 0x80;

/// Whole-message wire codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCodec;

impl CodecSize for MessageCodec {}

impl Encoder<CompiledTransactionMessage> for MessageCodec {
    fn encoded_size(&self, value: &CompiledTransactionMessage) -> usize {
        let version = match value.version {
            TransactionVersion::Legacy => 0,
            TransactionVersion::V(_) => 1,
        };
        let lookups = match value.version {
            TransactionVersion::Legacy => 0,
            TransactionVersion::V(_) => lookups_codec().encoded_size(&value.address_table_lookups),
        };
        version
            + 3
            + accounts_codec().encoded_size(&value.static_accounts)
            + 32
            + instructions_codec().encoded_size(&value.instructions)
            + lookups
    }

    fn write(
        &self,
        value: &CompiledTransactionMessage,
        buf: &mut [u8],
        offset: usize,
    ) -> quill_codecs::Result<usize> {
        let mut offset = offset;
        if let TransactionVersion::V(version) = value.version {
            offset = U8Codec::new().write(&(VERSION_PREFIX_FLAG | version), buf, offset)?;
        }
        offset = header_codec().write(&value.header, buf, offset)?;
        offset = accounts_codec().write(&value.static_accounts, buf, offset)?;
        offset = fixed_bytes::<32>().write(&value.lifetime_token, buf, offset)?;
        offset = instructions_codec().write(&value.instructions, buf, offset)?;
        if value.version != TransactionVersion::Legacy {
            offset = lookups_codec().write(&value.address_table_lookups, buf, offset)?;
        }
        Ok(offset)
    }
}

impl Decoder<CompiledTransactionMessage> for MessageCodec {
    fn read(
        &self,
        buf: &[u8],
        offset: usize,
    ) -> quill_codecs::Result<(CompiledTransactionMessage, usize)> {
        let (first, after_first) = U8Codec::new().read(buf, offset)?;
        let (version, mut offset) = if first & VERSION_PREFIX_FLAG != 0 {
            (
                TransactionVersion::V(first & !VERSION_PREFIX_FLAG),
                after_first,
            )
        } else {
            (TransactionVersion::Legacy, offset)
        };
        let (header, next) = header_codec().read(buf, offset)?;
        offset = next;
        let (static_accounts, next) = accounts_codec().read(buf, offset)?;
        offset = next;
        let (lifetime_token, next) = fixed_bytes::<32>().read(buf, offset)?;
        offset = next;
        let (instructions, next) = instructions_codec().read(buf, offset)?;
        offset = next;
        let address_table_lookups = match version {
            TransactionVersion::Legacy => Vec::new(),
            TransactionVersion::V(_) => {
                let (lookups, next) = lookups_codec().read(buf, offset)?;
                offset = next;
                lookups
            }
        };
        Ok((
            CompiledTransactionMessage {
                version,
                header,
                static_accounts,
                lifetime_token,
                instructions,
                address_table_lookups,
            },
            offset,
        ))
    }
}
