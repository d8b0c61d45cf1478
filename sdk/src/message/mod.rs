//! Transaction messages: the mutable-by-copy builder form, its compiled wire
//! form, and the translation between them.

pub mod compiled;
pub mod compiled_keys;
pub mod decompile;

pub use {
    compiled::{
        AddressTableLookup, CompiledInstruction, CompiledTransactionMessage, MessageHeader,
    },
    compiled_keys::CompileError,
    decompile::{
        decompile_transaction_message, decompile_with_fetcher, DecompileConfig, DecompileError,
        LookupTableFetcher,
    },
};

use {
    crate::{
        address::Address,
        blockhash::{Blockhash, Nonce},
        instruction::Instruction,
        system,
    },
    serde::{Deserialize, Serialize},
};

/// Either the original unprefixed layout or a version-prefixed one
/// (0 through 127).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TransactionVersion {
    #[default]
    Legacy,
    V(u8),
}

impl TransactionVersion {
    pub const MAX_VERSION: u8 = 127;

    /// `None` when `version` exceeds the 7 bits the wire prefix can carry.
    pub fn versioned(version: u8) -> Option<Self> {
        (version <= Self::MAX_VERSION).then_some(Self::V(version))
    }
}

/// How long a transaction remains valid.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Lifetime {
    Blockhash {
        blockhash: Blockhash,
        last_valid_block_height: u64,
    },
    DurableNonce {
        nonce: Nonce,
        nonce_account: Address,
        nonce_authority: Address,
    },
}

impl Lifetime {
    /// The literal 32 bytes the wire format carries for this lifetime.
    pub fn token(&self) -> [u8; 32] {
        match self {
            Self::Blockhash { blockhash, .. } => blockhash.to_bytes(),
            Self::DurableNonce { nonce, .. } => nonce.to_bytes(),
        }
    }
}

/// A transaction under construction. Immutable: every builder method returns
/// a new value and leaves the receiver untouched.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionMessage {
    version: TransactionVersion,
    fee_payer: Option<Address>,
    lifetime: Option<Lifetime>,
    instructions: Vec<Instruction>,
}

impl TransactionMessage {
    pub fn new(version: TransactionVersion) -> Self {
        Self {
            version,
            fee_payer: None,
            lifetime: None,
            instructions: Vec::new(),
        }
    }

    pub fn version(&self) -> TransactionVersion {
        self.version
    }

    pub fn fee_payer(&self) -> Option<&Address> {
        self.fee_payer.as_ref()
    }

    pub fn lifetime(&self) -> Option<&Lifetime> {
        self.lifetime.as_ref()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn with_fee_payer(&self, fee_payer: Address) -> Self {
        let mut next = self.clone();
        next.fee_payer = Some(fee_payer);
        next
    }

    pub fn with_blockhash_lifetime(
        &self,
        blockhash: Blockhash,
        last_valid_block_height: u64,
    ) -> Self {
        let mut next = self.clone();
        next.lifetime = Some(Lifetime::Blockhash {
            blockhash,
            last_valid_block_height,
        });
        next
    }

    /// Install a durable-nonce lifetime. The matching advance-nonce
    /// instruction must run first, so it is placed in slot 0, replacing a
    /// recognized advance-nonce instruction already there.
    pub fn with_durable_nonce_lifetime(
        &self,
        nonce: Nonce,
        nonce_account: Address,
        nonce_authority: Address,
    ) -> Self {
        let mut next = self.clone();
        next.lifetime = Some(Lifetime::DurableNonce {
            nonce,
            nonce_account,
            nonce_authority,
        });
        let advance = system::advance_nonce_account(&nonce_account, &nonce_authority);
        match next.instructions.first() {
            Some(first) if system::is_advance_nonce_instruction(first) => {
                next.instructions[0] = advance;
            }
            _ => next.instructions.insert(0, advance),
        }
        next
    }

    pub fn appending_instruction(&self, instruction: Instruction) -> Self {
        let mut next = self.clone();
        next.instructions.push(instruction);
        next
    }

    pub fn appending_instructions(
        &self,
        instructions: impl IntoIterator<Item = Instruction>,
    ) -> Self {
        let mut next = self.clone();
        next.instructions.extend(instructions);
        next
    }

    pub fn prepending_instruction(&self, instruction: Instruction) -> Self {
        let mut next = self.clone();
        next.instructions.insert(0, instruction);
        next
    }
}
