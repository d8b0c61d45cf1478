//! Instructions and the two-bit account role model.

use {
    crate::address::Address,
    serde::{Deserialize, Serialize},
};

const WRITABLE_BIT: u8 = 0b01;
const SIGNER_BIT: u8 = 0b10;

/// Access descriptor for one account reference: bit 0 = writable,
/// bit 1 = signer.
#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum AccountRole {
    #[default]
    Readonly = 0,
    Writable = WRITABLE_BIT,
    ReadonlySigner = SIGNER_BIT,
    WritableSigner = SIGNER_BIT | WRITABLE_BIT,
}

impl AccountRole {
    fn from_bits(bits: u8) -> Self {
        match bits & (SIGNER_BIT | WRITABLE_BIT) {
            0 => Self::Readonly,
            WRITABLE_BIT => Self::Writable,
            SIGNER_BIT => Self::ReadonlySigner,
            _ => Self::WritableSigner,
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self::from_bits(self as u8 | other as u8)
    }

    pub fn upgrade_to_signer(self) -> Self {
        Self::from_bits(self as u8 | SIGNER_BIT)
    }

    pub fn downgrade_to_non_signer(self) -> Self {
        Self::from_bits(self as u8 & !SIGNER_BIT)
    }

    pub fn upgrade_to_writable(self) -> Self {
        Self::from_bits(self as u8 | WRITABLE_BIT)
    }

    pub fn downgrade_to_readonly(self) -> Self {
        Self::from_bits(self as u8 & !WRITABLE_BIT)
    }

    pub fn is_signer(self) -> bool {
        self as u8 & SIGNER_BIT != 0
    }

    pub fn is_writable(self) -> bool {
        self as u8 & WRITABLE_BIT != 0
    }
}

/// An account named directly in the transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AccountMeta {
    pub address: Address,
    pub role: AccountRole,
}

impl AccountMeta {
    pub fn new(address: Address, role: AccountRole) -> Self {
        Self { address, role }
    }
}

/// An account reachable through an on-chain address lookup table.
/// `address_index` is the account's position within the *table's* address
/// list, not within the transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AccountLookupMeta {
    pub address: Address,
    pub role: AccountRole,
    pub lookup_table_address: Address,
    pub address_index: u8,
}

/// One account reference on an instruction.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum InstructionAccount {
    Static(AccountMeta),
    Lookup(AccountLookupMeta),
}

impl InstructionAccount {
    pub fn address(&self) -> &Address {
        match self {
            Self::Static(meta) => &meta.address,
            Self::Lookup(meta) => &meta.address,
        }
    }

    pub fn role(&self) -> AccountRole {
        match self {
            Self::Static(meta) => meta.role,
            Self::Lookup(meta) => meta.role,
        }
    }

    /// The table this reference resolves through, with the account's index
    /// inside that table.
    pub fn lookup(&self) -> Option<(&Address, u8)> {
        match self {
            Self::Static(_) => None,
            Self::Lookup(meta) => Some((&meta.lookup_table_address, meta.address_index)),
        }
    }
}

impl From<AccountMeta> for InstructionAccount {
    fn from(meta: AccountMeta) -> Self {
        Self::Static(meta)
    }
}

impl From<AccountLookupMeta> for InstructionAccount {
    fn from(meta: AccountLookupMeta) -> Self {
        Self::Lookup(meta)
    }
}

/// A single program invocation. `accounts` and `data` may each be absent,
/// which is distinct from present-but-empty.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub program_address: Address,
    pub accounts: Option<Vec<InstructionAccount>>,
    pub data: Option<Vec<u8>>,
}

impl Instruction {
    pub fn new(
        program_address: Address,
        accounts: Vec<InstructionAccount>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            program_address,
            accounts: Some(accounts),
            data: Some(data),
        }
    }

    pub fn new_bare(program_address: Address) -> Self {
        Self {
            program_address,
            accounts: None,
            data: None,
        }
    }

    pub fn accounts(&self) -> &[InstructionAccount] {
        self.accounts.as_deref().unwrap_or(&[])
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_bitwise_or() {
        use AccountRole::*;
        assert_eq!(Readonly.merge(Writable), Writable);
        assert_eq!(Writable.merge(ReadonlySigner), WritableSigner);
        assert_eq!(ReadonlySigner.merge(Readonly), ReadonlySigner);
        assert_eq!(WritableSigner.merge(Readonly), WritableSigner);
    }

    #[test]
    fn test_merge_idempotent() {
        use AccountRole::*;
        for a in [Readonly, Writable, ReadonlySigner, WritableSigner] {
            for b in [Readonly, Writable, ReadonlySigner, WritableSigner] {
                assert_eq!(a.merge(b).merge(b), a.merge(b));
            }
        }
    }

    #[test]
    fn test_upgrades_and_downgrades() {
        use AccountRole::*;
        assert_eq!(Readonly.upgrade_to_signer(), ReadonlySigner);
        assert_eq!(Writable.upgrade_to_signer(), WritableSigner);
        assert_eq!(WritableSigner.downgrade_to_non_signer(), Writable);
        assert_eq!(Readonly.upgrade_to_writable(), Writable);
        assert_eq!(WritableSigner.downgrade_to_readonly(), ReadonlySigner);
    }

    #[test]
    fn test_predicates() {
        use AccountRole::*;
        assert!(WritableSigner.is_signer() && WritableSigner.is_writable());
        assert!(ReadonlySigner.is_signer() && !ReadonlySigner.is_writable());
        assert!(!Writable.is_signer() && Writable.is_writable());
        assert!(!Readonly.is_signer() && !Readonly.is_writable());
    }

    #[test]
    fn test_absent_fields_distinct_from_empty() {
        let bare = Instruction::new_bare(Address::new_unique());
        let empty = Instruction::new(bare.program_address, vec![], vec![]);
        assert_ne!(bare, empty);
        assert_eq!(bare.accounts(), empty.accounts());
        assert_eq!(bare.data(), empty.data());
    }
}
