//! Resolves the accounts referenced by a message's instructions into the
//! canonical ordered account table.
//!
//! The ordering and tie-break rules here are part of the wire contract; a
//! divergence produces messages the network will reject or mis-authorize.

use {
    crate::{
        address::{compare_addresses, Address},
        instruction::{AccountRole, Instruction, InstructionAccount},
        message::compiled::{AddressTableLookup, MessageHeader},
    },
    std::cmp::Ordering,
    thiserror::Error,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("transaction has no fee payer")]
    MissingFeePayer,
    #[error("transaction has no lifetime constraint")]
    MissingLifetime,
    #[error("invoked program `{0}` cannot be writable")]
    InvokedProgramCannotBeWritable(Address),
    #[error("invoked program `{0}` cannot pay fees")]
    InvokedProgramCannotPayFees(Address),
    #[error("legacy messages cannot reference address lookup tables")]
    LegacyMessageCannotUseLookupTables,
    #[error("account index overflowed during compilation")]
    AccountIndexOverflow,
    #[error("address `{0}` missing from the compiled account table")]
    UnknownAddress(Address),
}

/// Entry provenance, in sort-priority order. The fee payer always leads;
/// lookup-sourced accounts always trail the static section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Tag {
    FeePayer,
    Static,
    LookupTable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct AccountEntry {
    address: Address,
    tag: Tag,
    role: AccountRole,
    /// Table address and the account's index within that table. Present iff
    /// the tag is `LookupTable`.
    lookup: Option<(Address, u8)>,
}

/// One resolution pass over a message's instructions.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CompiledKeys {
    entries: Vec<AccountEntry>,
    invoked: Vec<Address>,
}

impl CompiledKeys {
    pub fn compile(
        fee_payer: &Address,
        instructions: &[Instruction],
    ) -> Result<Self, CompileError> {
        let mut keys = Self {
            entries: vec![AccountEntry {
                address: *fee_payer,
                tag: Tag::FeePayer,
                role: AccountRole::WritableSigner,
                lookup: None,
            }],
            invoked: Vec::new(),
        };
        for instruction in instructions {
            keys.visit_program(&instruction.program_address)?;
            for account in instruction.accounts() {
                keys.visit_account(account)?;
            }
        }
        Ok(keys)
    }

    fn position(&self, address: &Address) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.address == address)
    }

    fn visit_program(&mut self, address: &Address) -> Result<(), CompileError> {
        match self.position(address) {
            Some(position) => {
                let entry = &mut self.entries[position];
                if entry.role.is_writable() {
                    return Err(if entry.tag == Tag::FeePayer {
                        CompileError::InvokedProgramCannotPayFees(*address)
                    } else {
                        CompileError::InvokedProgramCannotBeWritable(*address)
                    });
                }
                // Invoked addresses must be resolvable by index into the
                // static section.
                if entry.tag == Tag::LookupTable {
                    entry.tag = Tag::Static;
                    entry.lookup = None;
                }
            }
            None => self.entries.push(AccountEntry {
                address: *address,
                tag: Tag::Static,
                role: AccountRole::Readonly,
                lookup: None,
            }),
        }
        if !self.invoked.contains(address) {
            self.invoked.push(*address);
        }
        Ok(())
    }

    fn visit_account(&mut self, reference: &InstructionAccount) -> Result<(), CompileError> {
        let address = *reference.address();
        let role = reference.role();
        let lookup = reference.lookup().map(|(table, index)| (*table, index));

        let Some(position) = self.position(&address) else {
            // Lookup tables cannot name signers; a signer reference carrying
            // a lookup table lands in the static section instead.
            let entry = match lookup {
                Some(lookup) if !role.is_signer() => AccountEntry {
                    address,
                    tag: Tag::LookupTable,
                    role,
                    lookup: Some(lookup),
                },
                _ => AccountEntry {
                    address,
                    tag: Tag::Static,
                    role,
                    lookup: None,
                },
            };
            self.entries.push(entry);
            return Ok(());
        };

        // The fee payer already holds the maximal role and is never
        // re-tagged or weakened.
        if self.entries[position].tag == Tag::FeePayer {
            return Ok(());
        }
        if role.is_writable() && self.invoked.contains(&address) {
            return Err(CompileError::InvokedProgramCannotBeWritable(address));
        }

        let entry = &mut self.entries[position];
        entry.role = entry.role.merge(role);
        match (entry.tag, lookup) {
            (Tag::Static, Some(lookup))
                if !entry.role.is_signer() && !self.invoked.contains(&entry.address) =>
            {
                entry.tag = Tag::LookupTable;
                entry.lookup = Some(lookup);
            }
            (Tag::LookupTable, _) if entry.role.is_signer() => {
                entry.tag = Tag::Static;
                entry.lookup = None;
            }
            (Tag::LookupTable, Some((table, index))) => {
                // Competing tables for one address: keep the one whose
                // address collates first.
                if let Some((existing_table, _)) = entry.lookup {
                    if existing_table != table
                        && compare_addresses(&table, &existing_table) == Ordering::Less
                    {
                        entry.lookup = Some((table, index));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn try_into_message_components(self) -> Result<MessageComponents, CompileError> {
        let mut entries = self.entries;
        entries.sort_by(compare_entries);

        let static_len = entries
            .iter()
            .position(|entry| entry.tag == Tag::LookupTable)
            .unwrap_or(entries.len());
        let (static_entries, lookup_entries) = entries.split_at(static_len);

        let num_signers = static_entries
            .iter()
            .filter(|entry| entry.role.is_signer())
            .count();
        let num_readonly_signers = static_entries
            .iter()
            .filter(|entry| entry.role.is_signer() && !entry.role.is_writable())
            .count();
        let num_readonly_non_signers = static_entries
            .iter()
            .filter(|entry| !entry.role.is_signer() && !entry.role.is_writable())
            .count();
        let header = MessageHeader {
            num_signer_accounts: index_u8(num_signers)?,
            num_readonly_signer_accounts: index_u8(num_readonly_signers)?,
            num_readonly_non_signer_accounts: index_u8(num_readonly_non_signers)?,
        };

        // Lookup entries regroup per table (groups collated by table
        // address), writable bucket before readonly within each group.
        let mut groups: Vec<LookupGroup> = Vec::new();
        for entry in lookup_entries {
            let Some((table, index)) = entry.lookup else {
                debug_assert!(false, "lookup-tagged entry without table info");
                continue;
            };
            let group = match groups.iter().position(|group| group.table == table) {
                Some(position) => &mut groups[position],
                None => {
                    let position = groups
                        .iter()
                        .position(|group| {
                            compare_addresses(&table, &group.table) == Ordering::Less
                        })
                        .unwrap_or(groups.len());
                    groups.insert(position, LookupGroup::new(table));
                    &mut groups[position]
                }
            };
            if entry.role.is_writable() {
                group.writable.push((entry.address, index));
            } else {
                group.readonly.push((entry.address, index));
            }
        }

        let mut ordered: Vec<Address> =
            static_entries.iter().map(|entry| entry.address).collect();
        let static_accounts = ordered.clone();
        let mut address_table_lookups = Vec::with_capacity(groups.len());
        for group in groups {
            ordered.extend(group.writable.iter().map(|(address, _)| *address));
            ordered.extend(group.readonly.iter().map(|(address, _)| *address));
            address_table_lookups.push(AddressTableLookup {
                lookup_table_address: group.table,
                writable_indices: group.writable.iter().map(|(_, index)| *index).collect(),
                readonly_indices: group.readonly.iter().map(|(_, index)| *index).collect(),
            });
        }

        Ok(MessageComponents {
            header,
            static_accounts,
            address_table_lookups,
            ordered,
        })
    }
}

struct LookupGroup {
    table: Address,
    writable: Vec<(Address, u8)>,
    readonly: Vec<(Address, u8)>,
}

impl LookupGroup {
    fn new(table: Address) -> Self {
        Self {
            table,
            writable: Vec::new(),
            readonly: Vec::new(),
        }
    }
}

fn index_u8(value: usize) -> Result<u8, CompileError> {
    u8::try_from(value).map_err(|_| CompileError::AccountIndexOverflow)
}

/// The four-stage total order: provenance tag, signers first, writables
/// first, then address collation (table address when two lookup entries
/// come from different tables).
fn compare_entries(a: &AccountEntry, b: &AccountEntry) -> Ordering {
    a.tag
        .cmp(&b.tag)
        .then_with(|| b.role.is_signer().cmp(&a.role.is_signer()))
        .then_with(|| b.role.is_writable().cmp(&a.role.is_writable()))
        .then_with(|| match (&a.lookup, &b.lookup) {
            (Some((table_a, _)), Some((table_b, _))) if table_a != table_b => {
                compare_addresses(table_a, table_b)
            }
            _ => compare_addresses(&a.address, &b.address),
        })
}

pub(crate) struct MessageComponents {
    pub header: MessageHeader,
    pub static_accounts: Vec<Address>,
    pub address_table_lookups: Vec<AddressTableLookup>,
    /// Static accounts followed by every lookup group's writable then
    /// readonly accounts; instruction indices point into this list.
    ordered: Vec<Address>,
}

impl MessageComponents {
    pub fn index_of(&self, address: &Address) -> Result<u8, CompileError> {
        let position = self
            .ordered
            .iter()
            .position(|candidate| candidate == address)
            .ok_or(CompileError::UnknownAddress(*address))?;
        index_u8(position)
    }
}
