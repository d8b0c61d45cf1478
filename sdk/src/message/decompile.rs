//! Reconstructs a [`TransactionMessage`] from its compiled form, given the
//! contents of any referenced lookup tables.

use {
    crate::{
        address::Address,
        blockhash::{Blockhash, Nonce},
        cancel::CancelToken,
        instruction::{
            AccountLookupMeta, AccountMeta, AccountRole, Instruction, InstructionAccount,
        },
        message::{compiled::CompiledTransactionMessage, Lifetime, TransactionMessage},
        system,
    },
    log::debug,
    std::collections::HashMap,
    thiserror::Error,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecompileError {
    #[error("compiled message has no fee payer")]
    MissingFeePayer,
    #[error("program address index {index} is outside the static accounts")]
    ProgramIndexOutOfRange { index: u8 },
    #[error("account index {index} is outside the account table")]
    AccountIndexOutOfRange { index: u8 },
    #[error("contents of lookup table `{0}` were not supplied")]
    LookupTableContentsMissing(Address),
    #[error("index {index} exceeds the {len} known addresses of lookup table `{table}`")]
    LookupTableIndexOutOfRange {
        table: Address,
        index: u8,
        len: usize,
    },
    #[error("lookup table fetch failed: {0}")]
    FetchFailed(String),
    #[error("lookup table fetch was cancelled")]
    Cancelled,
}

/// Externally supplied context for decompilation.
#[derive(Debug, Clone, Default)]
pub struct DecompileConfig {
    /// Full address list per referenced lookup table.
    pub lookup_tables: HashMap<Address, Vec<Address>>,
    /// Block height bound to attach to a recovered blockhash lifetime;
    /// `u64::MAX` when unknown.
    pub last_valid_block_height: Option<u64>,
}

/// Resolves lookup-table contents through a transport.
pub trait LookupTableFetcher {
    fn fetch(
        &self,
        tables: &[Address],
    ) -> Result<HashMap<Address, Vec<Address>>, DecompileError>;
}

/// Fetch the referenced tables, then decompile. The cancellation token is
/// checked once, immediately before the fetch is issued.
pub fn decompile_with_fetcher(
    compiled: &CompiledTransactionMessage,
    fetcher: &dyn LookupTableFetcher,
    cancel: &CancelToken,
    last_valid_block_height: Option<u64>,
) -> Result<TransactionMessage, DecompileError> {
    let tables: Vec<Address> = compiled
        .address_table_lookups
        .iter()
        .map(|lookup| lookup.lookup_table_address)
        .collect();
    let lookup_tables = if tables.is_empty() {
        HashMap::new()
    } else {
        if cancel.is_cancelled() {
            return Err(DecompileError::Cancelled);
        }
        debug!("fetching {} lookup tables", tables.len());
        fetcher.fetch(&tables)?
    };
    decompile_transaction_message(
        compiled,
        &DecompileConfig {
            lookup_tables,
            last_valid_block_height,
        },
    )
}

/// One resolved row of the combined account table.
struct ResolvedAccount {
    address: Address,
    role: AccountRole,
    lookup: Option<(Address, u8)>,
}

pub fn decompile_transaction_message(
    compiled: &CompiledTransactionMessage,
    config: &DecompileConfig,
) -> Result<TransactionMessage, DecompileError> {
    let accounts = resolve_account_table(compiled, config)?;
    let num_signers = usize::from(compiled.header.num_signer_accounts);
    if num_signers == 0 || accounts.is_empty() {
        return Err(DecompileError::MissingFeePayer);
    }
    let fee_payer = accounts[0].address;
    let static_len = compiled.static_accounts.len();

    let mut instructions = Vec::with_capacity(compiled.instructions.len());
    for compiled_instruction in &compiled.instructions {
        let program_index = usize::from(compiled_instruction.program_address_index);
        if program_index >= static_len {
            return Err(DecompileError::ProgramIndexOutOfRange {
                index: compiled_instruction.program_address_index,
            });
        }
        let program_address = accounts[program_index].address;

        let referenced = compiled_instruction
            .account_indices
            .iter()
            .map(|&index| {
                let account = accounts.get(usize::from(index)).ok_or(
                    DecompileError::AccountIndexOutOfRange { index },
                )?;
                Ok(match account.lookup {
                    Some((lookup_table_address, address_index)) => {
                        InstructionAccount::Lookup(AccountLookupMeta {
                            address: account.address,
                            role: account.role,
                            lookup_table_address,
                            address_index,
                        })
                    }
                    None => InstructionAccount::Static(AccountMeta::new(
                        account.address,
                        account.role,
                    )),
                })
            })
            .collect::<Result<Vec<_>, DecompileError>>()?;

        // The wire always carries both fields, so they come back present
        // even when empty.
        instructions.push(Instruction {
            program_address,
            accounts: Some(referenced),
            data: Some(compiled_instruction.data.clone()),
        });
    }

    let lifetime = recover_lifetime(compiled, &instructions, config);
    let mut message = TransactionMessage::new(compiled.version).with_fee_payer(fee_payer);
    // Assign the lifetime directly: the instruction list already carries the
    // advance-nonce instruction when this is a nonce transaction.
    message = match lifetime {
        Lifetime::Blockhash {
            blockhash,
            last_valid_block_height,
        } => message.with_blockhash_lifetime(blockhash, last_valid_block_height),
        Lifetime::DurableNonce {
            nonce,
            nonce_account,
            nonce_authority,
        } => message.with_durable_nonce_lifetime(nonce, nonce_account, nonce_authority),
    };
    // Skip the advance-nonce instruction the lifetime setter installed.
    let skip = match message.lifetime() {
        Some(Lifetime::DurableNonce { .. }) => 1,
        _ => 0,
    };
    Ok(message.appending_instructions(instructions.into_iter().skip(skip)))
}

fn resolve_account_table(
    compiled: &CompiledTransactionMessage,
    config: &DecompileConfig,
) -> Result<Vec<ResolvedAccount>, DecompileError> {
    let header = &compiled.header;
    let static_len = compiled.static_accounts.len();
    let num_signers = usize::from(header.num_signer_accounts);
    let num_readonly_signers = usize::from(header.num_readonly_signer_accounts);
    let num_readonly_non_signers = usize::from(header.num_readonly_non_signer_accounts);

    let mut accounts = Vec::with_capacity(static_len);
    for (position, address) in compiled.static_accounts.iter().enumerate() {
        let role = if position < num_signers {
            let writable = position < num_signers.saturating_sub(num_readonly_signers);
            if writable {
                AccountRole::WritableSigner
            } else {
                AccountRole::ReadonlySigner
            }
        } else {
            let non_signer_position = position - num_signers;
            let num_writable = (static_len - num_signers).saturating_sub(num_readonly_non_signers);
            if non_signer_position < num_writable {
                AccountRole::Writable
            } else {
                AccountRole::Readonly
            }
        };
        accounts.push(ResolvedAccount {
            address: *address,
            role,
            lookup: None,
        });
    }

    for lookup in &compiled.address_table_lookups {
        let table = &lookup.lookup_table_address;
        let contents = config
            .lookup_tables
            .get(table)
            .ok_or(DecompileError::LookupTableContentsMissing(*table))?;
        for (indices, role) in [
            (&lookup.writable_indices, AccountRole::Writable),
            (&lookup.readonly_indices, AccountRole::Readonly),
        ] {
            for &index in indices {
                let address = contents.get(usize::from(index)).ok_or(
                    DecompileError::LookupTableIndexOutOfRange {
                        table: *table,
                        index,
                        len: contents.len(),
                    },
                )?;
                accounts.push(ResolvedAccount {
                    address: *address,
                    role,
                    lookup: Some((*table, index)),
                });
            }
        }
    }
    Ok(accounts)
}

fn recover_lifetime(
    compiled: &CompiledTransactionMessage,
    instructions: &[Instruction],
    config: &DecompileConfig,
) -> Lifetime {
    if let Some(first) = instructions.first() {
        if system::is_advance_nonce_instruction(first) {
            let accounts = first.accounts();
            return Lifetime::DurableNonce {
                nonce: Nonce::new_from_array(compiled.lifetime_token),
                nonce_account: *accounts[0].address(),
                nonce_authority: *accounts[2].address(),
            };
        }
    }
    Lifetime::Blockhash {
        blockhash: Blockhash::new_from_array(compiled.lifetime_token),
        last_valid_block_height: config.last_valid_block_height.unwrap_or(u64::MAX),
    }
}
