//! Categorizes a group of signers and applies them in the deterministic
//! order the wire contract requires: modifying signers in sequence, partial
//! signers against the final message, then an optional hand-off to the one
//! sending signer.

use {
    crate::{
        cancel::CancelToken,
        message::TransactionMessage,
        signature::Signature,
        signer::{SignerError, TransactionSigner},
        transaction::{compile_transaction, Transaction},
    },
    log::debug,
};

struct CategorizedSigners<'a> {
    sending: Option<&'a dyn TransactionSigner>,
    modifying: Vec<&'a dyn TransactionSigner>,
    partial: Vec<&'a dyn TransactionSigner>,
}

fn same_object(a: &dyn TransactionSigner, b: &dyn TransactionSigner) -> bool {
    std::ptr::eq(
        (a as *const dyn TransactionSigner).cast::<u8>(),
        (b as *const dyn TransactionSigner).cast::<u8>(),
    )
}

/// Duplicate addresses are fine when they refer to the same signer object;
/// two distinct objects for one address is unresolvable.
fn dedupe<'a>(
    signers: &[&'a dyn TransactionSigner],
) -> Result<Vec<&'a dyn TransactionSigner>, SignerError> {
    let mut unique: Vec<&dyn TransactionSigner> = Vec::new();
    for &signer in signers {
        match unique
            .iter()
            .find(|candidate| candidate.address() == signer.address())
        {
            Some(existing) => {
                if !same_object(*existing, signer) {
                    return Err(SignerError::AmbiguousSigner(signer.address()));
                }
            }
            None => unique.push(signer),
        }
    }
    Ok(unique)
}

fn categorize<'a>(
    signers: &[&'a dyn TransactionSigner],
    select_sending: bool,
) -> Result<CategorizedSigners<'a>, SignerError> {
    let unique = dedupe(signers)?;

    let sending = if select_sending {
        let sending_capable: Vec<_> = unique
            .iter()
            .copied()
            .filter(|signer| signer.capabilities().sending)
            .collect();
        match sending_capable
            .iter()
            .copied()
            .find(|signer| signer.capabilities().is_sending_only())
        {
            Some(sending_only) => Some(sending_only),
            None if sending_capable.len() > 1 => {
                return Err(SignerError::MultipleSendingSigners)
            }
            None => sending_capable.first().copied(),
        }
    } else {
        None
    };

    let rest: Vec<_> = unique
        .into_iter()
        .filter(|signer| !sending.is_some_and(|selected| same_object(selected, *signer)))
        .collect();

    // Prefer modifiers that cannot fall back to partial signing; only the
    // first modifier runs otherwise, since one mutation pass is applied per
    // attempt.
    let mut modifying: Vec<_> = rest
        .iter()
        .copied()
        .filter(|signer| {
            let capabilities = signer.capabilities();
            capabilities.modifying && !capabilities.partial
        })
        .collect();
    if modifying.is_empty() {
        modifying = rest
            .iter()
            .copied()
            .filter(|signer| signer.capabilities().modifying)
            .take(1)
            .collect();
    }

    let partial: Vec<_> = rest
        .iter()
        .copied()
        .filter(|signer| signer.capabilities().partial)
        .filter(|signer| !modifying.iter().any(|modifier| same_object(*modifier, *signer)))
        .collect();

    Ok(CategorizedSigners {
        sending,
        modifying,
        partial,
    })
}

fn signed_transaction<'a>(
    signers: &[&'a dyn TransactionSigner],
    message: &TransactionMessage,
    select_sending: bool,
) -> Result<(Transaction, Option<&'a dyn TransactionSigner>), SignerError> {
    let categorized = categorize(signers, select_sending)?;
    let mut transaction = compile_transaction(message)?;

    debug!(
        "signing with {} modifying and {} partial signers",
        categorized.modifying.len(),
        categorized.partial.len()
    );
    for modifier in &categorized.modifying {
        transaction = modifier.modify_and_sign(transaction)?;
    }

    let mut collected = Vec::with_capacity(categorized.partial.len());
    for partial in &categorized.partial {
        let signature = partial.sign_partial(transaction.message_bytes())?;
        collected.push((partial.address(), signature));
    }
    let transaction = transaction.with_signatures(collected)?;
    Ok((transaction, categorized.sending))
}

/// Apply every applicable signer and return the (possibly still incomplete)
/// transaction. Sending-only signers take no part here.
pub fn partially_sign_transaction(
    signers: &[&dyn TransactionSigner],
    message: &TransactionMessage,
) -> Result<Transaction, SignerError> {
    signed_transaction(signers, message, false).map(|(transaction, _)| transaction)
}

/// Like [`partially_sign_transaction`], then require every slot signed.
pub fn sign_transaction(
    signers: &[&dyn TransactionSigner],
    message: &TransactionMessage,
) -> Result<Transaction, SignerError> {
    let transaction = partially_sign_transaction(signers, message)?;
    transaction.assert_fully_signed()?;
    Ok(transaction)
}

/// Sign, then hand the merged transaction to the selected sending signer.
/// The cancellation token is checked immediately before the send.
pub fn sign_and_send_transaction(
    signers: &[&dyn TransactionSigner],
    message: &TransactionMessage,
    cancel: &CancelToken,
) -> Result<Signature, SignerError> {
    let (transaction, sending) = signed_transaction(signers, message, true)?;
    let sending = sending.ok_or(SignerError::MissingSendingSigner)?;
    if cancel.is_cancelled() {
        return Err(SignerError::Cancelled);
    }
    debug!("routing transaction to sending signer {}", sending.address());
    sending.sign_and_send(&transaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        address::Address,
        blockhash::Blockhash,
        instruction::{AccountMeta, AccountRole, Instruction, InstructionAccount},
        message::TransactionVersion,
        signer::SignerCapabilities,
    };
    use std::cell::Cell;

    struct StubSigner {
        address: Address,
        capabilities: SignerCapabilities,
        sends: Cell<u32>,
    }

    impl StubSigner {
        fn new(capabilities: SignerCapabilities) -> Self {
            Self {
                address: Address::new_unique(),
                capabilities,
                sends: Cell::new(0),
            }
        }
    }

    impl TransactionSigner for StubSigner {
        fn address(&self) -> Address {
            self.address
        }

        fn capabilities(&self) -> SignerCapabilities {
            self.capabilities
        }

        fn sign_partial(&self, _message_bytes: &[u8]) -> Result<Signature, SignerError> {
            Ok(Signature::new_unique())
        }

        fn modify_and_sign(&self, transaction: Transaction) -> Result<Transaction, SignerError> {
            transaction
                .with_signatures([(self.address, Signature::new_unique())])
                .map_err(SignerError::from)
        }

        fn sign_and_send(&self, _transaction: &Transaction) -> Result<Signature, SignerError> {
            self.sends.set(self.sends.get() + 1);
            Ok(Signature::new_unique())
        }
    }

    fn message_requiring(signers: &[Address]) -> TransactionMessage {
        let accounts = signers[1..]
            .iter()
            .map(|address| {
                InstructionAccount::Static(AccountMeta::new(
                    *address,
                    AccountRole::WritableSigner,
                ))
            })
            .collect();
        TransactionMessage::new(TransactionVersion::Legacy)
            .with_fee_payer(signers[0])
            .with_blockhash_lifetime(Blockhash::new_unique(), 1)
            .appending_instruction(Instruction::new(Address::new_unique(), accounts, vec![]))
    }

    #[test]
    fn test_partial_signers_fill_their_slots() {
        let a = StubSigner::new(SignerCapabilities::partial_only());
        let b = StubSigner::new(SignerCapabilities::partial_only());
        let message = message_requiring(&[a.address, b.address]);
        let transaction = partially_sign_transaction(&[&a, &b], &message).unwrap();
        assert!(transaction.is_fully_signed());
    }

    #[test]
    fn test_sign_transaction_requires_every_slot() {
        let a = StubSigner::new(SignerCapabilities::partial_only());
        let absent = Address::new_unique();
        let message = message_requiring(&[a.address, absent]);
        assert!(partially_sign_transaction(&[&a], &message).is_ok());
        assert!(matches!(
            sign_transaction(&[&a], &message),
            Err(SignerError::Transaction(_))
        ));
    }

    #[test]
    fn test_same_object_twice_is_fine_different_objects_fail() {
        let a = StubSigner::new(SignerCapabilities::partial_only());
        let message = message_requiring(&[a.address]);
        assert!(partially_sign_transaction(&[&a, &a], &message).is_ok());

        let impostor = StubSigner {
            address: a.address,
            capabilities: SignerCapabilities::partial_only(),
            sends: Cell::new(0),
        };
        assert_eq!(
            partially_sign_transaction(&[&a, &impostor], &message),
            Err(SignerError::AmbiguousSigner(a.address))
        );
    }

    #[test]
    fn test_sending_signer_selection_prefers_sending_only() {
        let fee_payer = StubSigner::new(SignerCapabilities::partial_only());
        let hybrid = StubSigner {
            address: Address::new_unique(),
            capabilities: SignerCapabilities {
                partial: true,
                modifying: false,
                sending: true,
            },
            sends: Cell::new(0),
        };
        let sender = StubSigner::new(SignerCapabilities::sending_only());
        let message = message_requiring(&[fee_payer.address, hybrid.address, sender.address]);

        // Hybrid stays a partial signer; the sending-only signer sends.
        // Its slot is left for the network to fill, so only assert routing.
        let result = sign_and_send_transaction(
            &[&fee_payer, &hybrid, &sender],
            &message,
            &CancelToken::new(),
        );
        assert!(result.is_ok());
        assert_eq!(sender.sends.get(), 1);
        assert_eq!(hybrid.sends.get(), 0);
    }

    #[test]
    fn test_multiple_sending_capable_without_sending_only_fails() {
        let a = StubSigner {
            address: Address::new_unique(),
            capabilities: SignerCapabilities {
                partial: true,
                modifying: false,
                sending: true,
            },
            sends: Cell::new(0),
        };
        let b = StubSigner {
            address: Address::new_unique(),
            capabilities: SignerCapabilities {
                partial: true,
                modifying: false,
                sending: true,
            },
            sends: Cell::new(0),
        };
        let message = message_requiring(&[a.address, b.address]);
        assert_eq!(
            sign_and_send_transaction(&[&a, &b], &message, &CancelToken::new()),
            Err(SignerError::MultipleSendingSigners)
        );
    }

    #[test]
    fn test_missing_sending_signer_fails() {
        let a = StubSigner::new(SignerCapabilities::partial_only());
        let message = message_requiring(&[a.address]);
        assert_eq!(
            sign_and_send_transaction(&[&a], &message, &CancelToken::new()),
            Err(SignerError::MissingSendingSigner)
        );
    }

    #[test]
    fn test_cancellation_blocks_the_send() {
        let fee_payer = StubSigner::new(SignerCapabilities::partial_only());
        let sender = StubSigner::new(SignerCapabilities::sending_only());
        let message = message_requiring(&[fee_payer.address, sender.address]);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            sign_and_send_transaction(&[&fee_payer, &sender], &message, &cancel),
            Err(SignerError::Cancelled)
        );
        assert_eq!(sender.sends.get(), 0);
    }

    #[test]
    fn test_modifying_prefers_non_partial_with_first_fallback() {
        // Only hybrid modifying-and-partial signers: exactly one modifies,
        // the other partial-signs.
        let a = StubSigner {
            address: Address::new_unique(),
            capabilities: SignerCapabilities {
                partial: true,
                modifying: true,
                sending: false,
            },
            sends: Cell::new(0),
        };
        let b = StubSigner {
            address: Address::new_unique(),
            capabilities: SignerCapabilities {
                partial: true,
                modifying: true,
                sending: false,
            },
            sends: Cell::new(0),
        };
        let message = message_requiring(&[a.address, b.address]);
        let transaction = partially_sign_transaction(&[&a, &b], &message).unwrap();
        // Both slots end up signed: one via the modify pass, one partially.
        assert!(transaction.is_fully_signed());

        // With a dedicated modifier present, hybrids all sign partially.
        let dedicated = StubSigner::new(SignerCapabilities::modifying_only());
        let message =
            message_requiring(&[a.address, b.address, dedicated.address]);
        let transaction = partially_sign_transaction(&[&a, &b, &dedicated], &message).unwrap();
        assert!(transaction.is_fully_signed());
    }
}
