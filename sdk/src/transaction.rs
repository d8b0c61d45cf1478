//! The signable transaction container: one signature slot per required
//! signer, in message order, plus the encoded message bytes.

use {
    crate::{
        address::Address,
        message::{compiled::CompiledTransactionMessage, CompileError, TransactionMessage},
        signature::{Signature, SignatureCodec, SIGNATURE_BYTES},
    },
    quill_codecs::{short_u16, CodecError, Decoder, Encoder},
    serde::{Deserialize, Serialize},
    thiserror::Error,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("signature count {actual} does not match the {expected} required signers")]
    SignatureCountMismatch { expected: usize, actual: usize },
    #[error("address `{0}` is not a required signer of this transaction")]
    UnexpectedSigner(Address),
    #[error("missing signatures for addresses: {0:?}")]
    MissingSignatures(Vec<Address>),
}

/// Invariant: the slot addresses equal the signer addresses implied by
/// `message_bytes`, in the message's signer order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    signatures: Vec<(Address, Option<Signature>)>,
    message_bytes: Vec<u8>,
}

impl Transaction {
    pub fn new(signer_addresses: Vec<Address>, message_bytes: Vec<u8>) -> Self {
        Self {
            signatures: signer_addresses
                .into_iter()
                .map(|address| (address, None))
                .collect(),
            message_bytes,
        }
    }

    pub fn signatures(&self) -> &[(Address, Option<Signature>)] {
        &self.signatures
    }

    pub fn signer_addresses(&self) -> impl Iterator<Item = &Address> {
        self.signatures.iter().map(|(address, _)| address)
    }

    pub fn message_bytes(&self) -> &[u8] {
        &self.message_bytes
    }

    /// A copy with `signatures` merged into the matching slots. Existing
    /// signatures survive unless the new map carries a replacement.
    pub fn with_signatures(
        &self,
        signatures: impl IntoIterator<Item = (Address, Signature)>,
    ) -> Result<Self, TransactionError> {
        let mut next = self.clone();
        for (address, signature) in signatures {
            let slot = next
                .signatures
                .iter_mut()
                .find(|(slot_address, _)| slot_address == &address)
                .ok_or(TransactionError::UnexpectedSigner(address))?;
            slot.1 = Some(signature);
        }
        Ok(next)
    }

    /// A copy with new message bytes and the slot set re-derived from them.
    /// Signatures for addresses that remain required signers are kept.
    pub fn with_message_bytes(&self, message_bytes: Vec<u8>) -> Result<Self, TransactionError> {
        let message = CompiledTransactionMessage::decode(&message_bytes)?;
        let signatures = message
            .signer_addresses()
            .iter()
            .map(|address| {
                let existing = self
                    .signatures
                    .iter()
                    .find(|(slot_address, _)| slot_address == address)
                    .and_then(|(_, signature)| *signature);
                (*address, existing)
            })
            .collect();
        Ok(Self {
            signatures,
            message_bytes,
        })
    }

    pub fn is_fully_signed(&self) -> bool {
        self.signatures.iter().all(|(_, signature)| signature.is_some())
    }

    pub fn missing_signer_addresses(&self) -> Vec<Address> {
        self.signatures
            .iter()
            .filter(|(_, signature)| signature.is_none())
            .map(|(address, _)| *address)
            .collect()
    }

    pub fn assert_fully_signed(&self) -> Result<(), TransactionError> {
        let missing = self.missing_signer_addresses();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TransactionError::MissingSignatures(missing))
        }
    }

    /// Wire form: shortU16 slot count, 64 bytes per slot (zero-filled while
    /// unsigned), then the raw message bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let size = short_u16::len_size(self.signatures.len())
            + self.signatures.len() * SIGNATURE_BYTES
            + self.message_bytes.len();
        let mut buf = vec![0u8; size];
        let mut offset = short_u16::write_len(self.signatures.len(), &mut buf, 0)?;
        for (_, signature) in &self.signatures {
            offset = SignatureCodec.write(&signature.unwrap_or_default(), &mut buf, offset)?;
        }
        buf[offset..].copy_from_slice(&self.message_bytes);
        Ok(buf)
    }

    /// Inverts [`encode`](Self::encode), re-deriving the slot addresses from
    /// the embedded message. All-zero signatures decode as unsigned slots.
    pub fn decode(buf: &[u8]) -> Result<Self, TransactionError> {
        let (count, mut offset) = short_u16::read_len(buf, 0)?;
        let mut raw_signatures = Vec::with_capacity(count);
        for _ in 0..count {
            let (signature, next) = SignatureCodec.read(buf, offset)?;
            raw_signatures.push(signature);
            offset = next;
        }
        let message_bytes = buf[offset..].to_vec();
        let message = CompiledTransactionMessage::decode(&message_bytes)?;
        let signer_addresses = message.signer_addresses();
        if signer_addresses.len() != count {
            return Err(TransactionError::SignatureCountMismatch {
                expected: signer_addresses.len(),
                actual: count,
            });
        }
        let signatures = signer_addresses
            .iter()
            .zip(raw_signatures)
            .map(|(address, signature)| {
                let present = signature.to_bytes() != [0u8; SIGNATURE_BYTES];
                (*address, present.then_some(signature))
            })
            .collect();
        Ok(Self {
            signatures,
            message_bytes,
        })
    }
}

/// Compile a message and open one unsigned slot per required signer.
pub fn compile_transaction(message: &TransactionMessage) -> Result<Transaction, TransactionError> {
    let compiled = CompiledTransactionMessage::compile(message)?;
    let signer_addresses = compiled.signer_addresses().to_vec();
    let message_bytes = compiled.encode()?;
    Ok(Transaction::new(signer_addresses, message_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        blockhash::Blockhash,
        instruction::{AccountMeta, AccountRole, Instruction, InstructionAccount},
        message::TransactionVersion,
    };

    fn sample_message(fee_payer: Address, co_signer: Address) -> TransactionMessage {
        TransactionMessage::new(TransactionVersion::Legacy)
            .with_fee_payer(fee_payer)
            .with_blockhash_lifetime(Blockhash::new_unique(), 10)
            .appending_instruction(Instruction::new(
                Address::new_unique(),
                vec![InstructionAccount::Static(AccountMeta::new(
                    co_signer,
                    AccountRole::WritableSigner,
                ))],
                vec![1],
            ))
    }

    #[test]
    fn test_compile_opens_one_slot_per_signer() {
        let fee_payer = Address::new_unique();
        let co_signer = Address::new_unique();
        let transaction = compile_transaction(&sample_message(fee_payer, co_signer)).unwrap();
        assert_eq!(
            transaction.signer_addresses().collect::<Vec<_>>(),
            vec![&fee_payer, &co_signer]
        );
        assert!(!transaction.is_fully_signed());
        assert_eq!(
            transaction.missing_signer_addresses(),
            vec![fee_payer, co_signer]
        );
    }

    #[test]
    fn test_with_signatures_merges_without_mutation() {
        let fee_payer = Address::new_unique();
        let co_signer = Address::new_unique();
        let unsigned = compile_transaction(&sample_message(fee_payer, co_signer)).unwrap();

        let first = Signature::new_unique();
        let partly = unsigned.with_signatures([(fee_payer, first)]).unwrap();
        assert!(unsigned.missing_signer_addresses().contains(&fee_payer));
        assert_eq!(partly.missing_signer_addresses(), vec![co_signer]);

        let fully = partly
            .with_signatures([(co_signer, Signature::new_unique())])
            .unwrap();
        assert!(fully.is_fully_signed());
        assert!(fully.assert_fully_signed().is_ok());
        // The earlier signature survived the second merge.
        assert_eq!(fully.signatures()[0].1, Some(first));
    }

    #[test]
    fn test_with_signatures_rejects_unknown_address() {
        let transaction =
            compile_transaction(&sample_message(Address::new_unique(), Address::new_unique()))
                .unwrap();
        let stranger = Address::new_unique();
        assert_eq!(
            transaction.with_signatures([(stranger, Signature::new_unique())]),
            Err(TransactionError::UnexpectedSigner(stranger))
        );
    }

    #[test]
    fn test_wire_round_trip_with_partial_signatures() {
        let fee_payer = Address::new_unique();
        let co_signer = Address::new_unique();
        let transaction = compile_transaction(&sample_message(fee_payer, co_signer))
            .unwrap()
            .with_signatures([(fee_payer, Signature::new_unique())])
            .unwrap();

        let bytes = transaction.encode().unwrap();
        // Two slots: the second is zero-filled.
        assert_eq!(bytes[0], 2);
        assert!(bytes[1 + 64..1 + 128].iter().all(|byte| *byte == 0));

        let decoded = Transaction::decode(&bytes).unwrap();
        assert_eq!(decoded, transaction);
    }

    #[test]
    fn test_decode_rejects_cardinality_mismatch() {
        let transaction =
            compile_transaction(&sample_message(Address::new_unique(), Address::new_unique()))
                .unwrap();
        let mut bytes = transaction.encode().unwrap();
        // Claim one signature slot but leave the two-signer message intact.
        bytes[0] = 1;
        bytes.drain(1 + 64..1 + 128);
        assert_eq!(
            Transaction::decode(&bytes),
            Err(TransactionError::SignatureCountMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_assert_fully_signed_lists_missing() {
        let fee_payer = Address::new_unique();
        let co_signer = Address::new_unique();
        let transaction = compile_transaction(&sample_message(fee_payer, co_signer))
            .unwrap()
            .with_signatures([(fee_payer, Signature::new_unique())])
            .unwrap();
        assert_eq!(
            transaction.assert_fully_signed(),
            Err(TransactionError::MissingSignatures(vec![co_signer]))
        );
    }
}
