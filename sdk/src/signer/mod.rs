//! Signing authorities and the protocol that sequences them.
//!
//! A signer declares its capability set at construction; the protocol in
//! [`protocol`] categorizes a group of signers once per signing attempt and
//! applies them in a deterministic order.

pub mod keypair;
pub mod presigner;
pub mod protocol;

pub use {
    keypair::Keypair,
    presigner::Presigner,
    protocol::{partially_sign_transaction, sign_and_send_transaction, sign_transaction},
};

use {
    crate::{
        address::Address,
        signature::Signature,
        transaction::{Transaction, TransactionError},
    },
    thiserror::Error,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("signer does not support {0} signing")]
    UnsupportedOperation(&'static str),
    #[error("two different signers claim the address `{0}`")]
    AmbiguousSigner(Address),
    #[error("multiple sending signers and none is sending-only")]
    MultipleSendingSigners,
    #[error("a sending signer is required but none was provided")]
    MissingSendingSigner,
    #[error("signature by `{0}` does not verify against the message")]
    VerificationFailure(Address),
    #[error("signing was cancelled")]
    Cancelled,
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

/// Which of the three signing operations a signer supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignerCapabilities {
    /// Produces a signature over the message bytes without touching the
    /// transaction.
    pub partial: bool,
    /// May rewrite the transaction before signing it.
    pub modifying: bool,
    /// Submits the transaction to the network.
    pub sending: bool,
}

impl SignerCapabilities {
    pub const fn partial_only() -> Self {
        Self {
            partial: true,
            modifying: false,
            sending: false,
        }
    }

    pub const fn modifying_only() -> Self {
        Self {
            partial: false,
            modifying: true,
            sending: false,
        }
    }

    pub const fn sending_only() -> Self {
        Self {
            partial: false,
            modifying: false,
            sending: true,
        }
    }

    pub const fn is_sending_only(&self) -> bool {
        self.sending && !self.partial && !self.modifying
    }
}

/// A signing authority for exactly one address.
///
/// Default method bodies reject the operation, so implementors only override
/// what their declared capabilities cover.
pub trait TransactionSigner {
    fn address(&self) -> Address;

    fn capabilities(&self) -> SignerCapabilities;

    /// Sign the message bytes of a transaction. Never mutates anything.
    fn sign_partial(&self, _message_bytes: &[u8]) -> Result<Signature, SignerError> {
        Err(SignerError::UnsupportedOperation("partial"))
    }

    /// Rewrite the transaction if needed, returning the (possibly new)
    /// transaction with this signer's signature applied.
    fn modify_and_sign(&self, _transaction: Transaction) -> Result<Transaction, SignerError> {
        Err(SignerError::UnsupportedOperation("modifying"))
    }

    /// Submit the transaction, returning the network-confirmed signature.
    fn sign_and_send(&self, _transaction: &Transaction) -> Result<Signature, SignerError> {
        Err(SignerError::UnsupportedOperation("sending"))
    }
}
