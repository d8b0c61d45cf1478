//! Client-side transaction construction for an ed25519-signed, base58-addressed
//! chain: build a message out of instructions, compile it to its canonical wire
//! bytes, collect signatures, and hand the result to a sending signer.
//!
//! The flow is deliberately one-directional:
//!
//! 1. assemble a [`TransactionMessage`] from [`Instruction`]s, a fee payer and
//!    a lifetime,
//! 2. [`compile_transaction`] it into a [`Transaction`] with one signature
//!    slot per required signer,
//! 3. apply [`TransactionSigner`]s through the functions in [`signer`],
//! 4. [`Transaction::encode`] for the wire.
//!
//! [`decompile_transaction_message`] inverts step 2 for inspection of
//! transactions received off the wire.

pub mod address;
pub mod blockhash;
pub mod cancel;
pub mod instruction;
pub mod lamports;
pub mod message;
pub mod signature;
pub mod signer;
pub mod system;
pub mod transaction;

pub use {
    address::Address,
    blockhash::{Blockhash, Nonce},
    cancel::CancelToken,
    instruction::{AccountLookupMeta, AccountMeta, AccountRole, Instruction, InstructionAccount},
    lamports::Lamports,
    message::{
        decompile_transaction_message, CompiledTransactionMessage, Lifetime, TransactionMessage,
        TransactionVersion,
    },
    signature::Signature,
    signer::{
        partially_sign_transaction, sign_and_send_transaction, sign_transaction, Keypair,
        Presigner, SignerCapabilities, SignerError, TransactionSigner,
    },
    transaction::{compile_transaction, Transaction, TransactionError},
};
