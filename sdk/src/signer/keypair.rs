//! An ed25519 keypair acting as a partial signer.

use {
    crate::{
        address::Address,
        signature::Signature,
        signer::{SignerCapabilities, SignerError, TransactionSigner},
    },
    ed25519_dalek::{Signer as DalekSigner, SigningKey, SECRET_KEY_LENGTH},
    rand::rngs::OsRng,
};

pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn address(&self) -> Address {
        Address::new_from_array(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign_message(&self, message: &[u8]) -> Signature {
        Signature::new_from_array(self.signing_key.sign(message).to_bytes())
    }
}

impl TransactionSigner for Keypair {
    fn address(&self) -> Address {
        self.address()
    }

    fn capabilities(&self) -> SignerCapabilities {
        SignerCapabilities::partial_only()
    }

    fn sign_partial(&self, message_bytes: &[u8]) -> Result<Signature, SignerError> {
        Ok(self.sign_message(message_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_verifies_against_address() {
        let keypair = Keypair::generate();
        let signature = keypair.sign_message(b"hello");
        assert!(signature.verify(&keypair.address(), b"hello"));
        assert!(!signature.verify(&keypair.address(), b"tampered"));
    }

    #[test]
    fn test_from_seed_is_deterministic() {
        let seed = [7u8; SECRET_KEY_LENGTH];
        let a = Keypair::from_seed(&seed);
        let b = Keypair::from_seed(&seed);
        assert_eq!(a.address(), b.address());
        assert_eq!(a.sign_message(b"x"), b.sign_message(b"x"));
    }

    #[test]
    fn test_acts_as_partial_signer() {
        let keypair = Keypair::generate();
        let signature = keypair.sign_partial(b"message").unwrap();
        assert!(signature.verify(&TransactionSigner::address(&keypair), b"message"));
    }
}
