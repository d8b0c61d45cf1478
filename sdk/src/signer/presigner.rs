//! A signature produced out-of-band, wrapped as a partial signer that
//! verifies itself against whatever it is asked to sign.

use crate::{
    address::Address,
    signature::Signature,
    signer::{SignerCapabilities, SignerError, TransactionSigner},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presigner {
    address: Address,
    signature: Signature,
}

impl Presigner {
    pub fn new(address: Address, signature: Signature) -> Self {
        Self { address, signature }
    }
}

impl TransactionSigner for Presigner {
    fn address(&self) -> Address {
        self.address
    }

    fn capabilities(&self) -> SignerCapabilities {
        SignerCapabilities::partial_only()
    }

    fn sign_partial(&self, message_bytes: &[u8]) -> Result<Signature, SignerError> {
        if self.signature.verify(&self.address, message_bytes) {
            Ok(self.signature)
        } else {
            Err(SignerError::VerificationFailure(self.address))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::Keypair;

    #[test]
    fn test_returns_signature_when_it_verifies() {
        let keypair = Keypair::generate();
        let signature = keypair.sign_message(b"payload");
        let presigner = Presigner::new(keypair.address(), signature);
        assert_eq!(presigner.sign_partial(b"payload"), Ok(signature));
    }

    #[test]
    fn test_rejects_mismatched_message() {
        let keypair = Keypair::generate();
        let presigner = Presigner::new(keypair.address(), keypair.sign_message(b"payload"));
        assert_eq!(
            presigner.sign_partial(b"different"),
            Err(SignerError::VerificationFailure(keypair.address()))
        );
    }
}
