use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::encoding::CanonicalEncode;
use super::transaction::Transaction;

/// Errors that can occur while decoding keys and signatures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// Represents a digital signature (hex encoded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DigitalSignature(pub String);

impl DigitalSignature {
    /// Creates a new digital signature from a signature
    pub fn from_signature(signature: &Signature) -> Self {
        DigitalSignature(hex::encode(signature.to_bytes()))
    }

    /// Converts the digital signature to a signature
    pub fn to_signature(&self) -> Result<Signature, CryptoError> {
        let bytes = hex::decode(&self.0).map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        let signature_bytes: [u8; 64] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidSignature("Invalid signature length".to_string())
        })?;

        Ok(Signature::from_bytes(&signature_bytes))
    }
}

/// Decodes a hex encoded public key
pub fn public_key_from_hex(public_key: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = hex::decode(public_key).map_err(|e| CryptoError::DecodingError(e.to_string()))?;

    let key_bytes: [u8; 32] = bytes.try_into().map_err(|_| {
        CryptoError::InvalidPublicKey("Invalid public key length".to_string())
    })?;

    VerifyingKey::from_bytes(&key_bytes).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

/// An elliptic-curve keypair, not tied to any ledger account
#[derive(Debug, Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generates a fresh keypair
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let verifying_key = signing_key.verifying_key();

        KeyPair {
            signing_key,
            verifying_key,
        }
    }

    /// Restores a keypair from a hex encoded secret key
    pub fn from_secret_hex(secret_key: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(secret_key).map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        let bytes_array: [u8; 32] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidPrivateKey("Invalid private key length".to_string())
        })?;

        let signing_key = SigningKey::from_bytes(&bytes_array);
        let verifying_key = signing_key.verifying_key();

        Ok(KeyPair {
            signing_key,
            verifying_key,
        })
    }

    pub fn public_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.as_bytes())
    }

    /// Exports the secret key as hex
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Signs the canonical bytes of `transaction`
    pub fn sign_transaction(&self, transaction: &Transaction) -> DigitalSignature {
        let signature = self.signing_key.sign(&transaction.canonical_bytes());
        DigitalSignature::from_signature(&signature)
    }
}

/// Outcome of checking a transaction signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Verified,
    /// Well-formed signature that does not match the payload and key
    SignatureInvalid,
    /// Signature or key bytes could not be decoded
    MalformedInput(CryptoError),
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified)
    }
}

/// Checks `signature` over the canonical bytes of `transaction`
pub fn check_transaction_signature(
    transaction: &Transaction,
    signature: &DigitalSignature,
    public_key: &str,
) -> Verification {
    let public_key = match public_key_from_hex(public_key) {
        Ok(key) => key,
        Err(err) => return Verification::MalformedInput(err),
    };
    let signature = match signature.to_signature() {
        Ok(signature) => signature,
        Err(err) => return Verification::MalformedInput(err),
    };

    match public_key.verify(&transaction.canonical_bytes(), &signature) {
        Ok(_) => Verification::Verified,
        Err(_) => Verification::SignatureInvalid,
    }
}

/// Verifies a transaction signature, collapsing every failure to `false`
pub fn verify_transaction(
    transaction: &Transaction,
    signature: &DigitalSignature,
    public_key: &str,
) -> bool {
    check_transaction_signature(transaction, signature, public_key).is_verified()
}
