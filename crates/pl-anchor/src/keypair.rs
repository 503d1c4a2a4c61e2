//! Ed25519 process keypair used to sign anchor transactions.

use crate::base58;
use crate::AnchorError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Generate a new Ed25519 keypair.
///
/// Returns (private_key_bytes, public_key_bytes).
pub fn keygen() -> ([u8; 32], [u8; 32]) {
    let private_bytes: [u8; 32] = rand::random();
    let signing_key = SigningKey::from_bytes(&private_bytes);
    let public_bytes = signing_key.verifying_key().to_bytes();
    (private_bytes, public_bytes)
}

/// On-disk form of a keypair: hex-encoded key material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeypairFile {
    pub private_key: String,
    pub public_key: String,
}

/// The keypair held by the anchor for the lifetime of the process.
pub struct AnchorKeypair {
    signing_key: SigningKey,
}

impl AnchorKeypair {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        let (private_key, _) = keygen();
        Self::from_private_bytes(&private_key)
    }

    pub fn from_private_bytes(private_key: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(private_key),
        }
    }

    /// Raw 32-byte public key.
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Public key rendered as an address.
    pub fn public_key_base58(&self) -> String {
        base58::encode(&self.public_key())
    }

    /// Sign arbitrary bytes, returning the 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    pub fn to_file_format(&self) -> KeypairFile {
        KeypairFile {
            private_key: hex::encode(self.signing_key.to_bytes()),
            public_key: hex::encode(self.public_key()),
        }
    }

    /// Load a keypair written by [`AnchorKeypair::save`] or `pl keygen`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AnchorError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let file: KeypairFile = serde_json::from_str(&contents)?;
        let bytes = hex::decode(&file.private_key)
            .map_err(|e| AnchorError::InvalidKey(format!("private key is not hex: {e}")))?;
        let private_key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AnchorError::InvalidKey("private key must be 32 bytes".to_string()))?;

        let keypair = Self::from_private_bytes(&private_key);
        if hex::encode(keypair.public_key()) != file.public_key.to_lowercase() {
            return Err(AnchorError::InvalidKey(
                "public key does not match private key".to_string(),
            ));
        }
        Ok(keypair)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), AnchorError> {
        let json = serde_json::to_string_pretty(&self.to_file_format())?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

impl std::fmt::Debug for AnchorKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnchorKeypair")
            .field("public_key", &self.public_key_base58())
            .finish_non_exhaustive()
    }
}

/// Verify a 64-byte signature against a public key.
pub fn verify_signature(message: &[u8], signature: &[u8; 64], public_key: &[u8; 32]) -> bool {
    let verifying_key = match VerifyingKey::from_bytes(public_key) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let signature = ed25519_dalek::Signature::from_bytes(signature);
    verifying_key.verify(message, &signature).is_ok()
}
