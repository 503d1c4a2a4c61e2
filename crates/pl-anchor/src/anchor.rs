//! Signature minting with external anchoring and local fallback.

use crate::keypair::AnchorKeypair;
use crate::rpc::AnchorTransport;
use crate::transaction::{encode_transaction, self_transfer_message};
use crate::{base58, AnchorError};
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Size of a locally-minted identifier, matching an Ed25519 signature.
pub const LOCAL_SIGNATURE_BYTES: usize = 64;

/// Which path produced a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorOrigin {
    /// Confirmation id returned by the external ledger.
    Anchored,
    /// Random identifier derived in-process.
    Local,
}

/// A minted event identifier together with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintedSignature {
    pub signature: String,
    pub origin: AnchorOrigin,
}

impl MintedSignature {
    pub fn local() -> Self {
        Self {
            signature: local_signature(),
            origin: AnchorOrigin::Local,
        }
    }
}

/// 64 CSPRNG bytes rendered in base58.
pub fn local_signature() -> String {
    let mut bytes = [0u8; LOCAL_SIGNATURE_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    base58::encode(&bytes)
}

/// Produces a unique identifier for each ledger event.
///
/// With a transport configured, each mint submits a zero-lamport self-transfer
/// signed by the process keypair and returns the ledger's confirmation id.
/// Any failure along that path is logged and absorbed: the caller receives a
/// locally-minted identifier instead, in the same textual alphabet.
pub struct SignatureAnchor {
    keypair: AnchorKeypair,
    transport: Option<Box<dyn AnchorTransport>>,
}

impl SignatureAnchor {
    pub fn new(keypair: AnchorKeypair, transport: Box<dyn AnchorTransport>) -> Self {
        Self {
            keypair,
            transport: Some(transport),
        }
    }

    /// An anchor that never contacts an external ledger.
    pub fn local_only(keypair: AnchorKeypair) -> Self {
        Self {
            keypair,
            transport: None,
        }
    }

    pub fn is_anchoring(&self) -> bool {
        self.transport.is_some()
    }

    pub fn public_key_base58(&self) -> String {
        self.keypair.public_key_base58()
    }

    /// Mint a signature for the action described by `description`.
    ///
    /// The description is only logged. Never fails.
    pub fn mint(&self, description: &str) -> MintedSignature {
        let Some(transport) = self.transport.as_deref() else {
            let minted = MintedSignature::local();
            debug!(description, signature = %minted.signature, "minted local signature");
            return minted;
        };

        match self.submit(transport) {
            Ok(signature) => {
                info!(description, %signature, "anchored signature");
                MintedSignature {
                    signature,
                    origin: AnchorOrigin::Anchored,
                }
            }
            Err(err) => {
                let minted = MintedSignature::local();
                warn!(
                    description,
                    error = %err,
                    signature = %minted.signature,
                    "external anchor unavailable; using local signature"
                );
                minted
            }
        }
    }

    fn submit(&self, transport: &dyn AnchorTransport) -> Result<String, AnchorError> {
        let blockhash_text = transport.latest_blockhash()?;
        let blockhash: [u8; 32] = base58::decode(&blockhash_text)?
            .try_into()
            .map_err(|_| {
                AnchorError::MalformedResponse(format!(
                    "blockhash {blockhash_text} is not 32 bytes"
                ))
            })?;

        let message = self_transfer_message(&self.keypair.public_key(), &blockhash, 0);
        let signature = self.keypair.sign(&message);
        let wire = encode_transaction(&signature, &message);
        let encoded = base64::engine::general_purpose::STANDARD.encode(wire);

        let confirmation = transport.send_transaction(&encoded)?;
        if confirmation.is_empty() {
            return Err(AnchorError::MalformedResponse(
                "empty confirmation signature".to_string(),
            ));
        }
        base58::decode(&confirmation)?;
        Ok(confirmation)
    }
}

impl std::fmt::Debug for SignatureAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureAnchor")
            .field("keypair", &self.keypair)
            .field("anchoring", &self.is_anchoring())
            .finish()
    }
}
