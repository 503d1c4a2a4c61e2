//! Event signature minting for the provenance ledger.
//!
//! Every ledger event carries a signature minted here. When an RPC endpoint is
//! configured, the anchor submits a zero-value self-transfer to the external
//! ledger and returns its confirmation id; otherwise, or when that fails, it
//! returns 64 random bytes in the same base58 alphabet.
//!
//! # Example
//!
//! ```
//! use pl_anchor::{AnchorKeypair, AnchorOrigin, SignatureAnchor};
//!
//! let anchor = SignatureAnchor::local_only(AnchorKeypair::generate());
//! let minted = anchor.mint("create product BIKE-001");
//! assert_eq!(minted.origin, AnchorOrigin::Local);
//! assert!(!minted.signature.is_empty());
//! ```

mod anchor;
pub mod base58;
mod keypair;
mod rpc;
pub mod transaction;

pub use anchor::{local_signature, AnchorOrigin, MintedSignature, SignatureAnchor};
pub use keypair::{keygen, verify_signature, AnchorKeypair, KeypairFile};
pub use rpc::{AnchorTransport, RpcClient};

use thiserror::Error;

/// Failures on the external anchoring path.
///
/// These never escape [`SignatureAnchor::mint`]; they surface from key file
/// handling and from transports used directly.
#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("RPC transport failed: {0}")]
    Transport(String),

    #[error("RPC endpoint rejected request ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Malformed RPC response: {0}")]
    MalformedResponse(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid encoding: {0}")]
    Encoding(#[from] base58::DecodeError),
}
