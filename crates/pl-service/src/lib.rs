//! Provenance service: the create/transfer/repair/query contract.
//!
//! Wires a [`pl_anchor::SignatureAnchor`] to a [`pl_store::ProvenanceStore`].
//! Both are injected, so one process may host several independent ledgers
//! and tests can substitute a local-only anchor.

mod config;
mod service;

pub use config::{network_rpc_url, AnchorConfig, ConfigError, QueryConfig, ServiceConfig};
pub use service::ProvenanceService;

pub use pl_anchor::{AnchorOrigin, MintedSignature, SignatureAnchor};
pub use pl_store::{Event, EventKind, LedgerError, ProvenanceStore, QueryFilters};
