//! Append-only product provenance ledger.
//!
//! Each product owns a chain of custody events (Manufacture, then any number
//! of Transfers and Repairs). Every event is also part of one global log used
//! for recency and filtered queries.
//!
//! # Example
//!
//! ```
//! use pl_anchor::MintedSignature;
//! use pl_store::{LedgerError, ProvenanceStore, QueryFilters};
//!
//! let store = ProvenanceStore::new();
//! store.create_product("BIKE-001", None, "alice", MintedSignature::local()).unwrap();
//! store.transfer_ownership("BIKE-001", "alice", "bob", MintedSignature::local()).unwrap();
//!
//! let stale = store.transfer_ownership("BIKE-001", "alice", "carol", MintedSignature::local());
//! assert!(matches!(stale, Err(LedgerError::OwnershipMismatch { .. })));
//!
//! assert_eq!(store.get_history("BIKE-001").unwrap().len(), 2);
//! assert_eq!(store.query_all(&QueryFilters::default().owner("BOB")).len(), 1);
//! ```

mod clock;
mod store;
mod types;
mod verify;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{LedgerError, ProvenanceStore, DEFAULT_RECENT_LIMIT};
pub use types::{Event, EventKind, QueryFilters};
pub use verify::{history_digest, verify_events, CustodyViolation};
