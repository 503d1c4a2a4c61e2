//! The authoritative in-memory ledger.
//!
//! Events live once in an append-only arena (the global log). Each product
//! keeps the arena indices of its own events, so both the per-product chain
//! and the global recency order are served without duplicating event data.

use crate::clock::{Clock, SystemClock};
use crate::types::{Event, EventKind, QueryFilters};
use crate::verify::{verify_events, CustodyViolation};
use parking_lot::RwLock;
use pl_anchor::MintedSignature;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Number of events returned by `get_recent` when no limit is given.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Domain errors raised by ledger operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Product {0} already exists")]
    DuplicateProduct(String),

    #[error("Product {0} not found")]
    UnknownProduct(String),

    #[error("Ownership mismatch for product {product_id}: expected current owner {expected}, got {actual}")]
    OwnershipMismatch {
        product_id: String,
        /// Owner recorded at the tail of the chain
        expected: String,
        /// Owner claimed by the caller
        actual: String,
    },

    #[error("Custody chain for product {product_id} is broken: {violation}")]
    CustodyViolation {
        product_id: String,
        violation: CustodyViolation,
    },
}

#[derive(Debug, Default)]
struct Ledger {
    /// Every event in append order.
    events: Vec<Arc<Event>>,
    /// Product id to arena indices, oldest first. Never empty.
    chains: HashMap<String, Vec<usize>>,
    last_timestamp: i64,
}

impl Ledger {
    fn tail(&self, product_id: &str) -> Result<&Event, LedgerError> {
        self.chains
            .get(product_id)
            .and_then(|indices| indices.last())
            .map(|&idx| self.events[idx].as_ref())
            .ok_or_else(|| LedgerError::UnknownProduct(product_id.to_string()))
    }

    fn check_owner(&self, product_id: &str, claimed: &str) -> Result<(), LedgerError> {
        let tail = self.tail(product_id)?;
        if tail.owner != claimed {
            return Err(LedgerError::OwnershipMismatch {
                product_id: product_id.to_string(),
                expected: tail.owner.clone(),
                actual: claimed.to_string(),
            });
        }
        Ok(())
    }

    /// Append to the arena and the product's chain in one step.
    fn append(&mut self, mut event: Event, now: i64) -> Arc<Event> {
        event.timestamp = now.max(self.last_timestamp);
        self.last_timestamp = event.timestamp;

        let idx = self.events.len();
        let event = Arc::new(event);
        self.events.push(Arc::clone(&event));
        self.chains
            .entry(event.product_id.clone())
            .or_default()
            .push(idx);
        event
    }
}

/// Owner of all product chains and the global event log.
///
/// Mutations hold the write lock across validate-and-append, so two
/// mutations of the same product never interleave. Reads hold the read lock
/// and see whole events only.
pub struct ProvenanceStore {
    ledger: RwLock<Ledger>,
    clock: Box<dyn Clock>,
}

impl ProvenanceStore {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            ledger: RwLock::new(Ledger::default()),
            clock: Box::new(clock),
        }
    }

    /// Start a new chain with a Manufacture event.
    pub fn create_product(
        &self,
        product_id: &str,
        metadata: Option<String>,
        manufacturer: &str,
        minted: MintedSignature,
    ) -> Result<Arc<Event>, LedgerError> {
        let mut ledger = self.ledger.write();
        if ledger.chains.contains_key(product_id) {
            warn!(product_id, "create rejected: duplicate product");
            return Err(LedgerError::DuplicateProduct(product_id.to_string()));
        }

        let event = Event {
            product_id: product_id.to_string(),
            kind: EventKind::Manufacture,
            timestamp: 0,
            owner: manufacturer.to_string(),
            previous_owner: None,
            metadata,
            signature: minted.signature,
            anchor: minted.origin,
        };
        let event = ledger.append(event, self.clock.now_millis());
        info!(product_id, owner = manufacturer, "product created");
        Ok(event)
    }

    /// Hand a product from its current owner to `next_owner`.
    pub fn transfer_ownership(
        &self,
        product_id: &str,
        current_owner: &str,
        next_owner: &str,
        minted: MintedSignature,
    ) -> Result<Arc<Event>, LedgerError> {
        let mut ledger = self.ledger.write();
        if let Err(err) = ledger.check_owner(product_id, current_owner) {
            warn!(product_id, current_owner, error = %err, "transfer rejected");
            return Err(err);
        }

        let event = Event {
            product_id: product_id.to_string(),
            kind: EventKind::Transfer,
            timestamp: 0,
            owner: next_owner.to_string(),
            previous_owner: Some(current_owner.to_string()),
            metadata: None,
            signature: minted.signature,
            anchor: minted.origin,
        };
        let event = ledger.append(event, self.clock.now_millis());
        info!(
            product_id,
            from = current_owner,
            to = next_owner,
            "ownership transferred"
        );
        Ok(event)
    }

    /// Record a repair attested by the current owner. Ownership is unchanged.
    pub fn record_repair(
        &self,
        product_id: &str,
        owner: &str,
        metadata: Option<String>,
        minted: MintedSignature,
    ) -> Result<Arc<Event>, LedgerError> {
        let mut ledger = self.ledger.write();
        if let Err(err) = ledger.check_owner(product_id, owner) {
            warn!(product_id, owner, error = %err, "repair rejected");
            return Err(err);
        }

        let event = Event {
            product_id: product_id.to_string(),
            kind: EventKind::Repair,
            timestamp: 0,
            owner: owner.to_string(),
            previous_owner: None,
            metadata,
            signature: minted.signature,
            anchor: minted.origin,
        };
        let event = ledger.append(event, self.clock.now_millis());
        info!(product_id, owner, "repair recorded");
        Ok(event)
    }

    /// Full chain for a product, oldest first.
    pub fn get_history(&self, product_id: &str) -> Result<Vec<Arc<Event>>, LedgerError> {
        let ledger = self.ledger.read();
        let indices = ledger
            .chains
            .get(product_id)
            .ok_or_else(|| LedgerError::UnknownProduct(product_id.to_string()))?;
        debug!(product_id, events = indices.len(), "history read");
        Ok(indices
            .iter()
            .map(|&idx| Arc::clone(&ledger.events[idx]))
            .collect())
    }

    /// Up to `limit` most recent events across all products, newest first.
    pub fn get_recent(&self, limit: Option<usize>) -> Vec<Arc<Event>> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT);
        let ledger = self.ledger.read();
        debug!(limit, total = ledger.events.len(), "recent read");
        ledger.events.iter().rev().take(limit).cloned().collect()
    }

    /// All events matching `filters`, newest first; ties keep append order.
    pub fn query_all(&self, filters: &QueryFilters) -> Vec<Arc<Event>> {
        let mut matched: Vec<Arc<Event>> = {
            let ledger = self.ledger.read();
            ledger
                .events
                .iter()
                .filter(|event| filters.matches(event))
                .cloned()
                .collect()
        };
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!(?filters, matched = matched.len(), "query evaluated");
        matched
    }

    /// Owner at the tail of a product's chain.
    pub fn current_owner(&self, product_id: &str) -> Result<String, LedgerError> {
        let ledger = self.ledger.read();
        ledger.tail(product_id).map(|event| event.owner.clone())
    }

    /// Re-check the chain-of-custody invariant for one product.
    pub fn verify_custody(&self, product_id: &str) -> Result<(), LedgerError> {
        let history = self.get_history(product_id)?;
        verify_events(history.iter().map(Arc::as_ref)).map_err(|violation| {
            LedgerError::CustodyViolation {
                product_id: product_id.to_string(),
                violation,
            }
        })
    }

    pub fn product_count(&self) -> usize {
        self.ledger.read().chains.len()
    }

    pub fn event_count(&self) -> usize {
        self.ledger.read().events.len()
    }
}

impl Default for ProvenanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProvenanceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ledger = self.ledger.read();
        f.debug_struct("ProvenanceStore")
            .field("products", &ledger.chains.len())
            .field("events", &ledger.events.len())
            .finish()
    }
}
