//! Orchestration of signature minting and ledger writes.

use crate::config::{ConfigError, ServiceConfig};
use pl_anchor::SignatureAnchor;
use pl_store::{Event, LedgerError, ProvenanceStore, QueryFilters};
use std::sync::Arc;
use tracing::info;

/// The public contract consumed by request-handling layers.
///
/// Each mutation mints its signature first and only then hands it to the
/// store, so a chain never holds an event without one.
#[derive(Debug, Clone)]
pub struct ProvenanceService {
    anchor: Arc<SignatureAnchor>,
    store: Arc<ProvenanceStore>,
    default_recent_limit: usize,
}

impl ProvenanceService {
    pub fn new(anchor: Arc<SignatureAnchor>, store: Arc<ProvenanceStore>) -> Self {
        Self {
            anchor,
            store,
            default_recent_limit: pl_store::DEFAULT_RECENT_LIMIT,
        }
    }

    /// Build the anchor from `config` and pair it with an empty store.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        let anchor = config.anchor.build_anchor()?;
        Ok(Self::new(Arc::new(anchor), Arc::new(ProvenanceStore::new()))
            .with_recent_limit(config.query.default_recent_limit))
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.default_recent_limit = limit;
        self
    }

    pub fn store(&self) -> &Arc<ProvenanceStore> {
        &self.store
    }

    /// Base58 public key of the anchor's process keypair.
    pub fn public_key(&self) -> String {
        self.anchor.public_key_base58()
    }

    pub fn create_product(
        &self,
        product_id: &str,
        metadata: Option<String>,
        manufacturer: &str,
    ) -> Result<Arc<Event>, LedgerError> {
        let minted = self
            .anchor
            .mint(&format!("create product {product_id} for {manufacturer}"));
        let origin = minted.origin;
        let result = self
            .store
            .create_product(product_id, metadata, manufacturer, minted);
        info!(op = "create", product_id, ?origin, ok = result.is_ok());
        result
    }

    pub fn transfer_ownership(
        &self,
        product_id: &str,
        current_owner: &str,
        next_owner: &str,
    ) -> Result<Arc<Event>, LedgerError> {
        let minted = self.anchor.mint(&format!(
            "transfer product {product_id} from {current_owner} to {next_owner}"
        ));
        let origin = minted.origin;
        let result = self
            .store
            .transfer_ownership(product_id, current_owner, next_owner, minted);
        info!(op = "transfer", product_id, ?origin, ok = result.is_ok());
        result
    }

    pub fn record_repair(
        &self,
        product_id: &str,
        owner: &str,
        metadata: Option<String>,
    ) -> Result<Arc<Event>, LedgerError> {
        let minted = self
            .anchor
            .mint(&format!("repair product {product_id} attested by {owner}"));
        let origin = minted.origin;
        let result = self.store.record_repair(product_id, owner, metadata, minted);
        info!(op = "repair", product_id, ?origin, ok = result.is_ok());
        result
    }

    pub fn get_history(&self, product_id: &str) -> Result<Vec<Arc<Event>>, LedgerError> {
        let result = self.store.get_history(product_id);
        info!(
            op = "history",
            product_id,
            ok = result.is_ok(),
            returned = result.as_ref().map_or(0, Vec::len)
        );
        result
    }

    /// Most recent events; `None` uses the configured default limit.
    pub fn get_recent(&self, limit: Option<usize>) -> Vec<Arc<Event>> {
        let limit = limit.unwrap_or(self.default_recent_limit);
        let events = self.store.get_recent(Some(limit));
        info!(op = "recent", limit, returned = events.len());
        events
    }

    pub fn query_all(&self, filters: &QueryFilters) -> Vec<Arc<Event>> {
        let events = self.store.query_all(filters);
        info!(op = "query", ?filters, returned = events.len());
        events
    }

    pub fn verify_custody(&self, product_id: &str) -> Result<(), LedgerError> {
        self.store.verify_custody(product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl_anchor::{AnchorKeypair, AnchorOrigin};

    fn local_service() -> ProvenanceService {
        ProvenanceService::new(
            Arc::new(SignatureAnchor::local_only(AnchorKeypair::generate())),
            Arc::new(ProvenanceStore::new()),
        )
    }

    #[test]
    fn test_mutations_carry_distinct_signatures() {
        let service = local_service();
        let a = service.create_product("P-1", None, "alice").unwrap();
        let b = service.transfer_ownership("P-1", "alice", "bob").unwrap();
        let c = service.record_repair("P-1", "bob", None).unwrap();

        for event in [&a, &b, &c] {
            assert!(!event.signature.is_empty());
            assert_eq!(event.anchor, AnchorOrigin::Local);
        }
        assert_ne!(a.signature, b.signature);
        assert_ne!(b.signature, c.signature);
    }

    #[test]
    fn test_rejected_mutation_leaves_store_unchanged() {
        let service = local_service();
        service.create_product("P-1", None, "alice").unwrap();
        assert!(service.create_product("P-1", None, "alice").is_err());
        assert!(service.transfer_ownership("P-1", "bob", "carol").is_err());
        assert_eq!(service.store().event_count(), 1);
    }

    #[test]
    fn test_recent_uses_configured_default() {
        let service = local_service().with_recent_limit(2);
        for i in 0..5 {
            service
                .create_product(&format!("P-{i}"), None, "maker")
                .unwrap();
        }
        assert_eq!(service.get_recent(None).len(), 2);
        assert_eq!(service.get_recent(Some(4)).len(), 4);
    }

    #[test]
    fn test_public_key_matches_anchor() {
        let keypair = AnchorKeypair::generate();
        let expected = keypair.public_key_base58();
        let service = ProvenanceService::new(
            Arc::new(SignatureAnchor::local_only(keypair)),
            Arc::new(ProvenanceStore::new()),
        );
        assert_eq!(service.public_key(), expected);
    }
}
