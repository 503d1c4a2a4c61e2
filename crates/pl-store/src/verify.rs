//! Chain-of-custody verification and history digests.

use crate::types::{Event, EventKind};
use sha3::{Digest, Sha3_256};
use thiserror::Error;

/// A broken link in a product history.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CustodyViolation {
    #[error("History is empty")]
    EmptyHistory,

    #[error("Event 0 must be Manufacture, found {0}")]
    MissingManufacture(EventKind),

    #[error("Event {index} is a second Manufacture")]
    RepeatedManufacture { index: usize },

    #[error("Event {index} has previous owner {actual:?} but belongs to a {kind}")]
    UnexpectedPreviousOwner {
        index: usize,
        kind: EventKind,
        actual: String,
    },

    #[error("Event {index} transfers from {actual:?}, expected {expected:?}")]
    BrokenTransfer {
        index: usize,
        expected: String,
        actual: Option<String>,
    },

    #[error("Event {index} repair changes owner from {expected:?} to {actual:?}")]
    RepairOwnerChanged {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("Event {index} belongs to product {actual:?}, expected {expected:?}")]
    ProductMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("Event {index} timestamp {actual} precedes previous timestamp {previous}")]
    TimestampRegression {
        index: usize,
        previous: i64,
        actual: i64,
    },
}

/// Check a single product history, oldest first.
///
/// The first event must be a Manufacture with no previous owner. Each later
/// Transfer must name the preceding owner as its previous owner, and each
/// Repair must leave the owner unchanged.
pub fn verify_events<'a, I>(events: I) -> Result<(), CustodyViolation>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut iter = events.into_iter();
    let first = iter.next().ok_or(CustodyViolation::EmptyHistory)?;

    if first.kind != EventKind::Manufacture {
        return Err(CustodyViolation::MissingManufacture(first.kind));
    }
    if let Some(prev) = &first.previous_owner {
        return Err(CustodyViolation::UnexpectedPreviousOwner {
            index: 0,
            kind: first.kind,
            actual: prev.clone(),
        });
    }

    let mut last = first;
    for (offset, event) in iter.enumerate() {
        let index = offset + 1;

        if event.product_id != first.product_id {
            return Err(CustodyViolation::ProductMismatch {
                index,
                expected: first.product_id.clone(),
                actual: event.product_id.clone(),
            });
        }
        if event.timestamp < last.timestamp {
            return Err(CustodyViolation::TimestampRegression {
                index,
                previous: last.timestamp,
                actual: event.timestamp,
            });
        }

        match event.kind {
            EventKind::Manufacture => {
                return Err(CustodyViolation::RepeatedManufacture { index });
            }
            EventKind::Transfer => {
                if event.previous_owner.as_deref() != Some(last.owner.as_str()) {
                    return Err(CustodyViolation::BrokenTransfer {
                        index,
                        expected: last.owner.clone(),
                        actual: event.previous_owner.clone(),
                    });
                }
            }
            EventKind::Repair => {
                if let Some(prev) = &event.previous_owner {
                    return Err(CustodyViolation::UnexpectedPreviousOwner {
                        index,
                        kind: event.kind,
                        actual: prev.clone(),
                    });
                }
                if event.owner != last.owner {
                    return Err(CustodyViolation::RepairOwnerChanged {
                        index,
                        expected: last.owner.clone(),
                        actual: event.owner.clone(),
                    });
                }
            }
        }

        last = event;
    }

    Ok(())
}

/// SHA3-256 over the canonical JSON of each event, in order.
pub fn history_digest<'a, I>(events: I) -> String
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut hasher = Sha3_256::new();
    for event in events {
        // Event holds only strings, integers and unit enums.
        let json = serde_json::to_vec(event).expect("event serialization failed");
        hasher.update(Sha3_256::digest(&json));
    }
    format!("sha3-256:{}", hex::encode(hasher.finalize()))
}
