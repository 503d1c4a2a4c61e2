//! Ledger data structures.

use pl_anchor::AnchorOrigin;
use serde::{Deserialize, Serialize};

/// Kind of custody event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Manufacture,
    Transfer,
    Repair,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::Manufacture => "Manufacture",
            EventKind::Transfer => "Transfer",
            EventKind::Repair => "Repair",
        };
        f.write_str(name)
    }
}

/// A single immutable entry in a product's chain of custody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Product this event belongs to
    pub product_id: String,

    pub kind: EventKind,

    /// Milliseconds since the Unix epoch, assigned by the store
    pub timestamp: i64,

    /// Owner after this event
    pub owner: String,

    /// Owner being superseded (Transfer only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_owner: Option<String>,

    /// Free-form payload: manufacturing details, repair notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,

    /// Base58 identifier minted by the anchor
    pub signature: String,

    /// Whether `signature` was confirmed externally or derived locally
    pub anchor: AnchorOrigin,
}

/// Filters accepted by `query_all`. Absent filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilters {
    /// Case-insensitive substring of the event owner
    #[serde(default)]
    pub owner: Option<String>,

    /// Case-insensitive substring of a Transfer's previous owner
    #[serde(default)]
    pub previous_owner: Option<String>,

    /// Inclusive lower timestamp bound
    #[serde(default)]
    pub start_time: Option<i64>,

    /// Inclusive upper timestamp bound
    #[serde(default)]
    pub end_time: Option<i64>,
}

impl QueryFilters {
    pub fn owner(mut self, needle: impl Into<String>) -> Self {
        self.owner = Some(needle.into());
        self
    }

    pub fn previous_owner(mut self, needle: impl Into<String>) -> Self {
        self.previous_owner = Some(needle.into());
        self
    }

    pub fn between(mut self, start_time: Option<i64>, end_time: Option<i64>) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    /// Whether `event` passes every provided filter.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(needle) = &self.owner {
            if !contains_ignore_case(&event.owner, needle) {
                return false;
            }
        }
        if let Some(needle) = &self.previous_owner {
            match &event.previous_owner {
                Some(prev) if contains_ignore_case(prev, needle) => {}
                _ => return false,
            }
        }
        if let Some(start) = self.start_time {
            if event.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if event.timestamp > end {
                return false;
            }
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
