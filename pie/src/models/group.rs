use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GroupingType;

/// A cluster kept by the grouping service. Persisted separately from the
/// chapters in [`AggregateState`](super::AggregateState).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryGroup {
    pub id: String,
    pub name: String,
    pub kind: GroupingType,
    /// Member entry ids in assignment order.
    pub entry_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntryGroup {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: GroupingType,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            entry_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append an entry; returns false if it was already a member.
    pub fn add_entry(&mut self, entry_id: &str, now: DateTime<Utc>) -> bool {
        if self.entry_ids.iter().any(|id| id == entry_id) {
            return false;
        }
        self.entry_ids.push(entry_id.to_string());
        self.updated_at = now;
        true
    }

    pub fn remove_entry(&mut self, entry_id: &str, now: DateTime<Utc>) -> bool {
        let before = self.entry_ids.len();
        self.entry_ids.retain(|id| id != entry_id);
        let removed = self.entry_ids.len() != before;
        if removed {
            self.updated_at = now;
        }
        removed
    }

    pub fn contains(&self, entry_id: &str) -> bool {
        self.entry_ids.iter().any(|id| id == entry_id)
    }

    pub fn is_empty(&self) -> bool {
        self.entry_ids.is_empty()
    }
}
