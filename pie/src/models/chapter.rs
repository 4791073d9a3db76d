use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{EnrichedEntry, Emotion};

/// Enriched entries keyed by entry id. Lives outside [`AggregateState`].
pub type EnrichedIndex = BTreeMap<String, EnrichedEntry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupingType {
    Relationship,
    Theme,
}

impl GroupingType {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Relationship => "relationship",
            Self::Theme => "theme",
        }
    }

    /// Recover the type from a stable grouping id such as `theme-work`.
    pub fn from_grouping_id(id: &str) -> Option<Self> {
        if id.starts_with("relationship-") {
            Some(Self::Relationship)
        } else if id.starts_with("theme-") {
            Some(Self::Theme)
        } else {
            None
        }
    }
}

impl std::fmt::Display for GroupingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frequency {
    pub per_week: f64,
    pub per_month: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_entries: usize,
    pub emotion_distribution: BTreeMap<Emotion, usize>,
    pub frequency: Frequency,
}

/// A chapter: a named cluster of entries keyed by relationship or theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grouping {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub grouping_type: GroupingType,
    /// Member entry ids, most recent first. Never contains duplicates.
    pub entry_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
}

impl Grouping {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        grouping_type: GroupingType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            grouping_type,
            entry_ids: Vec::new(),
            created_at,
            last_updated: created_at,
            keywords: None,
            metrics: None,
        }
    }

    pub fn contains(&self, entry_id: &str) -> bool {
        self.entry_ids.iter().any(|id| id == entry_id)
    }

    /// Prepend an entry id. Returns false if it was already a member.
    pub fn prepend_entry(&mut self, entry_id: &str) -> bool {
        if self.contains(entry_id) {
            return false;
        }
        self.entry_ids.insert(0, entry_id.to_string());
        true
    }

    pub fn remove_entry(&mut self, entry_id: &str) -> bool {
        let before = self.entry_ids.len();
        self.entry_ids.retain(|id| id != entry_id);
        before != self.entry_ids.len()
    }

    /// Drop repeated member ids, keeping the first (most recent) occurrence.
    pub fn dedup_entries(&mut self) -> usize {
        let mut seen = std::collections::HashSet::new();
        let before = self.entry_ids.len();
        self.entry_ids.retain(|id| seen.insert(id.clone()));
        before - self.entry_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_ids.is_empty()
    }
}

/// A run of temporally close, topically related entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Storyline {
    pub id: String,
    pub title: String,
    pub entry_ids: Vec<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusEntry {
    pub grouping_id: String,
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusState {
    pub current_focus_chapters: Vec<FocusEntry>,
}

/// Root aggregate owned by the orchestrator and persisted by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateState {
    pub last_updated_at: DateTime<Utc>,
    pub chapters: BTreeMap<String, Grouping>,
    #[serde(default)]
    pub storylines: Vec<Storyline>,
    #[serde(default)]
    pub focus: FocusState,
}

impl AggregateState {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            last_updated_at: now,
            chapters: BTreeMap::new(),
            storylines: Vec::new(),
            focus: FocusState::default(),
        }
    }

    pub fn chapter(&self, id: &str) -> Option<&Grouping> {
        self.chapters.get(id)
    }

    /// Ids of every chapter the entry belongs to, in id order.
    pub fn chapters_containing(&self, entry_id: &str) -> Vec<String> {
        self.chapters
            .values()
            .filter(|g| g.contains(entry_id))
            .map(|g| g.id.clone())
            .collect()
    }

    /// Chapter membership as sorted id sets, for comparing two states
    /// independently of timestamps and member order.
    pub fn membership(&self) -> BTreeMap<String, Vec<String>> {
        self.chapters
            .iter()
            .map(|(id, g)| {
                let mut members = g.entry_ids.clone();
                members.sort();
                (id.clone(), members)
            })
            .collect()
    }

    pub fn current_focus(&self) -> &[FocusEntry] {
        &self.focus.current_focus_chapters
    }
}

impl Default for AggregateState {
    fn default() -> Self {
        Self::empty(Utc::now())
    }
}
