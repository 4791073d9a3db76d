use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::PieConfig;
use crate::db::GroupingStore;
use crate::error::Result;
use crate::intelligence::associator::relationship_grouping_id;
use crate::intelligence::atomizer::tokenize;
use crate::intelligence::{ThemeBank, ThemeDefinition};
use crate::models::{EntryGroup, GroupingType, RawEntry, Relationship};

const GROUPING_THEMES: &[(&str, &str, &[&str])] = &[
    (
        "career",
        "Career",
        &[
            "work", "job", "career", "office", "boss", "promotion", "salary", "interview",
            "meeting", "coworker", "colleague", "project", "deadline", "client",
        ],
    ),
    (
        "health",
        "Health",
        &[
            "health", "doctor", "gym", "workout", "exercise", "run", "running", "yoga", "sleep",
            "sick", "diet", "therapy", "meditation", "hospital",
        ],
    ),
    (
        "family",
        "Family",
        &[
            "family", "mom", "dad", "mother", "father", "sister", "brother", "son", "daughter",
            "kids", "parents", "grandma", "grandpa", "cousin",
        ],
    ),
    (
        "friends",
        "Friends",
        &[
            "friend", "friends", "party", "hangout", "drinks", "brunch", "birthday", "game",
            "games",
        ],
    ),
    (
        "hobbies",
        "Hobbies",
        &[
            "hobby", "music", "guitar", "piano", "painting", "drawing", "reading", "book",
            "gaming", "cooking", "baking", "garden", "gardening", "photography",
        ],
    ),
    (
        "growth",
        "Personal Growth",
        &[
            "goal", "goals", "learn", "learning", "growth", "habit", "habits", "journal",
            "reflect", "progress", "mindset", "course", "study",
        ],
    ),
    (
        "travel",
        "Travel",
        &[
            "travel", "trip", "flight", "vacation", "holiday", "hotel", "beach", "airport",
            "abroad", "roadtrip",
        ],
    ),
];

/// Built-in bank for the grouping service, distinct from the associator's.
pub fn default_grouping_bank() -> ThemeBank {
    ThemeBank {
        themes: GROUPING_THEMES
            .iter()
            .map(|(id, label, keywords)| ThemeDefinition::new(id, label, keywords))
            .collect(),
        fallback: ThemeDefinition::new("everyday", "Daily Life", &[]),
    }
}

/// Secondary clustering of entries into relationship and theme groups.
///
/// Entries that reference known relationships are linked to those
/// relationships' groups; every other entry is classified against the
/// service's keyword bank and lands in the fallback group when nothing
/// matches. Groups are kept independently of the orchestrator's chapters.
pub struct GroupingService {
    bank: ThemeBank,
    relationships: Vec<Relationship>,
    groups: BTreeMap<String, EntryGroup>,
    store: Arc<dyn GroupingStore>,
}

impl GroupingService {
    pub fn new(
        bank: ThemeBank,
        relationships: Vec<Relationship>,
        store: Arc<dyn GroupingStore>,
    ) -> Self {
        Self {
            bank,
            relationships,
            groups: BTreeMap::new(),
            store,
        }
    }

    /// Create a service with the configured bank, or the built-in one.
    pub fn from_config(
        config: &PieConfig,
        relationships: Vec<Relationship>,
        store: Arc<dyn GroupingStore>,
    ) -> Result<Self> {
        let bank = match &config.themes.grouping_bank_path {
            Some(path) => {
                info!("Loading grouping bank from {}", path.display());
                ThemeBank::from_configured_path(path)?
            }
            None => default_grouping_bank(),
        };
        Ok(Self::new(bank, relationships, store))
    }

    pub fn set_relationships(&mut self, relationships: Vec<Relationship>) {
        self.relationships = relationships;
        let now = Utc::now();
        for group in self.groups.values_mut() {
            if group.kind != GroupingType::Relationship {
                continue;
            }
            if let Some(rel) = self
                .relationships
                .iter()
                .find(|r| relationship_grouping_id(&r.id) == group.id)
            {
                if group.name != rel.name {
                    group.name = rel.name.clone();
                    group.updated_at = now;
                }
            }
        }
    }

    pub fn bank(&self) -> &ThemeBank {
        &self.bank
    }

    /// Replace in-memory groups with what the store holds. Returns the
    /// number of groups loaded.
    pub async fn load(&mut self) -> Result<usize> {
        let groups = self.store.load_groups().await?;
        self.groups = groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .map(|g| (g.id.clone(), g))
            .collect();
        debug!(groups = self.groups.len(), "Loaded groupings");
        Ok(self.groups.len())
    }

    pub async fn save(&self) -> Result<()> {
        let groups: Vec<EntryGroup> = self.groups.values().cloned().collect();
        self.store.save_groups(&groups).await
    }

    pub fn groups(&self) -> impl Iterator<Item = &EntryGroup> {
        self.groups.values()
    }

    pub fn group(&self, id: &str) -> Option<&EntryGroup> {
        self.groups.get(id)
    }

    pub fn groups_for_entry(&self, entry_id: &str) -> Vec<&EntryGroup> {
        self.groups.values().filter(|g| g.contains(entry_id)).collect()
    }

    /// Group ids an entry belongs to, without changing anything.
    pub fn classify(&self, entry: &RawEntry) -> Vec<(String, String, GroupingType)> {
        let mut targets: Vec<(String, String, GroupingType)> = Vec::new();
        let mut seen = HashSet::new();

        for rel_id in &entry.relationship_ids {
            let Some(rel) = self.relationships.iter().find(|r| r.id == *rel_id) else {
                debug!(entry_id = %entry.id, relationship_id = %rel_id, "Unknown relationship reference");
                continue;
            };
            let id = relationship_grouping_id(&rel.id);
            if seen.insert(id.clone()) {
                targets.push((id, rel.name.clone(), GroupingType::Relationship));
            }
        }
        if !targets.is_empty() {
            return targets;
        }

        let tokens = tokenize(&entry.content);
        for theme in self.bank.classify_or_fallback(&tokens) {
            let id = theme.grouping_id();
            if seen.insert(id.clone()) {
                targets.push((id, theme.label.clone(), GroupingType::Theme));
            }
        }
        targets
    }

    /// Place an entry into its groups, moving it out of groups it no longer
    /// belongs to. Returns the ids of the groups it now belongs to.
    pub fn assign_entry(&mut self, entry: &RawEntry) -> Vec<String> {
        if entry.id.trim().is_empty() {
            warn!("Ignoring entry without id");
            return Vec::new();
        }
        let now = Utc::now();
        let targets = self.classify(entry);
        let target_ids: Vec<String> = targets.iter().map(|(id, _, _)| id.clone()).collect();

        for group in self.groups.values_mut() {
            if !target_ids.contains(&group.id) {
                group.remove_entry(&entry.id, now);
            }
        }
        self.groups.retain(|_, g| !g.is_empty());

        for (id, name, kind) in targets {
            self.upsert(id, name, kind, entry.created_at)
                .add_entry(&entry.id, now);
        }
        target_ids
    }

    /// Remove an entry everywhere. Returns whether it was a member of anything.
    pub fn remove_entry(&mut self, entry_id: &str) -> bool {
        let now = Utc::now();
        let mut removed = false;
        for group in self.groups.values_mut() {
            removed |= group.remove_entry(entry_id, now);
        }
        self.groups.retain(|_, g| !g.is_empty());
        removed
    }

    /// Discard every group and reassign all entries oldest first.
    pub fn rebuild(&mut self, entries: &[RawEntry]) {
        info!(entries = entries.len(), "Rebuilding groupings");
        self.groups.clear();

        let mut ordered: Vec<&RawEntry> = entries.iter().collect();
        ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let mut seen = HashSet::new();
        for entry in ordered {
            if !seen.insert(entry.id.as_str()) {
                continue;
            }
            self.assign_entry(entry);
        }
        info!(groups = self.groups.len(), "Groupings rebuilt");
    }

    fn upsert(
        &mut self,
        id: String,
        name: String,
        kind: GroupingType,
        created_at: DateTime<Utc>,
    ) -> &mut EntryGroup {
        self.groups.entry(id).or_insert_with_key(|id| {
            debug!(group = %id, "Created group");
            EntryGroup::new(id.clone(), name, kind, created_at)
        })
    }
}
