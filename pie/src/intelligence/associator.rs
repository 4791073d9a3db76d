use serde::{Deserialize, Serialize};

use crate::models::{EnrichedEntry, Relationship};

use super::atomizer::strip_markup;
use super::themes::ThemeBank;

/// Grouping ids selected for one entry, split by grouping type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub relationship_grouping_ids: Vec<String>,
    pub theme_grouping_ids: Vec<String>,
}

impl Association {
    /// Relationship ids first, then theme ids.
    pub fn all_ids(&self) -> impl Iterator<Item = &String> {
        self.relationship_grouping_ids
            .iter()
            .chain(self.theme_grouping_ids.iter())
    }

    pub fn contains(&self, grouping_id: &str) -> bool {
        self.all_ids().any(|id| id == grouping_id)
    }
}

pub fn relationship_grouping_id(relationship_id: &str) -> String {
    format!("relationship-{relationship_id}")
}

/// Maps enriched entries onto relationship and theme grouping ids.
#[derive(Debug, Clone, Default)]
pub struct Associator {
    themes: ThemeBank,
}

impl Associator {
    pub fn new(themes: ThemeBank) -> Self {
        Self { themes }
    }

    pub fn themes(&self) -> &ThemeBank {
        &self.themes
    }

    /// A relationship matches when the entry names it explicitly, when the
    /// content text (markup removed) contains its name case-insensitively,
    /// or when a PERSON entity equals its name. Themes match on keyword
    /// intersection; an entry that matches no theme lands in the fallback
    /// theme.
    pub fn associate(&self, entry: &EnrichedEntry, relationships: &[Relationship]) -> Association {
        let content_lower = strip_markup(&entry.raw.content).to_lowercase();
        let person_names: Vec<String> = entry.persons().map(|p| p.text.to_lowercase()).collect();

        let mut relationship_grouping_ids: Vec<String> = Vec::new();
        for relationship in relationships {
            let name = relationship.name.trim();
            let explicit = entry.raw.relationship_ids.iter().any(|id| *id == relationship.id);
            let name_lower = name.to_lowercase();
            let named = !name.is_empty()
                && (content_lower.contains(&name_lower)
                    || person_names.iter().any(|p| *p == name_lower));

            if explicit || named {
                let id = relationship_grouping_id(&relationship.id);
                if !relationship_grouping_ids.contains(&id) {
                    relationship_grouping_ids.push(id);
                }
            }
        }

        let theme_grouping_ids = self
            .themes
            .classify_or_fallback(&entry.keywords)
            .into_iter()
            .map(|theme| theme.grouping_id())
            .fold(Vec::new(), |mut ids: Vec<String>, id| {
                if !ids.contains(&id) {
                    ids.push(id);
                }
                ids
            });

        tracing::debug!(
            entry_id = %entry.raw.id,
            relationships = ?relationship_grouping_ids,
            themes = ?theme_grouping_ids,
            "Associated entry"
        );

        Association {
            relationship_grouping_ids,
            theme_grouping_ids,
        }
    }

    /// Display title for a grouping id this associator produced.
    pub fn title_for(&self, grouping_id: &str, relationships: &[Relationship]) -> String {
        if let Some(rel_id) = grouping_id.strip_prefix("relationship-") {
            return relationships
                .iter()
                .find(|r| r.id == rel_id)
                .map(|r| r.name.clone())
                .unwrap_or_else(|| rel_id.to_string());
        }
        self.themes
            .by_grouping_id(grouping_id)
            .map(|t| t.label.clone())
            .unwrap_or_else(|| {
                grouping_id
                    .strip_prefix("theme-")
                    .unwrap_or(grouping_id)
                    .to_string()
            })
    }

    /// Keyword list stored on theme groupings.
    pub fn keywords_for(&self, grouping_id: &str) -> Option<Vec<String>> {
        self.themes
            .by_grouping_id(grouping_id)
            .map(|t| t.keywords.clone())
    }
}
