use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PieError, Result};

use super::utils::slugify;

/// One row of a theme keyword bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeDefinition {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ThemeDefinition {
    pub fn new(id: &str, label: &str, keywords: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Stable grouping id, `theme-<slug>`.
    pub fn grouping_id(&self) -> String {
        format!("theme-{}", slugify(&self.id))
    }

    pub fn matches<'a, I>(&self, tokens: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let bank: HashSet<&str> = self.keywords.iter().map(String::as_str).collect();
        tokens.into_iter().any(|t| bank.contains(t))
    }
}

/// An ordered list of themes plus the catch-all used when none match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeBank {
    pub themes: Vec<ThemeDefinition>,
    pub fallback: ThemeDefinition,
}

const DEFAULT_THEMES: &[(&str, &str, &[&str])] = &[
    (
        "work",
        "Work",
        &[
            "work", "job", "office", "meeting", "meetings", "project", "deadline", "boss",
            "colleague", "colleagues", "career", "client", "presentation", "promotion", "team",
            "manager", "shift", "email", "interview",
        ],
    ),
    (
        "wellness",
        "Wellness",
        &[
            "gym", "workout", "exercise", "run", "running", "yoga", "sleep", "slept", "meditation",
            "meditate", "health", "healthy", "doctor", "therapy", "walk", "hike", "diet", "stretch",
            "rest", "swim",
        ],
    ),
    (
        "relationships",
        "Relationships",
        &[
            "friend", "friends", "family", "date", "partner", "mom", "dad", "mother", "father",
            "sister", "brother", "wife", "husband", "girlfriend", "boyfriend", "kids", "son",
            "daughter", "dinner", "party", "wedding",
        ],
    ),
    (
        "learning",
        "Learning",
        &[
            "learn", "learned", "learning", "study", "studied", "book", "books", "read", "reading",
            "course", "class", "lecture", "exam", "practice", "skill", "language", "tutorial",
            "research",
        ],
    ),
    (
        "travel",
        "Travel",
        &[
            "trip", "travel", "traveling", "flight", "airport", "vacation", "holiday", "hotel",
            "beach", "train", "abroad", "city", "journey", "passport", "road", "visit", "visited",
        ],
    ),
    (
        "creativity",
        "Creativity",
        &[
            "write", "writing", "wrote", "paint", "painting", "draw", "drawing", "music", "song",
            "guitar", "piano", "photo", "photography", "design", "craft", "poem", "story",
        ],
    ),
];

impl Default for ThemeBank {
    fn default() -> Self {
        Self {
            themes: DEFAULT_THEMES
                .iter()
                .map(|(id, label, keywords)| ThemeDefinition::new(id, label, keywords))
                .collect(),
            fallback: ThemeDefinition::new("reflections", "Reflections", &[]),
        }
    }
}

impl ThemeBank {
    pub fn new(themes: Vec<ThemeDefinition>, fallback: ThemeDefinition) -> Result<Self> {
        let bank = Self { themes, fallback };
        bank.validate()?;
        Ok(bank)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut bank: Self = serde_json::from_str(json)?;
        for theme in &mut bank.themes {
            theme.keywords = theme.keywords.iter().map(|k| k.trim().to_lowercase()).collect();
        }
        bank.validate()?;
        Ok(bank)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load a bank named by configuration. A path that does not point at a
    /// file is a configuration error.
    pub fn from_configured_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PieError::Config(format!(
                "theme bank {} is not a readable file",
                path.display()
            )));
        }
        Self::from_json_file(path)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for theme in self.themes.iter().chain(std::iter::once(&self.fallback)) {
            if slugify(&theme.id).is_empty() {
                return Err(PieError::Validation(format!(
                    "theme '{}' has an empty id",
                    theme.label
                )));
            }
            if !seen.insert(theme.grouping_id()) {
                return Err(PieError::Validation(format!(
                    "theme id '{}' is defined twice",
                    theme.id
                )));
            }
        }
        if let Some(theme) = self.themes.iter().find(|t| t.keywords.is_empty()) {
            return Err(PieError::Validation(format!(
                "theme '{}' has no keywords",
                theme.id
            )));
        }
        Ok(())
    }

    /// Every theme whose keyword list intersects `tokens`, in bank order.
    pub fn classify<'a>(&'a self, tokens: &[String]) -> Vec<&'a ThemeDefinition> {
        self.themes
            .iter()
            .filter(|theme| theme.matches(tokens.iter().map(String::as_str)))
            .collect()
    }

    /// Like [`classify`](Self::classify) but never empty: falls back to the catch-all.
    pub fn classify_or_fallback<'a>(&'a self, tokens: &[String]) -> Vec<&'a ThemeDefinition> {
        let matched = self.classify(tokens);
        if matched.is_empty() {
            vec![&self.fallback]
        } else {
            matched
        }
    }

    /// Look up a theme (including the fallback) by its grouping id.
    pub fn by_grouping_id(&self, grouping_id: &str) -> Option<&ThemeDefinition> {
        self.themes
            .iter()
            .chain(std::iter::once(&self.fallback))
            .find(|t| t.grouping_id() == grouping_id)
    }
}
