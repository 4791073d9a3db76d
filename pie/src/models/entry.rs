use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PieError, Result};

/// A journal entry as written by the author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub mood: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub relationship_ids: Vec<String>,
}

impl RawEntry {
    pub fn new(id: impl Into<String>, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            mood: None,
            created_at,
            relationship_ids: Vec::new(),
        }
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_relationships<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relationship_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Convert a loosely-typed JSON record into an entry.
    ///
    /// Non-string `content` or `mood` values are dropped rather than rejected;
    /// only a missing id or an unreadable timestamp makes the record unusable.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| PieError::Validation("entry is not a JSON object".to_string()))?;

        let id = obj
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PieError::Validation("entry has no id".to_string()))?
            .to_string();

        let created_at = obj
            .get("createdAt")
            .or_else(|| obj.get("created_at"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| PieError::Validation(format!("entry {id} has no createdAt")))
            .and_then(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| PieError::Validation(format!("entry {id} has bad createdAt: {e}")))
            })?;

        let content = obj
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let mood = obj
            .get("mood")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);

        let relationship_ids = obj
            .get("relationshipIds")
            .or_else(|| obj.get("relationship_ids"))
            .and_then(|v| v.as_array())
            .map(|ids| {
                ids.iter()
                    .filter_map(|v| v.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            id,
            content,
            mood,
            created_at,
            relationship_ids,
        })
    }
}

/// A known companion the author writes about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub name: String,
}

impl Relationship {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Person,
    Location,
    Organization,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub kind: EntityKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Excited,
    #[default]
    Calm,
    Tired,
    Sad,
    Angry,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Happy,
        Emotion::Excited,
        Emotion::Calm,
        Emotion::Tired,
        Emotion::Sad,
        Emotion::Angry,
    ];

    /// Bucket a summed lexicon score.
    ///
    /// Thresholds are evaluated in order: excited >= 3, happy > 1, calm > -1,
    /// tired > -3, sad > -5, otherwise angry.
    pub fn from_lexicon_score(score: f64) -> Self {
        if score >= 3.0 {
            Emotion::Excited
        } else if score > 1.0 {
            Emotion::Happy
        } else if score > -1.0 {
            Emotion::Calm
        } else if score > -3.0 {
            Emotion::Tired
        } else if score > -5.0 {
            Emotion::Sad
        } else {
            Emotion::Angry
        }
    }

    /// Map a user-chosen mood label onto an emotion, accepting common aliases.
    pub fn from_mood_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "happy" | "good" | "content" | "cheerful" | "glad" | "joyful" => Some(Emotion::Happy),
            "excited" | "great" | "amazing" | "awesome" | "thrilled" | "ecstatic" => {
                Some(Emotion::Excited)
            }
            "calm" | "okay" | "ok" | "neutral" | "fine" | "relaxed" | "peaceful" => {
                Some(Emotion::Calm)
            }
            "tired" | "exhausted" | "sleepy" | "drained" | "meh" => Some(Emotion::Tired),
            "sad" | "down" | "low" | "upset" | "lonely" | "bad" => Some(Emotion::Sad),
            "angry" | "mad" | "frustrated" | "furious" | "annoyed" | "awful" => {
                Some(Emotion::Angry)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Happy => write!(f, "happy"),
            Self::Excited => write!(f, "excited"),
            Self::Calm => write!(f, "calm"),
            Self::Tired => write!(f, "tired"),
            Self::Sad => write!(f, "sad"),
            Self::Angry => write!(f, "angry"),
        }
    }
}

impl std::str::FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "happy" => Ok(Self::Happy),
            "excited" => Ok(Self::Excited),
            "calm" => Ok(Self::Calm),
            "tired" => Ok(Self::Tired),
            "sad" => Ok(Self::Sad),
            "angry" => Ok(Self::Angry),
            _ => Err(format!("Unknown emotion: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    #[default]
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sentiment {
    /// Normalized polarity in `[-1, 1]`
    pub score: f64,
    pub label: SentimentLabel,
}

impl Sentiment {
    pub fn from_score(score: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let label = if score > 0.2 {
            SentimentLabel::Positive
        } else if score < -0.2 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };
        Self { score, label }
    }
}

/// A raw entry plus everything the atomizer and associator derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedEntry {
    #[serde(flatten)]
    pub raw: RawEntry,
    pub keywords: Vec<String>,
    pub entities: Vec<Entity>,
    /// Authoritative emotion: the mapped user mood when present, else the heuristic.
    pub primary_emotion: Emotion,
    /// What the lexicon alone detected, kept for diagnostics.
    pub detected_emotion: Emotion,
    pub lexicon_score: f64,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub grouping_ids: Vec<String>,
}

impl EnrichedEntry {
    pub fn id(&self) -> &str {
        &self.raw.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.raw.created_at
    }

    pub fn persons(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.kind == EntityKind::Person)
    }
}
