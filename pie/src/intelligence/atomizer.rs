use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::AtomizerConfig;
use crate::models::{EnrichedEntry, Emotion, Entity, EntityKind, RawEntry, Sentiment};

use super::lexicon::{
    is_entity_exclusion, is_stop_word, polarity, LOCATION_CUES, ORGANIZATION_SUFFIXES,
    SENTIMENT_NORMALIZER,
};

fn markup_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)<[^>]*>|&(?:[a-zA-Z]+|#[0-9]+);").expect("markup pattern is valid")
    })
}

/// Remove tags and character entities, leaving a space where each stood.
pub fn strip_markup(text: &str) -> String {
    markup_pattern()
        .replace_all(text, " ")
        .replace(['\u{2019}', '\u{2018}'], "'")
}

/// Lower-cased content words with markup, stop words and single characters removed.
pub fn tokenize(text: &str) -> Vec<String> {
    strip_markup(text)
        .to_lowercase()
        .unicode_words()
        .filter(|w| w.chars().count() > 1 && !is_stop_word(w))
        .map(str::to_string)
        .collect()
}

/// Up to `limit` tokens, most frequent first, ties broken by first occurrence.
pub fn top_keywords(tokens: &[String], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, token) in tokens.iter().enumerate() {
        counts
            .entry(token.as_str())
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, position));
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(token, (count, first))| (token, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(token, _, _)| token.to_string())
        .collect()
}

fn is_name_candidate(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_uppercase() || word.chars().count() <= 1 {
        return false;
    }
    // acronyms
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return false;
    }
    !is_entity_exclusion(&word.to_lowercase())
}

fn trim_possessive(word: &str) -> &str {
    word.strip_suffix("'s").unwrap_or(word)
}

/// Capitalization-based named-entity candidates.
///
/// The first word of each sentence is never a candidate, nor are excluded
/// words or all-caps acronyms. Adjacent names are not merged except for an
/// organization suffix ("Acme Corp").
pub fn extract_entities(text: &str) -> Vec<Entity> {
    let cleaned = strip_markup(text);
    let mut entities: Vec<Entity> = Vec::new();

    for sentence in cleaned.unicode_sentences() {
        let words: Vec<&str> = sentence.unicode_words().collect();
        let mut i = 1;
        while i < words.len() {
            let word = trim_possessive(words[i]);
            let lower = word.to_lowercase();

            if ORGANIZATION_SUFFIXES.contains(&lower.as_str()) || !is_name_candidate(word) {
                i += 1;
                continue;
            }

            let next_is_suffix = words
                .get(i + 1)
                .map(|next| {
                    let next = trim_possessive(next);
                    next.chars().next().is_some_and(char::is_uppercase)
                        && ORGANIZATION_SUFFIXES.contains(&next.to_lowercase().as_str())
                })
                .unwrap_or(false);

            let entity = if next_is_suffix {
                let text = format!("{} {}", word, trim_possessive(words[i + 1]));
                i += 1;
                Entity {
                    text,
                    kind: EntityKind::Organization,
                }
            } else if LOCATION_CUES.contains(&words[i - 1].to_lowercase().as_str()) {
                Entity {
                    text: word.to_string(),
                    kind: EntityKind::Location,
                }
            } else {
                Entity {
                    text: word.to_string(),
                    kind: EntityKind::Person,
                }
            };

            if !entities.contains(&entity) {
                entities.push(entity);
            }
            i += 1;
        }
    }

    entities
}

/// Sum of lexicon weights over the given tokens.
pub fn lexicon_score(tokens: &[String]) -> f64 {
    tokens.iter().map(|t| polarity(t)).sum()
}

/// Turns raw entry text into keywords, entities and an emotion estimate.
#[derive(Debug, Clone)]
pub struct Atomizer {
    keyword_limit: usize,
}

impl Atomizer {
    pub fn new(config: &AtomizerConfig) -> Self {
        Self {
            keyword_limit: config.keyword_limit.max(1),
        }
    }

    pub fn keyword_limit(&self) -> usize {
        self.keyword_limit
    }

    /// Enrich a single entry. Deterministic and total: empty or malformed
    /// content yields no keywords, no entities and a calm, neutral reading.
    ///
    /// The entry's own mood label, when it maps to an emotion, becomes the
    /// primary emotion; the lexicon result is kept in `detected_emotion`.
    pub fn enrich(&self, entry: &RawEntry) -> EnrichedEntry {
        self.enrich_with_mood(entry, entry.mood.as_deref())
    }

    /// Like [`enrich`](Self::enrich) with the mood label supplied by the caller
    /// instead of read from the entry.
    pub fn enrich_with_mood(&self, entry: &RawEntry, mood: Option<&str>) -> EnrichedEntry {
        let tokens = tokenize(&entry.content);
        let keywords = top_keywords(&tokens, self.keyword_limit);
        let entities = extract_entities(&entry.content);

        let score = lexicon_score(&tokens);
        let detected_emotion = Emotion::from_lexicon_score(score);
        let sentiment = Sentiment::from_score(score / SENTIMENT_NORMALIZER);

        let primary_emotion = resolve_emotion(mood, detected_emotion);

        tracing::debug!(
            entry_id = %entry.id,
            keywords = keywords.len(),
            entities = entities.len(),
            score,
            emotion = %primary_emotion,
            "Atomized entry"
        );

        EnrichedEntry {
            raw: entry.clone(),
            keywords,
            entities,
            primary_emotion,
            detected_emotion,
            lexicon_score: score,
            sentiment,
            grouping_ids: Vec::new(),
        }
    }
}

impl Default for Atomizer {
    fn default() -> Self {
        Self::new(&AtomizerConfig::default())
    }
}

/// A mapped user mood wins over the detected emotion. Unrecognized labels
/// are ignored.
pub fn resolve_emotion(mood: Option<&str>, detected: Emotion) -> Emotion {
    match mood {
        Some(label) if !label.trim().is_empty() => match Emotion::from_mood_label(label) {
            Some(emotion) => emotion,
            None => {
                tracing::warn!(mood = label, "Unrecognized mood label, using detected emotion");
                detected
            }
        },
        _ => detected,
    }
}
