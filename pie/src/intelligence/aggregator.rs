use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};

use crate::models::{
    AggregateState, EnrichedEntry, EnrichedIndex, FocusEntry, Frequency, Grouping, Metrics,
    Storyline,
};

use super::atomizer::top_keywords;
use super::utils::{capitalize, shared_keyword_count};

/// Largest gap between consecutive storyline entries.
pub const STORYLINE_MAX_GAP_DAYS: i64 = 3;
/// Keywords an entry must share with its predecessor to extend a run.
pub const STORYLINE_MIN_SHARED_KEYWORDS: usize = 2;
/// Shortest run that is emitted as a storyline.
pub const STORYLINE_MIN_LENGTH: usize = 3;
pub const STORYLINE_MAX_KEYWORDS: usize = 3;

pub const FOCUS_LIMIT: usize = 3;
pub const RECENCY_WINDOW_DAYS: f64 = 7.0;
pub const RECENCY_WEIGHT: f64 = 1.5;
pub const EMOTIONAL_WEIGHT: f64 = 1.2;
/// Only entries with `|sentiment|` above this count toward the emotional bonus.
pub const EMOTIONAL_THRESHOLD: f64 = 0.5;
pub const WEEKS_PER_MONTH: f64 = 4.33;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Breakdown of a grouping's focus score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FocusScore {
    pub member_count: usize,
    pub recency_bonus: f64,
    pub emotional_bonus: f64,
    pub score: f64,
}

impl FocusScore {
    /// Human-readable explanation assembled from fixed thresholds.
    pub fn reason(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if self.member_count >= 10 {
            parts.push("High activity");
        } else if self.member_count >= 5 {
            parts.push("Moderate activity");
        }
        if self.recency_bonus > 3.0 {
            parts.push("Recent entries");
        }
        if self.emotional_bonus > 2.0 {
            parts.push("Strong emotional engagement");
        }
        if parts.is_empty() {
            "Steady presence in your journal".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Computes chapter metrics, storylines and the focus list. Stateless: every
/// result depends only on the arguments, including the reference time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// Return a copy of `grouping` with fresh metrics.
    ///
    /// Frequency is `total / age_days * 7` per week (times 4.33 per month),
    /// age measured in whole days from chapter creation to `now`. A chapter
    /// younger than a day reports its total for both.
    pub fn recompute_metrics(
        &self,
        grouping: &Grouping,
        entries: &EnrichedIndex,
        now: DateTime<Utc>,
    ) -> Grouping {
        let total_entries = grouping.entry_ids.len();

        let mut emotion_distribution = BTreeMap::new();
        for entry in grouping.entry_ids.iter().filter_map(|id| entries.get(id)) {
            *emotion_distribution.entry(entry.primary_emotion).or_insert(0) += 1;
        }

        let age_days = (now - grouping.created_at).num_days();
        let frequency = if age_days <= 0 {
            Frequency {
                per_week: total_entries as f64,
                per_month: total_entries as f64,
            }
        } else {
            let per_week = total_entries as f64 / age_days as f64 * 7.0;
            Frequency {
                per_week,
                per_month: per_week * WEEKS_PER_MONTH,
            }
        };

        let mut updated = grouping.clone();
        updated.metrics = Some(Metrics {
            total_entries,
            emotion_distribution,
            frequency,
        });
        updated
    }

    /// Detect runs of chronologically close entries that share keywords.
    ///
    /// Entries are visited oldest first. The current run is extended while
    /// the next entry is at most three days after the run's last member and
    /// shares at least two keywords with it; otherwise the run is closed and
    /// kept only if it has at least three members.
    pub fn detect_storylines(&self, entries: &EnrichedIndex) -> Vec<Storyline> {
        let mut ordered: Vec<&EnrichedEntry> = entries.values().collect();
        ordered.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });

        let max_gap = Duration::days(STORYLINE_MAX_GAP_DAYS);
        let mut storylines = Vec::new();
        let mut run: Vec<&EnrichedEntry> = Vec::new();

        for entry in ordered {
            let extends = run.last().is_some_and(|last| {
                entry.created_at() - last.created_at() <= max_gap
                    && shared_keyword_count(&last.keywords, &entry.keywords)
                        >= STORYLINE_MIN_SHARED_KEYWORDS
            });

            if !extends {
                if let Some(storyline) = build_storyline(&run) {
                    storylines.push(storyline);
                }
                run.clear();
            }
            run.push(entry);
        }

        if let Some(storyline) = build_storyline(&run) {
            storylines.push(storyline);
        }

        storylines
    }

    /// Score one chapter against the entry index at `now`.
    pub fn score_grouping(
        &self,
        grouping: &Grouping,
        entries: &EnrichedIndex,
        now: DateTime<Utc>,
    ) -> FocusScore {
        let member_count = grouping.entry_ids.len();
        let mut recency_bonus = 0.0;
        let mut emotional_bonus = 0.0;

        for entry in grouping.entry_ids.iter().filter_map(|id| entries.get(id)) {
            let days_ago =
                ((now - entry.created_at()).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0);
            if days_ago < RECENCY_WINDOW_DAYS {
                recency_bonus += (RECENCY_WINDOW_DAYS - days_ago) / RECENCY_WINDOW_DAYS;
            }

            let intensity = entry.sentiment.score.abs();
            if intensity > EMOTIONAL_THRESHOLD {
                emotional_bonus += intensity;
            }
        }

        FocusScore {
            member_count,
            recency_bonus,
            emotional_bonus,
            score: member_count as f64
                + recency_bonus * RECENCY_WEIGHT
                + emotional_bonus * EMOTIONAL_WEIGHT,
        }
    }

    /// Top chapters by score, highest first, at most [`FOCUS_LIMIT`].
    /// Equal scores are ordered by chapter id.
    pub fn rank_focus(
        &self,
        state: &AggregateState,
        entries: &EnrichedIndex,
        now: DateTime<Utc>,
    ) -> Vec<FocusEntry> {
        let mut scored: Vec<(&Grouping, FocusScore)> = state
            .chapters
            .values()
            .filter(|g| !g.is_empty())
            .map(|g| (g, self.score_grouping(g, entries, now)))
            .collect();

        scored.sort_by(|(ga, a), (gb, b)| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| ga.id.cmp(&gb.id))
        });

        scored
            .into_iter()
            .take(FOCUS_LIMIT)
            .map(|(grouping, score)| FocusEntry {
                grouping_id: grouping.id.clone(),
                score: score.score,
                reason: score.reason(),
            })
            .collect()
    }
}

fn build_storyline(run: &[&EnrichedEntry]) -> Option<Storyline> {
    if run.len() < STORYLINE_MIN_LENGTH {
        return None;
    }
    let first = run.first()?;
    let last = run.last()?;

    let all_keywords: Vec<String> = run.iter().flat_map(|e| e.keywords.iter().cloned()).collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for keyword in &all_keywords {
        *counts.entry(keyword.as_str()).or_insert(0) += 1;
    }
    let shared: Vec<String> = all_keywords
        .iter()
        .filter(|k| counts.get(k.as_str()).copied().unwrap_or(0) >= 2)
        .cloned()
        .collect();
    let keywords = top_keywords(&shared, STORYLINE_MAX_KEYWORDS);

    let title = if keywords.is_empty() {
        "Untitled storyline".to_string()
    } else {
        keywords
            .iter()
            .map(|k| capitalize(k))
            .collect::<Vec<_>>()
            .join(", ")
    };

    Some(Storyline {
        id: format!("storyline-{}", first.id()),
        title,
        entry_ids: run.iter().map(|e| e.id().to_string()).collect(),
        start_date: first.created_at(),
        end_date: last.created_at(),
        keywords,
    })
}
