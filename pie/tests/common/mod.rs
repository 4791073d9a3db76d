// Shared helpers for integration tests
#![allow(dead_code)]

use std::sync::Once;

use chrono::{DateTime, Duration, TimeZone, Utc};

use pie::intelligence::{Atomizer, ThemeBank};
use pie::models::{RawEntry, Relationship};
use pie::PieEngine;

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Day zero for fixture timestamps.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

pub fn day(n: i64) -> DateTime<Utc> {
    base_time() + Duration::days(n)
}

pub fn entry(id: &str, on_day: i64, content: &str) -> RawEntry {
    RawEntry::new(id, content, day(on_day))
}

pub fn directory() -> Vec<Relationship> {
    vec![
        Relationship::new("r1", "Mike"),
        Relationship::new("r2", "Sofia"),
    ]
}

/// Engine with the default banks, the test directory and a clock fixed at `now`.
pub fn engine_at(now: DateTime<Utc>) -> PieEngine {
    PieEngine::new(Atomizer::default(), ThemeBank::default(), directory()).with_clock(move || now)
}

/// A small journal spanning two weeks.
pub fn journal() -> Vec<RawEntry> {
    vec![
        entry("j01", 0, "Coffee with Mike before the project meeting"),
        entry("j02", 1, "Long run in the park, slept well afterwards"),
        entry("j03", 2, "Garden planting tomatoes, basil and peppers in the garden"),
        entry("j04", 3, "More garden work: tomatoes and basil need water"),
        entry("j05", 5, "Garden harvest! Tomatoes and basil everywhere"),
        entry("j06", 6, "Sofia called about her trip, I felt sad and lonely"),
        entry("j07", 8, "Awful deadline at work, my boss was furious"),
        entry("j08", 9, "Read a book about painting"),
        entry("j09", 12, "Dinner with Sofia and Mike, a wonderful evening").with_mood("happy"),
        entry("j10", 13, "The sky was grey and the tea was warm"),
    ]
}
