mod common;

use pretty_assertions::assert_eq;

use common::{day, engine_at, entry, init_test_logger, journal};
use pie::models::{AggregateState, Emotion, EnrichedIndex, GroupingType};

#[test]
fn test_rebuild_is_idempotent() {
    init_test_logger();
    let engine = engine_at(day(20));
    let entries = journal();

    let first = engine.rebuild_all(&entries);
    let second = engine.rebuild_all(&entries);

    assert_eq!(first.state.membership(), second.state.membership());
    assert_eq!(first.state.storylines, second.state.storylines);
    assert_eq!(first.state.focus, second.state.focus);
    assert_eq!(first.enriched, second.enriched);
}

#[test]
fn test_rebuild_ignores_input_order() {
    let engine = engine_at(day(20));
    let entries = journal();
    let mut reversed = entries.clone();
    reversed.reverse();

    assert_eq!(
        engine.rebuild_all(&entries).state,
        engine.rebuild_all(&reversed).state
    );
}

#[test]
fn test_incremental_matches_rebuild() {
    init_test_logger();
    let engine = engine_at(day(20));
    let entries = journal();

    let mut state = AggregateState::empty(day(0));
    let mut index = EnrichedIndex::new();
    for raw in &entries {
        state = engine.process_new_entry(raw, state, &mut index, None).state;
    }

    let rebuilt = engine.rebuild_all(&entries);
    assert_eq!(state.membership(), rebuilt.state.membership());
    assert_eq!(index, rebuilt.enriched);

    // Metrics of every chapter were kept current along the way
    for (id, chapter) in &state.chapters {
        assert_eq!(chapter.metrics, rebuilt.state.chapters[id].metrics, "{id}");
        assert_eq!(chapter.created_at, rebuilt.state.chapters[id].created_at, "{id}");
    }

    // Insights are only refreshed on demand
    assert!(state.storylines.is_empty());
    let refreshed = engine.refresh_insights(state, &index);
    assert_eq!(refreshed.storylines, rebuilt.state.storylines);
    assert_eq!(refreshed.focus, rebuilt.state.focus);
}

#[test]
fn test_edits_and_removals_match_rebuild() {
    let engine = engine_at(day(20));
    let mut entries = journal();

    let mut state = AggregateState::empty(day(0));
    let mut index = EnrichedIndex::new();
    for raw in &entries {
        state = engine.process_new_entry(raw, state, &mut index, None).state;
    }

    // j01 is the oldest member of Mike's chapter and of the work theme
    state = engine.remove_entry("j01", state, &mut index);
    entries.retain(|e| e.id != "j01");

    // j02 leaves wellness for travel
    let edited = entry("j02", 1, "Booked a flight for the beach vacation");
    state = engine.process_new_entry(&edited, state, &mut index, None).state;
    for e in entries.iter_mut().filter(|e| e.id == "j02") {
        *e = edited.clone();
    }

    let rebuilt = engine.rebuild_all(&entries);
    assert_eq!(state.membership(), rebuilt.state.membership());
    for (id, chapter) in &state.chapters {
        let expected = &rebuilt.state.chapters[id];
        assert_eq!(chapter.created_at, expected.created_at, "{id}");
        assert_eq!(chapter.metrics, expected.metrics, "{id}");
    }
    assert_eq!(state.chapter("relationship-r1").unwrap().created_at, day(12));
}

#[test]
fn test_user_mood_is_authoritative() {
    let engine = engine_at(day(1));
    let content = "Awful, terrible, miserable day. I hate everything";

    for emotion in Emotion::ALL {
        let raw = entry("m1", 0, content);
        let outcome = engine.process_new_entry(
            &raw,
            AggregateState::empty(day(0)),
            &mut EnrichedIndex::new(),
            Some(emotion.to_string().as_str()),
        );
        assert_eq!(outcome.enriched.primary_emotion, emotion);
        assert_eq!(outcome.enriched.detected_emotion, Emotion::Angry);
        assert!(outcome.enriched.sentiment.score < 0.0);
    }
}

#[test]
fn test_theme_fallback_is_exclusive() {
    let engine = engine_at(day(1));
    let mut index = EnrichedIndex::new();
    let outcome = engine.process_new_entry(
        &entry("f1", 0, "The sky was grey and the tea was warm"),
        AggregateState::empty(day(0)),
        &mut index,
        None,
    );

    assert_eq!(outcome.enriched.grouping_ids, vec!["theme-reflections"]);
    let chapter = outcome.state.chapter("theme-reflections").unwrap();
    assert_eq!(chapter.grouping_type, GroupingType::Theme);
    assert_eq!(chapter.title, "Reflections");
    assert_eq!(outcome.state.chapters.len(), 1);
}

#[test]
fn test_storyline_gap_rule() {
    let engine = engine_at(day(30));
    let mut entries = vec![
        entry("s1", 1, "garden tomatoes sunny"),
        entry("s2", 2, "garden tomatoes rainy"),
        entry("s3", 4, "garden tomatoes windy"),
        entry("s4", 14, "garden tomatoes cloudy"),
    ];

    let outcome = engine.rebuild_all(&entries);
    assert_eq!(outcome.state.storylines.len(), 1);
    let story = &outcome.state.storylines[0];
    assert_eq!(story.entry_ids, vec!["s1", "s2", "s3"]);
    assert_eq!(story.start_date, day(1));
    assert_eq!(story.end_date, day(4));
    assert_eq!(story.keywords, vec!["garden", "tomatoes"]);

    // s4 opened its own run; two more close entries complete it
    entries.push(entry("s5", 15, "garden tomatoes foggy"));
    entries.push(entry("s6", 16, "garden tomatoes humid"));
    let outcome = engine.rebuild_all(&entries);
    assert_eq!(outcome.state.storylines.len(), 2);
    assert_eq!(outcome.state.storylines[1].entry_ids, vec!["s4", "s5", "s6"]);
}

#[test]
fn test_journal_storyline() {
    let engine = engine_at(day(20));
    let outcome = engine.rebuild_all(&journal());

    assert_eq!(outcome.state.storylines.len(), 1);
    let story = &outcome.state.storylines[0];
    assert_eq!(story.id, "storyline-j03");
    assert_eq!(story.entry_ids, vec!["j03", "j04", "j05"]);
    assert!(story.keywords.len() <= 3);
    assert!(story.keywords.contains(&"garden".to_string()));
}

#[test]
fn test_focus_is_bounded_and_sorted() {
    let engine = engine_at(day(14));
    let outcome = engine.rebuild_all(&journal());
    let focus = outcome.state.current_focus();

    assert!(!focus.is_empty());
    assert!(focus.len() <= 3);
    for pair in focus.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for item in focus {
        assert!(outcome.state.chapters.contains_key(&item.grouping_id));
        assert!(!item.reason.is_empty());
    }
}

#[test]
fn test_single_entry_example() {
    let engine = engine_at(day(0));
    let mut index = EnrichedIndex::new();
    let outcome = engine.process_new_entry(
        &entry("x1", 0, "Had coffee with Mike, felt happy and excited"),
        AggregateState::empty(day(0)),
        &mut index,
        None,
    );

    assert!(outcome
        .enriched
        .grouping_ids
        .contains(&"relationship-r1".to_string()));
    assert!(matches!(
        outcome.enriched.primary_emotion,
        Emotion::Excited | Emotion::Happy
    ));
    let metrics = outcome
        .state
        .chapter("relationship-r1")
        .and_then(|c| c.metrics.clone())
        .unwrap();
    assert_eq!(metrics.total_entries, 1);
}

#[test]
fn test_relationship_chapters_from_journal() {
    let engine = engine_at(day(20));
    let outcome = engine.rebuild_all(&journal());

    let mike = outcome.state.chapter("relationship-r1").unwrap();
    assert_eq!(mike.entry_ids, vec!["j09", "j01"]);
    assert_eq!(mike.created_at, day(0));

    let sofia = outcome.state.chapter("relationship-r2").unwrap();
    assert_eq!(sofia.entry_ids, vec!["j09", "j06"]);
    let distribution = &sofia.metrics.as_ref().unwrap().emotion_distribution;
    assert_eq!(distribution.get(&Emotion::Happy), Some(&1));
}
