mod common;

use common::fixtures::sample_corpus;
use verse_stream::{
    ApplyMode, DisplaySettings, HighlightStore, MemoryStateStore, MergeStrategy, Persistence,
    StudySession, VerseCycleOutcome, UNDO_CAPACITY,
};

#[test]
fn three_direct_clicks_leave_exactly_one_entry() {
    // Palette index 1 carries #fff3cd; clicking the same swatch three times
    // ends with a single highlight entry, not three.
    let mut store = HighlightStore::new();
    let palette = vec!["#d4edda".to_string(), "#fff3cd".to_string()];
    let mode = ApplyMode::Direct(1);
    let reference = "Genesis 1:1";

    store.cycle_verse(reference, &palette, mode, 1);
    store.cycle_verse(reference, &palette, mode, 2);
    store.cycle_verse(reference, &palette, mode, 3);

    assert_eq!(store.verse_count(), 1);
    assert_eq!(store.verse_highlight(reference).unwrap().color, "#fff3cd");
}

#[test]
fn cycle_returns_to_unhighlighted_after_palette_size_plus_one_steps() {
    let store_backend = MemoryStateStore::new();
    let mut session = StudySession::load(&store_backend);
    let palette_size = session.settings().palette.len();
    assert!(session.set_mode(ApplyMode::Cycle).is_durable());

    for _ in 0..palette_size + 1 {
        session.cycle_verse_highlight("Genesis 1:1", 1);
    }
    assert!(session.highlights().is_empty());

    // And the persisted state agrees after a reload.
    let reloaded = StudySession::load(&store_backend);
    assert!(reloaded.highlights().is_empty());
}

#[test]
fn import_with_invalid_color_coerces_and_preserves_unrelated_entries() {
    let corpus = sample_corpus();
    let mut session = StudySession::load(MemoryStateStore::new());
    session.set_mode(ApplyMode::Direct(0));
    session.cycle_verse_highlight("Moses 1:39", 1);
    let existing_color = session
        .highlights()
        .verse_highlight("Moses 1:39")
        .unwrap()
        .color
        .clone();

    let payload = r#"{
        "highlights": { "Genesis 1:1": { "color": "notacolor", "timestamp": 2 } },
        "version": "1.1"
    }"#;
    let (summary, persisted) = session
        .import_highlights_json(&corpus, payload, MergeStrategy::AddMissing)
        .unwrap();
    assert!(persisted.is_durable());
    assert_eq!(summary.coerced_colors, 1);
    assert_eq!(
        session.highlights().verse_highlight("Genesis 1:1").unwrap().color,
        "#888888"
    );
    assert_eq!(
        session.highlights().verse_highlight("Moses 1:39").unwrap().color,
        existing_color
    );
}

#[test]
fn quota_failure_warns_but_applies_in_memory() {
    let backend = MemoryStateStore::new().with_quota_bytes(2);
    let mut session = StudySession::load(backend);
    let (outcome, persisted) = session.cycle_verse_highlight("Genesis 1:1", 1);
    assert!(matches!(outcome, VerseCycleOutcome::Set(_)));
    match persisted {
        Persistence::MemoryOnly(err) => assert!(err.is_quota()),
        Persistence::Durable => panic!("a two-byte quota cannot hold the highlight maps"),
    }
    assert!(session
        .highlights()
        .verse_highlight("Genesis 1:1")
        .is_some());
}

#[test]
fn undo_history_is_capped_at_fifty_snapshots() {
    let mut session = StudySession::load(MemoryStateStore::new());
    session.set_mode(ApplyMode::Direct(0));
    for i in 0..UNDO_CAPACITY + 8 {
        // Alternate references so every click is a Set, never a toggle-off.
        let reference = format!("Genesis 1:{}", i + 1);
        session.cycle_verse_highlight(&reference, i as u64);
    }
    let mut undone = 0;
    while session.undo_highlights().0 {
        undone += 1;
    }
    assert_eq!(undone, UNDO_CAPACITY);
}

#[test]
fn phrase_and_search_flow_composes_in_rendered_output() {
    let corpus = sample_corpus();
    let mut session = StudySession::load(MemoryStateStore::new());
    let verse = corpus.verse_by_reference("Genesis 1:3").unwrap();
    // "Let there be light" at bytes 14..32.
    let start = verse.text.find("Let there be light").unwrap();
    let end = start + "Let there be light".len();
    session
        .add_phrase_highlight("Genesis 1:3", start, end, &verse.text, 1)
        .unwrap();

    let verses: Vec<&verse_stream::Verse> = corpus.verses().iter().collect();
    let html = verse_stream_render::render_page_html(
        &verses,
        2,
        3,
        session.highlights(),
        &verse_stream_render::RenderOptions {
            search_term: Some("light"),
        },
    );
    assert!(html.contains("phrase-highlight"));
    assert!(html.contains("search-hit"));
    // Two occurrences of "light" in the verse; one inside the phrase span.
    assert_eq!(html.matches("search-hit").count(), 2);
}

#[test]
fn settings_clamps_apply_through_the_session() {
    let mut session = StudySession::load(MemoryStateStore::new());
    session.set_font_size_px(500);
    session.set_column_count(0);
    assert_eq!(
        session.settings().font_size_px,
        verse_stream::MAX_FONT_SIZE_PX
    );
    assert_eq!(
        session.settings().column_count,
        verse_stream::MIN_COLUMN_COUNT
    );
}

#[test]
fn default_settings_match_spec_ranges() {
    let settings = DisplaySettings::default();
    assert!(settings.font_size_px >= verse_stream::MIN_FONT_SIZE_PX);
    assert!(settings.font_size_px <= verse_stream::MAX_FONT_SIZE_PX);
    assert!(settings.column_count >= verse_stream::MIN_COLUMN_COUNT);
    assert!(settings.column_count <= verse_stream::MAX_COLUMN_COUNT);
    assert!(settings.palette.contains(&"#fff3cd".to_string()));
}
