//! Highlight export/import payloads and merge strategies.
//!
//! The wire shape is a single JSON document:
//!
//! ```json
//! {
//!   "highlights": { "Genesis 1:1": { "color": "#fff3cd", "timestamp": 0 } },
//!   "phraseHighlights": { "Genesis 1:1": [ { "id": "ph-0", "start": 0, "end": 6,
//!       "text": "In the", "color": "#d4edda", "timestamp": 0 } ] },
//!   "colors": ["#fff3cd", "#d4edda"],
//!   "exportDate": "2023-11-14T22:13:20.000Z",
//!   "version": "1.1"
//! }
//! ```
//!
//! Import is all-or-nothing: the payload is validated and staged in full
//! before the store is touched, so a rejected import never partially mutates
//! existing highlights. Malformed colors are coerced to a neutral gray
//! rather than rejected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::error::ImportError;
use crate::highlight::{
    HighlightState, HighlightStore, PhraseHighlight, SpanList, VerseHighlight,
    MAX_REFERENCE_BYTES,
};
use crate::settings::{coerce_hex_color, normalize_hex_color};

/// Version written by this build.
pub const PAYLOAD_VERSION: &str = "1.1";

const ACCEPTED_VERSIONS: &[&str] = &["1.0", "1.1"];

/// Verse-level highlight entry as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadVerseHighlight {
    pub color: String,
    #[serde(default)]
    pub timestamp: u64,
}

/// Phrase highlight entry as it appears on the wire.
///
/// `start`/`end` are typed numeric fields; a payload carrying strings here
/// fails deserialization and is rejected wholly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadPhraseHighlight {
    #[serde(default)]
    pub id: String,
    pub start: u64,
    pub end: u64,
    #[serde(default)]
    pub text: String,
    pub color: String,
    #[serde(default)]
    pub timestamp: u64,
}

/// Complete export/import document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightPayload {
    #[serde(default)]
    pub highlights: BTreeMap<String, PayloadVerseHighlight>,
    #[serde(rename = "phraseHighlights", default)]
    pub phrase_highlights: BTreeMap<String, Vec<PayloadPhraseHighlight>>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(rename = "exportDate", default)]
    pub export_date: String,
    pub version: String,
}

/// How imported entries merge with existing highlights.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Discard existing highlights; the payload becomes the whole state.
    Replace,
    /// Only add entries whose reference/span is not already present.
    AddMissing,
    /// On conflict the imported entry wins.
    PreferImported,
    /// On a verse-highlight conflict, convert the existing highlight into a
    /// full-verse phrase highlight before applying the imported one, so no
    /// information is silently dropped.
    Layer,
}

/// What an import did, entry by entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub verse_added: usize,
    pub verse_replaced: usize,
    pub verse_layered: usize,
    pub verse_skipped: usize,
    pub phrase_added: usize,
    pub phrase_updated: usize,
    pub phrase_skipped_overlap: usize,
    pub phrase_text_mismatch: usize,
    pub coerced_colors: usize,
}

/// Build an export payload from the current state.
pub fn export_payload(
    state: &HighlightState,
    palette: &[String],
    now_ms: u64,
) -> HighlightPayload {
    let highlights = state
        .verse
        .iter()
        .map(|(reference, h)| {
            (
                reference.clone(),
                PayloadVerseHighlight {
                    color: h.color.clone(),
                    timestamp: h.timestamp,
                },
            )
        })
        .collect();
    let phrase_highlights = state
        .phrase
        .iter()
        .map(|(reference, spans)| {
            (
                reference.clone(),
                spans
                    .iter()
                    .map(|s| PayloadPhraseHighlight {
                        id: s.id.clone(),
                        start: s.start as u64,
                        end: s.end as u64,
                        text: s.text.clone(),
                        color: s.color.clone(),
                        timestamp: s.timestamp,
                    })
                    .collect(),
            )
        })
        .collect();
    HighlightPayload {
        highlights,
        phrase_highlights,
        colors: palette.to_vec(),
        export_date: format_export_date(now_ms),
        version: PAYLOAD_VERSION.to_string(),
    }
}

/// Serialize an export payload to pretty JSON.
pub fn export_json(
    state: &HighlightState,
    palette: &[String],
    now_ms: u64,
) -> Result<String, ImportError> {
    let payload = export_payload(state, palette, now_ms);
    serde_json::to_string_pretty(&payload).map_err(|e| ImportError::Malformed(e.to_string()))
}

/// Parse a payload from JSON without applying it.
pub fn parse_payload(json: &str) -> Result<HighlightPayload, ImportError> {
    serde_json::from_str(json).map_err(|e| ImportError::Malformed(e.to_string()))
}

/// The payload's palette with malformed colors coerced, for callers that
/// want to adopt it.
pub fn payload_palette(payload: &HighlightPayload) -> Vec<String> {
    payload.colors.iter().map(|c| coerce_hex_color(c)).collect()
}

/// Validate and merge a payload into the store under a strategy.
///
/// Applies as a single undoable operation. Structural failures reject the
/// whole payload with zero mutation.
pub fn import_payload(
    store: &mut HighlightStore,
    corpus: &Corpus,
    payload: &HighlightPayload,
    strategy: MergeStrategy,
) -> Result<ImportSummary, ImportError> {
    if !ACCEPTED_VERSIONS.contains(&payload.version.as_str()) {
        return Err(ImportError::UnsupportedVersion(payload.version.clone()));
    }
    validate_payload(payload)?;

    let mut summary = ImportSummary::default();
    let mut staged = match strategy {
        MergeStrategy::Replace => HighlightState::default(),
        _ => store.state().clone(),
    };

    merge_verse_highlights(&mut staged, corpus, payload, strategy, &mut summary);
    merge_phrase_highlights(&mut staged, corpus, payload, strategy, &mut summary);

    store.replace_state(staged);
    Ok(summary)
}

fn validate_payload(payload: &HighlightPayload) -> Result<(), ImportError> {
    for reference in payload
        .highlights
        .keys()
        .chain(payload.phrase_highlights.keys())
    {
        if reference.len() > MAX_REFERENCE_BYTES {
            return Err(ImportError::ReferenceTooLong {
                actual: reference.len(),
                limit: MAX_REFERENCE_BYTES,
            });
        }
    }
    for spans in payload.phrase_highlights.values() {
        for span in spans {
            let (start, end) = span_offsets(span)?;
            if start >= end {
                return Err(ImportError::InvalidSpan { start, end });
            }
        }
    }
    Ok(())
}

fn span_offsets(span: &PayloadPhraseHighlight) -> Result<(usize, usize), ImportError> {
    let start = usize::try_from(span.start)
        .map_err(|_| ImportError::Malformed("span start offset overflows usize".to_string()))?;
    let end = usize::try_from(span.end)
        .map_err(|_| ImportError::Malformed("span end offset overflows usize".to_string()))?;
    Ok((start, end))
}

fn import_color(raw: &str, summary: &mut ImportSummary) -> String {
    match normalize_hex_color(raw) {
        Some(color) => color,
        None => {
            summary.coerced_colors += 1;
            coerce_hex_color(raw)
        }
    }
}

fn merge_verse_highlights(
    staged: &mut HighlightState,
    corpus: &Corpus,
    payload: &HighlightPayload,
    strategy: MergeStrategy,
    summary: &mut ImportSummary,
) {
    for (reference, imported) in &payload.highlights {
        let color = import_color(&imported.color, summary);
        let incoming = VerseHighlight {
            color,
            timestamp: imported.timestamp,
        };
        match staged.verse.get(reference) {
            None => {
                staged.verse.insert(reference.clone(), incoming);
                summary.verse_added += 1;
            }
            Some(existing) => match strategy {
                MergeStrategy::Replace => {
                    // Replace starts from an empty staging state; an existing
                    // entry here means the payload itself repeated a key.
                    staged.verse.insert(reference.clone(), incoming);
                    summary.verse_replaced += 1;
                }
                MergeStrategy::AddMissing => {
                    summary.verse_skipped += 1;
                }
                MergeStrategy::PreferImported => {
                    staged.verse.insert(reference.clone(), incoming);
                    summary.verse_replaced += 1;
                }
                MergeStrategy::Layer => {
                    let existing = existing.clone();
                    if layer_existing_as_phrase(staged, corpus, reference, &existing) {
                        summary.verse_layered += 1;
                    } else {
                        summary.verse_replaced += 1;
                    }
                    staged.verse.insert(reference.clone(), incoming);
                }
            },
        }
    }
}

/// Convert an existing verse highlight into a full-verse phrase span.
///
/// Returns false when the conversion is impossible: the verse text is not in
/// the corpus, or the verse already carries phrase spans (a full-verse span
/// would overlap them).
fn layer_existing_as_phrase(
    staged: &mut HighlightState,
    corpus: &Corpus,
    reference: &str,
    existing: &VerseHighlight,
) -> bool {
    let Some(verse) = corpus.verse_by_reference(reference) else {
        log::warn!(
            "layer import: verse {:?} not in corpus, existing highlight replaced",
            reference
        );
        return false;
    };
    if staged
        .phrase
        .get(reference)
        .is_some_and(|spans| !spans.is_empty())
    {
        return false;
    }
    let span = PhraseHighlight {
        id: format!("layer-{}", staged.phrase.len()),
        start: 0,
        end: verse.text.len(),
        text: verse.text.clone(),
        color: existing.color.clone(),
        timestamp: existing.timestamp,
    };
    let mut spans = SpanList::new();
    spans.push(span);
    staged.phrase.insert(reference.to_string(), spans);
    true
}

fn merge_phrase_highlights(
    staged: &mut HighlightState,
    corpus: &Corpus,
    payload: &HighlightPayload,
    strategy: MergeStrategy,
    summary: &mut ImportSummary,
) {
    let mut generated = 0usize;
    for (reference, imported_spans) in &payload.phrase_highlights {
        for imported in imported_spans {
            // Validation already proved the offsets are sane.
            let Ok((start, end)) = span_offsets(imported) else {
                continue;
            };
            if let Some(verse) = corpus.verse_by_reference(reference) {
                let in_range = end <= verse.text.len()
                    && verse.text.is_char_boundary(start)
                    && verse.text.is_char_boundary(end);
                let text_matches =
                    in_range && (imported.text.is_empty() || verse.text[start..end] == imported.text);
                if !text_matches {
                    summary.phrase_text_mismatch += 1;
                    continue;
                }
            }
            let color = import_color(&imported.color, summary);
            let spans = staged.phrase.entry(reference.clone()).or_default();
            if let Some(existing) = spans
                .iter_mut()
                .find(|s| s.start == start && s.end == end)
            {
                match strategy {
                    MergeStrategy::AddMissing => {}
                    _ => {
                        existing.color = color;
                        existing.timestamp = imported.timestamp;
                        summary.phrase_updated += 1;
                    }
                }
                continue;
            }
            if spans.iter().any(|s| s.start < end && start < s.end) {
                summary.phrase_skipped_overlap += 1;
                continue;
            }
            let id = if imported.id.is_empty() {
                generated += 1;
                format!("imp-{}", generated)
            } else {
                imported.id.clone()
            };
            let text = if imported.text.is_empty() {
                corpus
                    .verse_by_reference(reference)
                    .map(|v| v.text[start..end].to_string())
                    .unwrap_or_default()
            } else {
                imported.text.clone()
            };
            let insert_at = spans
                .iter()
                .position(|s| s.start > start)
                .unwrap_or(spans.len());
            spans.insert(
                insert_at,
                PhraseHighlight {
                    id,
                    start,
                    end,
                    text,
                    color,
                    timestamp: imported.timestamp,
                },
            );
            summary.phrase_added += 1;
        }
        if staged
            .phrase
            .get(reference)
            .is_some_and(|spans| spans.is_empty())
        {
            staged.phrase.remove(reference);
        }
    }
}

/// Format epoch milliseconds as an ISO-8601 UTC timestamp.
pub fn format_export_date(now_ms: u64) -> String {
    let days = (now_ms / 86_400_000) as i64;
    let rem_ms = now_ms % 86_400_000;
    let (year, month, day) = civil_from_days(days);
    let hour = rem_ms / 3_600_000;
    let minute = (rem_ms / 60_000) % 60;
    let second = (rem_ms / 1_000) % 60;
    let millis = rem_ms % 1_000;
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year, month, day, hour, minute, second, millis
    )
}

/// Convert days since the Unix epoch into a (year, month, day) civil date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    (year + i64::from(month <= 2), month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ApplyMode;

    fn corpus() -> Corpus {
        Corpus::parse(
            "\
Genesis 1:1  In the beginning God created the heaven and the earth.
Genesis 1:2  And the earth was without form, and void.
Matthew 5:9  Blessed are the peacemakers.",
        )
    }

    fn palette() -> Vec<String> {
        vec!["#fff3cd".to_string(), "#d4edda".to_string()]
    }

    fn store_with_one_highlight() -> HighlightStore {
        let mut store = HighlightStore::new();
        store.cycle_verse("Genesis 1:1", &palette(), ApplyMode::Direct(0), 10);
        store
    }

    #[test]
    fn export_then_import_replace_round_trips() {
        let corpus = corpus();
        let mut store = store_with_one_highlight();
        store
            .add_phrase(
                "Genesis 1:2",
                4,
                13,
                "And the earth was without form, and void.",
                &palette(),
                ApplyMode::Cycle,
                11,
            )
            .unwrap();
        let json = export_json(store.state(), &palette(), 1_700_000_000_000).unwrap();
        let payload = parse_payload(&json).unwrap();
        assert_eq!(payload.version, PAYLOAD_VERSION);
        assert_eq!(payload.export_date, "2023-11-14T22:13:20.000Z");

        let mut fresh = HighlightStore::new();
        let summary =
            import_payload(&mut fresh, &corpus, &payload, MergeStrategy::Replace).unwrap();
        assert_eq!(summary.verse_added, 1);
        assert_eq!(summary.phrase_added, 1);
        assert_eq!(fresh.state(), store.state());
    }

    #[test]
    fn invalid_color_is_coerced_not_rejected() {
        let corpus = corpus();
        let mut store = HighlightStore::new();
        let payload = parse_payload(
            r#"{
                "highlights": { "Genesis 1:1": { "color": "notacolor", "timestamp": 5 } },
                "version": "1.0"
            }"#,
        )
        .unwrap();
        let summary =
            import_payload(&mut store, &corpus, &payload, MergeStrategy::AddMissing).unwrap();
        assert_eq!(summary.coerced_colors, 1);
        assert_eq!(
            store.verse_highlight("Genesis 1:1").unwrap().color,
            "#888888"
        );
    }

    #[test]
    fn add_missing_leaves_existing_entries_untouched() {
        let corpus = corpus();
        let mut store = store_with_one_highlight();
        let payload = parse_payload(
            r##"{
                "highlights": {
                    "Genesis 1:1": { "color": "#000000" },
                    "Matthew 5:9": { "color": "#d4edda" }
                },
                "version": "1.1"
            }"##,
        )
        .unwrap();
        let summary =
            import_payload(&mut store, &corpus, &payload, MergeStrategy::AddMissing).unwrap();
        assert_eq!(summary.verse_added, 1);
        assert_eq!(summary.verse_skipped, 1);
        assert_eq!(
            store.verse_highlight("Genesis 1:1").unwrap().color,
            "#fff3cd"
        );
        assert_eq!(
            store.verse_highlight("Matthew 5:9").unwrap().color,
            "#d4edda"
        );
    }

    #[test]
    fn prefer_imported_overwrites_conflicts() {
        let corpus = corpus();
        let mut store = store_with_one_highlight();
        let payload = parse_payload(
            r##"{
                "highlights": { "Genesis 1:1": { "color": "#d4edda" } },
                "version": "1.1"
            }"##,
        )
        .unwrap();
        let summary =
            import_payload(&mut store, &corpus, &payload, MergeStrategy::PreferImported).unwrap();
        assert_eq!(summary.verse_replaced, 1);
        assert_eq!(
            store.verse_highlight("Genesis 1:1").unwrap().color,
            "#d4edda"
        );
    }

    #[test]
    fn layer_converts_existing_into_full_verse_phrase() {
        let corpus = corpus();
        let mut store = store_with_one_highlight();
        let payload = parse_payload(
            r##"{
                "highlights": { "Genesis 1:1": { "color": "#d4edda" } },
                "version": "1.1"
            }"##,
        )
        .unwrap();
        let summary = import_payload(&mut store, &corpus, &payload, MergeStrategy::Layer).unwrap();
        assert_eq!(summary.verse_layered, 1);
        assert_eq!(
            store.verse_highlight("Genesis 1:1").unwrap().color,
            "#d4edda"
        );
        let spans = store.phrase_highlights("Genesis 1:1");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 0);
        assert_eq!(
            spans[0].end,
            corpus.verse_by_reference("Genesis 1:1").unwrap().text.len()
        );
        assert_eq!(spans[0].color, "#fff3cd");
    }

    #[test]
    fn unsupported_version_is_rejected_without_mutation() {
        let corpus = corpus();
        let mut store = store_with_one_highlight();
        let before = store.state().clone();
        let payload = parse_payload(
            r#"{ "highlights": {}, "version": "9.9" }"#,
        )
        .unwrap();
        let err = import_payload(&mut store, &corpus, &payload, MergeStrategy::Replace)
            .expect_err("version 9.9 should be rejected");
        assert!(matches!(err, ImportError::UnsupportedVersion(_)));
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn invalid_span_rejects_whole_payload() {
        let corpus = corpus();
        let mut store = store_with_one_highlight();
        let before = store.state().clone();
        let payload = parse_payload(
            r##"{
                "highlights": { "Matthew 5:9": { "color": "#d4edda" } },
                "phraseHighlights": {
                    "Genesis 1:2": [ { "start": 9, "end": 3, "color": "#fff3cd" } ]
                },
                "version": "1.1"
            }"##,
        )
        .unwrap();
        let err = import_payload(&mut store, &corpus, &payload, MergeStrategy::PreferImported)
            .expect_err("inverted span should be rejected");
        assert_eq!(err, ImportError::InvalidSpan { start: 9, end: 3 });
        assert_eq!(store.state(), &before);
    }

    #[test]
    fn non_numeric_span_offsets_fail_parse() {
        let err = parse_payload(
            r##"{
                "phraseHighlights": {
                    "Genesis 1:1": [ { "start": "zero", "end": 3, "color": "#fff3cd" } ]
                },
                "version": "1.1"
            }"##,
        )
        .expect_err("string offsets should not parse");
        assert!(matches!(err, ImportError::Malformed(_)));
    }

    #[test]
    fn overlong_reference_is_rejected() {
        let corpus = corpus();
        let mut store = HighlightStore::new();
        let long_ref = "G".repeat(MAX_REFERENCE_BYTES + 1);
        let json = format!(
            r##"{{ "highlights": {{ "{}": {{ "color": "#fff3cd" }} }}, "version": "1.1" }}"##,
            long_ref
        );
        let payload = parse_payload(&json).unwrap();
        let err = import_payload(&mut store, &corpus, &payload, MergeStrategy::Replace)
            .expect_err("overlong reference should be rejected");
        assert!(matches!(err, ImportError::ReferenceTooLong { .. }));
    }

    #[test]
    fn mismatched_cached_text_skips_the_span() {
        let corpus = corpus();
        let mut store = HighlightStore::new();
        let payload = parse_payload(
            r##"{
                "phraseHighlights": {
                    "Genesis 1:1": [ { "start": 0, "end": 6, "text": "In der", "color": "#fff3cd" } ]
                },
                "version": "1.1"
            }"##,
        )
        .unwrap();
        let summary =
            import_payload(&mut store, &corpus, &payload, MergeStrategy::PreferImported).unwrap();
        assert_eq!(summary.phrase_text_mismatch, 1);
        assert!(store.phrase_highlights("Genesis 1:1").is_empty());
    }

    #[test]
    fn import_is_one_undo_step() {
        let corpus = corpus();
        let mut store = store_with_one_highlight();
        let payload = parse_payload(
            r##"{
                "highlights": { "Matthew 5:9": { "color": "#d4edda" } },
                "version": "1.1"
            }"##,
        )
        .unwrap();
        import_payload(&mut store, &corpus, &payload, MergeStrategy::PreferImported).unwrap();
        assert_eq!(store.verse_count(), 2);
        assert!(store.undo());
        assert_eq!(store.verse_count(), 1);
    }

    #[test]
    fn export_date_formatting() {
        assert_eq!(format_export_date(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(
            format_export_date(1_700_000_000_000),
            "2023-11-14T22:13:20.000Z"
        );
    }

    #[test]
    fn payload_palette_is_coerced() {
        let payload = HighlightPayload {
            colors: vec!["#ABCDEF".to_string(), "nope".to_string()],
            version: PAYLOAD_VERSION.to_string(),
            ..HighlightPayload::default()
        };
        assert_eq!(payload_palette(&payload), vec!["#abcdef", "#888888"]);
    }
}
