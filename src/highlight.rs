//! Verse and phrase highlight store.
//!
//! Two persisted maps: at most one whole-verse color per reference, and zero
//! or more non-overlapping sub-string phrase spans per reference. Every
//! mutating operation pushes a full-state snapshot onto a bounded undo
//! history first.
//!
//! Color choice is driven by [`ApplyMode`]: direct mode applies one palette
//! color (clicking the same color again clears), cycle mode advances through
//! the palette and wraps to removal:
//!
//! ```text
//! none -> palette[0] -> palette[1] -> ... -> palette[n-1] -> removed -> palette[0] -> ...
//! ```

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::settings::ApplyMode;

/// Maximum undo snapshots retained.
pub const UNDO_CAPACITY: usize = 50;

/// Maximum accepted byte length for a reference string.
pub const MAX_REFERENCE_BYTES: usize = 128;

/// A whole-verse color annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseHighlight {
    /// `#rrggbb` color.
    pub color: String,
    /// Creation time, epoch milliseconds.
    pub timestamp: u64,
}

/// A sub-string color annotation within one verse's text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseHighlight {
    /// Unique span token within the store.
    pub id: String,
    /// Byte offset of the span start (inclusive), on a char boundary.
    pub start: usize,
    /// Byte offset of the span end (exclusive), on a char boundary.
    pub end: usize,
    /// Cached substring, kept for integrity checking.
    pub text: String,
    /// `#rrggbb` color.
    pub color: String,
    /// Creation time, epoch milliseconds.
    pub timestamp: u64,
}

/// Span storage per verse; most verses hold one or two spans.
pub type SpanList = SmallVec<[PhraseHighlight; 2]>;

/// Full serializable highlight state: both maps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightState {
    /// Verse-level highlights keyed by reference.
    pub verse: BTreeMap<String, VerseHighlight>,
    /// Phrase highlights keyed by reference, sorted by span start.
    pub phrase: BTreeMap<String, SpanList>,
}

impl HighlightState {
    /// Whether both maps are empty.
    pub fn is_empty(&self) -> bool {
        self.verse.is_empty() && self.phrase.is_empty()
    }
}

/// Result of one verse-level highlight interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerseCycleOutcome {
    /// A highlight with this color is now present.
    Set(String),
    /// The highlight was removed.
    Removed,
    /// Nothing happened (empty palette).
    NoOp,
}

/// Result of one accepted phrase interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhraseOutcome {
    /// A new span was added; carries its id.
    Added(String),
    /// An identical span changed color.
    Recolored(String),
    /// An identical span cycled past the last color and was removed.
    Removed,
}

/// Why a phrase interaction was rejected (a no-op on the store).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanRejection {
    /// `start >= end`.
    EmptyRange,
    /// `end` exceeds the verse text length.
    OutOfBounds,
    /// An offset does not fall on a char boundary.
    NotCharBoundary,
    /// The span partially overlaps an existing different span.
    Overlap,
    /// The palette has no colors to apply.
    NoPalette,
}

/// In-memory highlight store with bounded undo.
#[derive(Clone, Debug, Default)]
pub struct HighlightStore {
    state: HighlightState,
    history: VecDeque<HighlightState>,
    next_span_id: u64,
}

impl HighlightStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store around previously persisted state.
    pub fn from_state(state: HighlightState) -> Self {
        Self {
            state,
            history: VecDeque::with_capacity(8),
            next_span_id: 0,
        }
    }

    /// Current state, for rendering and persistence.
    pub fn state(&self) -> &HighlightState {
        &self.state
    }

    /// The verse-level highlight for a reference, if any.
    pub fn verse_highlight(&self, reference: &str) -> Option<&VerseHighlight> {
        self.state.verse.get(reference)
    }

    /// Phrase spans for a reference, sorted by start offset.
    pub fn phrase_highlights(&self, reference: &str) -> &[PhraseHighlight] {
        self.state
            .phrase
            .get(reference)
            .map(|spans| spans.as_slice())
            .unwrap_or(&[])
    }

    /// Number of verse-level highlights.
    pub fn verse_count(&self) -> usize {
        self.state.verse.len()
    }

    /// Total number of phrase spans across all verses.
    pub fn phrase_count(&self) -> usize {
        self.state.phrase.values().map(|s| s.len()).sum()
    }

    /// Whether the store holds no highlights.
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// References whose verse-level color is not in the given palette.
    ///
    /// Orphans stay stored and rendered; this is a query, not a cleanup.
    pub fn orphaned_references(&self, palette: &[String]) -> Vec<&str> {
        self.state
            .verse
            .iter()
            .filter(|(_, h)| !palette.contains(&h.color))
            .map(|(r, _)| r.as_str())
            .collect()
    }

    /// Cycle or directly apply the verse-level highlight for a reference.
    pub fn cycle_verse(
        &mut self,
        reference: &str,
        palette: &[String],
        mode: ApplyMode,
        now_ms: u64,
    ) -> VerseCycleOutcome {
        if palette.is_empty() {
            return VerseCycleOutcome::NoOp;
        }
        let current = self.state.verse.get(reference).map(|h| h.color.clone());
        let next = next_color(current.as_deref(), palette, mode);
        self.remember();
        match next {
            Some(color) => {
                self.state.verse.insert(
                    reference.to_string(),
                    VerseHighlight {
                        color: color.clone(),
                        timestamp: now_ms,
                    },
                );
                VerseCycleOutcome::Set(color)
            }
            None => {
                self.state.verse.remove(reference);
                VerseCycleOutcome::Removed
            }
        }
    }

    /// Apply the mode's color to every reference in a batch, as one undoable
    /// operation (the highlight-all-matches bulk action).
    ///
    /// Bulk application always sets; it never cycles or clears. In cycle
    /// mode the first palette color is used.
    pub fn highlight_all<'r>(
        &mut self,
        references: impl IntoIterator<Item = &'r str>,
        palette: &[String],
        mode: ApplyMode,
        now_ms: u64,
    ) -> usize {
        if palette.is_empty() {
            return 0;
        }
        let color = match mode {
            ApplyMode::Direct(idx) => palette[idx.min(palette.len() - 1)].clone(),
            ApplyMode::Cycle => palette[0].clone(),
        };
        self.remember();
        let mut applied = 0usize;
        for reference in references {
            self.state.verse.insert(
                reference.to_string(),
                VerseHighlight {
                    color: color.clone(),
                    timestamp: now_ms,
                },
            );
            applied += 1;
        }
        applied
    }

    /// Add, recolor, or cycle-remove a phrase span.
    ///
    /// `verse_text` is the full verse body; the span's substring is cached
    /// from it. A span partially overlapping an existing different span is
    /// rejected outright — never silently truncated.
    pub fn add_phrase(
        &mut self,
        reference: &str,
        start: usize,
        end: usize,
        verse_text: &str,
        palette: &[String],
        mode: ApplyMode,
        now_ms: u64,
    ) -> Result<PhraseOutcome, SpanRejection> {
        if start >= end {
            return Err(SpanRejection::EmptyRange);
        }
        if end > verse_text.len() {
            return Err(SpanRejection::OutOfBounds);
        }
        if !verse_text.is_char_boundary(start) || !verse_text.is_char_boundary(end) {
            return Err(SpanRejection::NotCharBoundary);
        }
        if palette.is_empty() {
            return Err(SpanRejection::NoPalette);
        }

        let existing = self.state.phrase.get(reference).and_then(|spans| {
            spans
                .iter()
                .enumerate()
                .find(|(_, s)| s.start == start && s.end == end)
                .map(|(idx, s)| (idx, s.color.clone()))
        });

        if let Some((idx, current)) = existing {
            let next = match mode {
                ApplyMode::Direct(_) => next_color(None, palette, mode),
                ApplyMode::Cycle => next_color(Some(&current), palette, mode),
            };
            self.remember();
            let mut emptied = false;
            let outcome = match self.state.phrase.get_mut(reference) {
                Some(spans) => match next {
                    Some(color) => {
                        spans[idx].color = color;
                        PhraseOutcome::Recolored(spans[idx].id.clone())
                    }
                    None => {
                        spans.remove(idx);
                        emptied = spans.is_empty();
                        PhraseOutcome::Removed
                    }
                },
                None => PhraseOutcome::Removed,
            };
            if emptied {
                self.state.phrase.remove(reference);
            }
            return Ok(outcome);
        }

        let overlaps = self
            .state
            .phrase
            .get(reference)
            .is_some_and(|spans| spans.iter().any(|s| s.start < end && start < s.end));
        if overlaps {
            return Err(SpanRejection::Overlap);
        }

        let color = match mode {
            ApplyMode::Direct(idx) => palette[idx.min(palette.len() - 1)].clone(),
            ApplyMode::Cycle => palette[0].clone(),
        };
        self.remember();
        let id = self.allocate_span_id(reference);
        let span = PhraseHighlight {
            id: id.clone(),
            start,
            end,
            text: verse_text[start..end].to_string(),
            color,
            timestamp: now_ms,
        };
        let spans = self.state.phrase.entry(reference.to_string()).or_default();
        let insert_at = spans.iter().position(|s| s.start > start).unwrap_or(spans.len());
        spans.insert(insert_at, span);
        Ok(PhraseOutcome::Added(id))
    }

    /// Remove a phrase span by id. Returns whether anything was removed.
    pub fn remove_phrase(&mut self, reference: &str, id: &str) -> bool {
        let Some(idx) = self
            .state
            .phrase
            .get(reference)
            .and_then(|spans| spans.iter().position(|s| s.id == id))
        else {
            return false;
        };
        self.remember();
        let mut emptied = false;
        if let Some(spans) = self.state.phrase.get_mut(reference) {
            spans.remove(idx);
            emptied = spans.is_empty();
        }
        if emptied {
            self.state.phrase.remove(reference);
        }
        true
    }

    /// Remove every highlight, as one undoable operation.
    pub fn clear(&mut self) {
        if self.state.is_empty() {
            return;
        }
        self.remember();
        self.state = HighlightState::default();
    }

    /// Replace the whole state (import paths), as one undoable operation.
    pub fn replace_state(&mut self, state: HighlightState) {
        self.remember();
        self.state = state;
    }

    /// Restore the most recent snapshot. Returns false when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop_back() {
            Some(previous) => {
                self.state = previous;
                true
            }
            None => false,
        }
    }

    /// Snapshots currently held.
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    fn remember(&mut self) {
        if self.history.len() == UNDO_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(self.state.clone());
    }

    fn allocate_span_id(&mut self, reference: &str) -> String {
        loop {
            let candidate = format!("ph-{}", self.next_span_id);
            self.next_span_id += 1;
            let taken = self
                .state
                .phrase
                .get(reference)
                .is_some_and(|spans| spans.iter().any(|s| s.id == candidate));
            if !taken {
                return candidate;
            }
        }
    }
}

/// Advance rule shared by verse and phrase highlights.
///
/// Returns the next color, or `None` for removal. Direct mode toggles on an
/// exact color match only when `current` is supplied; cycle mode walks the
/// palette and wraps to removal. A current color missing from the palette
/// (orphaned) restarts the cycle at index 0.
fn next_color(current: Option<&str>, palette: &[String], mode: ApplyMode) -> Option<String> {
    match mode {
        ApplyMode::Direct(idx) => {
            let chosen = &palette[idx.min(palette.len() - 1)];
            match current {
                Some(existing) if existing == chosen => None,
                _ => Some(chosen.clone()),
            }
        }
        ApplyMode::Cycle => match current {
            None => Some(palette[0].clone()),
            Some(existing) => match palette.iter().position(|c| c == existing) {
                Some(pos) if pos + 1 < palette.len() => Some(palette[pos + 1].clone()),
                Some(_) => None,
                None => Some(palette[0].clone()),
            },
        },
    }
}
