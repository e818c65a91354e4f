//! One controller owning settings, highlights, and reading position.
//!
//! The session replaces ambient mutable state: parser, navigation, and
//! renderer all receive what they need by reference from here. Every
//! mutation persists synchronously; a storage failure keeps the in-memory
//! state applied and is surfaced as [`Persistence::MemoryOnly`] so the
//! caller can warn the user instead of losing data silently.

use std::collections::BTreeMap;

use crate::corpus::Corpus;
use crate::error::{ImportError, StorageError};
use crate::highlight::{
    HighlightState, HighlightStore, PhraseOutcome, SpanList, SpanRejection, VerseCycleOutcome,
    VerseHighlight,
};
use crate::interchange::{self, ImportSummary, MergeStrategy};
use crate::settings::{coerce_hex_color, ApplyMode, DisplaySettings};
use crate::store::{
    ReadingPosition, StateStore, PHRASE_HIGHLIGHTS_KEY, POSITION_KEY, SETTINGS_KEY,
    VERSE_HIGHLIGHTS_KEY,
};

/// Whether a mutation reached durable storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Persistence {
    /// The state was written through.
    Durable,
    /// The state is applied in memory only; the write failed.
    MemoryOnly(StorageError),
}

impl Persistence {
    /// True when the write succeeded.
    pub fn is_durable(&self) -> bool {
        matches!(self, Self::Durable)
    }
}

/// Application state for one reader session.
pub struct StudySession<S: StateStore> {
    store: S,
    settings: DisplaySettings,
    highlights: HighlightStore,
    position: ReadingPosition,
}

impl<S: StateStore> StudySession<S> {
    /// Load a session from the store, defaulting every absent or corrupt key.
    pub fn load(store: S) -> Self {
        let mut settings: DisplaySettings =
            load_key(&store, SETTINGS_KEY).unwrap_or_default();
        settings.sanitize();

        let verse: BTreeMap<String, VerseHighlight> =
            load_key(&store, VERSE_HIGHLIGHTS_KEY).unwrap_or_default();
        let phrase: BTreeMap<String, SpanList> =
            load_key(&store, PHRASE_HIGHLIGHTS_KEY).unwrap_or_default();
        let highlights = HighlightStore::from_state(HighlightState { verse, phrase });

        let position: ReadingPosition = load_key(&store, POSITION_KEY).unwrap_or_default();

        Self {
            store,
            settings,
            highlights,
            position,
        }
    }

    /// Current display settings.
    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    /// Current highlight store.
    pub fn highlights(&self) -> &HighlightStore {
        &self.highlights
    }

    /// Last-viewed navigation position.
    pub fn position(&self) -> &ReadingPosition {
        &self.position
    }

    /// Set the font size (clamped) and persist settings.
    pub fn set_font_size_px(&mut self, px: u32) -> Persistence {
        self.settings.set_font_size_px(px);
        self.persist_settings()
    }

    /// Set the column count (clamped) and persist settings.
    pub fn set_column_count(&mut self, columns: u32) -> Persistence {
        self.settings.set_column_count(columns);
        self.persist_settings()
    }

    /// Switch the highlight apply mode and persist settings.
    pub fn set_mode(&mut self, mode: ApplyMode) -> Persistence {
        self.settings.mode = mode;
        if let ApplyMode::Direct(idx) = self.settings.mode {
            if idx >= self.settings.palette.len() {
                self.settings.mode = ApplyMode::Direct(0);
            }
        }
        self.persist_settings()
    }

    /// Replace the palette (colors coerced) and persist settings.
    pub fn set_palette(&mut self, palette: Vec<String>) -> Persistence {
        self.settings.palette = palette.iter().map(|c| coerce_hex_color(c)).collect();
        self.settings.sanitize();
        self.persist_settings()
    }

    /// Record the navigation position and persist it.
    pub fn set_position(&mut self, position: ReadingPosition) -> Persistence {
        self.position = position;
        match write_key(&self.store, POSITION_KEY, &self.position) {
            Ok(()) => Persistence::Durable,
            Err(e) => warn_memory_only(e),
        }
    }

    /// Cycle or directly apply a verse-level highlight, then persist.
    pub fn cycle_verse_highlight(
        &mut self,
        reference: &str,
        now_ms: u64,
    ) -> (VerseCycleOutcome, Persistence) {
        let outcome = self.highlights.cycle_verse(
            reference,
            &self.settings.palette,
            self.settings.mode,
            now_ms,
        );
        let persisted = self.persist_highlights();
        (outcome, persisted)
    }

    /// Add, recolor, or cycle-remove a phrase span, then persist.
    pub fn add_phrase_highlight(
        &mut self,
        reference: &str,
        start: usize,
        end: usize,
        verse_text: &str,
        now_ms: u64,
    ) -> Result<(PhraseOutcome, Persistence), SpanRejection> {
        let outcome = self.highlights.add_phrase(
            reference,
            start,
            end,
            verse_text,
            &self.settings.palette,
            self.settings.mode,
            now_ms,
        )?;
        let persisted = self.persist_highlights();
        Ok((outcome, persisted))
    }

    /// Remove one phrase span by id, then persist.
    pub fn remove_phrase_highlight(&mut self, reference: &str, id: &str) -> (bool, Persistence) {
        let removed = self.highlights.remove_phrase(reference, id);
        if !removed {
            return (false, Persistence::Durable);
        }
        (true, self.persist_highlights())
    }

    /// Apply the active color to every verse matching a search term.
    pub fn highlight_all_matches(
        &mut self,
        corpus: &Corpus,
        term: &str,
        now_ms: u64,
    ) -> (usize, Persistence) {
        let matches = corpus.search(term);
        if matches.is_empty() {
            return (0, Persistence::Durable);
        }
        let references: Vec<String> = matches
            .iter()
            .filter_map(|&idx| corpus.verses().get(idx))
            .map(|v| v.reference())
            .collect();
        let applied = self.highlights.highlight_all(
            references.iter().map(String::as_str),
            &self.settings.palette,
            self.settings.mode,
            now_ms,
        );
        (applied, self.persist_highlights())
    }

    /// Undo the most recent highlight mutation, then persist.
    ///
    /// Returns false when there was nothing to undo.
    pub fn undo_highlights(&mut self) -> (bool, Persistence) {
        if !self.highlights.undo() {
            return (false, Persistence::Durable);
        }
        (true, self.persist_highlights())
    }

    /// Remove all highlights, then persist.
    pub fn clear_highlights(&mut self) -> Persistence {
        self.highlights.clear();
        self.persist_highlights()
    }

    /// Export the highlight state as pretty JSON.
    pub fn export_highlights_json(&self, now_ms: u64) -> Result<String, ImportError> {
        interchange::export_json(self.highlights.state(), &self.settings.palette, now_ms)
    }

    /// Import a highlight payload under a merge strategy, then persist.
    pub fn import_highlights_json(
        &mut self,
        corpus: &Corpus,
        json: &str,
        strategy: MergeStrategy,
    ) -> Result<(ImportSummary, Persistence), ImportError> {
        let payload = interchange::parse_payload(json)?;
        let summary = interchange::import_payload(&mut self.highlights, corpus, &payload, strategy)?;
        Ok((summary, self.persist_highlights()))
    }

    fn persist_settings(&self) -> Persistence {
        match write_key(&self.store, SETTINGS_KEY, &self.settings) {
            Ok(()) => Persistence::Durable,
            Err(e) => warn_memory_only(e),
        }
    }

    fn persist_highlights(&self) -> Persistence {
        let state = self.highlights.state();
        let result = write_key(&self.store, VERSE_HIGHLIGHTS_KEY, &state.verse)
            .and_then(|()| write_key(&self.store, PHRASE_HIGHLIGHTS_KEY, &state.phrase));
        match result {
            Ok(()) => Persistence::Durable,
            Err(e) => warn_memory_only(e),
        }
    }
}

fn warn_memory_only(err: StorageError) -> Persistence {
    log::warn!("highlight state kept in memory only: {}", err);
    Persistence::MemoryOnly(err)
}

fn load_key<T: serde::de::DeserializeOwned>(store: &impl StateStore, key: &str) -> Option<T> {
    let value = match store.load(key) {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("could not read persisted key {}: {}", key, e);
            return None;
        }
    };
    match serde_json::from_str(&value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("persisted key {} is corrupt, using defaults: {}", key, e);
            None
        }
    }
}

fn write_key<T: serde::Serialize>(
    store: &impl StateStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(|e| {
        StorageError::new(key, crate::error::StorageErrorKind::Serialize, e.to_string())
    })?;
    store.store(key, &json)
}
