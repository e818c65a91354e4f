//! Scripture corpus parsing, navigation, and highlighting for reader UIs.
//!
//! The core pipeline, in dependency order:
//!
//! - [`corpus`] parses a flat line-delimited corpus into immutable verse
//!   records with volume tags.
//! - [`navigation`] derives cascading volume/book/chapter/verse selection
//!   and the filtered verse subsequence.
//! - [`highlight`] stores whole-verse colors and sub-string phrase spans
//!   with a bounded undo history.
//! - [`interchange`] imports and exports the highlight state as JSON under
//!   four merge strategies.
//! - [`session`] owns settings, highlights, and position for one reader,
//!   persisting through [`store`] on every mutation.
//!
//! Pagination and HTML rendering live in the companion
//! `verse-stream-render` crate.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod corpus;
pub mod error;
pub mod navigation;

#[cfg(feature = "std")]
pub mod highlight;
#[cfg(feature = "std")]
pub mod interchange;
#[cfg(feature = "std")]
pub mod session;
#[cfg(feature = "std")]
pub mod settings;
#[cfg(feature = "std")]
pub mod store;

pub use corpus::{
    volume_for_book, Corpus, CorpusFormat, FieldSeparator, ParseReport, ParserLimits, Verse,
    Volume,
};
pub use error::{ImportError, StorageError, StorageErrorKind, VerseError};
pub use navigation::{NavIndex, Selection};

#[cfg(feature = "std")]
pub use highlight::{
    HighlightState, HighlightStore, PhraseHighlight, PhraseOutcome, SpanRejection,
    VerseCycleOutcome, VerseHighlight, MAX_REFERENCE_BYTES, UNDO_CAPACITY,
};
#[cfg(feature = "std")]
pub use interchange::{
    export_json, export_payload, import_payload, parse_payload, HighlightPayload, ImportSummary,
    MergeStrategy, PAYLOAD_VERSION,
};
#[cfg(feature = "std")]
pub use session::{Persistence, StudySession};
#[cfg(feature = "std")]
pub use settings::{
    coerce_hex_color, normalize_hex_color, ApplyMode, DisplaySettings, DEFAULT_PALETTE,
    FALLBACK_COLOR, MAX_COLUMN_COUNT, MAX_FONT_SIZE_PX, MIN_COLUMN_COUNT, MIN_FONT_SIZE_PX,
};
#[cfg(feature = "std")]
pub use store::{
    FileStateStore, MemoryStateStore, ReadingPosition, StateStore, PHRASE_HIGHLIGHTS_KEY,
    POSITION_KEY, SETTINGS_KEY, VERSE_HIGHLIGHTS_KEY,
};
