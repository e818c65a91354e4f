//! Scripture corpus parsing.
//!
//! A corpus is a plain-text resource with one verse per line:
//!
//! ```text
//! Genesis 1:1     In the beginning God created the heaven and the earth.
//! ```
//!
//! The reference and the verse body are separated by a run of two or more
//! whitespace characters or a single tab, and the reference always ends in
//! `<chapter>:<verse>`. Parsing is lenient: lines that do not match the
//! pattern are skipped and counted, never fatal.
//!
//! # Usage
//!
//! ```rust
//! use verse_stream::corpus::{Corpus, Volume};
//!
//! let corpus = Corpus::parse("Genesis 1:1  In the beginning God created the heaven and the earth.");
//! assert_eq!(corpus.len(), 1);
//! assert_eq!(corpus.verses()[0].volume, Volume::OldTestament);
//! ```

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::VerseError;

/// The five canonical scripture divisions plus a fallback for books the
/// lookup table does not recognize.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Volume {
    OldTestament,
    NewTestament,
    BookOfMormon,
    DoctrineAndCovenants,
    PearlOfGreatPrice,
    Unknown,
}

impl Volume {
    /// The five known divisions, in canonical order.
    pub const KNOWN: [Volume; 5] = [
        Volume::OldTestament,
        Volume::NewTestament,
        Volume::BookOfMormon,
        Volume::DoctrineAndCovenants,
        Volume::PearlOfGreatPrice,
    ];

    /// Display label for this volume.
    pub fn label(self) -> &'static str {
        match self {
            Self::OldTestament => "Old Testament",
            Self::NewTestament => "New Testament",
            Self::BookOfMormon => "Book of Mormon",
            Self::DoctrineAndCovenants => "Doctrine and Covenants",
            Self::PearlOfGreatPrice => "Pearl of Great Price",
            Self::Unknown => "Unknown",
        }
    }

    /// Parse a display label back into a volume tag.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::KNOWN
            .iter()
            .copied()
            .find(|v| v.label() == label)
    }
}

impl core::fmt::Display for Volume {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

const OLD_TESTAMENT_BOOKS: &[&str] = &[
    "Genesis",
    "Exodus",
    "Leviticus",
    "Numbers",
    "Deuteronomy",
    "Joshua",
    "Judges",
    "Ruth",
    "1 Samuel",
    "2 Samuel",
    "1 Kings",
    "2 Kings",
    "1 Chronicles",
    "2 Chronicles",
    "Ezra",
    "Nehemiah",
    "Esther",
    "Job",
    "Psalms",
    "Proverbs",
    "Ecclesiastes",
    "Song of Solomon",
    "Isaiah",
    "Jeremiah",
    "Lamentations",
    "Ezekiel",
    "Daniel",
    "Hosea",
    "Joel",
    "Amos",
    "Obadiah",
    "Jonah",
    "Micah",
    "Nahum",
    "Habakkuk",
    "Zephaniah",
    "Haggai",
    "Zechariah",
    "Malachi",
];

const NEW_TESTAMENT_BOOKS: &[&str] = &[
    "Matthew",
    "Mark",
    "Luke",
    "John",
    "Acts",
    "Romans",
    "1 Corinthians",
    "2 Corinthians",
    "Galatians",
    "Ephesians",
    "Philippians",
    "Colossians",
    "1 Thessalonians",
    "2 Thessalonians",
    "1 Timothy",
    "2 Timothy",
    "Titus",
    "Philemon",
    "Hebrews",
    "James",
    "1 Peter",
    "2 Peter",
    "1 John",
    "2 John",
    "3 John",
    "Jude",
    "Revelation",
];

const BOOK_OF_MORMON_BOOKS: &[&str] = &[
    "1 Nephi",
    "2 Nephi",
    "Jacob",
    "Enos",
    "Jarom",
    "Omni",
    "Words of Mormon",
    "Mosiah",
    "Alma",
    "Helaman",
    "3 Nephi",
    "4 Nephi",
    "Mormon",
    "Ether",
    "Moroni",
];

const DOCTRINE_AND_COVENANTS_BOOKS: &[&str] = &["Doctrine and Covenants", "Official Declaration"];

const PEARL_OF_GREAT_PRICE_BOOKS: &[&str] = &[
    "Moses",
    "Abraham",
    "Joseph Smith--Matthew",
    "Joseph Smith--History",
    "Articles of Faith",
];

/// Fixed book-to-volume lookup covering the five canonical divisions.
///
/// Unrecognized books map to [`Volume::Unknown`].
pub fn volume_for_book(book: &str) -> Volume {
    if OLD_TESTAMENT_BOOKS.contains(&book) {
        Volume::OldTestament
    } else if NEW_TESTAMENT_BOOKS.contains(&book) {
        Volume::NewTestament
    } else if BOOK_OF_MORMON_BOOKS.contains(&book) {
        Volume::BookOfMormon
    } else if DOCTRINE_AND_COVENANTS_BOOKS.contains(&book) {
        Volume::DoctrineAndCovenants
    } else if PEARL_OF_GREAT_PRICE_BOOKS.contains(&book) {
        Volume::PearlOfGreatPrice
    } else {
        Volume::Unknown
    }
}

/// One verse record. Created at corpus load and immutable thereafter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verse {
    /// Book name (may itself start with a digit, e.g. "2 Nephi").
    pub book: String,
    /// 1-based chapter number.
    pub chapter: u32,
    /// 1-based verse number.
    pub verse: u32,
    /// Verse body text.
    pub text: String,
    /// Division this verse's book belongs to.
    pub volume: Volume,
}

impl Verse {
    /// Canonical reference string, derived deterministically as
    /// `"<book> <chapter>:<verse>"`.
    pub fn reference(&self) -> String {
        format!("{} {}:{}", self.book, self.chapter, self.verse)
    }
}

/// Field separator between the reference and the verse body.
///
/// Corpus files in the wild differ here and are not interchangeable, so the
/// separator is explicit parser configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldSeparator {
    /// A run of two or more whitespace characters.
    MultiSpace,
    /// Exactly one tab character.
    Tab,
    /// Either form, whichever appears first.
    #[default]
    Any,
}

/// Parser configuration for a corpus file variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CorpusFormat {
    /// Separator between reference and verse body.
    pub separator: FieldSeparator,
}

/// Hard limits for corpus parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParserLimits {
    /// Maximum UTF-8 byte length for a single line; longer lines are skipped.
    pub max_line_bytes: usize,
    /// Maximum number of verses accepted before parsing fails.
    pub max_verses: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_line_bytes: 16 * 1024,
            max_verses: 131_072,
        }
    }
}

impl ParserLimits {
    /// Constrained preset with smaller bounds.
    pub fn constrained() -> Self {
        Self {
            max_line_bytes: 4 * 1024,
            max_verses: 16_384,
        }
    }
}

/// What the parser saw while loading, for corpus-quality reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Number of verse records produced.
    pub verses: usize,
    /// Lines skipped for not matching the reference pattern or limits.
    pub skipped_lines: usize,
    /// Verses whose book was not in the lookup table.
    pub unknown_books: usize,
    /// Reference strings that appeared more than once.
    pub duplicate_references: usize,
}

/// An immutable, ordered verse corpus with a reference index.
#[derive(Clone, Debug, Default)]
pub struct Corpus {
    verses: Vec<Verse>,
    by_reference: BTreeMap<String, usize>,
    report: ParseReport,
}

impl Corpus {
    /// Parse corpus text with default format and limits.
    pub fn parse(text: &str) -> Self {
        // Default limits make the error path unreachable for any sane input;
        // an oversize corpus falls back to an empty corpus with a report.
        Self::parse_with(text, CorpusFormat::default(), ParserLimits::default())
            .unwrap_or_default()
    }

    /// Parse corpus text with explicit format and limits.
    ///
    /// Malformed lines never fail the load; only a breached `max_verses`
    /// limit does.
    pub fn parse_with(
        text: &str,
        format: CorpusFormat,
        limits: ParserLimits,
    ) -> Result<Self, VerseError> {
        let mut verses = Vec::with_capacity(1024);
        let mut by_reference = BTreeMap::new();
        let mut report = ParseReport::default();

        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if line.len() > limits.max_line_bytes {
                report.skipped_lines += 1;
                continue;
            }
            let Some((reference, body)) = split_line(line, format.separator) else {
                report.skipped_lines += 1;
                continue;
            };
            let Some((book, chapter, verse)) = parse_reference(reference) else {
                report.skipped_lines += 1;
                continue;
            };
            if verses.len() >= limits.max_verses {
                return Err(VerseError::Corpus(format!(
                    "Corpus exceeds max_verses ({} > {})",
                    verses.len() + 1,
                    limits.max_verses
                )));
            }
            let volume = volume_for_book(book);
            if volume == Volume::Unknown {
                report.unknown_books += 1;
            }
            let record = Verse {
                book: book.to_string(),
                chapter,
                verse,
                text: body.to_string(),
                volume,
            };
            let key = record.reference();
            if by_reference.insert(key, verses.len()).is_some() {
                report.duplicate_references += 1;
            }
            verses.push(record);
        }

        report.verses = verses.len();
        Ok(Self {
            verses,
            by_reference,
            report,
        })
    }

    /// All verses in file order.
    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    /// Number of verses.
    pub fn len(&self) -> usize {
        self.verses.len()
    }

    /// Whether the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    /// Parse-time quality report.
    pub fn report(&self) -> &ParseReport {
        &self.report
    }

    /// Look up a verse by its canonical reference string.
    ///
    /// When a corpus contains duplicate references the last occurrence wins,
    /// matching the index build order.
    pub fn verse_by_reference(&self, reference: &str) -> Option<&Verse> {
        self.by_reference
            .get(reference)
            .and_then(|&idx| self.verses.get(idx))
    }

    /// Case-insensitive substring search over verse bodies.
    ///
    /// Returns matching verse indices in corpus order.
    pub fn search(&self, term: &str) -> Vec<usize> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.verses
            .iter()
            .enumerate()
            .filter(|(_, v)| v.text.to_lowercase().contains(&needle))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Load and parse a corpus file.
    #[cfg(feature = "std")]
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self, VerseError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| VerseError::Io(format!("{}: {}", path.display(), e)))?;
        Self::parse_with(&text, CorpusFormat::default(), ParserLimits::default())
    }

    /// Load and parse a corpus file without blocking.
    #[cfg(feature = "async")]
    pub async fn load_from_path_async(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, VerseError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| VerseError::Io(format!("{}: {}", path.display(), e)))?;
        Self::parse_with(&text, CorpusFormat::default(), ParserLimits::default())
    }

    /// Stable content fingerprint over references and bodies.
    ///
    /// Feeds pagination cache keys so a changed corpus invalidates persisted
    /// page boundaries.
    #[cfg(feature = "std")]
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for verse in &self.verses {
            hasher.update(verse.book.as_bytes());
            hasher.update(&verse.chapter.to_le_bytes());
            hasher.update(&verse.verse.to_le_bytes());
            hasher.update(verse.text.as_bytes());
        }
        hasher.finalize()
    }
}

/// Split a line into reference and body at the configured separator.
fn split_line(line: &str, separator: FieldSeparator) -> Option<(&str, &str)> {
    let split_at = match separator {
        FieldSeparator::Tab => line.find('\t').map(|idx| (idx, idx + 1)),
        FieldSeparator::MultiSpace => find_multispace(line),
        FieldSeparator::Any => {
            let tab = line.find('\t').map(|idx| (idx, idx + 1));
            let run = find_multispace(line);
            match (tab, run) {
                (Some(t), Some(r)) if t.0 <= r.0 => Some(t),
                (Some(_), Some(r)) => Some(r),
                (Some(t), None) => Some(t),
                (None, run) => run,
            }
        }
    };
    let (ref_end, body_start) = split_at?;
    let reference = line[..ref_end].trim();
    let body = line[body_start..].trim();
    if reference.is_empty() || body.is_empty() {
        return None;
    }
    Some((reference, body))
}

/// Find the first run of two or more non-tab whitespace characters.
///
/// Returns (run start, index after the run).
fn find_multispace(line: &str) -> Option<(usize, usize)> {
    let mut run_start: Option<usize> = None;
    for (idx, ch) in line.char_indices() {
        if ch.is_whitespace() && ch != '\t' {
            if run_start.is_none() {
                run_start = Some(idx);
            }
        } else {
            if let Some(start) = run_start {
                if idx - start >= 2 {
                    return Some((start, idx));
                }
            }
            run_start = None;
        }
    }
    // A trailing whitespace run cannot separate a body; treat as no match.
    None
}

/// Parse `"<book> <chapter>:<verse>"` into its parts.
///
/// The chapter:verse token is the last whitespace-delimited token; everything
/// before it is the book name. Chapter and verse must be positive integers.
fn parse_reference(reference: &str) -> Option<(&str, u32, u32)> {
    let reference = reference.trim();
    let (book, locator) = reference.rsplit_once(' ')?;
    let (chapter, verse) = locator.split_once(':')?;
    let chapter: u32 = chapter.parse().ok()?;
    let verse: u32 = verse.parse().ok()?;
    if chapter == 0 || verse == 0 {
        return None;
    }
    let book = book.trim();
    if book.is_empty() {
        return None;
    }
    Some((book, chapter, verse))
}
