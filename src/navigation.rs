//! Cascading volume/book/chapter/verse navigation over a corpus.
//!
//! Four selection dimensions cascade downward: changing a higher dimension
//! clears every lower one and repopulates its option set. Filtering itself
//! is a pure predicate over the four fields; an empty dimension matches
//! everything.
//!
//! # Usage
//!
//! ```rust
//! use verse_stream::corpus::{Corpus, Volume};
//! use verse_stream::navigation::NavIndex;
//!
//! let corpus = Corpus::parse("Genesis 1:1  In the beginning God created the heaven and the earth.");
//! let mut nav = NavIndex::new(&corpus);
//! nav.set_volume(Some(Volume::OldTestament));
//! assert_eq!(nav.book_options(), vec!["Genesis"]);
//! ```

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::corpus::{Corpus, Verse, Volume};

/// Current values of the four selection dimensions.
///
/// `None` means the dimension is unset and matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub volume: Option<Volume>,
    pub book: Option<String>,
    pub chapter: Option<u32>,
    pub verse: Option<u32>,
}

impl Selection {
    /// Pure filter predicate over the four fields.
    pub fn matches(&self, verse: &Verse) -> bool {
        if let Some(volume) = self.volume {
            if verse.volume != volume {
                return false;
            }
        }
        if let Some(book) = &self.book {
            if &verse.book != book {
                return false;
            }
        }
        if let Some(chapter) = self.chapter {
            if verse.chapter != chapter {
                return false;
            }
        }
        if let Some(number) = self.verse {
            if verse.verse != number {
                return false;
            }
        }
        true
    }

    /// Stable key describing this selection, for pagination cache keying.
    pub fn key(&self) -> String {
        format!(
            "v={}|b={}|c={}|r={}",
            self.volume.map(|v| v.label()).unwrap_or(""),
            self.book.as_deref().unwrap_or(""),
            self.chapter.map(|c| c as i64).unwrap_or(-1),
            self.verse.map(|v| v as i64).unwrap_or(-1),
        )
    }
}

/// Navigation index owning the current selection for one corpus.
#[derive(Clone, Debug)]
pub struct NavIndex<'a> {
    corpus: &'a Corpus,
    selection: Selection,
}

impl<'a> NavIndex<'a> {
    /// Create an index with nothing selected.
    pub fn new(corpus: &'a Corpus) -> Self {
        Self {
            corpus,
            selection: Selection::default(),
        }
    }

    /// Create an index seeded with a previously saved selection.
    pub fn with_selection(corpus: &'a Corpus, selection: Selection) -> Self {
        Self { corpus, selection }
    }

    /// Current selection state.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Select a volume; clears book, chapter, and verse.
    pub fn set_volume(&mut self, volume: Option<Volume>) {
        self.selection.volume = volume;
        self.selection.book = None;
        self.selection.chapter = None;
        self.selection.verse = None;
    }

    /// Select a book; clears chapter and verse.
    pub fn set_book(&mut self, book: Option<String>) {
        self.selection.book = book;
        self.selection.chapter = None;
        self.selection.verse = None;
    }

    /// Select a chapter; clears verse.
    pub fn set_chapter(&mut self, chapter: Option<u32>) {
        self.selection.chapter = chapter;
        self.selection.verse = None;
    }

    /// Select a single verse number.
    pub fn set_verse(&mut self, verse: Option<u32>) {
        self.selection.verse = verse;
    }

    /// Distinct book names in the selected volume (or all volumes), in
    /// corpus order.
    pub fn book_options(&self) -> Vec<&'a str> {
        let mut books: Vec<&str> = Vec::with_capacity(8);
        for verse in self.corpus.verses() {
            if let Some(volume) = self.selection.volume {
                if verse.volume != volume {
                    continue;
                }
            }
            if !books.contains(&verse.book.as_str()) {
                books.push(&verse.book);
            }
        }
        books
    }

    /// Distinct chapter numbers for the selected book, ascending.
    ///
    /// Empty when no book is selected; a chapter list is only meaningful
    /// under a book.
    pub fn chapter_options(&self) -> Vec<u32> {
        let Some(book) = self.selection.book.as_deref() else {
            return Vec::new();
        };
        let mut chapters: Vec<u32> = Vec::with_capacity(8);
        for verse in self.corpus.verses() {
            if verse.book == book && !chapters.contains(&verse.chapter) {
                chapters.push(verse.chapter);
            }
        }
        chapters.sort_unstable();
        chapters
    }

    /// Distinct verse numbers for the selected book and chapter, ascending.
    pub fn verse_options(&self) -> Vec<u32> {
        let (Some(book), Some(chapter)) =
            (self.selection.book.as_deref(), self.selection.chapter)
        else {
            return Vec::new();
        };
        let mut numbers: Vec<u32> = Vec::with_capacity(8);
        for verse in self.corpus.verses() {
            if verse.book == book && verse.chapter == chapter && !numbers.contains(&verse.verse) {
                numbers.push(verse.verse);
            }
        }
        numbers.sort_unstable();
        numbers
    }

    /// Indices of verses matching all non-empty dimensions, in corpus order.
    pub fn filtered_indices(&self) -> Vec<usize> {
        self.corpus
            .verses()
            .iter()
            .enumerate()
            .filter(|(_, v)| self.selection.matches(v))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Verse records matching all non-empty dimensions, in corpus order.
    pub fn filtered_verses(&self) -> Vec<&'a Verse> {
        self.corpus
            .verses()
            .iter()
            .filter(|v| self.selection.matches(v))
            .collect()
    }

    /// Stable key describing the filtered set, for pagination cache keying.
    pub fn selection_key(&self) -> String {
        self.selection.key()
    }
}
