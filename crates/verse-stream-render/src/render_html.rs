//! HTML page rendering: headings, highlight layering, and escaping.
//!
//! Phrase highlights are layered first; the search-term highlight is then
//! layered inside each segment, so search marks nest within phrase marks
//! instead of replacing them. All raw verse text and user-supplied search
//! terms are HTML-escaped — only the wrapper tags emitted here are trusted
//! markup.
//!
//! The markup carries click-routing hooks for a host UI: every verse
//! paragraph has `data-ref`, every phrase mark has `data-span-id`, so clicks
//! can be routed to verse-level cycling, phrase cycling, or span creation in
//! the highlight store.

use verse_stream::corpus::Verse;
use verse_stream::highlight::{HighlightStore, PhraseHighlight};

use crate::render_layout::heading_transition;

/// Rendering options for one page.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions<'a> {
    /// Active search term, highlighted over any phrase markup.
    pub search_term: Option<&'a str>,
}

/// Render the verse range `[start, end)` of a filtered sequence as one page.
///
/// Headings are emitted by comparing each verse with the one immediately
/// before it — including the verse before the page's start index, so a book
/// or chapter that continues across the page boundary does not repeat its
/// heading.
pub fn render_page_html(
    verses: &[&Verse],
    start: usize,
    end: usize,
    highlights: &HighlightStore,
    options: &RenderOptions<'_>,
) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<article class=\"page\">\n");
    for idx in start..end.min(verses.len()) {
        let prev = if idx == 0 { None } else { Some(verses[idx - 1]) };
        let verse = verses[idx];
        let (book_changed, chapter_changed) = heading_transition(prev, verse);
        if book_changed {
            html.push_str("<h2 class=\"book-heading\">");
            html.push_str(&html_escape(&verse.book));
            html.push_str("</h2>\n");
        }
        if chapter_changed {
            html.push_str("<h3 class=\"chapter-heading\">");
            html.push_str(&html_escape(&verse.book));
            html.push(' ');
            html.push_str(&verse.chapter.to_string());
            html.push_str("</h3>\n");
        }
        html.push_str(&render_verse_html(verse, highlights, options));
        html.push('\n');
    }
    html.push_str("</article>\n");
    html
}

/// Render one verse paragraph with its highlights and search marks.
pub fn render_verse_html(
    verse: &Verse,
    highlights: &HighlightStore,
    options: &RenderOptions<'_>,
) -> String {
    let reference = verse.reference();
    let spans = highlights.phrase_highlights(&reference);
    let body = render_body(&verse.text, spans, options.search_term);
    let style = highlights
        .verse_highlight(&reference)
        .map(|h| format!(" style=\"background-color:{}\"", html_escape(&h.color)))
        .unwrap_or_default();
    format!(
        "<p class=\"verse\" data-ref=\"{}\"{}><sup class=\"verse-num\">{}</sup> {}</p>",
        html_escape(&reference),
        style,
        verse.verse,
        body
    )
}

/// Split verse text on phrase-span boundaries and compose search marks
/// inside every segment.
fn render_body(text: &str, spans: &[PhraseHighlight], search_term: Option<&str>) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    let mut cursor = 0usize;
    for span in spans {
        // A span that no longer fits the text (stale offsets after a corpus
        // change) renders as plain text rather than corrupting the markup.
        if span.start < cursor
            || span.end > text.len()
            || span.start >= span.end
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            continue;
        }
        out.push_str(&render_search_marks(&text[cursor..span.start], search_term));
        out.push_str("<mark class=\"phrase-highlight\" data-span-id=\"");
        out.push_str(&html_escape(&span.id));
        out.push_str("\" style=\"background-color:");
        out.push_str(&html_escape(&span.color));
        out.push_str("\">");
        out.push_str(&render_search_marks(&text[span.start..span.end], search_term));
        out.push_str("</mark>");
        cursor = span.end;
    }
    out.push_str(&render_search_marks(&text[cursor..], search_term));
    out
}

/// Escape a segment, wrapping case-insensitive search matches.
fn render_search_marks(raw: &str, search_term: Option<&str>) -> String {
    let term = search_term.map(str::trim).unwrap_or("");
    if term.is_empty() {
        return html_escape(raw);
    }
    let mut out = String::with_capacity(raw.len() + 16);
    let mut cursor = 0usize;
    while let Some(at) = find_ascii_ci(raw, term, cursor) {
        out.push_str(&html_escape(&raw[cursor..at]));
        out.push_str("<mark class=\"search-hit\">");
        out.push_str(&html_escape(&raw[at..at + term.len()]));
        out.push_str("</mark>");
        cursor = at + term.len();
    }
    out.push_str(&html_escape(&raw[cursor..]));
    out
}

/// First ASCII-case-insensitive match of `needle` at or after `from`.
///
/// Byte-window comparison is char-boundary safe: UTF-8 is
/// self-synchronizing, and non-ASCII bytes only match exactly.
fn find_ascii_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let haystack_bytes = haystack.as_bytes();
    let needle_bytes = needle.as_bytes();
    if needle_bytes.is_empty() || from + needle_bytes.len() > haystack_bytes.len() {
        return None;
    }
    (from..=haystack_bytes.len() - needle_bytes.len()).find(|&i| {
        haystack_bytes[i..i + needle_bytes.len()].eq_ignore_ascii_case(needle_bytes)
    })
}

/// Escape text for element content and attribute values.
pub fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
