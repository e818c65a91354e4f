//! Deterministic text measurement and page-fill math.
//!
//! The original pagination discovered overflow by rendering into a hidden
//! DOM node. This engine substitutes a deterministic text-wrapping model: a
//! [`TextMeasurer`] estimates rendered text width for a font size, greedy
//! word wrap derives line counts, and column fill derives how many verses a
//! page holds. The substitution trades glyph-exact fidelity for
//! reproducibility on any target; install a glyph-accurate measurer via
//! [`PaginationEngine::with_text_measurer`](crate::PaginationEngine::with_text_measurer)
//! when one is available.

use verse_stream::corpus::Verse;
use verse_stream::settings::DisplaySettings;

/// Text width measurement hook for line fitting.
pub trait TextMeasurer: Send + Sync {
    /// Measure rendered text width in pixels at a font size.
    fn measure_text_px(&self, text: &str, font_size_px: f32) -> f32;

    /// Conservative (safe upper-bound) width estimate.
    ///
    /// Default delegates to `measure_text_px`.
    fn conservative_text_px(&self, text: &str, font_size_px: f32) -> f32 {
        self.measure_text_px(text, font_size_px)
    }
}

/// Default measurer: per-glyph-class width factors of the em size.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
    fn measure_text_px(&self, text: &str, font_size_px: f32) -> f32 {
        text.chars().map(char_width_factor).sum::<f32>() * font_size_px
    }

    fn conservative_text_px(&self, text: &str, font_size_px: f32) -> f32 {
        self.measure_text_px(text, font_size_px) * 1.08
    }
}

fn char_width_factor(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | 't' | 'f' | 'r' | '.' | ',' | ';' | ':' | '!' | '\'' | '|' => 0.34,
        'm' | 'w' => 0.82,
        'M' | 'W' => 0.95,
        ' ' => 0.32,
        c if c.is_ascii_uppercase() => 0.72,
        c if c.is_ascii_digit() => 0.58,
        _ => 0.52,
    }
}

/// Viewport geometry and spacing knobs for page construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Viewport width in pixels.
    pub viewport_width: i32,
    /// Viewport height in pixels.
    pub viewport_height: i32,
    /// Left margin.
    pub margin_left: i32,
    /// Right margin.
    pub margin_right: i32,
    /// Top margin.
    pub margin_top: i32,
    /// Bottom margin.
    pub margin_bottom: i32,
    /// Horizontal gap between columns.
    pub column_gap_px: i32,
    /// Extra gap between lines.
    pub line_gap_px: i32,
    /// Gap after each verse block.
    pub verse_gap_px: i32,
    /// Gap after each heading block.
    pub heading_gap_px: i32,
    /// Book heading font scale relative to the body size.
    pub book_heading_scale: f32,
    /// Chapter heading font scale relative to the body size.
    pub chapter_heading_scale: f32,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f32,
    /// Verses per page when measurement is unavailable.
    pub fallback_verses_per_page: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_width: 960,
            viewport_height: 720,
            margin_left: 32,
            margin_right: 32,
            margin_top: 40,
            margin_bottom: 32,
            column_gap_px: 28,
            line_gap_px: 0,
            verse_gap_px: 6,
            heading_gap_px: 10,
            book_heading_scale: 1.6,
            chapter_heading_scale: 1.3,
            line_height_factor: 1.4,
            fallback_verses_per_page: 20,
        }
    }
}

impl LayoutConfig {
    /// Convenience for a viewport size with default spacing.
    pub fn for_viewport(width: i32, height: i32) -> Self {
        Self {
            viewport_width: width,
            viewport_height: height,
            ..Self::default()
        }
    }

    /// Usable width after margins.
    pub fn content_width(&self) -> i32 {
        self.viewport_width - self.margin_left - self.margin_right
    }

    /// Usable height after margins.
    pub fn content_height(&self) -> i32 {
        self.viewport_height - self.margin_top - self.margin_bottom
    }

    /// Width of one column for a column count.
    pub fn column_width(&self, columns: u32) -> i32 {
        let columns = columns.max(1) as i32;
        (self.content_width() - self.column_gap_px * (columns - 1)) / columns
    }

    /// Line advance in pixels for a font size.
    pub fn line_height_px(&self, font_size_px: f32) -> i32 {
        (font_size_px * self.line_height_factor).ceil() as i32 + self.line_gap_px
    }
}

/// Which headings precede a verse, given the verse immediately before it.
///
/// A book change forces a chapter heading too. The first verse of a
/// sequence (`prev == None`) gets both.
pub fn heading_transition(prev: Option<&Verse>, verse: &Verse) -> (bool, bool) {
    let book_changed = prev.map_or(true, |p| p.book != verse.book);
    let chapter_changed = book_changed || prev.map_or(true, |p| p.chapter != verse.chapter);
    (book_changed, chapter_changed)
}

/// Greedy word-wrap line count for text in a column.
///
/// A word wider than the column hard-wraps across as many lines as it
/// needs. Empty text still occupies one line.
pub fn wrap_line_count(
    measurer: &dyn TextMeasurer,
    text: &str,
    font_size_px: f32,
    max_width_px: f32,
) -> usize {
    if max_width_px <= 0.0 {
        return 1;
    }
    let space_width = measurer.measure_text_px(" ", font_size_px);
    let mut lines = 1usize;
    let mut current = 0f32;
    for word in text.split_whitespace() {
        let word_width = measurer.measure_text_px(word, font_size_px);
        if current > 0.0 {
            if current + space_width + word_width <= max_width_px {
                current += space_width + word_width;
                continue;
            }
            lines += 1;
            current = 0.0;
        }
        if word_width <= max_width_px {
            current = word_width;
        } else {
            let full_lines = (word_width / max_width_px).floor() as usize;
            lines += full_lines;
            current = word_width - full_lines as f32 * max_width_px;
            if current <= f32::EPSILON {
                // The word ended exactly at a line edge.
                lines -= 1;
                current = max_width_px;
            }
        }
    }
    lines
}

/// Rendered height of one verse block (number prefix plus body) in a column.
pub fn verse_block_height(
    cfg: &LayoutConfig,
    measurer: &dyn TextMeasurer,
    font_size_px: f32,
    column_width: i32,
    verse: &Verse,
) -> i32 {
    let text = format!("{} {}", verse.verse, verse.text);
    let lines = wrap_line_count(measurer, &text, font_size_px, column_width as f32);
    lines as i32 * cfg.line_height_px(font_size_px) + cfg.verse_gap_px
}

/// Rendered height of a book heading in a column.
pub fn book_heading_height(
    cfg: &LayoutConfig,
    measurer: &dyn TextMeasurer,
    font_size_px: f32,
    column_width: i32,
    book: &str,
) -> i32 {
    let heading_font = font_size_px * cfg.book_heading_scale;
    let lines = wrap_line_count(measurer, book, heading_font, column_width as f32);
    lines as i32 * cfg.line_height_px(heading_font) + cfg.heading_gap_px
}

/// Rendered height of a chapter heading in a column.
pub fn chapter_heading_height(
    cfg: &LayoutConfig,
    measurer: &dyn TextMeasurer,
    font_size_px: f32,
    column_width: i32,
    book: &str,
    chapter: u32,
) -> i32 {
    let heading_font = font_size_px * cfg.chapter_heading_scale;
    let label = format!("{} {}", book, chapter);
    let lines = wrap_line_count(measurer, &label, heading_font, column_width as f32);
    lines as i32 * cfg.line_height_px(heading_font) + cfg.heading_gap_px
}

/// Fill columns with verses from `start` and return the exclusive end index
/// of the page.
///
/// Always advances by at least one verse: a block taller than an entire
/// empty column is placed anyway and occupies that column alone. When
/// measurement is impossible (non-positive content height or column width)
/// a fixed verses-per-page fallback is used instead of failing.
pub fn measure_page(
    cfg: &LayoutConfig,
    measurer: &dyn TextMeasurer,
    settings: &DisplaySettings,
    verses: &[&Verse],
    start: usize,
) -> usize {
    let len = verses.len();
    if start >= len {
        return len;
    }
    let columns = settings.column_count.max(1);
    let content_height = cfg.content_height();
    let column_width = cfg.column_width(columns);
    if content_height <= 0 || column_width <= 0 {
        let step = cfg.fallback_verses_per_page.max(1);
        return (start + step).min(len);
    }

    let font = settings.font_size_px as f32;
    let mut column = 0u32;
    let mut column_y = 0i32;
    let mut idx = start;
    while idx < len {
        let prev = if idx == 0 { None } else { Some(verses[idx - 1]) };
        let verse = verses[idx];
        let (book_changed, chapter_changed) = heading_transition(prev, verse);
        let mut block_height = verse_block_height(cfg, measurer, font, column_width, verse);
        if book_changed {
            block_height += book_heading_height(cfg, measurer, font, column_width, &verse.book);
        }
        if chapter_changed {
            block_height +=
                chapter_heading_height(cfg, measurer, font, column_width, &verse.book, verse.chapter);
        }

        if column_y + block_height > content_height {
            if column_y == 0 {
                // Oversized block: it fills this column alone.
                idx += 1;
                column += 1;
                if column >= columns {
                    break;
                }
                continue;
            }
            column += 1;
            column_y = 0;
            if column >= columns {
                break;
            }
            continue;
        }
        column_y += block_height;
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use verse_stream::corpus::Corpus;

    fn verse(book: &str, chapter: u32, number: u32, text: &str) -> Verse {
        let line = format!("{} {}:{}  {}", book, chapter, number, text);
        Corpus::parse(&line).verses()[0].clone()
    }

    #[test]
    fn wrap_line_count_grows_as_width_shrinks() {
        let m = HeuristicMeasurer;
        let text = "In the beginning God created the heaven and the earth";
        let wide = wrap_line_count(&m, text, 16.0, 600.0);
        let narrow = wrap_line_count(&m, text, 16.0, 150.0);
        assert_eq!(wide, 1);
        assert!(narrow > wide);
    }

    #[test]
    fn wrap_line_count_handles_oversized_words() {
        let m = HeuristicMeasurer;
        let word = "x".repeat(200);
        let lines = wrap_line_count(&m, &word, 16.0, 100.0);
        assert!(lines > 1);
    }

    #[test]
    fn empty_text_occupies_one_line() {
        let m = HeuristicMeasurer;
        assert_eq!(wrap_line_count(&m, "", 16.0, 100.0), 1);
    }

    #[test]
    fn heading_transitions() {
        let a = verse("Genesis", 1, 1, "a");
        let b = verse("Genesis", 1, 2, "b");
        let c = verse("Genesis", 2, 1, "c");
        let d = verse("Exodus", 1, 1, "d");
        assert_eq!(heading_transition(None, &a), (true, true));
        assert_eq!(heading_transition(Some(&a), &b), (false, false));
        assert_eq!(heading_transition(Some(&b), &c), (false, true));
        assert_eq!(heading_transition(Some(&c), &d), (true, true));
    }

    #[test]
    fn measure_page_always_advances() {
        let m = HeuristicMeasurer;
        let cfg = LayoutConfig::for_viewport(200, 120);
        let settings = DisplaySettings::default();
        let long = "word ".repeat(300);
        let verses = vec![
            verse("Genesis", 1, 1, &long),
            verse("Genesis", 1, 2, &long),
        ];
        let refs: Vec<&Verse> = verses.iter().collect();
        let end = measure_page(&cfg, &m, &settings, &refs, 0);
        assert!(end > 0);
        let end = measure_page(&cfg, &m, &settings, &refs, 1);
        assert_eq!(end, 2);
    }

    #[test]
    fn zero_height_viewport_uses_fallback_estimate() {
        let m = HeuristicMeasurer;
        let cfg = LayoutConfig::for_viewport(960, 0);
        let settings = DisplaySettings::default();
        let verses: Vec<Verse> = (1..=50)
            .map(|n| verse("Genesis", 1, n, "In the beginning."))
            .collect();
        let refs: Vec<&Verse> = verses.iter().collect();
        assert_eq!(
            measure_page(&cfg, &m, &settings, &refs, 0),
            cfg.fallback_verses_per_page
        );
        assert_eq!(measure_page(&cfg, &m, &settings, &refs, 40), 50);
    }

    #[test]
    fn more_columns_fit_more_verses() {
        let m = HeuristicMeasurer;
        let cfg = LayoutConfig::for_viewport(960, 400);
        let verses: Vec<Verse> = (1..=80)
            .map(|n| {
                verse(
                    "Genesis",
                    1,
                    n,
                    "And God said, Let there be light: and there was light.",
                )
            })
            .collect();
        let refs: Vec<&Verse> = verses.iter().collect();
        let mut one_column = DisplaySettings::default();
        one_column.set_column_count(1);
        let mut three_columns = DisplaySettings::default();
        three_columns.set_column_count(3);
        let end_one = measure_page(&cfg, &m, &one_column, &refs, 0);
        let end_three = measure_page(&cfg, &m, &three_columns, &refs, 0);
        assert!(end_three > end_one);
    }

    #[test]
    fn larger_font_fits_fewer_verses() {
        let m = HeuristicMeasurer;
        let cfg = LayoutConfig::default();
        let verses: Vec<Verse> = (1..=80)
            .map(|n| {
                verse(
                    "Genesis",
                    1,
                    n,
                    "And the evening and the morning were the first day.",
                )
            })
            .collect();
        let refs: Vec<&Verse> = verses.iter().collect();
        let mut small = DisplaySettings::default();
        small.set_font_size_px(12);
        let mut large = DisplaySettings::default();
        large.set_font_size_px(32);
        assert!(
            measure_page(&cfg, &m, &small, &refs, 0) > measure_page(&cfg, &m, &large, &refs, 0)
        );
    }

    #[test]
    fn past_the_end_returns_length() {
        let m = HeuristicMeasurer;
        let cfg = LayoutConfig::default();
        let settings = DisplaySettings::default();
        let verses = [verse("Genesis", 1, 1, "text")];
        let refs: Vec<&Verse> = verses.iter().collect();
        assert_eq!(measure_page(&cfg, &m, &settings, &refs, 1), 1);
        assert_eq!(measure_page(&cfg, &m, &settings, &refs, 9), 1);
    }
}
