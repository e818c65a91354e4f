//! Pagination engine and HTML renderer for `verse-stream`.

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod render_engine;
mod render_html;
mod render_layout;

pub use render_engine::{
    CachedBoundaries, CancelToken, FilePageCacheStore, NeverCancel, PageCacheStore,
    PaginationEngine, PaginationProfileId, PrecalcStatus, PRECALC_PAGES_PER_TICK,
};
pub use render_html::{html_escape, render_page_html, render_verse_html, RenderOptions};
pub use render_layout::{
    book_heading_height, chapter_heading_height, heading_transition, measure_page,
    verse_block_height, wrap_line_count, HeuristicMeasurer, LayoutConfig, TextMeasurer,
};
