//! Pagination engine: lazy page-boundary computation with profile-keyed
//! caching and cooperative background pre-calculation.
//!
//! Page boundaries are valid only for one pagination profile — the
//! fingerprint of everything that affects layout (font size, column count,
//! viewport, filter selection, corpus content). Any profile change clears
//! the boundary cache and computation restarts from page zero.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use verse_stream::corpus::Verse;
use verse_stream::settings::DisplaySettings;

use crate::render_layout::{measure_page, HeuristicMeasurer, LayoutConfig, TextMeasurer};

/// Cooperative cancellation hook for background pre-calculation.
pub trait CancelToken {
    fn is_cancelled(&self) -> bool;
}

/// A token that never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Pages measured per background tick, so the pre-calculation loop never
/// blocks input handling for a perceptible duration.
pub const PRECALC_PAGES_PER_TICK: usize = 3;

/// Stable pagination profile id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PaginationProfileId(pub [u8; 32]);

impl PaginationProfileId {
    /// Build a deterministic profile id from arbitrary payload bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        fn fnv64(seed: u64, payload: &[u8]) -> u64 {
            let mut hash = seed;
            for b in payload {
                hash ^= *b as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            hash
        }
        let mut out = [0u8; 32];
        let h0 = fnv64(0xcbf29ce484222325, bytes).to_le_bytes();
        let h1 = fnv64(0x9e3779b97f4a7c15, bytes).to_le_bytes();
        let h2 = fnv64(0xd6e8feb86659fd93, bytes).to_le_bytes();
        let h3 = fnv64(0xa0761d6478bd642f, bytes).to_le_bytes();
        out[0..8].copy_from_slice(&h0);
        out[8..16].copy_from_slice(&h1);
        out[16..24].copy_from_slice(&h2);
        out[24..32].copy_from_slice(&h3);
        Self(out)
    }
}

/// Result of one background pre-calculation tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrecalcStatus {
    /// Boundaries were measured; more remain.
    InProgress { pages_measured: usize },
    /// The whole filtered set is paginated.
    Complete,
    /// The cancel token fired; the tick exited without work.
    Cancelled,
    /// The seeding profile is no longer current; the tick exited cleanly.
    Invalidated,
}

/// Lazy page-boundary engine for one filtered verse sequence.
pub struct PaginationEngine {
    cfg: LayoutConfig,
    measurer: Arc<dyn TextMeasurer>,
    profile: Option<PaginationProfileId>,
    boundaries: Vec<usize>,
    complete: bool,
}

impl fmt::Debug for PaginationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationEngine")
            .field("cfg", &self.cfg)
            .field("profile", &self.profile)
            .field("boundaries", &self.boundaries.len())
            .field("complete", &self.complete)
            .finish_non_exhaustive()
    }
}

impl PaginationEngine {
    /// Create an engine with the default heuristic measurer.
    pub fn new(cfg: LayoutConfig) -> Self {
        Self {
            cfg,
            measurer: Arc::new(HeuristicMeasurer),
            profile: None,
            boundaries: vec![0],
            complete: false,
        }
    }

    /// Install a glyph-accurate text measurer.
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    /// Layout geometry in use.
    pub fn layout_config(&self) -> &LayoutConfig {
        &self.cfg
    }

    /// Current profile, once seeded by [`ensure_profile`](Self::ensure_profile).
    pub fn profile_id(&self) -> Option<PaginationProfileId> {
        self.profile
    }

    /// Known page-start boundaries; entry 0 is always 0.
    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    /// Whether the whole sequence is paginated.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    fn compute_profile(
        &self,
        settings: &DisplaySettings,
        selection_key: &str,
        corpus_fingerprint: u32,
    ) -> PaginationProfileId {
        let payload = format!(
            "{}x{}|fs={}|cols={}|sel={}|crc={:08x}",
            self.cfg.viewport_width,
            self.cfg.viewport_height,
            settings.font_size_px,
            settings.column_count,
            selection_key,
            corpus_fingerprint,
        );
        PaginationProfileId::from_bytes(payload.as_bytes())
    }

    /// Re-key the boundary cache; returns true when it was invalidated.
    ///
    /// The check is synchronous and happens before any boundary read, so a
    /// stale read can never be observed.
    pub fn ensure_profile(
        &mut self,
        settings: &DisplaySettings,
        selection_key: &str,
        corpus_fingerprint: u32,
    ) -> bool {
        let profile = self.compute_profile(settings, selection_key, corpus_fingerprint);
        if self.profile == Some(profile) {
            return false;
        }
        self.profile = Some(profile);
        self.boundaries.clear();
        self.boundaries.push(0);
        self.complete = false;
        true
    }

    fn extend_once(&mut self, verses: &[&Verse], settings: &DisplaySettings) {
        if self.complete {
            return;
        }
        let last = self.boundaries.last().copied().unwrap_or(0);
        if last >= verses.len() {
            self.complete = true;
            return;
        }
        let end = measure_page(&self.cfg, self.measurer.as_ref(), settings, verses, last);
        if end >= verses.len() {
            self.complete = true;
        } else {
            self.boundaries.push(end);
        }
    }

    /// Start index of a page, lazily extending the boundary cache.
    ///
    /// A page beyond the end of the sequence returns `verses.len()`.
    pub fn page_start_index(
        &mut self,
        verses: &[&Verse],
        settings: &DisplaySettings,
        page: usize,
    ) -> usize {
        loop {
            if page < self.boundaries.len() {
                return self.boundaries[page];
            }
            if self.complete {
                return verses.len();
            }
            self.extend_once(verses, settings);
        }
    }

    /// Verse range `[start, end)` for a page; empty at `verses.len()` when
    /// the page is past the end.
    pub fn page_slice(
        &mut self,
        verses: &[&Verse],
        settings: &DisplaySettings,
        page: usize,
    ) -> (usize, usize) {
        let start = self.page_start_index(verses, settings, page);
        if start >= verses.len() {
            return (verses.len(), verses.len());
        }
        let end = if page + 1 < self.boundaries.len() {
            self.boundaries[page + 1]
        } else if self.complete {
            verses.len()
        } else {
            self.page_start_index(verses, settings, page + 1)
        };
        (start, end)
    }

    /// Exact page count once pagination is complete.
    pub fn page_count(&self, verses: &[&Verse]) -> Option<usize> {
        if !self.complete {
            return None;
        }
        Some(if verses.is_empty() {
            0
        } else {
            self.boundaries.len()
        })
    }

    /// Page-count estimate while pagination is still in flight.
    ///
    /// Exact once complete; otherwise extrapolates from the average measured
    /// page size, so the page indicator can show something before the
    /// background pass finishes.
    pub fn page_count_estimate(&self, verses: &[&Verse]) -> usize {
        if let Some(exact) = self.page_count(verses) {
            return exact;
        }
        let len = verses.len();
        let measured_pages = self.boundaries.len() - 1;
        let measured_verses = self.boundaries.last().copied().unwrap_or(0);
        if measured_pages == 0 || measured_verses == 0 {
            let step = self.cfg.fallback_verses_per_page.max(1);
            return len.div_ceil(step).max(1);
        }
        let average = measured_verses as f32 / measured_pages as f32;
        let remaining = (len - measured_verses) as f32;
        measured_pages + (remaining / average).ceil().max(1.0) as usize
    }

    /// One background pre-calculation tick: measure up to `budget` more
    /// boundaries.
    ///
    /// Exists purely so the page-count indicator can become exact. The tick
    /// checks cancellation and whether the seeding profile is still current
    /// before doing any work, and exits cleanly when either fails.
    pub fn precalculate_step(
        &mut self,
        verses: &[&Verse],
        settings: &DisplaySettings,
        selection_key: &str,
        corpus_fingerprint: u32,
        cancel: &dyn CancelToken,
        budget: usize,
    ) -> PrecalcStatus {
        if cancel.is_cancelled() {
            return PrecalcStatus::Cancelled;
        }
        let current = self.compute_profile(settings, selection_key, corpus_fingerprint);
        if self.profile != Some(current) {
            return PrecalcStatus::Invalidated;
        }
        if self.complete {
            return PrecalcStatus::Complete;
        }
        let budget = budget.clamp(1, PRECALC_PAGES_PER_TICK);
        let mut measured = 0usize;
        for _ in 0..budget {
            if self.complete {
                break;
            }
            self.extend_once(verses, settings);
            measured += 1;
        }
        if self.complete {
            PrecalcStatus::Complete
        } else {
            PrecalcStatus::InProgress {
                pages_measured: measured,
            }
        }
    }

    /// Adopt persisted boundaries for the current profile. Returns whether
    /// anything was restored.
    pub fn restore_from_cache(&mut self, cache: &dyn PageCacheStore) -> bool {
        let Some(profile) = self.profile else {
            return false;
        };
        let Some(cached) = cache.load_boundaries(profile) else {
            return false;
        };
        if !boundaries_are_valid(&cached.boundaries) {
            return false;
        }
        self.boundaries = cached.boundaries;
        self.complete = cached.complete;
        true
    }

    /// Persist the current boundaries under the current profile.
    pub fn persist_to_cache(&self, cache: &dyn PageCacheStore) {
        if let Some(profile) = self.profile {
            cache.store_boundaries(profile, &self.boundaries, self.complete);
        }
    }
}

fn boundaries_are_valid(boundaries: &[usize]) -> bool {
    if boundaries.first() != Some(&0) {
        return false;
    }
    boundaries.windows(2).all(|pair| pair[0] < pair[1])
}

/// Persisted page-boundary cache keyed by pagination profile.
pub trait PageCacheStore {
    /// Load boundaries for a profile; `None` on any miss or corruption.
    fn load_boundaries(&self, profile: PaginationProfileId) -> Option<CachedBoundaries>;

    /// Persist boundaries for a profile. Failures are the store's to log;
    /// a missed write only costs recomputation.
    fn store_boundaries(&self, profile: PaginationProfileId, boundaries: &[usize], complete: bool);
}

/// Boundary vector restored from a cache store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedBoundaries {
    pub boundaries: Vec<usize>,
    pub complete: bool,
}

const CACHE_FORMAT_VERSION: u16 = 1;

#[derive(Serialize, Deserialize)]
struct PersistedBoundaries {
    version: u16,
    profile: [u8; 32],
    boundaries: Vec<u32>,
    complete: bool,
}

#[derive(Default, Serialize, Deserialize)]
struct CacheIndex {
    entries: BTreeMap<String, CacheIndexEntry>,
}

#[derive(Serialize, Deserialize)]
struct CacheIndexEntry {
    pages: usize,
    complete: bool,
}

/// File-backed page cache: one postcard envelope per profile plus a
/// human-readable JSON index.
#[derive(Clone, Debug)]
pub struct FilePageCacheStore {
    root: PathBuf,
    max_file_bytes: usize,
}

impl FilePageCacheStore {
    const DEFAULT_MAX_FILE_BYTES: usize = 1024 * 1024;

    /// Create a cache rooted at a directory (created lazily on first write).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_bytes: Self::DEFAULT_MAX_FILE_BYTES,
        }
    }

    /// Cap individual cache file size; larger envelopes are not written.
    pub fn with_max_file_bytes(mut self, max_file_bytes: usize) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Cache root directory.
    pub fn cache_root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, profile: PaginationProfileId) -> PathBuf {
        self.root.join(format!("{}.pages", profile_hex(profile)))
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn update_index(&self, profile: PaginationProfileId, pages: usize, complete: bool) {
        let mut index: CacheIndex = std::fs::read_to_string(self.index_path())
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default();
        index
            .entries
            .insert(profile_hex(profile), CacheIndexEntry { pages, complete });
        match serde_json::to_string_pretty(&index) {
            Ok(json) => {
                if let Err(e) = std::fs::write(self.index_path(), json) {
                    log::warn!("page cache index write failed: {}", e);
                }
            }
            Err(e) => log::warn!("page cache index serialize failed: {}", e),
        }
    }
}

impl PageCacheStore for FilePageCacheStore {
    fn load_boundaries(&self, profile: PaginationProfileId) -> Option<CachedBoundaries> {
        let path = self.entry_path(profile);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("page cache read failed for {}: {}", path.display(), e);
                return None;
            }
        };
        if bytes.len() > self.max_file_bytes {
            remove_file_quiet(&path);
            return None;
        }
        let envelope: PersistedBoundaries = match postcard::from_bytes(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::warn!("page cache entry corrupt at {}: {}", path.display(), e);
                remove_file_quiet(&path);
                return None;
            }
        };
        if envelope.version != CACHE_FORMAT_VERSION || envelope.profile != profile.0 {
            remove_file_quiet(&path);
            return None;
        }
        let boundaries: Vec<usize> = envelope
            .boundaries
            .iter()
            .map(|&b| b as usize)
            .collect();
        if !boundaries_are_valid(&boundaries) {
            remove_file_quiet(&path);
            return None;
        }
        Some(CachedBoundaries {
            boundaries,
            complete: envelope.complete,
        })
    }

    fn store_boundaries(
        &self,
        profile: PaginationProfileId,
        boundaries: &[usize],
        complete: bool,
    ) {
        let mut narrowed = Vec::with_capacity(boundaries.len());
        for &boundary in boundaries {
            match u32::try_from(boundary) {
                Ok(b) => narrowed.push(b),
                Err(_) => {
                    log::warn!("page cache entry skipped: boundary {} overflows u32", boundary);
                    return;
                }
            }
        }
        let envelope = PersistedBoundaries {
            version: CACHE_FORMAT_VERSION,
            profile: profile.0,
            boundaries: narrowed,
            complete,
        };
        let bytes = match postcard::to_allocvec(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("page cache serialize failed: {}", e);
                return;
            }
        };
        if bytes.len() > self.max_file_bytes {
            log::warn!(
                "page cache entry skipped: {} bytes exceeds max_file_bytes {}",
                bytes.len(),
                self.max_file_bytes
            );
            return;
        }
        if let Err(e) = std::fs::create_dir_all(&self.root) {
            log::warn!("page cache dir create failed: {}", e);
            return;
        }
        let path = self.entry_path(profile);
        let tmp = path.with_extension("pages.tmp");
        if let Err(e) = std::fs::write(&tmp, &bytes) {
            log::warn!("page cache write failed for {}: {}", tmp.display(), e);
            return;
        }
        if let Err(e) = std::fs::rename(&tmp, &path) {
            log::warn!("page cache rename failed for {}: {}", path.display(), e);
            remove_file_quiet(&tmp);
            return;
        }
        self.update_index(profile, boundaries.len(), complete);
    }
}

fn profile_hex(profile: PaginationProfileId) -> String {
    let mut out = String::with_capacity(64);
    for byte in profile.0 {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

fn remove_file_quiet(path: &Path) {
    let _ = std::fs::remove_file(path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use verse_stream::corpus::Corpus;

    fn corpus(verse_count: u32) -> Corpus {
        let mut text = String::new();
        for n in 1..=verse_count {
            text.push_str(&format!(
                "Genesis {}:{}  And God said, Let there be light: and there was light.\n",
                n / 10 + 1,
                n % 10 + 1,
            ));
        }
        Corpus::parse(&text)
    }

    fn settings() -> DisplaySettings {
        DisplaySettings::default()
    }

    #[test]
    fn profile_id_is_deterministic_and_sensitive() {
        let engine = PaginationEngine::new(LayoutConfig::default());
        let a = engine.compute_profile(&settings(), "sel", 7);
        let b = engine.compute_profile(&settings(), "sel", 7);
        assert_eq!(a, b);
        let mut larger = settings();
        larger.set_font_size_px(32);
        assert_ne!(a, engine.compute_profile(&larger, "sel", 7));
        assert_ne!(a, engine.compute_profile(&settings(), "other", 7));
        assert_ne!(a, engine.compute_profile(&settings(), "sel", 8));
    }

    #[test]
    fn ensure_profile_invalidates_on_settings_change() {
        let corpus = corpus(60);
        let refs: Vec<&Verse> = corpus.verses().iter().collect();
        let mut engine = PaginationEngine::new(LayoutConfig::default());
        let mut display = settings();
        assert!(engine.ensure_profile(&display, "sel", 1));
        engine.page_start_index(&refs, &display, 3);
        assert!(engine.boundaries().len() > 1);

        display.set_font_size_px(30);
        assert!(engine.ensure_profile(&display, "sel", 1));
        assert_eq!(engine.boundaries(), &[0]);
        assert!(!engine.is_complete());
        // Same inputs again: no invalidation.
        assert!(!engine.ensure_profile(&display, "sel", 1));
    }

    #[test]
    fn page_starts_are_monotonic_and_end_at_length() {
        let corpus = corpus(80);
        let refs: Vec<&Verse> = corpus.verses().iter().collect();
        let mut engine = PaginationEngine::new(LayoutConfig::for_viewport(480, 640));
        let display = settings();
        engine.ensure_profile(&display, "", 0);

        let mut page = 0usize;
        let mut previous_start = None;
        loop {
            let start = engine.page_start_index(&refs, &display, page);
            if let Some(prev) = previous_start {
                assert!(start > prev, "page starts must strictly increase");
            }
            if start >= refs.len() {
                assert_eq!(start, refs.len());
                break;
            }
            previous_start = Some(start);
            page += 1;
            assert!(page <= refs.len(), "page count can never exceed verse count");
        }
        assert!(engine.is_complete());
        let count = engine.page_count(&refs).unwrap();
        assert_eq!(engine.page_start_index(&refs, &display, count), refs.len());
        assert_eq!(engine.page_start_index(&refs, &display, count + 5), refs.len());
    }

    #[test]
    fn page_slices_tile_the_sequence() {
        let corpus = corpus(50);
        let refs: Vec<&Verse> = corpus.verses().iter().collect();
        let mut engine = PaginationEngine::new(LayoutConfig::for_viewport(480, 480));
        let display = settings();
        engine.ensure_profile(&display, "", 0);

        let mut covered = 0usize;
        let mut page = 0usize;
        loop {
            let (start, end) = engine.page_slice(&refs, &display, page);
            if start == refs.len() {
                break;
            }
            assert_eq!(start, covered);
            assert!(end > start);
            covered = end;
            page += 1;
        }
        assert_eq!(covered, refs.len());
    }

    #[test]
    fn empty_sequence_has_zero_pages() {
        let refs: Vec<&Verse> = Vec::new();
        let mut engine = PaginationEngine::new(LayoutConfig::default());
        let display = settings();
        engine.ensure_profile(&display, "", 0);
        assert_eq!(engine.page_start_index(&refs, &display, 0), 0);
        assert_eq!(engine.page_slice(&refs, &display, 0), (0, 0));
        assert_eq!(engine.page_count(&refs), Some(0));
    }

    #[test]
    fn precalculate_completes_in_bounded_ticks() {
        let corpus = corpus(100);
        let refs: Vec<&Verse> = corpus.verses().iter().collect();
        let mut engine = PaginationEngine::new(LayoutConfig::for_viewport(480, 640));
        let display = settings();
        engine.ensure_profile(&display, "sel", 2);

        let mut ticks = 0usize;
        loop {
            let status = engine.precalculate_step(
                &refs,
                &display,
                "sel",
                2,
                &NeverCancel,
                PRECALC_PAGES_PER_TICK,
            );
            ticks += 1;
            match status {
                PrecalcStatus::Complete => break,
                PrecalcStatus::InProgress { pages_measured } => {
                    assert!(pages_measured <= PRECALC_PAGES_PER_TICK);
                }
                other => panic!("unexpected status {:?}", other),
            }
            assert!(ticks <= refs.len(), "precalc must terminate");
        }
        assert!(engine.page_count(&refs).is_some());
    }

    #[test]
    fn precalculate_exits_on_cancel_and_stale_profile() {
        struct AlwaysCancel;
        impl CancelToken for AlwaysCancel {
            fn is_cancelled(&self) -> bool {
                true
            }
        }

        let corpus = corpus(40);
        let refs: Vec<&Verse> = corpus.verses().iter().collect();
        let mut engine = PaginationEngine::new(LayoutConfig::default());
        let display = settings();
        engine.ensure_profile(&display, "sel", 0);

        assert_eq!(
            engine.precalculate_step(&refs, &display, "sel", 0, &AlwaysCancel, 3),
            PrecalcStatus::Cancelled
        );

        // Settings changed after seeding: the tick must refuse to extend.
        let mut changed = settings();
        changed.set_column_count(5);
        assert_eq!(
            engine.precalculate_step(&refs, &changed, "sel", 0, &NeverCancel, 3),
            PrecalcStatus::Invalidated
        );
        assert_eq!(engine.boundaries(), &[0]);
    }

    #[test]
    fn estimate_converges_to_exact_count() {
        let corpus = corpus(100);
        let refs: Vec<&Verse> = corpus.verses().iter().collect();
        let mut engine = PaginationEngine::new(LayoutConfig::for_viewport(480, 640));
        let display = settings();
        engine.ensure_profile(&display, "", 0);

        let early = engine.page_count_estimate(&refs);
        assert!(early >= 1);
        while !engine.is_complete() {
            engine.precalculate_step(&refs, &display, "", 0, &NeverCancel, 3);
        }
        assert_eq!(engine.page_count_estimate(&refs), engine.page_count(&refs).unwrap());
    }

    #[test]
    fn file_cache_round_trips_boundaries() {
        let corpus = corpus(80);
        let refs: Vec<&Verse> = corpus.verses().iter().collect();
        let display = settings();
        let root = std::env::temp_dir().join(format!(
            "verse-stream-page-cache-{}",
            std::process::id()
        ));
        let cache = FilePageCacheStore::new(&root);

        let mut engine = PaginationEngine::new(LayoutConfig::for_viewport(480, 640));
        engine.ensure_profile(&display, "sel", 9);
        while !engine.is_complete() {
            engine.precalculate_step(&refs, &display, "sel", 9, &NeverCancel, 3);
        }
        engine.persist_to_cache(&cache);

        let mut restored = PaginationEngine::new(LayoutConfig::for_viewport(480, 640));
        restored.ensure_profile(&display, "sel", 9);
        assert!(restored.restore_from_cache(&cache));
        assert_eq!(restored.boundaries(), engine.boundaries());
        assert!(restored.is_complete());

        // A different profile misses.
        let mut other = PaginationEngine::new(LayoutConfig::for_viewport(480, 640));
        other.ensure_profile(&display, "other-selection", 9);
        assert!(!other.restore_from_cache(&cache));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn corrupt_cache_entry_is_a_miss() {
        let root = std::env::temp_dir().join(format!(
            "verse-stream-page-cache-corrupt-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&root).unwrap();
        let cache = FilePageCacheStore::new(&root);
        let profile = PaginationProfileId::from_bytes(b"profile");
        std::fs::write(
            root.join(format!("{}.pages", profile_hex(profile))),
            b"not a postcard envelope",
        )
        .unwrap();
        assert!(cache.load_boundaries(profile).is_none());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn boundary_validation_rejects_non_monotonic() {
        assert!(boundaries_are_valid(&[0, 4, 9]));
        assert!(!boundaries_are_valid(&[1, 4]));
        assert!(!boundaries_are_valid(&[0, 4, 4]));
        assert!(!boundaries_are_valid(&[]));
    }
}
