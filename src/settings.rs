//! Display settings: font size, column count, palette, and apply mode.
//!
//! Settings are process-wide, loaded once at startup (defaults when absent),
//! and persisted on every change by the owning session.

use serde::{Deserialize, Serialize};

/// Lower clamp for the reader font size.
pub const MIN_FONT_SIZE_PX: u32 = 10;
/// Upper clamp for the reader font size.
pub const MAX_FONT_SIZE_PX: u32 = 48;
/// Lower clamp for the column count.
pub const MIN_COLUMN_COUNT: u32 = 1;
/// Upper clamp for the column count.
pub const MAX_COLUMN_COUNT: u32 = 6;

/// Neutral gray applied to malformed colors instead of rejecting them.
pub const FALLBACK_COLOR: &str = "#888888";

/// Default highlight palette, in cycle order.
pub const DEFAULT_PALETTE: [&str; 5] = ["#fff3cd", "#d4edda", "#cce5ff", "#f8d7da", "#e2d9f3"];

/// Validate and canonicalize a `#rrggbb` color.
///
/// Returns the lowercased form, or `None` when the input is not a six-digit
/// hex color.
pub fn normalize_hex_color(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let digits = raw.strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(raw.to_ascii_lowercase())
}

/// Canonicalize a color, coercing anything malformed to [`FALLBACK_COLOR`].
pub fn coerce_hex_color(raw: &str) -> String {
    normalize_hex_color(raw).unwrap_or_else(|| FALLBACK_COLOR.to_string())
}

/// How a highlight interaction chooses its color.
///
/// One tagged state instead of a cycle-mode flag plus a separate active
/// swatch index, so the two can never disagree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyMode {
    /// Each interaction advances through the palette, then removes.
    Cycle,
    /// Each interaction applies the palette color at this index.
    Direct(usize),
}

impl Default for ApplyMode {
    fn default() -> Self {
        Self::Cycle
    }
}

/// Process-wide display settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Reader font size, clamped to `[MIN_FONT_SIZE_PX, MAX_FONT_SIZE_PX]`.
    pub font_size_px: u32,
    /// Column count, clamped to `[MIN_COLUMN_COUNT, MAX_COLUMN_COUNT]`.
    pub column_count: u32,
    /// Ordered highlight palette of `#rrggbb` colors.
    pub palette: Vec<String>,
    /// Highlight apply mode.
    pub mode: ApplyMode,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            font_size_px: 18,
            column_count: 2,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            mode: ApplyMode::default(),
        }
    }
}

impl DisplaySettings {
    /// Set the font size, clamping to the allowed range.
    pub fn set_font_size_px(&mut self, px: u32) {
        self.font_size_px = px.clamp(MIN_FONT_SIZE_PX, MAX_FONT_SIZE_PX);
    }

    /// Set the column count, clamping to the allowed range.
    pub fn set_column_count(&mut self, columns: u32) {
        self.column_count = columns.clamp(MIN_COLUMN_COUNT, MAX_COLUMN_COUNT);
    }

    /// Color applied by the current mode, when it names one directly.
    pub fn active_color(&self) -> Option<&str> {
        match self.mode {
            ApplyMode::Cycle => None,
            ApplyMode::Direct(idx) => self.palette.get(idx).map(String::as_str),
        }
    }

    /// Repair settings loaded from persisted state.
    ///
    /// Clamps numeric fields, coerces malformed palette colors, restores the
    /// default palette when empty, and resets an out-of-range direct index.
    pub fn sanitize(&mut self) {
        self.font_size_px = self.font_size_px.clamp(MIN_FONT_SIZE_PX, MAX_FONT_SIZE_PX);
        self.column_count = self.column_count.clamp(MIN_COLUMN_COUNT, MAX_COLUMN_COUNT);
        if self.palette.is_empty() {
            self.palette = DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect();
        } else {
            for color in &mut self.palette {
                *color = coerce_hex_color(color);
            }
        }
        if let ApplyMode::Direct(idx) = self.mode {
            if idx >= self.palette.len() {
                self.mode = ApplyMode::Direct(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_and_columns_are_clamped() {
        let mut settings = DisplaySettings::default();
        settings.set_font_size_px(200);
        assert_eq!(settings.font_size_px, MAX_FONT_SIZE_PX);
        settings.set_font_size_px(1);
        assert_eq!(settings.font_size_px, MIN_FONT_SIZE_PX);
        settings.set_column_count(0);
        assert_eq!(settings.column_count, MIN_COLUMN_COUNT);
        settings.set_column_count(99);
        assert_eq!(settings.column_count, MAX_COLUMN_COUNT);
    }

    #[test]
    fn hex_color_normalization() {
        assert_eq!(normalize_hex_color("#FFF3CD"), Some("#fff3cd".to_string()));
        assert_eq!(normalize_hex_color(" #fff3cd "), Some("#fff3cd".to_string()));
        assert_eq!(normalize_hex_color("fff3cd"), None);
        assert_eq!(normalize_hex_color("#fff"), None);
        assert_eq!(normalize_hex_color("#gggggg"), None);
        assert_eq!(coerce_hex_color("notacolor"), FALLBACK_COLOR);
    }

    #[test]
    fn sanitize_repairs_persisted_state() {
        let mut settings = DisplaySettings {
            font_size_px: 3,
            column_count: 40,
            palette: vec!["notacolor".to_string(), "#ABCDEF".to_string()],
            mode: ApplyMode::Direct(9),
        };
        settings.sanitize();
        assert_eq!(settings.font_size_px, MIN_FONT_SIZE_PX);
        assert_eq!(settings.column_count, MAX_COLUMN_COUNT);
        assert_eq!(settings.palette, vec![FALLBACK_COLOR, "#abcdef"]);
        assert_eq!(settings.mode, ApplyMode::Direct(0));
    }

    #[test]
    fn sanitize_restores_default_palette_when_empty() {
        let mut settings = DisplaySettings {
            palette: Vec::new(),
            ..DisplaySettings::default()
        };
        settings.sanitize();
        assert_eq!(settings.palette.len(), DEFAULT_PALETTE.len());
    }

    #[test]
    fn active_color_follows_mode() {
        let mut settings = DisplaySettings::default();
        assert_eq!(settings.active_color(), None);
        settings.mode = ApplyMode::Direct(1);
        assert_eq!(settings.active_color(), Some(DEFAULT_PALETTE[1]));
        settings.mode = ApplyMode::Direct(99);
        assert_eq!(settings.active_color(), None);
    }
}
