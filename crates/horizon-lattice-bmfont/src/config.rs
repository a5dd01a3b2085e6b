//! Configuration shared by the font catalog, layout and text blocks.

use std::path::{Path, PathBuf};

/// Default tab stop width, as a multiple of the font size.
pub const DEFAULT_TAB_WIDTH: f32 = 2.0;

/// Default substitute for characters the font does not define.
pub const DEFAULT_FALLBACK_CHAR: char = '?';

/// Configuration for loading fonts and laying out text.
///
/// # Example
///
/// ```
/// use horizon_lattice_bmfont::TextConfig;
///
/// let config = TextConfig::new()
///     .asset_root("assets")
///     .tab_width(4.0)
///     .log_missing_glyphs(false);
///
/// assert_eq!(config.tab_width, 4.0);
/// ```
#[derive(Debug, Clone)]
pub struct TextConfig {
    /// Tab stops fall on multiples of `font_size * tab_width`.
    pub tab_width: f32,
    /// Glyph substituted for undefined characters.
    pub fallback_char: char,
    /// Directory that canonical font paths are resolved against on disk.
    ///
    /// The cache key stays the canonical path as given, so the same font is
    /// shared no matter which root it was read from.
    pub asset_root: Option<PathBuf>,
    /// Whether the first miss of each character is logged.
    pub log_missing_glyphs: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
            fallback_char: DEFAULT_FALLBACK_CHAR,
            asset_root: None,
            log_missing_glyphs: true,
        }
    }
}

impl TextConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tab stop width as a multiple of the font size.
    #[must_use]
    pub fn tab_width(mut self, tab_width: f32) -> Self {
        self.tab_width = tab_width;
        self
    }

    /// Set the glyph used for undefined characters.
    #[must_use]
    pub fn fallback_char(mut self, fallback: char) -> Self {
        self.fallback_char = fallback;
        self
    }

    /// Resolve font files against this directory.
    #[must_use]
    pub fn asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Enable or disable logging of glyph misses.
    #[must_use]
    pub fn log_missing_glyphs(mut self, enabled: bool) -> Self {
        self.log_missing_glyphs = enabled;
        self
    }

    /// Map a canonical asset path to the file to open.
    pub(crate) fn resolve(&self, canonical: &str) -> PathBuf {
        match &self.asset_root {
            Some(root) => root.join(canonical),
            None => Path::new(canonical).to_path_buf(),
        }
    }
}
