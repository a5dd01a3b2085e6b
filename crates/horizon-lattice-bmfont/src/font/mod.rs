//! Bitmap fonts: glyph tables, lookup and text measurement.
//!
//! A [`Font`] is built once per descriptor file by the
//! [`FontCatalog`](crate::FontCatalog) and shared through an `Arc`. It never
//! changes after construction, so it can be measured from any thread.
//!
//! Glyphs for codepoints 32..=255 live in a flat table indexed by
//! `codepoint - 32`; everything else goes through a hash map.

mod glyph;
mod layout;
pub mod parser;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

pub use glyph::Glyph;
pub(crate) use layout::Pen;
pub use parser::FontDefinition;

use crate::backend::TextureInfo;
use crate::config::TextConfig;
use crate::logging::targets;
use crate::reclaim::ResourceReclaimer;
use crate::renderable::RenderableText;
use crate::types::Color;

const FAST_TABLE_START: u32 = 32;
const FAST_TABLE_END: u32 = 255;
const FAST_TABLE_LEN: usize = (FAST_TABLE_END - FAST_TABLE_START + 1) as usize;

/// A loaded bitmap font.
pub struct Font {
    name: String,
    path: String,
    base_height: f32,
    texture: TextureInfo,
    fast_table: Box<[Option<Glyph>]>,
    extended: HashMap<u32, Glyph>,
    blank: Glyph,
    fallback_char: char,
    tab_width: f32,
    log_missing_glyphs: bool,
    missed: Mutex<HashSet<char>>,
    reclaimer: Arc<ResourceReclaimer>,
}

impl Font {
    /// Build a font from a parsed descriptor and its loaded atlas.
    pub(crate) fn from_definition(
        path: String,
        definition: FontDefinition,
        texture: TextureInfo,
        config: &TextConfig,
        reclaimer: Arc<ResourceReclaimer>,
    ) -> Self {
        let FontDefinition {
            header,
            glyphs,
            kernings,
        } = definition;

        let mut kerning_tables: HashMap<u32, HashMap<u32, i32>> = HashMap::new();
        for kerning in &kernings {
            kerning_tables
                .entry(kerning.second)
                .or_default()
                .insert(kerning.first, kerning.amount);
        }

        let mut fast_table = vec![None; FAST_TABLE_LEN].into_boxed_slice();
        let mut extended = HashMap::new();
        for record in &glyphs {
            let kernings = kerning_tables.remove(&record.id).unwrap_or_default();
            let glyph = Glyph::new(record, texture.width, texture.height, kernings);
            match fast_index(record.id) {
                Some(index) => fast_table[index] = Some(glyph),
                None => {
                    extended.insert(record.id, glyph);
                }
            }
        }

        for (id, table) in &kerning_tables {
            debug!(
                target: targets::FONT,
                font = %header.name,
                glyph = id,
                pairs = table.len(),
                "dropping kerning for undefined glyph"
            );
        }

        Self {
            name: header.name,
            path,
            base_height: header.base_height,
            texture,
            fast_table,
            extended,
            blank: Glyph::blank(' ' as u32),
            fallback_char: config.fallback_char,
            tab_width: config.tab_width,
            log_missing_glyphs: config.log_missing_glyphs,
            missed: Mutex::new(HashSet::new()),
            reclaimer,
        }
    }

    /// Face name from the descriptor header.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical path this font was loaded from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Reference pixel height; text drawn at this size is unscaled.
    pub fn base_height(&self) -> f32 {
        self.base_height
    }

    /// Atlas texture handle and pixel dimensions.
    pub fn texture(&self) -> TextureInfo {
        self.texture
    }

    pub fn texture_width(&self) -> u32 {
        self.texture.width
    }

    pub fn texture_height(&self) -> u32 {
        self.texture.height
    }

    /// Width of a tab stop at `font_size`.
    pub fn tab_stop(&self, font_size: f32) -> f32 {
        font_size * self.tab_width
    }

    /// Number of glyphs the descriptor defined.
    pub fn glyph_count(&self) -> usize {
        self.fast_table.iter().flatten().count() + self.extended.len()
    }

    /// The glyph for `c`, if the font defines one.
    pub fn defined_glyph(&self, c: char) -> Option<&Glyph> {
        let code = c as u32;
        match fast_index(code) {
            Some(index) => self.fast_table[index].as_ref(),
            None => self.extended.get(&code),
        }
    }

    /// The glyph used to draw `c`.
    ///
    /// Never fails. Undefined characters resolve to the fallback glyph
    /// (`'?'` by default), then to space, then to an invisible blank glyph.
    pub fn glyph(&self, c: char) -> &Glyph {
        if let Some(glyph) = self.defined_glyph(c) {
            return glyph;
        }
        self.report_miss(c);

        if c != self.fallback_char {
            if let Some(glyph) = self.defined_glyph(self.fallback_char) {
                return glyph;
            }
        }
        self.defined_glyph(' ').unwrap_or(&self.blank)
    }

    fn report_miss(&self, c: char) {
        if !self.log_missing_glyphs || c.is_whitespace() {
            return;
        }
        if self.missed.lock().insert(c) {
            warn!(
                target: targets::FONT,
                font = %self.name,
                character = %c.escape_debug(),
                codepoint = c as u32,
                "font does not define character, substituting fallback"
            );
        }
    }

    pub(crate) fn reclaimer(&self) -> &Arc<ResourceReclaimer> {
        &self.reclaimer
    }

    /// Create a text block with default styling: white, drawn at the base
    /// height, with no size limits.
    pub fn create_text(self: &Arc<Self>, text: &str) -> RenderableText {
        self.create_text_with(text, Color::WHITE, self.base_height, f32::MAX, f32::MAX)
    }

    /// Create a text block with explicit color, size and limits.
    ///
    /// Text wider than `max_width` is wrapped; lines past `max_height` are dropped.
    pub fn create_text_with(
        self: &Arc<Self>,
        text: &str,
        color: Color,
        font_size: f32,
        max_width: f32,
        max_height: f32,
    ) -> RenderableText {
        RenderableText::new(Arc::clone(self), text, color, font_size, max_width, max_height)
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("base_height", &self.base_height)
            .field("texture", &self.texture)
            .field("glyphs", &self.glyph_count())
            .finish()
    }
}

fn fast_index(code: u32) -> Option<usize> {
    (FAST_TABLE_START..=FAST_TABLE_END)
        .contains(&code)
        .then(|| (code - FAST_TABLE_START) as usize)
}
