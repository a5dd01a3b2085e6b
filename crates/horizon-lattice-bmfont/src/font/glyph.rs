//! Per-character metrics, atlas coordinates and kerning.

use std::collections::HashMap;

use super::parser::GlyphRecord;

/// A single character of a bitmap font.
///
/// Immutable once built; owned by its [`Font`](super::Font).
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    id: u32,
    width: u32,
    height: u32,
    x_offset: i32,
    y_offset: i32,
    advance: i32,
    tx1: f32,
    ty1: f32,
    tx2: f32,
    ty2: f32,
    /// Adjustment applied when this glyph follows the keyed glyph id.
    kernings: HashMap<u32, i32>,
}

impl Glyph {
    pub(crate) fn new(
        record: &GlyphRecord,
        texture_width: u32,
        texture_height: u32,
        kernings: HashMap<u32, i32>,
    ) -> Self {
        let tex_w = texture_width.max(1) as f32;
        let tex_h = texture_height.max(1) as f32;
        let tx1 = record.x as f32 / tex_w;
        let ty1 = record.y as f32 / tex_h;

        Self {
            id: record.id,
            width: record.width,
            height: record.height,
            x_offset: record.x_offset,
            y_offset: record.y_offset,
            advance: record.advance,
            tx1,
            ty1,
            tx2: tx1 + record.width as f32 / tex_w,
            ty2: ty1 + record.height as f32 / tex_h,
            kernings,
        }
    }

    /// An invisible glyph used when a font defines neither the fallback nor space.
    pub(crate) fn blank(id: u32) -> Self {
        Self {
            id,
            width: 0,
            height: 0,
            x_offset: 0,
            y_offset: 0,
            advance: 1,
            tx1: 0.0,
            ty1: 0.0,
            tx2: 0.0,
            ty2: 0.0,
            kernings: HashMap::new(),
        }
    }

    /// Codepoint this glyph renders.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Width of the glyph bitmap in atlas pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the glyph bitmap in atlas pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn x_offset(&self) -> i32 {
        self.x_offset
    }

    pub fn y_offset(&self) -> i32 {
        self.y_offset
    }

    /// Pen advance in base-height pixels, before kerning.
    pub fn advance(&self) -> i32 {
        self.advance
    }

    /// Left texture coordinate.
    pub fn tx1(&self) -> f32 {
        self.tx1
    }

    /// Top texture coordinate.
    pub fn ty1(&self) -> f32 {
        self.ty1
    }

    /// Right texture coordinate.
    pub fn tx2(&self) -> f32 {
        self.tx2
    }

    /// Bottom texture coordinate.
    pub fn ty2(&self) -> f32 {
        self.ty2
    }

    /// All kerning pairs ending in this glyph, keyed by the preceding glyph id.
    pub fn kernings(&self) -> &HashMap<u32, i32> {
        &self.kernings
    }

    /// Kerning to apply when this glyph follows glyph `previous_id`.
    pub fn kerning_with(&self, previous_id: u32) -> i32 {
        self.kernings.get(&previous_id).copied().unwrap_or(0)
    }

    /// Kerning against the previously drawn glyph, if any.
    #[inline]
    pub fn kerning(&self, previous: Option<&Glyph>) -> i32 {
        previous.map_or(0, |prev| self.kerning_with(prev.id))
    }
}
