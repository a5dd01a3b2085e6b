//! Cached, drawable blocks of text.
//!
//! A [`RenderableText`] owns a text buffer plus styling, and lazily turns it
//! into glyph quads. Any mutation marks the block dirty. The CPU layout is
//! redone the next time its size is read or it is drawn, and the vertex
//! buffer is re-uploaded on the next draw.
//!
//! # Example
//!
//! ```no_run
//! use horizon_lattice_bmfont::{Color, FontCatalog, HeadlessBackend};
//!
//! let catalog = FontCatalog::new();
//! let mut backend = HeadlessBackend::new();
//! let font = catalog.load_font("fonts/insignia15.fnt", &mut backend)?;
//!
//! let mut text = font.create_text_with("Sample text.", Color::YELLOW, 15.0, 400.0, f32::MAX);
//! text.append_colored("\nA second line, in orange.", Color::ORANGE)?;
//! text.draw(&mut backend, 100.0, 50.0)?;
//!
//! // Release the buffer on the rendering thread when done.
//! text.dispose(&mut backend);
//! # Ok::<(), horizon_lattice_bmfont::FontError>(())
//! ```

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use tracing::{debug, trace, warn};

use crate::backend::{BackendId, BlendFactors, BufferHandle, RenderBackend, TextDrawCommand};
use crate::error::{FontError, FontResult, RenderError};
use crate::font::{Font, Glyph, Pen};
use crate::logging::targets;
use crate::types::{Color, Point, Rect, Size};
use crate::vertex::{GlyphQuad, VertexData};

/// Which point of the text block is placed at the draw position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAnchor {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl TextAnchor {
    /// Offset from the anchor point to the block's top-left corner.
    pub fn offset(self, size: Size) -> Point {
        let (w, h) = (size.width, size.height);
        let (x, y) = match self {
            TextAnchor::TopLeft => (0.0, 0.0),
            TextAnchor::TopCenter => (-w / 2.0, 0.0),
            TextAnchor::TopRight => (-w, 0.0),
            TextAnchor::CenterLeft => (0.0, -h / 2.0),
            TextAnchor::Center => (-w / 2.0, -h / 2.0),
            TextAnchor::CenterRight => (-w, -h / 2.0),
            TextAnchor::BottomLeft => (0.0, -h),
            TextAnchor::BottomCenter => (-w / 2.0, -h),
            TextAnchor::BottomRight => (-w, -h),
        };
        Point::new(x, y)
    }
}

/// Horizontal alignment of each line within the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    /// Layout is stale.
    Dirty,
    /// Layout is current but not yet uploaded.
    Built,
    /// Layout is current and matches the GPU buffer.
    Uploaded,
}

/// An appendable, optionally multi-colored block of text.
///
/// Created through [`Font::create_text`] or [`Font::create_text_with`].
/// Call [`dispose`](Self::dispose) on the rendering thread when finished.
/// A block dropped without disposal hands its buffer to the font's
/// [`ResourceReclaimer`](crate::ResourceReclaimer) instead.
pub struct RenderableText {
    font: Arc<Font>,
    text: String,
    color: Color,
    /// Color in effect from each byte offset of `text` onward; `None` reverts to `color`.
    color_runs: BTreeMap<usize, Option<Color>>,
    font_size: f32,
    max_width: f32,
    max_height: f32,
    anchor: TextAnchor,
    alignment: TextAlignment,
    blend: BlendFactors,
    render_debug_bounds: bool,
    state: BuildState,
    width: f32,
    height: f32,
    vertices: VertexData,
    /// Vertex buffer and the backend that created it.
    buffer: Option<(BackendId, BufferHandle)>,
    disposed: bool,
}

impl RenderableText {
    pub(crate) fn new(
        font: Arc<Font>,
        text: &str,
        color: Color,
        font_size: f32,
        max_width: f32,
        max_height: f32,
    ) -> Self {
        Self {
            font,
            text: text.to_string(),
            color,
            color_runs: BTreeMap::new(),
            font_size,
            max_width,
            max_height,
            anchor: TextAnchor::default(),
            alignment: TextAlignment::default(),
            blend: BlendFactors::default(),
            render_debug_bounds: false,
            state: BuildState::Dirty,
            width: 0.0,
            height: 0.0,
            vertices: VertexData::default(),
            buffer: None,
            disposed: false,
        }
    }

    /// The font this text is drawn with.
    pub fn font(&self) -> &Arc<Font> {
        &self.font
    }

    /// Raw text, before wrapping.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Base color, used wherever no color run applies.
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn max_width(&self) -> f32 {
        self.max_width
    }

    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    pub fn anchor(&self) -> TextAnchor {
        self.anchor
    }

    pub fn alignment(&self) -> TextAlignment {
        self.alignment
    }

    pub fn blend(&self) -> BlendFactors {
        self.blend
    }

    pub fn render_debug_bounds(&self) -> bool {
        self.render_debug_bounds
    }

    /// Whether the next size read or draw will redo the layout.
    pub fn is_rebuild_needed(&self) -> bool {
        self.state == BuildState::Dirty
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Width of the laid-out text.
    pub fn width(&mut self) -> FontResult<f32> {
        self.trigger_rebuild_if_needed()?;
        Ok(self.width)
    }

    /// Height of the laid-out text (one font size per line).
    pub fn height(&mut self) -> FontResult<f32> {
        self.trigger_rebuild_if_needed()?;
        Ok(self.height)
    }

    pub fn size(&mut self) -> FontResult<Size> {
        self.trigger_rebuild_if_needed()?;
        Ok(Size::new(self.width, self.height))
    }

    /// Replace the text, dropping all color runs.
    pub fn set_text(&mut self, text: &str) -> FontResult<()> {
        self.ensure_live()?;
        self.text.clear();
        self.text.push_str(text);
        self.color_runs.clear();
        self.invalidate();
        Ok(())
    }

    /// Append text in the current color.
    pub fn append(&mut self, text: &str) -> FontResult<()> {
        self.ensure_live()?;
        self.text.push_str(text);
        self.invalidate();
        Ok(())
    }

    /// Append text in `color`; text appended afterwards reverts to the base color.
    pub fn append_colored(&mut self, text: &str, color: Color) -> FontResult<()> {
        self.ensure_live()?;
        self.color_runs.insert(self.text.len(), Some(color));
        self.text.push_str(text);
        self.color_runs.insert(self.text.len(), None);
        self.invalidate();
        Ok(())
    }

    /// Append text wrapped to this block's limits, each line indented by `indent` spaces.
    pub fn append_indented(&mut self, text: &str, indent: usize) -> FontResult<()> {
        self.ensure_live()?;
        let wrapped = self.wrap_indented(text, indent);
        self.append(&wrapped)
    }

    /// [`append_indented`](Self::append_indented) in `color`.
    pub fn append_indented_colored(
        &mut self,
        text: &str,
        color: Color,
        indent: usize,
    ) -> FontResult<()> {
        self.ensure_live()?;
        let wrapped = self.wrap_indented(text, indent);
        self.append_colored(&wrapped, color)
    }

    fn wrap_indented(&self, text: &str, indent: usize) -> String {
        self.font
            .wrap_string(text, self.font_size, self.max_width, self.max_height, indent)
    }

    pub fn set_color(&mut self, color: Color) -> FontResult<()> {
        self.ensure_live()?;
        if self.color != color {
            self.color = color;
            self.invalidate();
        }
        Ok(())
    }

    pub fn set_font_size(&mut self, font_size: f32) -> FontResult<()> {
        self.ensure_live()?;
        if self.font_size != font_size {
            self.font_size = font_size;
            self.invalidate();
        }
        Ok(())
    }

    pub fn set_max_width(&mut self, max_width: f32) -> FontResult<()> {
        self.ensure_live()?;
        if self.max_width != max_width {
            self.max_width = max_width;
            self.invalidate();
        }
        Ok(())
    }

    pub fn set_max_height(&mut self, max_height: f32) -> FontResult<()> {
        self.ensure_live()?;
        if self.max_height != max_height {
            self.max_height = max_height;
            self.invalidate();
        }
        Ok(())
    }

    pub fn set_alignment(&mut self, alignment: TextAlignment) -> FontResult<()> {
        self.ensure_live()?;
        if self.alignment != alignment {
            self.alignment = alignment;
            self.invalidate();
        }
        Ok(())
    }

    /// Anchor is applied at draw time and does not dirty the layout.
    pub fn set_anchor(&mut self, anchor: TextAnchor) -> FontResult<()> {
        self.ensure_live()?;
        self.anchor = anchor;
        Ok(())
    }

    pub fn set_blend(&mut self, blend: BlendFactors) -> FontResult<()> {
        self.ensure_live()?;
        self.blend = blend;
        Ok(())
    }

    pub fn set_render_debug_bounds(&mut self, enabled: bool) -> FontResult<()> {
        self.ensure_live()?;
        self.render_debug_bounds = enabled;
        Ok(())
    }

    /// Redo the CPU layout now if anything changed since the last one.
    pub fn trigger_rebuild_if_needed(&mut self) -> FontResult<()> {
        self.ensure_live()?;
        if self.state == BuildState::Dirty {
            self.rebuild();
        }
        Ok(())
    }

    /// Draw with the anchor point at (`x`, `y`).
    pub fn draw(&mut self, backend: &mut dyn RenderBackend, x: f32, y: f32) -> FontResult<()> {
        self.draw_at_angle(backend, Point::new(x, y), 0.0)
    }

    pub fn draw_at(&mut self, backend: &mut dyn RenderBackend, position: Point) -> FontResult<()> {
        self.draw_at_angle(backend, position, 0.0)
    }

    /// Draw rotated `angle` degrees about the anchor point.
    pub fn draw_at_angle(
        &mut self,
        backend: &mut dyn RenderBackend,
        position: Point,
        angle: f32,
    ) -> FontResult<()> {
        self.ensure_live()?;
        self.font
            .reclaimer()
            .owner()
            .debug_assert_same_thread_with_msg("RenderableText::draw() called off the rendering thread");
        self.font.reclaimer().drain(backend);

        self.trigger_rebuild_if_needed()?;
        self.adopt_backend(backend);
        if self.state == BuildState::Built {
            self.upload(backend)?;
        }

        if self.buffer.is_none() || self.vertices.is_empty() {
            return Ok(());
        }

        let size = Size::new(self.width, self.height);
        let offset = self.anchor.offset(size);
        let transform = Mat4::from_translation(Vec3::new(position.x, position.y, 0.0))
            * Mat4::from_rotation_z(angle.to_radians())
            * Mat4::from_translation(Vec3::new(offset.x, offset.y, 0.0));

        let mut command = TextDrawCommand {
            buffer: self.current_buffer(backend)?,
            texture: self.font.texture().handle,
            format: self.vertices.format(),
            quad_count: self.vertices.quad_count() as u32,
            transform,
            color: self.color,
            blend: self.blend,
            debug_bounds: self
                .render_debug_bounds
                .then(|| Rect::new(0.0, 0.0, self.width, self.height)),
        };

        match backend.draw_text(command.clone()) {
            Err(RenderError::UnknownBuffer) => {
                // The backend no longer knows our buffer; upload into a fresh one.
                warn!(
                    target: targets::RENDERABLE,
                    font = %self.font.name(),
                    "text buffer missing from backend; re-uploading"
                );
                self.buffer = None;
                self.upload(backend)?;
                command.buffer = self.current_buffer(backend)?;
                backend.draw_text(command)?;
            }
            result => result?,
        }
        Ok(())
    }

    /// Release the GPU buffer. Further use fails with
    /// [`FontError::DisposedResourceUse`]; disposing again does nothing.
    pub fn dispose(&mut self, backend: &mut dyn RenderBackend) {
        if self.disposed {
            return;
        }
        self.font
            .reclaimer()
            .owner()
            .debug_assert_same_thread_with_msg("RenderableText::dispose() called off the rendering thread");

        if let Some((owner, buffer)) = self.buffer.take() {
            if owner == backend.id() {
                backend.release_buffer(buffer);
            } else {
                self.font.reclaimer().defer_release(owner, buffer);
            }
        }
        self.vertices = VertexData::default();
        self.disposed = true;
    }

    fn ensure_live(&self) -> FontResult<()> {
        if self.disposed {
            return Err(FontError::DisposedResourceUse);
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.state = BuildState::Dirty;
    }

    /// Hand a buffer owned by a different backend back to that backend's
    /// queue, so the next upload allocates on `backend`.
    fn adopt_backend(&mut self, backend: &dyn RenderBackend) {
        let id = backend.id();
        let Some((owner, buffer)) = self.buffer else {
            return;
        };
        if owner == id {
            return;
        }
        debug!(target: targets::RENDERABLE, "text moved to another backend");
        self.font.reclaimer().defer_release(owner, buffer);
        self.buffer = None;
        if self.state == BuildState::Uploaded {
            self.state = BuildState::Built;
        }
    }

    fn current_buffer(&self, backend: &dyn RenderBackend) -> FontResult<BufferHandle> {
        match self.buffer {
            Some((owner, buffer)) if owner == backend.id() => Ok(buffer),
            _ => Err(RenderError::UnknownBuffer.into()),
        }
    }

    fn upload(&mut self, backend: &mut dyn RenderBackend) -> FontResult<()> {
        let id = backend.id();
        let buffer = match self.buffer {
            Some((_, buffer)) => buffer,
            None => {
                let buffer = backend.create_buffer();
                self.buffer = Some((id, buffer));
                buffer
            }
        };
        match backend.upload_vertices(buffer, &self.vertices) {
            Err(RenderError::UnknownBuffer) => {
                let fresh = backend.create_buffer();
                self.buffer = Some((id, fresh));
                backend.upload_vertices(fresh, &self.vertices)?;
            }
            result => result?,
        }
        self.state = BuildState::Uploaded;
        trace!(
            target: targets::RENDERABLE,
            quads = self.vertices.quad_count(),
            bytes = self.vertices.as_bytes().len(),
            "uploaded text vertices"
        );
        Ok(())
    }

    fn color_at(&self, offset: usize) -> Color {
        self.color_runs
            .range(..=offset)
            .next_back()
            .and_then(|(_, color)| *color)
            .unwrap_or(self.color)
    }

    fn rebuild(&mut self) {
        let font = Arc::clone(&self.font);
        let spans = font.wrap_spans(&self.text, self.font_size, self.max_width, self.max_height);

        let mut pen = Pen::new(&font, self.font_size);
        let scale = pen.scale();
        let mut quads = Vec::with_capacity(self.text.len());
        let mut lines: Vec<(Range<usize>, f32)> = Vec::with_capacity(spans.len());
        let mut width: f32 = 0.0;

        for (index, span) in spans.iter().enumerate() {
            pen.new_line();
            let y = index as f32 * self.font_size;
            let first = quads.len();

            for (offset, c) in self.text[span.range.clone()].char_indices() {
                if let Some((glyph, x)) = pen.advance(c) {
                    let color = self.color_at(span.range.start + offset);
                    quads.push(glyph_quad(glyph, x, y, scale, color));
                }
            }
            if span.hyphenated {
                let color = self.color_at(span.range.end.saturating_sub(1));
                if let Some((glyph, x)) = pen.advance('-') {
                    quads.push(glyph_quad(glyph, x, y, scale, color));
                }
            }

            width = width.max(pen.x());
            lines.push((first..quads.len(), pen.x()));
        }

        if self.alignment != TextAlignment::Left {
            for (range, line_width) in &lines {
                let shift = match self.alignment {
                    TextAlignment::Left => 0.0,
                    TextAlignment::Center => (width - line_width) / 2.0,
                    TextAlignment::Right => width - line_width,
                };
                for quad in &mut quads[range.clone()] {
                    quad.rect.origin.x += shift;
                }
            }
        }

        self.width = width;
        self.height = spans.len() as f32 * self.font_size;
        self.vertices = VertexData::from_quads(&quads, !self.color_runs.is_empty());
        self.state = BuildState::Built;

        debug!(
            target: targets::RENDERABLE,
            lines = spans.len(),
            quads = quads.len(),
            width = self.width,
            height = self.height,
            colored = !self.color_runs.is_empty(),
            "rebuilt text layout"
        );
    }
}

fn glyph_quad(glyph: &Glyph, x: f32, y: f32, scale: f32, color: Color) -> GlyphQuad {
    GlyphQuad {
        rect: Rect::new(
            x + glyph.x_offset() as f32 * scale,
            y + glyph.y_offset() as f32 * scale,
            glyph.width() as f32 * scale,
            glyph.height() as f32 * scale,
        ),
        uv: [glyph.tx1(), glyph.ty1(), glyph.tx2(), glyph.ty2()],
        color,
    }
}

impl Drop for RenderableText {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }
        if let Some((owner, buffer)) = self.buffer.take() {
            warn!(
                target: targets::RENDERABLE,
                font = %self.font.name(),
                "RenderableText dropped without dispose(); deferring buffer release"
            );
            self.font.reclaimer().defer_release(owner, buffer);
        }
    }
}

impl std::fmt::Debug for RenderableText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderableText")
            .field("font", &self.font.name())
            .field("text", &self.text)
            .field("font_size", &self.font_size)
            .field("state", &self.state)
            .field("disposed", &self.disposed)
            .finish()
    }
}
