//! The boundary between text layout and the graphics API.
//!
//! Fonts and text blocks never talk to a GPU directly. Texture loading goes
//! through a [`TextureProvider`], and buffer management plus drawing go
//! through a [`RenderBackend`]. Both are only ever called from the thread
//! that owns the rendering context.
//!
//! Two implementations ship with the crate:
//! - [`WgpuBackend`](crate::WgpuBackend) for real rendering.
//! - [`HeadlessBackend`](crate::HeadlessBackend), which records every call and
//!   is used for tests and tooling.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::new_key_type;

use crate::error::RenderResult;
use crate::types::{Color, Rect};
use crate::vertex::{VertexData, VertexFormat};

new_key_type! {
    /// Opaque handle to a texture owned by a render backend.
    pub struct TextureHandle;

    /// Opaque handle to a vertex buffer owned by a render backend.
    pub struct BufferHandle;
}

static BACKEND_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies one render backend instance.
///
/// Buffer handles are only meaningful to the backend that created them, so
/// anything holding a handle also records which backend it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendId(u64);

impl BackendId {
    /// A fresh id, distinct from every other one in the process.
    pub fn next() -> Self {
        Self(BACKEND_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A loaded atlas texture and its pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
}

/// Loads atlas images into textures.
pub trait TextureProvider {
    /// Load and bind the image at `path`, returning its handle and size.
    fn load_texture(&mut self, path: &Path) -> RenderResult<TextureInfo>;
}

/// Blend factors used when compositing text.
///
/// Defaults to `One` / `OneMinusSrcAlpha`, which suits premultiplied colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendFactors {
    pub src: wgpu::BlendFactor,
    pub dst: wgpu::BlendFactor,
}

impl Default for BlendFactors {
    fn default() -> Self {
        Self {
            src: wgpu::BlendFactor::One,
            dst: wgpu::BlendFactor::OneMinusSrcAlpha,
        }
    }
}

impl BlendFactors {
    pub fn new(src: wgpu::BlendFactor, dst: wgpu::BlendFactor) -> Self {
        Self { src, dst }
    }

    /// Blend state applying these factors to both color and alpha.
    pub fn to_blend_state(self) -> wgpu::BlendState {
        let component = wgpu::BlendComponent {
            src_factor: self.src,
            dst_factor: self.dst,
            operation: wgpu::BlendOperation::Add,
        };
        wgpu::BlendState {
            color: component,
            alpha: component,
        }
    }
}

/// One request to draw a previously uploaded text buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDrawCommand {
    pub buffer: BufferHandle,
    pub texture: TextureHandle,
    pub format: VertexFormat,
    pub quad_count: u32,
    /// Maps block-local positions to target positions (anchor, rotation, translation).
    pub transform: glam::Mat4,
    /// Color for [`VertexFormat::Plain`] buffers; ignored for colored ones.
    pub color: Color,
    pub blend: BlendFactors,
    /// Block-local bounds to outline, when debug bounds are enabled.
    pub debug_bounds: Option<Rect>,
}

impl TextDrawCommand {
    /// Number of indices needed to draw every quad.
    pub fn index_count(&self) -> u32 {
        self.quad_count * 6
    }
}

/// Owner-thread graphics operations needed by text blocks.
pub trait RenderBackend: TextureProvider {
    /// Identity of this backend; stable for its whole lifetime.
    fn id(&self) -> BackendId;

    /// Allocate an empty vertex buffer.
    fn create_buffer(&mut self) -> BufferHandle;

    /// Replace the contents of `buffer`.
    fn upload_vertices(&mut self, buffer: BufferHandle, vertices: &VertexData) -> RenderResult<()>;

    /// Free `buffer`. Unknown handles are ignored.
    fn release_buffer(&mut self, buffer: BufferHandle);

    /// Submit a draw of an uploaded buffer.
    fn draw_text(&mut self, command: TextDrawCommand) -> RenderResult<()>;
}
