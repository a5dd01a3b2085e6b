//! Bitmap font text for Horizon Lattice.
//!
//! This crate loads AngelCode BMFont text descriptors, measures and
//! word-wraps text with kerning, and keeps drawable text blocks cached as
//! GPU vertex buffers that are rebuilt only when they change.
//!
//! # Getting Started
//!
//! Fonts are loaded through a [`FontCatalog`], which parses each descriptor
//! once and shares the result:
//!
//! ```no_run
//! use horizon_lattice_bmfont::{FontCatalog, HeadlessBackend, TextConfig};
//!
//! let catalog = FontCatalog::with_config(TextConfig::new().asset_root("assets"));
//! let mut backend = HeadlessBackend::new();
//!
//! let font = catalog.load_font("graphics/fonts/insignia15LTaa.fnt", &mut backend)?;
//! let wrapped = font.wrap_to_width("Text that should fit in 200 pixels", 15.0, 200.0);
//! println!("{wrapped} is {} wide", font.calc_width(&wrapped, 15.0));
//! # Ok::<(), horizon_lattice_bmfont::FontError>(())
//! ```
//!
//! # Drawing Text
//!
//! [`RenderableText`] blocks are created by a [`Font`] and drawn through a
//! [`RenderBackend`]: [`WgpuBackend`] on a real device, or
//! [`HeadlessBackend`] when only the CPU side is needed.
//!
//! ```no_run
//! use std::sync::Arc;
//! use horizon_lattice_bmfont::{
//!     Color, FontCatalog, GpuResources, GraphicsConfig, TextAnchor, WgpuBackend,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resources = Arc::new(GpuResources::request(&GraphicsConfig::default())?);
//! let mut backend = WgpuBackend::new(resources);
//! let catalog = FontCatalog::new();
//!
//! let font = catalog.load_font("fonts/ui.fnt", &mut backend)?;
//! let mut label = font.create_text_with("Score: 0", Color::WHITE, 24.0, 300.0, f32::MAX);
//! label.set_anchor(TextAnchor::Center)?;
//!
//! // Each frame:
//! catalog.reclaim(&mut backend);
//! label.draw(&mut backend, 400.0, 300.0)?;
//! for command in backend.take_draws() {
//!     // Record into the application's render pass.
//!     let _ = command;
//! }
//!
//! label.dispose(&mut backend);
//! # Ok(())
//! # }
//! ```
//!
//! # Threading
//!
//! Fonts are immutable and can be measured from any thread. Everything that
//! touches the backend (loading, drawing, disposing) belongs to the thread
//! that created the catalog. A text block dropped on another thread queues
//! its buffer in the catalog's [`ResourceReclaimer`], and the rendering
//! thread releases it on the next [`FontCatalog::reclaim`] or draw.

mod backend;
mod catalog;
mod config;
mod context;
mod error;
mod font;
mod headless;
pub mod logging;
mod reclaim;
mod renderable;
pub mod thread_check;
mod types;
mod vertex;
mod wgpu_backend;

// Loading and layout
pub use catalog::{FontCatalog, canonicalize_path};
pub use config::{DEFAULT_FALLBACK_CHAR, DEFAULT_TAB_WIDTH, TextConfig};
pub use error::{FontError, FontResult, RenderError, RenderResult};
pub use font::parser::{self, FontDefinition, FontHeader, GlyphRecord, KerningRecord};
pub use font::{Font, Glyph};

// Text blocks
pub use reclaim::ResourceReclaimer;
pub use renderable::{RenderableText, TextAlignment, TextAnchor};

// Rendering boundary
pub use backend::{
    BackendId, BlendFactors, BufferHandle, RenderBackend, TextDrawCommand, TextureHandle, TextureInfo,
    TextureProvider,
};
pub use context::{GpuResources, GraphicsConfig};
pub use headless::{BackendStats, HeadlessBackend};
pub use vertex::{ColoredTextVertex, TextVertex, VertexData, VertexFormat, quad_indices};
pub use wgpu_backend::{AtlasTexture, TextVertexBuffer, WgpuBackend};

pub use types::{Color, Point, Rect, Size};

// Re-export wgpu types that users commonly need
pub use wgpu;
