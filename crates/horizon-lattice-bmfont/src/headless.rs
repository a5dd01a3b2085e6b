//! A render backend that keeps everything on the CPU.
//!
//! [`HeadlessBackend`] stores uploaded vertex data and draw commands instead of
//! sending them to a GPU, and counts every call. It is what the tests run
//! against, and it is handy for tools that only need text metrics.

use std::path::{Path, PathBuf};

use slotmap::SlotMap;
use tracing::trace;

use crate::backend::{BackendId, BufferHandle, RenderBackend, TextDrawCommand, TextureHandle, TextureInfo, TextureProvider};
use crate::error::{RenderError, RenderResult};
use crate::logging::targets;
use crate::vertex::VertexData;

/// Call counts recorded by a [`HeadlessBackend`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub textures_loaded: usize,
    pub buffers_created: usize,
    pub uploads: usize,
    pub buffers_released: usize,
    pub draws: usize,
}

#[derive(Debug)]
struct TextureEntry {
    path: PathBuf,
    width: u32,
    height: u32,
}

/// CPU-only [`RenderBackend`].
#[derive(Debug)]
pub struct HeadlessBackend {
    id: BackendId,
    textures: SlotMap<TextureHandle, TextureEntry>,
    buffers: SlotMap<BufferHandle, VertexData>,
    draws: Vec<TextDrawCommand>,
    stats: BackendStats,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self {
            id: BackendId::next(),
            textures: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            draws: Vec::new(),
            stats: BackendStats::default(),
        }
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    /// Buffers created and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Contents last uploaded to `buffer`.
    pub fn buffer(&self, buffer: BufferHandle) -> Option<&VertexData> {
        self.buffers.get(buffer)
    }

    /// Path a texture was loaded from.
    pub fn texture_path(&self, texture: TextureHandle) -> Option<&Path> {
        self.textures.get(texture).map(|entry| entry.path.as_path())
    }

    /// Pixel size of a loaded texture.
    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures.get(texture).map(|entry| (entry.width, entry.height))
    }

    /// Register a texture without reading a file.
    pub fn insert_texture(&mut self, path: impl Into<PathBuf>, width: u32, height: u32) -> TextureInfo {
        let handle = self.textures.insert(TextureEntry {
            path: path.into(),
            width,
            height,
        });
        TextureInfo {
            handle,
            width,
            height,
        }
    }

    /// Draw commands received so far.
    pub fn draws(&self) -> &[TextDrawCommand] {
        &self.draws
    }

    /// Take the recorded draw commands, leaving the list empty.
    pub fn take_draws(&mut self) -> Vec<TextDrawCommand> {
        std::mem::take(&mut self.draws)
    }
}

impl TextureProvider for HeadlessBackend {
    fn load_texture(&mut self, path: &Path) -> RenderResult<TextureInfo> {
        let (width, height) = image::image_dimensions(path)
            .map_err(|e| RenderError::ImageLoad(format!("{}: {e}", path.display())))?;
        self.stats.textures_loaded += 1;
        trace!(
            target: targets::BACKEND,
            path = %path.display(),
            width,
            height,
            "loaded headless texture"
        );
        Ok(self.insert_texture(path, width, height))
    }
}

impl RenderBackend for HeadlessBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    fn create_buffer(&mut self) -> BufferHandle {
        self.stats.buffers_created += 1;
        self.buffers.insert(VertexData::default())
    }

    fn upload_vertices(&mut self, buffer: BufferHandle, vertices: &VertexData) -> RenderResult<()> {
        let slot = self.buffers.get_mut(buffer).ok_or(RenderError::UnknownBuffer)?;
        *slot = vertices.clone();
        self.stats.uploads += 1;
        Ok(())
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(buffer).is_some() {
            self.stats.buffers_released += 1;
        }
    }

    fn draw_text(&mut self, command: TextDrawCommand) -> RenderResult<()> {
        let vertices = self.buffers.get(command.buffer).ok_or(RenderError::UnknownBuffer)?;
        if !self.textures.contains_key(command.texture) {
            return Err(RenderError::UnknownTexture);
        }
        debug_assert_eq!(vertices.format(), command.format);
        self.stats.draws += 1;
        self.draws.push(command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BlendFactors;
    use crate::types::Color;
    use crate::vertex::VertexFormat;

    fn command(buffer: BufferHandle, texture: TextureHandle) -> TextDrawCommand {
        TextDrawCommand {
            buffer,
            texture,
            format: VertexFormat::Plain,
            quad_count: 0,
            transform: glam::Mat4::IDENTITY,
            color: Color::WHITE,
            blend: BlendFactors::default(),
            debug_bounds: None,
        }
    }

    #[test]
    fn buffer_lifecycle_is_counted() {
        let mut backend = HeadlessBackend::new();
        let buffer = backend.create_buffer();
        backend.upload_vertices(buffer, &VertexData::default()).unwrap();
        assert_eq!(backend.live_buffers(), 1);

        backend.release_buffer(buffer);
        backend.release_buffer(buffer);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(
            backend.stats(),
            BackendStats {
                buffers_created: 1,
                uploads: 1,
                buffers_released: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn released_buffer_cannot_be_uploaded_or_drawn() {
        let mut backend = HeadlessBackend::new();
        let texture = backend.insert_texture("atlas.png", 16, 16);
        let buffer = backend.create_buffer();
        backend.release_buffer(buffer);

        assert!(matches!(
            backend.upload_vertices(buffer, &VertexData::default()),
            Err(RenderError::UnknownBuffer)
        ));
        assert!(matches!(
            backend.draw_text(command(buffer, texture.handle)),
            Err(RenderError::UnknownBuffer)
        ));
    }

    #[test]
    fn draw_requires_known_texture() {
        let mut backend = HeadlessBackend::new();
        let buffer = backend.create_buffer();
        assert!(matches!(
            backend.draw_text(command(buffer, TextureHandle::default())),
            Err(RenderError::UnknownTexture)
        ));
    }

    #[test]
    fn missing_image_is_an_error() {
        let mut backend = HeadlessBackend::new();
        let err = backend
            .load_texture(Path::new("does/not/exist.png"))
            .unwrap_err();
        assert!(matches!(err, RenderError::ImageLoad(_)));
        assert_eq!(backend.stats().textures_loaded, 0);
    }

    #[test]
    fn loads_image_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.png");
        image::RgbaImage::new(64, 32).save(&path).unwrap();

        let mut backend = HeadlessBackend::new();
        let texture = backend.load_texture(&path).unwrap();
        assert_eq!((texture.width, texture.height), (64, 32));
        assert_eq!(backend.texture_path(texture.handle), Some(path.as_path()));
        assert_eq!(backend.texture_size(texture.handle), Some((64, 32)));
        assert_eq!(backend.stats().textures_loaded, 1);
    }
}
