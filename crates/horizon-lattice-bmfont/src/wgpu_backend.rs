//! [`RenderBackend`] on top of wgpu.
//!
//! Atlas images become sampled RGBA textures. Each text block gets its own
//! vertex buffer, grown as needed, and all blocks share one quad index
//! buffer. Draw commands are queued rather than executed: the application
//! takes them with [`WgpuBackend::take_draws`] and records them into its own
//! render pass with a pipeline built from
//! [`VertexFormat::buffer_layout`](crate::VertexFormat::buffer_layout) and
//! [`BlendFactors::to_blend_state`](crate::BlendFactors::to_blend_state).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::backend::{BackendId, BufferHandle, RenderBackend, TextDrawCommand, TextureHandle, TextureInfo, TextureProvider};
use crate::context::GpuResources;
use crate::error::{RenderError, RenderResult};
use crate::logging::targets;
use crate::thread_check::ThreadAffinity;
use crate::vertex::{VertexData, VertexFormat, quad_indices};

/// Quads the shared index buffer holds before its first growth.
const INITIAL_INDEX_QUADS: usize = 256;

/// A loaded atlas page.
#[derive(Debug)]
pub struct AtlasTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
}

/// GPU storage behind a [`BufferHandle`].
#[derive(Debug)]
pub struct TextVertexBuffer {
    buffer: Option<wgpu::Buffer>,
    format: VertexFormat,
    vertex_count: usize,
}

impl TextVertexBuffer {
    /// The wgpu buffer, once something non-empty has been uploaded.
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    pub fn format(&self) -> VertexFormat {
        self.format
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    fn capacity(&self) -> u64 {
        self.buffer.as_ref().map_or(0, wgpu::Buffer::size)
    }
}

/// wgpu-backed texture loading, buffer management and draw queueing.
pub struct WgpuBackend {
    id: BackendId,
    resources: Arc<GpuResources>,
    owner: ThreadAffinity,
    textures: SlotMap<TextureHandle, AtlasTexture>,
    buffers: SlotMap<BufferHandle, TextVertexBuffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_quads: usize,
    draws: Vec<TextDrawCommand>,
}

impl WgpuBackend {
    /// Create a backend owned by the calling thread.
    pub fn new(resources: Arc<GpuResources>) -> Self {
        Self {
            id: BackendId::next(),
            resources,
            owner: ThreadAffinity::current(),
            textures: SlotMap::with_key(),
            buffers: SlotMap::with_key(),
            index_buffer: None,
            index_quads: 0,
            draws: Vec::new(),
        }
    }

    pub fn resources(&self) -> &Arc<GpuResources> {
        &self.resources
    }

    pub fn texture(&self, texture: TextureHandle) -> Option<&AtlasTexture> {
        self.textures.get(texture)
    }

    pub fn vertex_buffer(&self, buffer: BufferHandle) -> Option<&TextVertexBuffer> {
        self.buffers.get(buffer)
    }

    /// Shared quad index buffer (0, 1, 2, 0, 2, 3 per quad).
    pub fn index_buffer(&self) -> Option<&wgpu::Buffer> {
        self.index_buffer.as_ref()
    }

    /// Take the queued draw commands, in submission order.
    pub fn take_draws(&mut self) -> Vec<TextDrawCommand> {
        std::mem::take(&mut self.draws)
    }

    fn check_thread(&self) {
        self.owner
            .debug_assert_same_thread_with_msg("WgpuBackend used off the rendering thread");
    }

    fn ensure_index_capacity(&mut self, quads: usize) {
        if quads <= self.index_quads && self.index_buffer.is_some() {
            return;
        }
        let capacity = quads.max(INITIAL_INDEX_QUADS).next_power_of_two();
        let indices = quad_indices(capacity);
        let device = &self.resources.device;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bmfont_quad_index_buffer"),
            size: (indices.len() * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.resources
            .queue
            .write_buffer(&buffer, 0, bytemuck::cast_slice(&indices));

        debug!(target: targets::BACKEND, quads = capacity, "grew quad index buffer");
        self.index_buffer = Some(buffer);
        self.index_quads = capacity;
    }
}

impl TextureProvider for WgpuBackend {
    fn load_texture(&mut self, path: &Path) -> RenderResult<TextureInfo> {
        self.check_thread();
        let image = image::open(path)
            .map_err(|e| RenderError::ImageLoad(format!("{}: {e}", path.display())))?
            .to_rgba8();
        let (width, height) = image.dimensions();

        let device = &self.resources.device;
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("bmfont_atlas"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.resources.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bmfont_atlas_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        debug!(
            target: targets::BACKEND,
            path = %path.display(),
            width,
            height,
            "uploaded atlas texture"
        );

        let handle = self.textures.insert(AtlasTexture {
            texture,
            view,
            sampler,
            width,
            height,
            path: path.to_path_buf(),
        });
        Ok(TextureInfo {
            handle,
            width,
            height,
        })
    }
}

impl RenderBackend for WgpuBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    fn create_buffer(&mut self) -> BufferHandle {
        self.check_thread();
        self.buffers.insert(TextVertexBuffer {
            buffer: None,
            format: VertexFormat::Plain,
            vertex_count: 0,
        })
    }

    fn upload_vertices(&mut self, buffer: BufferHandle, vertices: &VertexData) -> RenderResult<()> {
        self.check_thread();
        let bytes = vertices.as_bytes();
        let resources = Arc::clone(&self.resources);
        let entry = self.buffers.get_mut(buffer).ok_or(RenderError::UnknownBuffer)?;

        entry.format = vertices.format();
        entry.vertex_count = vertices.vertex_count();
        if bytes.is_empty() {
            return Ok(());
        }

        if entry.capacity() < bytes.len() as u64 {
            let size = (bytes.len() as u64).next_power_of_two();
            entry.buffer = Some(resources.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("bmfont_text_vertex_buffer"),
                size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            trace!(target: targets::BACKEND, size, "allocated text vertex buffer");
        }
        if let Some(gpu_buffer) = &entry.buffer {
            resources.queue.write_buffer(gpu_buffer, 0, bytes);
        }

        self.ensure_index_capacity(vertices.quad_count());
        Ok(())
    }

    fn release_buffer(&mut self, buffer: BufferHandle) {
        self.check_thread();
        if let Some(entry) = self.buffers.remove(buffer) {
            if let Some(gpu_buffer) = entry.buffer {
                gpu_buffer.destroy();
            }
        }
    }

    fn draw_text(&mut self, command: TextDrawCommand) -> RenderResult<()> {
        if !self.buffers.contains_key(command.buffer) {
            return Err(RenderError::UnknownBuffer);
        }
        if !self.textures.contains_key(command.texture) {
            return Err(RenderError::UnknownTexture);
        }
        self.draws.push(command);
        Ok(())
    }
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("textures", &self.textures.len())
            .field("buffers", &self.buffers.len())
            .field("index_quads", &self.index_quads)
            .field("queued_draws", &self.draws.len())
            .finish()
    }
}
