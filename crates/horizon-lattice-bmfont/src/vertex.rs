//! Vertex formats for text quads.
//!
//! Each glyph is one quad of four vertices (top-left, top-right,
//! bottom-right, bottom-left) drawn as two triangles through a shared index
//! buffer. Text that uses a single color is uploaded without per-vertex color,
//! which halves the buffer size; the color is then passed with the draw.

use bytemuck::{Pod, Zeroable};

use crate::types::{Color, Rect};

/// Vertex for single-color text: position and texture coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TextVertex {
    /// Position in pixels, relative to the text block origin.
    pub position: [f32; 2],
    /// Atlas texture coordinates.
    pub uv: [f32; 2],
}

impl TextVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2, // uv
    ];

    /// Vertex buffer layout for pipelines drawing single-color text.
    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Vertex for text with colored runs.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ColoredTextVertex {
    /// Position in pixels, relative to the text block origin.
    pub position: [f32; 2],
    /// Atlas texture coordinates.
    pub uv: [f32; 2],
    /// Color (premultiplied alpha).
    pub color: [f32; 4],
}

impl ColoredTextVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Float32x2, // uv
        2 => Float32x4, // color
    ];

    /// Vertex buffer layout for pipelines drawing multi-color text.
    pub fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Which vertex layout a buffer was uploaded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// [`TextVertex`]; the draw color comes from the draw command.
    Plain,
    /// [`ColoredTextVertex`].
    Colored,
}

impl VertexFormat {
    /// Size of one vertex in bytes.
    pub fn stride(self) -> usize {
        match self {
            VertexFormat::Plain => std::mem::size_of::<TextVertex>(),
            VertexFormat::Colored => std::mem::size_of::<ColoredTextVertex>(),
        }
    }

    pub fn buffer_layout(self) -> wgpu::VertexBufferLayout<'static> {
        match self {
            VertexFormat::Plain => TextVertex::buffer_layout(),
            VertexFormat::Colored => ColoredTextVertex::buffer_layout(),
        }
    }
}

/// One positioned glyph before it is flattened into vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GlyphQuad {
    pub rect: Rect,
    /// (u_min, v_min, u_max, v_max)
    pub uv: [f32; 4],
    pub color: Color,
}

/// Vertex data for a whole text block, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexData {
    Plain(Vec<TextVertex>),
    Colored(Vec<ColoredTextVertex>),
}

impl Default for VertexData {
    fn default() -> Self {
        VertexData::Plain(Vec::new())
    }
}

impl VertexData {
    /// Flatten quads into vertices, with or without per-vertex color.
    pub(crate) fn from_quads(quads: &[GlyphQuad], colored: bool) -> Self {
        if colored {
            let mut vertices = Vec::with_capacity(quads.len() * 4);
            for quad in quads {
                let color = quad.color.to_array();
                for (position, uv) in corners(quad) {
                    vertices.push(ColoredTextVertex {
                        position,
                        uv,
                        color,
                    });
                }
            }
            VertexData::Colored(vertices)
        } else {
            let mut vertices = Vec::with_capacity(quads.len() * 4);
            for quad in quads {
                for (position, uv) in corners(quad) {
                    vertices.push(TextVertex { position, uv });
                }
            }
            VertexData::Plain(vertices)
        }
    }

    pub fn format(&self) -> VertexFormat {
        match self {
            VertexData::Plain(_) => VertexFormat::Plain,
            VertexData::Colored(_) => VertexFormat::Colored,
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self {
            VertexData::Plain(v) => v.len(),
            VertexData::Colored(v) => v.len(),
        }
    }

    /// Number of glyph quads.
    pub fn quad_count(&self) -> usize {
        self.vertex_count() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }

    /// Raw bytes for buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            VertexData::Plain(v) => bytemuck::cast_slice(v),
            VertexData::Colored(v) => bytemuck::cast_slice(v),
        }
    }
}

fn corners(quad: &GlyphQuad) -> [([f32; 2], [f32; 2]); 4] {
    let r = &quad.rect;
    let [u0, v0, u1, v1] = quad.uv;
    [
        ([r.left(), r.top()], [u0, v0]),
        ([r.right(), r.top()], [u1, v0]),
        ([r.right(), r.bottom()], [u1, v1]),
        ([r.left(), r.bottom()], [u0, v1]),
    ]
}

/// Index list for `quad_count` quads laid out as four vertices each.
pub fn quad_indices(quad_count: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(quad_count * 6);
    for quad in 0..quad_count as u32 {
        let base = quad * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> GlyphQuad {
        GlyphQuad {
            rect: Rect::new(1.0, 2.0, 10.0, 20.0),
            uv: [0.0, 0.25, 0.5, 0.75],
            color: Color::RED,
        }
    }

    #[test]
    fn vertex_sizes() {
        assert_eq!(std::mem::size_of::<TextVertex>(), 16);
        assert_eq!(std::mem::size_of::<ColoredTextVertex>(), 32);
        assert_eq!(VertexFormat::Plain.stride() * 2, VertexFormat::Colored.stride());
    }

    #[test]
    fn plain_quad_corners() {
        let data = VertexData::from_quads(&[quad()], false);
        let VertexData::Plain(vertices) = &data else {
            panic!("expected plain vertices");
        };
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[0].position, [1.0, 2.0]);
        assert_eq!(vertices[0].uv, [0.0, 0.25]);
        assert_eq!(vertices[2].position, [11.0, 22.0]);
        assert_eq!(vertices[2].uv, [0.5, 0.75]);
        assert_eq!(vertices[3].position, [1.0, 22.0]);
        assert_eq!(data.as_bytes().len(), 64);
    }

    #[test]
    fn colored_quad_carries_color() {
        let data = VertexData::from_quads(&[quad(), quad()], true);
        assert_eq!(data.format(), VertexFormat::Colored);
        assert_eq!(data.quad_count(), 2);
        let VertexData::Colored(vertices) = &data else {
            panic!("expected colored vertices");
        };
        assert!(vertices.iter().all(|v| v.color == Color::RED.to_array()));
        assert_eq!(data.as_bytes().len(), 256);
    }

    #[test]
    fn quad_indices_form_two_triangles() {
        assert_eq!(quad_indices(2), vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
        assert!(quad_indices(0).is_empty());
    }
}
