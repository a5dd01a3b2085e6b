//! Error types for bitmap font loading and text rendering.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the graphics side of the crate (device, textures, buffers).
#[derive(Error, Debug)]
pub enum RenderError {
    /// No suitable graphics adapter was found.
    #[error("no suitable graphics adapter found")]
    NoAdapter,

    /// Failed to request a graphics device.
    #[error("failed to request graphics device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// An atlas image could not be read or decoded.
    #[error("failed to load image: {0}")]
    ImageLoad(String),

    /// A buffer handle was used after it was released, or never existed.
    #[error("unknown vertex buffer handle")]
    UnknownBuffer,

    /// A texture handle does not belong to this backend.
    #[error("unknown texture handle")]
    UnknownTexture,
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while loading a font or using text built from it.
#[derive(Error, Debug)]
pub enum FontError {
    /// The font description document could not be opened or read.
    #[error("failed to read font file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The atlas image referenced by the font could not be loaded.
    #[error("failed to load texture atlas '{}': {source}", path.display())]
    TextureLoad {
        path: PathBuf,
        #[source]
        source: RenderError,
    },

    /// The three header lines did not tokenize to the expected field count.
    #[error("metadata length mismatch: expected {expected} fields, found {actual} in '{line}'")]
    MetadataLengthMismatch {
        expected: usize,
        actual: usize,
        line: String,
    },

    /// A `char` line did not tokenize to the expected field count.
    #[error("character data length mismatch: expected {expected} fields, found {actual} in '{line}'")]
    CharDataLengthMismatch {
        expected: usize,
        actual: usize,
        line: String,
    },

    /// A `kerning` line did not tokenize to the expected field count.
    #[error("kerning data length mismatch: expected {expected} fields, found {actual} in '{line}'")]
    KernDataLengthMismatch {
        expected: usize,
        actual: usize,
        line: String,
    },

    /// A field that must be numeric could not be parsed.
    #[error("failed to parse {field} from '{value}' in '{line}'")]
    NumericParse {
        field: &'static str,
        value: String,
        line: String,
    },

    /// An operation was attempted on a text block after `dispose()`.
    #[error("tried to use a disposed RenderableText")]
    DisposedResourceUse,

    /// Uploading or drawing through the render backend failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result type for font operations.
pub type FontResult<T> = Result<T, FontError>;
