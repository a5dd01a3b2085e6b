//! Tracing targets used by this crate.
//!
//! All diagnostics go through the `tracing` crate. Install a subscriber in the
//! application to see them, and filter with the targets below:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_lattice_bmfont::catalog=debug")
//!     .init();
//! ```

/// Target names for log filtering.
pub mod targets {
    /// Font catalog: loads, cache hits, reclamation ticks.
    pub const CATALOG: &str = "horizon_lattice_bmfont::catalog";
    /// Font description parsing.
    pub const PARSER: &str = "horizon_lattice_bmfont::parser";
    /// Glyph lookup and layout.
    pub const FONT: &str = "horizon_lattice_bmfont::font";
    /// Text block rebuilds, uploads and disposal.
    pub const RENDERABLE: &str = "horizon_lattice_bmfont::renderable";
    /// Deferred buffer release.
    pub const RECLAIM: &str = "horizon_lattice_bmfont::reclaim";
    /// Render backends.
    pub const BACKEND: &str = "horizon_lattice_bmfont::backend";
}
