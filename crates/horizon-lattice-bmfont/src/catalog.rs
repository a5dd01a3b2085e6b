//! Cache of loaded fonts keyed by canonical path.
//!
//! Each distinct descriptor file is parsed and its atlas loaded at most once
//! per catalog. Entries are never evicted. The catalog is an ordinary value:
//! create one for the application and pass it to whatever needs fonts.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::backend::{RenderBackend, TextureProvider};
use crate::config::TextConfig;
use crate::error::{FontError, FontResult};
use crate::font::{Font, FontDefinition};
use crate::logging::targets;
use crate::reclaim::ResourceReclaimer;

/// Shared, append-only font cache.
///
/// The thread that creates the catalog owns its [`ResourceReclaimer`] and
/// must be the one that renders.
pub struct FontCatalog {
    config: TextConfig,
    reclaimer: Arc<ResourceReclaimer>,
    fonts: RwLock<HashMap<String, Arc<Font>>>,
    /// Held while a path is being loaded so concurrent requests wait for it.
    loading: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Default for FontCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FontCatalog {
    /// Create an empty catalog with default configuration.
    pub fn new() -> Self {
        Self::with_config(TextConfig::default())
    }

    pub fn with_config(config: TextConfig) -> Self {
        Self {
            config,
            reclaimer: Arc::new(ResourceReclaimer::new()),
            fonts: RwLock::new(HashMap::new()),
            loading: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &TextConfig {
        &self.config
    }

    /// Queue that text blocks from this catalog's fonts release buffers through.
    pub fn reclaimer(&self) -> &Arc<ResourceReclaimer> {
        &self.reclaimer
    }

    /// Load the font at `path`, or return the cached one.
    ///
    /// Paths that differ only in separators, `.` or `..` segments share one
    /// entry. The atlas image is looked up next to the descriptor.
    pub fn load_font(&self, path: &str, textures: &mut dyn TextureProvider) -> FontResult<Arc<Font>> {
        let canonical = canonicalize_path(path);
        if let Some(font) = self.cached(&canonical) {
            return Ok(font);
        }

        loop {
            let slot = Arc::clone(self.loading.lock().entry(canonical.clone()).or_default());
            let _loading = slot.lock();

            // Another thread may have finished the load while we waited.
            if let Some(font) = self.cached(&canonical) {
                return Ok(font);
            }
            // The slot was retired by a load that failed; queue on the current one.
            if !self.is_current_slot(&canonical, &slot) {
                continue;
            }

            let result = self.load_uncached(&canonical, textures);
            self.loading.lock().remove(&canonical);
            return result;
        }
    }

    fn is_current_slot(&self, canonical: &str, slot: &Arc<Mutex<()>>) -> bool {
        self.loading
            .lock()
            .get(canonical)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    /// The cached font for `path`, without loading it.
    pub fn get(&self, path: &str) -> Option<Arc<Font>> {
        self.fonts.read().get(&canonicalize_path(path)).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fonts.read().contains_key(&canonicalize_path(path))
    }

    /// Number of fonts loaded.
    pub fn len(&self) -> usize {
        self.fonts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.read().is_empty()
    }

    /// Release buffers of text blocks that were dropped without being disposed.
    ///
    /// Call once per frame (or at any convenient point) on the rendering
    /// thread. Returns the number of buffers released.
    pub fn reclaim(&self, backend: &mut dyn RenderBackend) -> usize {
        self.reclaimer.drain(backend)
    }

    fn cached(&self, canonical: &str) -> Option<Arc<Font>> {
        let font = self.fonts.read().get(canonical).cloned()?;
        debug!(target: targets::CATALOG, path = canonical, "font cache hit");
        Some(font)
    }

    fn load_uncached(&self, canonical: &str, textures: &mut dyn TextureProvider) -> FontResult<Arc<Font>> {
        let file = self.config.resolve(canonical);
        let source = std::fs::read_to_string(&file).map_err(|source| FontError::Io {
            path: file.clone(),
            source,
        })?;
        let definition = FontDefinition::parse(&source)?;

        let image = self
            .config
            .resolve(&image_path(canonical, &definition.header.image_file));
        let texture = textures
            .load_texture(&image)
            .map_err(|source| FontError::TextureLoad {
                path: image.clone(),
                source,
            })?;

        let glyphs = definition.glyphs.len();
        let kernings = definition.kernings.len();
        let font = Arc::new(Font::from_definition(
            canonical.to_string(),
            definition,
            texture,
            &self.config,
            Arc::clone(&self.reclaimer),
        ));

        info!(
            target: targets::CATALOG,
            path = canonical,
            name = font.name(),
            glyphs,
            kernings,
            texture_width = texture.width,
            texture_height = texture.height,
            "loaded font"
        );

        self.fonts
            .write()
            .insert(canonical.to_string(), Arc::clone(&font));
        Ok(font)
    }
}

impl std::fmt::Debug for FontCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCatalog")
            .field("fonts", &self.len())
            .field("pending_releases", &self.reclaimer.pending())
            .finish()
    }
}

/// Normalize a path lexically: backslashes become `/`, empty and `.`
/// segments are dropped and `..` removes the preceding segment.
///
/// The file system is never consulted, so the file need not exist.
pub fn canonicalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                // `..` above the root of an absolute path goes nowhere.
                _ if absolute => {}
                _ => segments.push(".."),
            },
            _ => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    if absolute { format!("/{joined}") } else { joined }
}

/// Atlas image path for a descriptor at canonical path `font_path`.
fn image_path(font_path: &str, image_file: &str) -> String {
    match font_path.rfind('/') {
        Some(index) => format!("{}/{image_file}", &font_path[..index]),
        None => image_file.to_string(),
    }
}
