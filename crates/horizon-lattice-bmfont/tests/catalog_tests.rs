//! Integration tests for font loading through the catalog.

mod common;

use std::sync::{Arc, Barrier};

use horizon_lattice_bmfont::{FontCatalog, FontError, HeadlessBackend, TextConfig};

use common::{FONT_PATH, font_dir, init_tracing, write_font};

#[test]
fn test_load_font_reads_metadata() {
    init_tracing();
    let dir = font_dir();
    let catalog = FontCatalog::with_config(TextConfig::new().asset_root(dir.path()));
    let mut backend = HeadlessBackend::new();

    let font = catalog.load_font(FONT_PATH, &mut backend).unwrap();
    assert_eq!(font.name(), "Test Sans");
    assert_eq!(font.path(), FONT_PATH);
    assert_eq!(font.base_height(), 20.0);
    assert_eq!(font.texture_width(), 256);
    assert_eq!(font.texture_height(), 128);
    assert_eq!(font.glyph_count(), 95);
    assert_eq!(
        backend.texture_path(font.texture().handle),
        Some(dir.path().join("fonts/test sans_0.png").as_path())
    );
}

#[test]
fn test_equivalent_paths_share_one_font() {
    init_tracing();
    let dir = font_dir();
    let catalog = FontCatalog::with_config(TextConfig::new().asset_root(dir.path()));
    let mut backend = HeadlessBackend::new();

    let first = catalog.load_font("fonts/test.fnt", &mut backend).unwrap();
    let second = catalog.load_font("fonts\\test.fnt", &mut backend).unwrap();
    let third = catalog
        .load_font("./fonts/extra/../test.fnt", &mut backend)
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &third));
    assert_eq!(catalog.len(), 1);
    assert_eq!(backend.stats().textures_loaded, 1);
    assert!(catalog.contains("fonts//test.fnt"));
}

#[test]
fn test_cached_font_survives_file_removal() {
    let dir = font_dir();
    let catalog = FontCatalog::with_config(TextConfig::new().asset_root(dir.path()));
    let mut backend = HeadlessBackend::new();

    let font = catalog.load_font(FONT_PATH, &mut backend).unwrap();
    std::fs::remove_file(dir.path().join(FONT_PATH)).unwrap();

    let again = catalog.load_font(FONT_PATH, &mut backend).unwrap();
    assert!(Arc::ptr_eq(&font, &again));
}

#[test]
fn test_missing_font_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FontCatalog::with_config(TextConfig::new().asset_root(dir.path()));
    let mut backend = HeadlessBackend::new();

    let err = catalog.load_font("fonts/nope.fnt", &mut backend).unwrap_err();
    assert!(matches!(err, FontError::Io { .. }));
    assert!(catalog.is_empty());
}

#[test]
fn test_missing_atlas_is_texture_error() {
    let dir = font_dir();
    std::fs::remove_file(dir.path().join("fonts/test sans_0.png")).unwrap();
    let catalog = FontCatalog::with_config(TextConfig::new().asset_root(dir.path()));
    let mut backend = HeadlessBackend::new();

    let err = catalog.load_font(FONT_PATH, &mut backend).unwrap_err();
    assert!(matches!(err, FontError::TextureLoad { .. }));
    assert!(catalog.is_empty());
}

#[test]
fn test_malformed_header_aborts_load() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_font(dir.path(), "info face=\"Broken\"\ncommon lineHeight=20\npage id=0\n");
    let catalog = FontCatalog::with_config(TextConfig::new().asset_root(dir.path()));
    let mut backend = HeadlessBackend::new();

    let err = catalog.load_font(FONT_PATH, &mut backend).unwrap_err();
    assert!(matches!(err, FontError::MetadataLengthMismatch { expected: 51, .. }));
    assert!(catalog.is_empty());
    assert_eq!(backend.stats().textures_loaded, 0);
}

#[test]
fn test_malformed_char_line_aborts_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut descriptor = common::descriptor();
    descriptor.push_str("char id=200 x=0 y=0\n");
    write_font(dir.path(), &descriptor);
    let catalog = FontCatalog::with_config(TextConfig::new().asset_root(dir.path()));
    let mut backend = HeadlessBackend::new();

    let err = catalog.load_font(FONT_PATH, &mut backend).unwrap_err();
    assert!(matches!(
        err,
        FontError::CharDataLengthMismatch {
            expected: 21,
            actual: 7,
            ..
        }
    ));
    assert!(catalog.get(FONT_PATH).is_none());
}

#[test]
fn test_concurrent_first_loads_are_single_flight() {
    let dir = font_dir();
    let catalog = FontCatalog::with_config(TextConfig::new().asset_root(dir.path()));
    let barrier = Barrier::new(4);

    let (fonts, loads): (Vec<_>, Vec<_>) = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let mut backend = HeadlessBackend::new();
                    barrier.wait();
                    let font = catalog.load_font(FONT_PATH, &mut backend).unwrap();
                    (font, backend.stats().textures_loaded)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).unzip()
    });

    assert_eq!(loads.iter().sum::<usize>(), 1);
    assert!(fonts.iter().all(|font| Arc::ptr_eq(font, &fonts[0])));
    assert_eq!(catalog.len(), 1);
}

#[test]
fn test_calc_width_applies_kerning() {
    let dir = font_dir();
    let catalog = FontCatalog::with_config(TextConfig::new().asset_root(dir.path()));
    let mut backend = HeadlessBackend::new();
    let font = catalog.load_font(FONT_PATH, &mut backend).unwrap();

    assert_eq!(font.glyph('A').advance(), 12);
    assert_eq!(font.glyph('B').advance(), 10);
    assert_eq!(font.calc_width("AB", 20.0), 20.0);
}
