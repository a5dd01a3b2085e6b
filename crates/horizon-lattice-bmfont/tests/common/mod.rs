//! Shared fixtures: a small bitmap font written to a temporary asset root.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::Path;

use tempfile::TempDir;

pub const FONT_PATH: &str = "fonts/test.fnt";

const INFO: &str = r#"info face="Test Sans" size=20 bold=0 italic=0 charset="" unicode=1 stretchH=100 smooth=1 aa=1 padding=0,0,0,0 spacing=1,1 outline=0"#;
const COMMON: &str = "common lineHeight=20 base=16 scaleW=256 scaleH=128 pages=1 packed=0 alphaChnl=0 redChnl=4 greenChnl=4 blueChnl=4";
const PAGE: &str = r#"page id=0 file="test sans_0.png""#;

/// Descriptor for a 20px font: printable ASCII advances 10px, except space
/// (5px), `-` (6px) and `A` (12px). `B` after `A` kerns by -2.
pub fn descriptor() -> String {
    let mut doc = format!("{INFO}\n{COMMON}\n{PAGE}\nchars count=95\n");
    for id in 32..=126u32 {
        let xadvance = match char::from_u32(id) {
            Some(' ') => 4,
            Some('-') => 5,
            Some('A') => 11,
            _ => 9,
        };
        writeln!(
            doc,
            "char id={id:<4} x={:<5} y={:<5} width=8     height=16    xoffset=1     yoffset=2     xadvance={xadvance:<4} page=0  chnl=15",
            (id % 16) * 16,
            (id / 16) * 8,
        )
        .unwrap();
    }
    doc.push_str("kernings count=1\n");
    doc.push_str("kerning first=65  second=66  amount=-2\n");
    doc
}

/// Write the test font and its 256x128 atlas under a fresh temporary root.
pub fn font_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_font(dir.path(), &descriptor());
    dir
}

pub fn write_font(root: &Path, descriptor: &str) {
    let fonts = root.join("fonts");
    std::fs::create_dir_all(&fonts).unwrap();
    std::fs::write(fonts.join("test.fnt"), descriptor).unwrap();
    image::RgbaImage::new(256, 128)
        .save(fonts.join("test sans_0.png"))
        .unwrap();
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
