//! Parser for AngelCode BMFont text descriptors (`.fnt`).
//!
//! The document starts with three header lines (`info`, `common`, `page`)
//! followed by one line per glyph (`char ...`) and one per kerning pair
//! (`kerning ...`). Any other line is ignored.
//!
//! Lines are split on `=` and on runs of whitespace outside double quotes, so
//! `face="Open Sans" size=16` becomes `face`, `"Open Sans"`, `size`, `16`.
//! Fields are then read by fixed position.

use std::str::FromStr;

use tracing::{debug, error};

use crate::error::{FontError, FontResult};
use crate::logging::targets;

/// Number of fields the joined header lines must tokenize to.
pub const METADATA_LENGTH: usize = 51;
/// Number of fields a `char` line must tokenize to.
pub const CHARDATA_LENGTH: usize = 21;
/// Number of fields a `kerning` line must tokenize to.
pub const KERNDATA_LENGTH: usize = 7;

const HEADER_LINES: usize = 3;

// Header field positions.
const NAME_FIELD: usize = 2;
const BASE_HEIGHT_FIELD: usize = 27;
const IMAGE_FIELD: usize = 50;

/// Font-wide metadata taken from the header lines.
#[derive(Debug, Clone, PartialEq)]
pub struct FontHeader {
    /// Font face name with quotes removed.
    pub name: String,
    /// Reference pixel height that render sizes are scaled against.
    pub base_height: f32,
    /// Atlas image file name, relative to the descriptor's directory.
    pub image_file: String,
}

/// One `char` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphRecord {
    pub id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub x_offset: i32,
    pub y_offset: i32,
    /// Horizontal advance, already including the +1 pixel correction.
    pub advance: i32,
}

/// One `kerning` line: `amount` applies when `first` is followed by `second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KerningRecord {
    pub first: u32,
    pub second: u32,
    pub amount: i32,
}

/// A fully parsed font descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDefinition {
    pub header: FontHeader,
    pub glyphs: Vec<GlyphRecord>,
    pub kernings: Vec<KerningRecord>,
}

impl FontDefinition {
    /// Parse a descriptor document.
    ///
    /// Any structural mismatch aborts the whole parse; there is no partial result.
    pub fn parse(source: &str) -> FontResult<Self> {
        let mut lines = source.lines();

        let header_line = lines
            .by_ref()
            .take(HEADER_LINES)
            .collect::<Vec<_>>()
            .join(" ");
        let header = parse_header(&header_line)?;

        let mut glyphs = Vec::new();
        let mut kernings = Vec::new();
        for line in lines {
            if line.starts_with("char ") {
                glyphs.push(parse_char(line)?);
            } else if line.starts_with("kerning ") {
                kernings.push(parse_kerning(line)?);
            }
        }

        debug!(
            target: targets::PARSER,
            name = %header.name,
            glyphs = glyphs.len(),
            kernings = kernings.len(),
            "parsed font descriptor"
        );

        Ok(Self {
            header,
            glyphs,
            kernings,
        })
    }
}

/// Split a descriptor line into fields.
///
/// Separators are a single `=` or a run of whitespace that is not inside a
/// double-quoted value. Empty fields between separators are kept, trailing
/// empty fields are dropped.
pub fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut chars = line.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == '=' {
            tokens.push(&line[start..idx]);
            start = idx + 1;
        } else if ch.is_whitespace() && !in_quotes {
            tokens.push(&line[start..idx]);
            let mut end = idx + ch.len_utf8();
            while let Some(&(next_idx, next)) = chars.peek() {
                if !next.is_whitespace() {
                    break;
                }
                end = next_idx + next.len_utf8();
                chars.next();
            }
            start = end;
        }
    }
    tokens.push(&line[start..]);

    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens
}

fn parse_header(line: &str) -> FontResult<FontHeader> {
    let fields = tokenize(line);
    if fields.len() != METADATA_LENGTH {
        error!(
            target: targets::PARSER,
            expected = METADATA_LENGTH,
            actual = fields.len(),
            input = line,
            "metadata length mismatch"
        );
        return Err(FontError::MetadataLengthMismatch {
            expected: METADATA_LENGTH,
            actual: fields.len(),
            line: line.to_string(),
        });
    }

    Ok(FontHeader {
        name: fields[NAME_FIELD].replace('"', ""),
        base_height: number(&fields, BASE_HEIGHT_FIELD, "base height", line)?,
        image_file: fields[IMAGE_FIELD].replace('"', ""),
    })
}

fn parse_char(line: &str) -> FontResult<GlyphRecord> {
    let fields = tokenize(line);
    if fields.len() != CHARDATA_LENGTH {
        error!(
            target: targets::PARSER,
            expected = CHARDATA_LENGTH,
            actual = fields.len(),
            input = line,
            "character data length mismatch"
        );
        return Err(FontError::CharDataLengthMismatch {
            expected: CHARDATA_LENGTH,
            actual: fields.len(),
            line: line.to_string(),
        });
    }

    let advance: i32 = number(&fields, 16, "xadvance", line)?;
    Ok(GlyphRecord {
        id: number(&fields, 2, "char id", line)?,
        x: number(&fields, 4, "x", line)?,
        y: number(&fields, 6, "y", line)?,
        width: number(&fields, 8, "width", line)?,
        height: number(&fields, 10, "height", line)?,
        x_offset: number(&fields, 12, "xoffset", line)?,
        y_offset: number(&fields, 14, "yoffset", line)?,
        advance: advance + 1,
    })
}

fn parse_kerning(line: &str) -> FontResult<KerningRecord> {
    let fields = tokenize(line);
    if fields.len() != KERNDATA_LENGTH {
        error!(
            target: targets::PARSER,
            expected = KERNDATA_LENGTH,
            actual = fields.len(),
            input = line,
            "kerning data length mismatch"
        );
        return Err(FontError::KernDataLengthMismatch {
            expected: KERNDATA_LENGTH,
            actual: fields.len(),
            line: line.to_string(),
        });
    }

    Ok(KerningRecord {
        first: number(&fields, 2, "kerning first", line)?,
        second: number(&fields, 4, "kerning second", line)?,
        amount: number(&fields, 6, "kerning amount", line)?,
    })
}

fn number<T: FromStr>(fields: &[&str], index: usize, field: &'static str, line: &str) -> FontResult<T> {
    let value = fields[index];
    value.parse().map_err(|_| FontError::NumericParse {
        field,
        value: value.to_string(),
        line: line.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const INFO: &str = r#"info face="Test Sans" size=20 bold=0 italic=0 charset="" unicode=1 stretchH=100 smooth=1 aa=1 padding=0,0,0,0 spacing=1,1 outline=0"#;
    pub(crate) const COMMON: &str = "common lineHeight=20 base=16 scaleW=256 scaleH=128 pages=1 packed=0 alphaChnl=0 redChnl=4 greenChnl=4 blueChnl=4";
    pub(crate) const PAGE: &str = r#"page id=0 file="test sans_0.png""#;

    fn char_line(id: u32, advance: i32) -> String {
        format!(
            "char id={id}   x=0     y=0     width=8     height=12    xoffset=1     yoffset=2     xadvance={advance}     page=0  chnl=15"
        )
    }

    fn document(body: &[String]) -> String {
        let mut doc = format!("{INFO}\n{COMMON}\n{PAGE}\nchars count={}\n", body.len());
        for line in body {
            doc.push_str(line);
            doc.push('\n');
        }
        doc
    }

    #[test]
    fn tokenize_splits_on_equals_and_whitespace() {
        let fields = tokenize("kerning first=65  second=66 amount=-2");
        assert_eq!(
            fields,
            vec!["kerning", "first", "65", "second", "66", "amount", "-2"]
        );
    }

    #[test]
    fn tokenize_keeps_quoted_spaces() {
        let fields = tokenize(r#"info face="Open Sans Bold" size=16"#);
        assert_eq!(fields, vec!["info", "face", "\"Open Sans Bold\"", "size", "16"]);
    }

    #[test]
    fn tokenize_drops_trailing_empty_fields() {
        assert_eq!(tokenize("page id=0   "), vec!["page", "id", "0"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn header_has_expected_length() {
        let header = format!("{INFO} {COMMON} {PAGE}");
        assert_eq!(tokenize(&header).len(), METADATA_LENGTH);
    }

    #[test]
    fn parses_header_fields() {
        let definition = FontDefinition::parse(&document(&[])).unwrap();
        assert_eq!(definition.header.name, "Test Sans");
        assert_eq!(definition.header.base_height, 20.0);
        assert_eq!(definition.header.image_file, "test sans_0.png");
    }

    #[test]
    fn parses_chars_with_advance_correction() {
        let definition = FontDefinition::parse(&document(&[char_line(65, 11)])).unwrap();
        assert_eq!(
            definition.glyphs,
            vec![GlyphRecord {
                id: 65,
                x: 0,
                y: 0,
                width: 8,
                height: 12,
                x_offset: 1,
                y_offset: 2,
                advance: 12,
            }]
        );
    }

    #[test]
    fn parses_kerning_pairs() {
        let definition = FontDefinition::parse(&document(&[
            char_line(65, 11),
            "kernings count=1".to_string(),
            "kerning first=65  second=86  amount=-2".to_string(),
        ]))
        .unwrap();
        assert_eq!(
            definition.kernings,
            vec![KerningRecord {
                first: 65,
                second: 86,
                amount: -2,
            }]
        );
    }

    #[test]
    fn ignores_unknown_lines() {
        let definition = FontDefinition::parse(&document(&[
            "chars count=1".to_string(),
            "something else entirely".to_string(),
            char_line(32, 4),
        ]))
        .unwrap();
        assert_eq!(definition.glyphs.len(), 1);
    }

    #[test]
    fn short_header_is_metadata_mismatch() {
        let err = FontDefinition::parse("info face=\"x\"\ncommon lineHeight=20").unwrap_err();
        assert!(matches!(
            err,
            FontError::MetadataLengthMismatch { expected: 51, .. }
        ));
    }

    #[test]
    fn short_char_line_is_char_mismatch() {
        let err = FontDefinition::parse(&document(&["char id=65 x=0".to_string()])).unwrap_err();
        match err {
            FontError::CharDataLengthMismatch {
                expected,
                actual,
                line,
            } => {
                assert_eq!(expected, CHARDATA_LENGTH);
                assert_eq!(actual, 5);
                assert_eq!(line, "char id=65 x=0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn long_kerning_line_is_kern_mismatch() {
        let err = FontDefinition::parse(&document(&[
            "kerning first=65 second=66 amount=-1 extra=1".to_string(),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            FontError::KernDataLengthMismatch {
                expected: 7,
                actual: 9,
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_field_is_parse_error() {
        let line = char_line(65, 11).replace("width=8", "width=wide");
        let err = FontDefinition::parse(&document(&[line])).unwrap_err();
        assert!(matches!(
            err,
            FontError::NumericParse { field: "width", .. }
        ));
    }
}
