//! Measurement and word wrapping.
//!
//! All widths are in target pixels at the requested font size. Glyph metrics
//! are scaled by `font_size / base_height`, kerning is applied between
//! consecutive glyphs, and a tab moves the pen to the next multiple of the
//! tab stop without carrying kerning across it.

use std::ops::Range;

use super::{Font, Glyph};

/// Pen position along a single line of text.
pub(crate) struct Pen<'a> {
    font: &'a Font,
    scale: f32,
    tab_stop: f32,
    x: f32,
    previous: Option<&'a Glyph>,
}

impl<'a> Pen<'a> {
    pub(crate) fn new(font: &'a Font, font_size: f32) -> Self {
        Self {
            font,
            scale: font_size / font.base_height,
            tab_stop: font.tab_stop(font_size),
            x: 0.0,
            previous: None,
        }
    }

    /// Current horizontal offset.
    pub(crate) fn x(&self) -> f32 {
        self.x
    }

    pub(crate) fn scale(&self) -> f32 {
        self.scale
    }

    /// Return to the start of a line and forget the kerning context.
    pub(crate) fn new_line(&mut self) {
        self.x = 0.0;
        self.previous = None;
    }

    /// Move past `c`.
    ///
    /// Returns the glyph and the pen offset it should be drawn at, or `None`
    /// for a tab, which draws nothing.
    pub(crate) fn advance(&mut self, c: char) -> Option<(&'a Glyph, f32)> {
        if c == '\t' {
            if self.tab_stop > 0.0 {
                self.x += self.tab_stop - self.x % self.tab_stop;
            }
            self.previous = None;
            return None;
        }

        let glyph = self.font.glyph(c);
        self.x += glyph.kerning(self.previous) as f32 * self.scale;
        let origin = self.x;
        self.x += glyph.advance() as f32 * self.scale;
        self.previous = Some(glyph);
        Some((glyph, origin))
    }
}

/// One output line of a wrap, as a byte range of the wrapped text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineSpan {
    pub range: Range<usize>,
    /// A `-` follows the range because a word was split.
    pub hyphenated: bool,
}

impl LineSpan {
    fn new(range: Range<usize>, hyphenated: bool) -> Self {
        Self { range, hyphenated }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.range.is_empty() && !self.hyphenated
    }
}

impl Font {
    /// Width of `line` drawn at `font_size`.
    pub fn calc_width(&self, line: &str, font_size: f32) -> f32 {
        let mut pen = Pen::new(self, font_size);
        for c in line.chars() {
            pen.advance(c);
        }
        pen.x()
    }

    /// Longest prefix of `line` that fits within `max_width` at `font_size`.
    ///
    /// May end in the middle of a word. Returns an empty string for blank
    /// input or a non-positive width.
    pub fn build_until_limit<'s>(&self, line: &'s str, font_size: f32, max_width: f32) -> &'s str {
        if max_width <= 0.0 || line.trim().is_empty() {
            return "";
        }

        let mut pen = Pen::new(self, font_size);
        for (index, c) in line.char_indices() {
            pen.advance(c);
            if pen.x() > max_width {
                return &line[..index];
            }
        }
        line
    }

    /// Wrap `text` to `max_width` with no height limit.
    pub fn wrap_to_width(&self, text: &str, font_size: f32, max_width: f32) -> String {
        self.wrap_string(text, font_size, max_width, f32::MAX, 0)
    }

    /// Wrap `text` into lines no wider than `max_width`, each prefixed with
    /// `indent` spaces.
    ///
    /// Lines break at the last space that fits. A word too long for a whole
    /// line is split with a trailing `-`. Existing line breaks are kept,
    /// blank lines included, and `\r\n` counts as a single break. At most `max_height / font_size` lines are
    /// produced; the rest is dropped.
    pub fn wrap_string(
        &self,
        text: &str,
        font_size: f32,
        max_width: f32,
        max_height: f32,
        indent: usize,
    ) -> String {
        let prefix = " ".repeat(indent);
        let available = max_width - self.calc_width(&prefix, font_size);
        let spans = self.wrap_spans(text, font_size, available, max_height);

        let mut wrapped = String::with_capacity(text.len() + spans.len() * (indent + 2));
        for (index, span) in spans.iter().enumerate() {
            if index > 0 {
                wrapped.push('\n');
            }
            if span.is_empty() {
                continue;
            }
            wrapped.push_str(&prefix);
            wrapped.push_str(&text[span.range.clone()]);
            if span.hyphenated {
                wrapped.push('-');
            }
        }
        wrapped
    }

    /// Compute wrapped lines as ranges of `text`.
    pub(crate) fn wrap_spans(
        &self,
        text: &str,
        font_size: f32,
        max_width: f32,
        max_height: f32,
    ) -> Vec<LineSpan> {
        let mut lines = Vec::new();
        if font_size <= 0.0 || max_width <= 0.0 {
            return lines;
        }
        // Saturates for unbounded heights.
        let max_lines = (max_height / font_size).floor() as usize;

        let mut line_start = 0;
        for raw in text.split('\n') {
            let raw_start = line_start;
            line_start += raw.len() + 1;
            // A CR before the LF belongs to the line break.
            let raw = raw.strip_suffix('\r').unwrap_or(raw);

            if lines.len() >= max_lines {
                break;
            }
            if raw.trim().is_empty() {
                lines.push(LineSpan::new(raw_start..raw_start, false));
                continue;
            }

            let mut offset = raw_start;
            let mut remaining = raw;
            while !remaining.trim().is_empty() && lines.len() < max_lines {
                let fit = self.build_until_limit(remaining, font_size, max_width);
                if fit.len() == remaining.len() {
                    lines.push(LineSpan::new(offset..offset + remaining.len(), false));
                    break;
                }

                if let Some(space) = fit.rfind(' ') {
                    lines.push(LineSpan::new(offset..offset + space, false));
                    offset += space + 1;
                    remaining = &remaining[space + 1..];
                    continue;
                }

                // No space to break at; split the word and leave room for a hyphen.
                let hyphenated = format!("-{remaining}");
                let taken = self
                    .build_until_limit(&hyphenated, font_size, max_width)
                    .chars()
                    .count()
                    .saturating_sub(1)
                    .max(1);
                let split = remaining
                    .char_indices()
                    .nth(taken)
                    .map_or(remaining.len(), |(index, _)| index);

                if split >= remaining.len() {
                    lines.push(LineSpan::new(offset..offset + remaining.len(), false));
                    break;
                }
                lines.push(LineSpan::new(offset..offset + split, true));
                offset += split;
                remaining = &remaining[split..];
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TextConfig;
    use crate::font::tests::{font_from, test_descriptor, test_font};

    #[test]
    fn calc_width_applies_kerning() {
        let font = test_font();
        assert_eq!(font.calc_width("AB", 20.0), 20.0);
        assert_eq!(font.calc_width("BA", 20.0), 22.0);
        assert_eq!(font.calc_width("", 20.0), 0.0);
    }

    #[test]
    fn calc_width_scales_with_font_size() {
        let font = test_font();
        assert_eq!(font.calc_width("AB", 10.0), 10.0);
        assert_eq!(font.calc_width("ab c", 40.0), 70.0);
    }

    #[test]
    fn calc_width_is_pure() {
        let font = test_font();
        let first = font.calc_width("hello world", 20.0);
        font.calc_width("AB\tAB", 13.0);
        assert_eq!(font.calc_width("hello world", 20.0), first);
    }

    #[test]
    fn tab_advances_to_next_stop_and_breaks_kerning() {
        let font = test_font();
        // Tab stop is 40px at size 20.
        assert_eq!(font.calc_width("\t", 20.0), 40.0);
        assert_eq!(font.calc_width("ab\t", 20.0), 40.0);
        assert_eq!(font.calc_width("abcd\t", 20.0), 80.0);
        // A, tab to 40, then B without kerning against A.
        assert_eq!(font.calc_width("A\tB", 20.0), 50.0);
    }

    #[test]
    fn tab_width_is_configurable() {
        let font = font_from(&test_descriptor(), &TextConfig::new().tab_width(1.0));
        assert_eq!(font.calc_width("a\t", 20.0), 20.0);
    }

    #[test]
    fn build_until_limit_returns_longest_fitting_prefix() {
        let font = test_font();
        assert_eq!(font.build_until_limit("abcdef", 20.0, 35.0), "abc");
        assert_eq!(font.build_until_limit("abcdef", 20.0, 30.0), "abc");
        assert_eq!(font.build_until_limit("abc", 20.0, 100.0), "abc");
        assert_eq!(font.build_until_limit("abc", 20.0, 5.0), "");
    }

    #[test]
    fn build_until_limit_rejects_blank_and_non_positive() {
        let font = test_font();
        assert_eq!(font.build_until_limit("   ", 20.0, 100.0), "");
        assert_eq!(font.build_until_limit("abc", 20.0, 0.0), "");
        assert_eq!(font.build_until_limit("abc", 20.0, -1.0), "");
    }

    #[test]
    fn wraps_at_last_space() {
        let font = test_font();
        assert_eq!(
            font.wrap_to_width("one two three", 20.0, 75.0),
            "one two\nthree"
        );
    }

    #[test]
    fn hyphenates_unbreakable_words() {
        let font = test_font();
        let wrapped = font.wrap_to_width("a verylongunbreakableword here", 20.0, 60.0);
        assert_eq!(wrapped, "a\nveryl-\nongun-\nbreak-\nablew-\nord\nhere");

        for line in wrapped.lines() {
            let measured = line.strip_suffix('-').unwrap_or(line);
            assert!(font.calc_width(measured, 20.0) <= 60.0, "{line:?} too wide");
        }
    }

    #[test]
    fn hyphenation_always_makes_progress() {
        let font = test_font();
        // Narrower than any single glyph: one character per line.
        assert_eq!(font.wrap_to_width("abc", 20.0, 8.0), "a-\nb-\nc");
    }

    #[test]
    fn preserves_blank_lines() {
        let font = test_font();
        let wrapped = font.wrap_to_width("first\n\nsecond\n   \nthird", 20.0, 200.0);
        assert_eq!(wrapped, "first\n\nsecond\n\nthird");
        assert_eq!(wrapped.split('\n').filter(|l| l.is_empty()).count(), 2);
    }

    #[test]
    fn crlf_breaks_like_lf() {
        let font = test_font();
        assert_eq!(font.wrap_to_width("ab\r\ncd", 20.0, 200.0), "ab\ncd");
        assert_eq!(font.wrap_to_width("ab\r\n\r\ncd", 20.0, 200.0), "ab\n\ncd");
        // Wrapping measures the line without the CR.
        assert_eq!(font.wrap_to_width("abcd\r\ne", 20.0, 40.0), "abcd\ne");
    }

    #[test]
    fn trailing_newline_yields_trailing_blank_line() {
        let font = test_font();
        assert_eq!(font.wrap_to_width("abc\n", 20.0, 200.0), "abc\n");
    }

    #[test]
    fn rewrapping_is_idempotent() {
        let font = test_font();
        let text = "the quick brown fox jumps over the lazy dog\n\nsupercalifragilistic";
        let once = font.wrap_to_width(text, 20.0, 90.0);
        let twice = font.wrap_to_width(&once, 20.0, 90.0);
        assert_eq!(once, twice);
    }

    #[test]
    fn line_budget_drops_excess_lines() {
        let font = test_font();
        let wrapped = font.wrap_string("one two three four", 20.0, 45.0, 45.0, 0);
        assert_eq!(wrapped, "one\ntwo");

        let blank_first = font.wrap_string("\n\nabc", 20.0, 200.0, 40.0, 0);
        assert_eq!(blank_first, "\n");
    }

    #[test]
    fn indent_prefixes_every_line() {
        let font = test_font();
        // Two spaces of indent cost 10px, leaving 65px.
        let wrapped = font.wrap_string("one two three", 20.0, 75.0, f32::MAX, 2);
        assert_eq!(wrapped, "  one\n  two\n  three");
    }

    #[test]
    fn indent_wider_than_area_yields_nothing() {
        let font = test_font();
        assert_eq!(font.wrap_string("abc", 20.0, 10.0, f32::MAX, 2), "");
    }

    #[test]
    fn zero_font_size_yields_nothing() {
        let font = test_font();
        assert_eq!(font.wrap_string("abc", 0.0, 100.0, 100.0, 0), "");
    }
}
