//! Geometry and color values used by layout and drawing.
//!
//! Coordinates are in target pixels with the origin at the top left and y
//! growing downward.

/// A position in target pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for glam::Vec2 {
    fn from(point: Point) -> Self {
        glam::Vec2::new(point.x, point.y)
    }
}

/// Measured extent of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle: glyph quads and debug bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn left(&self) -> f32 {
        self.origin.x
    }

    pub fn top(&self) -> f32 {
        self.origin.y
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }
}

/// Text color with premultiplied alpha, each channel in 0.0..=1.0.
///
/// Premultiplied values pair with the default
/// [`BlendFactors`](crate::BlendFactors) of `One` / `OneMinusSrcAlpha`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::opaque(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::opaque(1.0, 1.0, 1.0);
    pub const RED: Self = Self::opaque(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::opaque(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::opaque(0.0, 0.0, 1.0);
    pub const YELLOW: Self = Self::opaque(1.0, 1.0, 0.0);
    pub const ORANGE: Self = Self::opaque(1.0, 0.78, 0.0);

    /// From already-premultiplied channels.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// From straight (non-premultiplied) channels.
    pub fn straight(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::new(r * a, g * a, b * a, a)
    }

    /// From straight 8-bit channels, as found in `0xRRGGBBAA`-style color tables.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        let unit = |v: u8| f32::from(v) / 255.0;
        Self::straight(unit(r), unit(g), unit(b), unit(a))
    }

    /// Same color at a different opacity.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        if self.a <= 0.0 {
            return Self::TRANSPARENT;
        }
        let k = alpha / self.a;
        Self::new(self.r * k, self.g * k, self.b * k, alpha)
    }

    /// Channels as stored in vertex data.
    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
