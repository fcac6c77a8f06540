//! Straight and premultiplied color representations.
//!
//! `Color` is the blend-formula currency: straight (non-premultiplied) f32
//! RGBA. `PixelColor` is what raster buffers store: premultiplied RGBA8.

/// Straight (non-premultiplied) RGBA color, f32 channels nominally in [0, 1].
///
/// Channels may leave [0, 1] transiently inside blend math; call [`clamped`]
/// before converting back to a pixel.
///
/// [`clamped`]: Color::clamped
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Each channel clamped to [0, 1].
    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
            a: self.a.clamp(0.0, 1.0),
        }
    }

    /// Convert to a premultiplied 8-bit pixel. Zero alpha maps to the zero
    /// pixel regardless of RGB.
    pub fn premultiply(self) -> PixelColor {
        let c = self.clamped();
        PixelColor {
            r: unit_to_u8(c.r * c.a),
            g: unit_to_u8(c.g * c.a),
            b: unit_to_u8(c.b * c.a),
            a: unit_to_u8(c.a),
        }
    }
}

/// Premultiplied RGBA8 pixel as stored in raster buffers (r, g, b already
/// multiplied by a).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PixelColor {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to straight-alpha color. A zero-alpha pixel demultiplies to
    /// fully transparent black.
    pub fn demultiply(self) -> Color {
        if self.a == 0 {
            return Color::TRANSPARENT;
        }
        let a = u8_to_unit(self.a);
        Color {
            r: u8_to_unit(self.r) / a,
            g: u8_to_unit(self.g) / a,
            b: u8_to_unit(self.b) / a,
            a,
        }
    }

    /// Scale all four (premultiplied) channels by `alpha`.
    pub fn scaled(self, alpha: f32) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        Self {
            r: unit_to_u8(u8_to_unit(self.r) * alpha),
            g: unit_to_u8(u8_to_unit(self.g) * alpha),
            b: unit_to_u8(u8_to_unit(self.b) * alpha),
            a: unit_to_u8(u8_to_unit(self.a) * alpha),
        }
    }
}

pub(crate) fn unit_to_u8(v: f32) -> u8 {
    ((v.clamp(0.0, 1.0) * 255.0) + 0.5) as u8
}

pub(crate) fn u8_to_unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}
