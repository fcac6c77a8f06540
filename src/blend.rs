//! Blend methods and the canonical blend-formula library.
//!
//! [`blend`] is the straight-alpha formula set: both pixels are demultiplied
//! before the call and the result is clamped and re-premultiplied by the
//! caller. [`blend_premultiplied`] is the narrower path for methods whose
//! formulas tolerate raw premultiplied channels (Divide, Overlay); it skips
//! the conversion entirely.

use crate::color::{Color, PixelColor, u8_to_unit, unit_to_u8};
use crate::operators::{lum, set_lum};

/// Compositing mode for a layer paint. Closed set; each variant maps to
/// exactly one compositing strategy in the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMethod {
    Composite,
    Straight,
    Brighten,
    Darken,
    Multiply,
    Hue,
    Saturation,
    Luminance,
    Behind,
    Onto,
    Screen,
    HardLight,
    AlphaOver,
    StraightOnto,
    Overlay,
    Divide,
    Add,
    Subtract,
    Difference,
    Color,
    AlphaBrighten,
    AlphaDarken,
}

impl BlendMethod {
    /// All variants, in declaration order.
    pub const ALL: [Self; 22] = [
        Self::Composite,
        Self::Straight,
        Self::Brighten,
        Self::Darken,
        Self::Multiply,
        Self::Hue,
        Self::Saturation,
        Self::Luminance,
        Self::Behind,
        Self::Onto,
        Self::Screen,
        Self::HardLight,
        Self::AlphaOver,
        Self::StraightOnto,
        Self::Overlay,
        Self::Divide,
        Self::Add,
        Self::Subtract,
        Self::Difference,
        Self::Color,
        Self::AlphaBrighten,
        Self::AlphaDarken,
    ];
}

/// Canonical blend of `src` over `dst` on straight-alpha colors.
///
/// `amount` is the global paint opacity; formulas that only touch RGB scale
/// their mix by `amount * src.a` and keep the destination alpha. The result
/// is not clamped; callers convert with `.clamped().premultiply()`.
pub fn blend(src: Color, dst: Color, amount: f32, method: BlendMethod) -> Color {
    let amount = amount.clamp(0.0, 1.0);
    let m = amount * src.a;
    match method {
        BlendMethod::Add => Color::new(
            dst.r + src.r * m,
            dst.g + src.g * m,
            dst.b + src.b * m,
            dst.a,
        ),
        BlendMethod::Subtract => Color::new(
            dst.r - src.r * m,
            dst.g - src.g * m,
            dst.b - src.b * m,
            dst.a,
        ),
        BlendMethod::Difference => Color::new(
            lerp(dst.r, (dst.r - src.r).abs(), m),
            lerp(dst.g, (dst.g - src.g).abs(), m),
            lerp(dst.b, (dst.b - src.b).abs(), m),
            dst.a,
        ),
        BlendMethod::Divide => Color::new(
            lerp(dst.r, divide(dst.r, src.r), m),
            lerp(dst.g, divide(dst.g, src.g), m),
            lerp(dst.b, divide(dst.b, src.b), m),
            dst.a,
        ),
        BlendMethod::Color => {
            // Chroma of the source, luminance of the destination.
            let t = set_lum([src.r, src.g, src.b], lum([dst.r, dst.g, dst.b]));
            Color::new(
                lerp(dst.r, t[0], m),
                lerp(dst.g, t[1], m),
                lerp(dst.b, t[2], m),
                dst.a,
            )
        }
        BlendMethod::Overlay => Color::new(
            lerp(dst.r, overlay_transfer(src.r, dst.r), m),
            lerp(dst.g, overlay_transfer(src.g, dst.g), m),
            lerp(dst.b, overlay_transfer(src.b, dst.b), m),
            dst.a,
        ),
        BlendMethod::AlphaBrighten => {
            let ea = src.a * amount;
            if ea > dst.a {
                Color::new(src.r, src.g, src.b, ea)
            } else {
                dst
            }
        }
        BlendMethod::AlphaDarken => {
            let ea = src.a * amount;
            if ea < dst.a {
                Color::new(src.r, src.g, src.b, ea)
            } else {
                dst
            }
        }
        // Native-operator and mask-simulated methods resolve through the
        // compositing operators, never through this table; source-over is
        // the formula they all share at alpha = 1.
        _ => {
            let sa = src.a * amount;
            let a = sa + dst.a * (1.0 - sa);
            if a <= 0.0 {
                return Color::TRANSPARENT;
            }
            Color::new(
                (src.r * sa + dst.r * dst.a * (1.0 - sa)) / a,
                (src.g * sa + dst.g * dst.a * (1.0 - sa)) / a,
                (src.b * sa + dst.b * dst.a * (1.0 - sa)) / a,
                a,
            )
        }
    }
}

/// Blend directly on premultiplied pixels, without the demultiply / clamp /
/// re-premultiply round trip.
///
/// Only Divide and Overlay are defined to tolerate premultiplied input.
/// Divide writes a destination-shaped result (alpha kept from `dst`);
/// Overlay writes a source-shaped result (alpha kept from `src`, RGB pulled
/// toward the overlay transfer by `amount * dst.a`, so a fully transparent
/// destination leaves the source untouched). Any other method falls back to
/// the straight-alpha path.
pub fn blend_premultiplied(
    src: PixelColor,
    dst: PixelColor,
    amount: f32,
    method: BlendMethod,
) -> PixelColor {
    let amount = amount.clamp(0.0, 1.0);
    match method {
        BlendMethod::Divide => {
            let m = amount * u8_to_unit(src.a);
            let ch = |d: u8, s: u8| {
                let d = u8_to_unit(d);
                let s = u8_to_unit(s);
                unit_to_u8(lerp(d, divide(d, s), m))
            };
            PixelColor::new(ch(dst.r, src.r), ch(dst.g, src.g), ch(dst.b, src.b), dst.a)
        }
        BlendMethod::Overlay => {
            let m = amount * u8_to_unit(dst.a);
            let ch = |s: u8, d: u8| {
                let s = u8_to_unit(s);
                let d = u8_to_unit(d);
                unit_to_u8(lerp(s, overlay_transfer(s, d), m))
            };
            PixelColor::new(ch(src.r, dst.r), ch(src.g, dst.g), ch(src.b, dst.b), src.a)
        }
        _ => blend(src.demultiply(), dst.demultiply(), amount, method)
            .clamped()
            .premultiply(),
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn overlay_transfer(s: f32, d: f32) -> f32 {
    if d <= 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

fn divide(d: f32, s: f32) -> f32 {
    const EPS: f32 = 1.0 / 512.0;
    d / s.max(EPS)
}
