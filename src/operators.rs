//! Native compositing operator algebra on premultiplied pixels.
//!
//! These are the operators the rendering context applies directly, without
//! custom pixel iteration by callers: the Porter-Duff set plus the separable
//! and non-separable (HSL) blend operators used by the mask-simulated
//! strategies.

use crate::color::{PixelColor, u8_to_unit, unit_to_u8};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Clear,
    Source,
    Over,
    In,
    Atop,
    DestOver,
    DestIn,
    DestOut,
    Add,
    Lighten,
    Darken,
    Multiply,
    Screen,
    HardLight,
    HslHue,
    HslSaturation,
    HslLuminosity,
}

/// Apply `op` to one premultiplied source/destination pixel pair.
pub fn composite(op: Operator, src: PixelColor, dst: PixelColor) -> PixelColor {
    let s = to_premul_f32(src);
    let d = to_premul_f32(dst);
    let sa = s[3];
    let da = d[3];

    let out = match op {
        Operator::Clear => [0.0; 4],
        Operator::Source => s,
        Operator::Over => porter_duff(s, d, 1.0, 1.0 - sa),
        Operator::In => porter_duff(s, d, da, 0.0),
        Operator::Atop => porter_duff(s, d, da, 1.0 - sa),
        Operator::DestOver => porter_duff(s, d, 1.0 - da, 1.0),
        Operator::DestIn => porter_duff(s, d, 0.0, sa),
        Operator::DestOut => porter_duff(s, d, 0.0, 1.0 - sa),
        Operator::Add => porter_duff(s, d, 1.0, 1.0),
        Operator::Lighten => blended(s, d, |cs, cd| [cs[0].max(cd[0]), cs[1].max(cd[1]), cs[2].max(cd[2])]),
        Operator::Darken => blended(s, d, |cs, cd| [cs[0].min(cd[0]), cs[1].min(cd[1]), cs[2].min(cd[2])]),
        Operator::Multiply => blended(s, d, |cs, cd| [cs[0] * cd[0], cs[1] * cd[1], cs[2] * cd[2]]),
        Operator::Screen => blended(s, d, |cs, cd| {
            [screen(cs[0], cd[0]), screen(cs[1], cd[1]), screen(cs[2], cd[2])]
        }),
        Operator::HardLight => blended(s, d, |cs, cd| {
            [
                hard_light(cs[0], cd[0]),
                hard_light(cs[1], cd[1]),
                hard_light(cs[2], cd[2]),
            ]
        }),
        Operator::HslHue => blended(s, d, |cs, cd| set_lum(set_sat(cs, sat(cd)), lum(cd))),
        Operator::HslSaturation => blended(s, d, |cs, cd| set_lum(set_sat(cd, sat(cs)), lum(cd))),
        Operator::HslLuminosity => blended(s, d, |cs, cd| set_lum(cd, lum(cs))),
    };
    from_premul_f32(out)
}

fn porter_duff(s: [f32; 4], d: [f32; 4], fs: f32, fd: f32) -> [f32; 4] {
    [
        s[0] * fs + d[0] * fd,
        s[1] * fs + d[1] * fd,
        s[2] * fs + d[2] * fd,
        s[3] * fs + d[3] * fd,
    ]
}

/// Blend-operator compositing: the transfer function `b` runs on straight
/// channels; coverage follows source-over.
fn blended(s: [f32; 4], d: [f32; 4], b: impl Fn([f32; 3], [f32; 3]) -> [f32; 3]) -> [f32; 4] {
    let sa = s[3];
    let da = d[3];
    let cs = straight(s);
    let cd = straight(d);
    let t = b(cs, cd);
    let mut out = [0.0; 4];
    for i in 0..3 {
        out[i] = s[i] * (1.0 - da) + d[i] * (1.0 - sa) + sa * da * t[i];
    }
    out[3] = sa + da - sa * da;
    out
}

fn straight(p: [f32; 4]) -> [f32; 3] {
    if p[3] <= 0.0 {
        [0.0; 3]
    } else {
        [p[0] / p[3], p[1] / p[3], p[2] / p[3]]
    }
}

fn screen(s: f32, d: f32) -> f32 {
    s + d - s * d
}

fn hard_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

pub(crate) fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

pub(crate) fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let dl = l - lum(c);
    clip_color([c[0] + dl, c[1] + dl, c[2] + dl])
}

pub(crate) fn sat(c: [f32; 3]) -> f32 {
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);
    max - min
}

pub(crate) fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|&i, &j| c[i].partial_cmp(&c[j]).unwrap_or(std::cmp::Ordering::Equal));
    let [lo, mid, hi] = idx;
    let mut out = [0.0; 3];
    if c[hi] > c[lo] {
        out[mid] = (c[mid] - c[lo]) * s / (c[hi] - c[lo]);
        out[hi] = s;
    }
    out
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 && l - n > f32::EPSILON {
        for v in &mut out {
            *v = l + (*v - l) * l / (l - n);
        }
    }
    if x > 1.0 && x - l > f32::EPSILON {
        for v in &mut out {
            *v = l + (*v - l) * (1.0 - l) / (x - l);
        }
    }
    out
}

fn to_premul_f32(p: PixelColor) -> [f32; 4] {
    [
        u8_to_unit(p.r),
        u8_to_unit(p.g),
        u8_to_unit(p.b),
        u8_to_unit(p.a),
    ]
}

fn from_premul_f32(p: [f32; 4]) -> PixelColor {
    let a = p[3].clamp(0.0, 1.0);
    // Premultiplied channels can never exceed coverage.
    PixelColor::new(
        unit_to_u8(p[0].min(a)),
        unit_to_u8(p[1].min(a)),
        unit_to_u8(p[2].min(a)),
        unit_to_u8(a),
    )
}
