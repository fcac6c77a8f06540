//! Blend-method dispatch: paint the current source contribution onto the
//! target, blended by method and scaled by a global alpha.
//!
//! Every [`BlendMethod`] maps to exactly one [`Strategy`]; the mapping lives
//! in [`strategy_for`] and nowhere else. [`paint_with_alpha`] consumes the
//! context: the handle is retired whether the paint succeeds or fails.

use crate::blend::{BlendMethod, blend, blend_premultiplied};
use crate::color::{Color, PixelColor};
use crate::context::{Pattern, RenderContext};
use crate::error::{RastermixError, RastermixResult};
use crate::operators::Operator;
use crate::surface::Surface;

/// The compositing strategy a blend method resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Single native-operator paint.
    Native(Operator),
    /// Two-pass straight-alpha decomposition (no single operator expresses
    /// true straight compositing).
    Straight,
    /// Snapshot the target scaled by alpha and re-apply it as a mask with
    /// the given blend operator.
    Masked(Operator),
    /// Capture the contribution, then overwrite destination pixels with the
    /// per-pixel blend result.
    DestinationLoop(PixelMath),
    /// Capture the contribution, write the blend result into the *source*
    /// buffer, then re-composite the mutated source over the whole target.
    SourceLoop,
    /// Keep the in-target intersection of the contribution, restore the
    /// original target, then run the Straight pass on the kept layer.
    StraightOnto,
}

/// Which color space the per-pixel blend runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelMath {
    /// Demultiply both pixels, blend, clamp, re-premultiply.
    Demultiplied,
    /// Call the blend formula on raw premultiplied channels (Divide only).
    Premultiplied,
}

/// The one place the method-to-strategy mapping is defined.
pub fn strategy_for(method: BlendMethod) -> Strategy {
    match method {
        BlendMethod::Composite => Strategy::Native(Operator::Over),
        BlendMethod::Behind => Strategy::Native(Operator::DestOver),
        BlendMethod::Onto => Strategy::Native(Operator::Atop),
        BlendMethod::AlphaOver => Strategy::Native(Operator::DestOut),
        BlendMethod::Straight => Strategy::Straight,
        BlendMethod::Brighten => Strategy::Masked(Operator::Lighten),
        BlendMethod::Darken => Strategy::Masked(Operator::Darken),
        BlendMethod::Multiply => Strategy::Masked(Operator::Multiply),
        BlendMethod::Hue => Strategy::Masked(Operator::HslHue),
        BlendMethod::Saturation => Strategy::Masked(Operator::HslSaturation),
        BlendMethod::Luminance => Strategy::Masked(Operator::HslLuminosity),
        BlendMethod::Screen => Strategy::Masked(Operator::Screen),
        BlendMethod::HardLight => Strategy::Masked(Operator::HardLight),
        BlendMethod::StraightOnto => Strategy::StraightOnto,
        BlendMethod::Overlay => Strategy::SourceLoop,
        BlendMethod::Divide => Strategy::DestinationLoop(PixelMath::Premultiplied),
        BlendMethod::Add
        | BlendMethod::Subtract
        | BlendMethod::Difference
        | BlendMethod::Color
        | BlendMethod::AlphaBrighten
        | BlendMethod::AlphaDarken => Strategy::DestinationLoop(PixelMath::Demultiplied),
    }
}

/// Composite the context's current source contribution onto its target,
/// blended by `method` and scaled by `alpha`.
///
/// Consumes the context. On error the target keeps whatever the completed
/// steps wrote; there is no rollback.
#[tracing::instrument(level = "debug", skip(ctx))]
pub fn paint_with_alpha(
    mut ctx: RenderContext<'_>,
    alpha: f32,
    method: BlendMethod,
) -> RastermixResult<()> {
    let alpha = alpha.clamp(0.0, 1.0);
    match strategy_for(method) {
        Strategy::Native(op) => {
            ctx.set_operator(op);
            ctx.paint(alpha)
        }
        Strategy::Straight => paint_straight(&mut ctx, alpha),
        Strategy::Masked(op) => paint_masked(&mut ctx, op, alpha),
        Strategy::DestinationLoop(math) => paint_destination_loop(&mut ctx, alpha, method, math),
        Strategy::SourceLoop => paint_source_loop(&mut ctx, alpha, method),
        Strategy::StraightOnto => paint_straight_onto(&mut ctx, alpha),
    }
}

/// Straight compositing as two native passes: reduce the existing target
/// alpha by `1 - alpha`, then add the contribution scaled by `alpha`.
fn paint_straight(ctx: &mut RenderContext<'_>, alpha: f32) -> RastermixResult<()> {
    let saved = ctx.replace_source(Pattern::Solid(Color::new(1.0, 1.0, 1.0, 1.0 - alpha)));
    ctx.set_operator(Operator::DestIn);
    ctx.paint(1.0)?;
    ctx.replace_source(saved);

    ctx.set_operator(Operator::Add);
    ctx.paint(alpha)
}

/// Mask-simulated blend: snapshot the target scaled by alpha, then paint the
/// source through the snapshot's alpha with the blend operator. The mask must
/// align pixel-for-pixel with the target, so the transform is reset first.
fn paint_masked(ctx: &mut RenderContext<'_>, op: Operator, alpha: f32) -> RastermixResult<()> {
    let snapshot = copy_target_image(ctx.target_mut(), alpha)?;
    ctx.set_operator(op);
    ctx.set_identity_transform();
    ctx.mask_surface(&snapshot, 0, 0)
}

/// Destination pixel loop: capture the contribution over the clip region and
/// overwrite each target pixel with the blend of the co-located pixels.
fn paint_destination_loop(
    ctx: &mut RenderContext<'_>,
    alpha: f32,
    method: BlendMethod,
    math: PixelMath,
) -> RastermixResult<()> {
    let (mut group, region) = ctx.capture_contribution()?;
    if region.is_empty() {
        return Ok(());
    }

    let src = group.map()?;
    let mut dst = ctx.target_mut().map()?;
    let (sw, sh) = (src.pixels().width(), src.pixels().height());
    let (dw, dh) = (dst.pixels().width(), dst.pixels().height());

    for y in 0..sh {
        for x in 0..sw {
            let tx = i64::from(region.x0) + i64::from(x);
            let ty = i64::from(region.y0) + i64::from(y);
            if tx < 0 || ty < 0 || tx >= i64::from(dw) || ty >= i64::from(dh) {
                continue;
            }
            let (tx, ty) = (tx as u32, ty as u32);
            let s = src.pixels().pixel(x, y);
            let d = dst.pixels().pixel(tx, ty);
            dst.pixels_mut().set_pixel(tx, ty, evaluate_pixel(s, d, alpha, method, math));
        }
    }
    Ok(())
}

/// Source-mutating loop (Overlay): the blend result replaces the *source*
/// pixel, and the mutated contribution is then painted back over the full
/// target with the clip disabled and the transform reset.
fn paint_source_loop(
    ctx: &mut RenderContext<'_>,
    alpha: f32,
    method: BlendMethod,
) -> RastermixResult<()> {
    let (mut group, region) = ctx.capture_contribution()?;
    if !region.is_empty() {
        let mut src = group.map()?;
        let target = ctx.target();
        let (sw, sh) = (src.pixels().width(), src.pixels().height());
        for y in 0..sh {
            for x in 0..sw {
                let d = target
                    .buffer()
                    .get(
                        i64::from(region.x0) + i64::from(x),
                        i64::from(region.y0) + i64::from(y),
                    )
                    .unwrap_or(PixelColor::TRANSPARENT);
                let s = src.pixels().pixel(x, y);
                src.pixels_mut()
                    .set_pixel(x, y, blend_premultiplied(s, d, alpha, method));
            }
        }
    }

    // Over, not atop: the mutated contribution must survive where the target
    // has no coverage; for covered pixels the two operators agree.
    ctx.set_operator(Operator::Over);
    ctx.reset_clip();
    ctx.set_identity_transform();
    ctx.set_source_surface(group, region.x0, region.y0);
    ctx.paint(alpha)
}

/// StraightOnto: straight-composite the contribution, restricted to where the
/// target already has coverage.
fn paint_straight_onto(ctx: &mut RenderContext<'_>, alpha: f32) -> RastermixResult<()> {
    let original = copy_target_image(ctx.target_mut(), 1.0)?;

    // Contribution masked by the target's coverage ("kept" layer).
    ctx.set_operator(Operator::In);
    ctx.paint(1.0)?;
    let kept = copy_target_image(ctx.target_mut(), 1.0)?;

    // Restore the original target by direct source replacement.
    ctx.set_operator(Operator::Clear);
    ctx.paint(1.0)?;
    ctx.set_source_surface(original, 0, 0);
    ctx.set_operator(Operator::Source);
    ctx.paint(1.0)?;

    // Layer the kept contribution with the straight decomposition. Explicit
    // helper call, not a re-entrant dispatch.
    ctx.set_source_surface(kept, 0, 0);
    paint_straight(ctx, alpha)
}

/// Pixel Blend Evaluator: one output pixel from the two co-located inputs.
fn evaluate_pixel(
    src: PixelColor,
    dst: PixelColor,
    alpha: f32,
    method: BlendMethod,
    math: PixelMath,
) -> PixelColor {
    match math {
        PixelMath::Premultiplied => blend_premultiplied(src, dst, alpha, method),
        PixelMath::Demultiplied => blend(src.demultiply(), dst.demultiply(), alpha, method)
            .clamped()
            .premultiply(),
    }
}

/// Straight source-replace copy of `source` into `dest`, scaled by `alpha`.
/// Both surfaces must have the same extent.
pub fn copy_surface(source: &Surface, dest: &mut Surface, alpha: f32) -> RastermixResult<()> {
    if source.width() != dest.width() || source.height() != dest.height() {
        return Err(RastermixError::validation(
            "copy_surface expects surfaces of matching extent",
        ));
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let mut mapped = dest.map()?;
    let buf = mapped.pixels_mut();
    for y in 0..buf.height() {
        for x in 0..buf.width() {
            buf.set_pixel(x, y, source.buffer().pixel(x, y).scaled(alpha));
        }
    }
    Ok(())
}

/// Surface Snapshot: an isolated copy of the target's full extent, scaled by
/// `alpha` during the copy. The target is flushed, read, and left unmutated;
/// the caller owns the returned surface.
pub fn copy_target_image(target: &mut Surface, alpha: f32) -> RastermixResult<Surface> {
    {
        // Flush pending draws before reading.
        let _mapped = target.map()?;
    }
    let mut image = Surface::new(target.width(), target.height());
    copy_surface(target, &mut image, alpha)?;
    Ok(image)
}

/// Scale a surface's existing alpha in place via an atop composite of solid
/// white at `alpha`.
pub fn mask_alpha(surface: &mut Surface, alpha: f32) -> RastermixResult<()> {
    let mut ctx = RenderContext::new(surface);
    ctx.set_source_color(Color::WHITE);
    ctx.set_operator(Operator::Atop);
    ctx.paint(alpha)
}
