//! The rendering context the compositor drives.
//!
//! [`RenderContext`] borrows the long-lived paint target and carries the
//! pieces of pipeline state compositing depends on: the current source
//! [`Pattern`], the active clip (kept in device space, as established), the
//! user-to-device [`Affine`] transform, and the current [`Operator`].
//!
//! Surfaces used as sources are expected to be device-aligned rasters; the
//! transform governs clip mapping, not source sampling.

use kurbo::{Affine, Point, Rect};

use crate::color::{Color, PixelColor, u8_to_unit};
use crate::error::RastermixResult;
use crate::operators::{self, Operator};
use crate::surface::Surface;

/// Axis-aligned integer rectangle in device pixel space.
///
/// Produced by mapping the clip's user-space corners through the current
/// transform and taking the bounding box of the two mapped points, so the
/// origin is always the true minimum corner even under rotation or flip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Region {
    pub x0: i32,
    pub y0: i32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// Source of pixels for a paint operation.
#[derive(Clone, Debug)]
pub enum Pattern {
    Solid(Color),
    /// Device-aligned raster placed with its top-left corner at `(x, y)`.
    Surface { surface: Surface, x: i32, y: i32 },
}

impl Pattern {
    fn sample(&self, x: i64, y: i64) -> PixelColor {
        match self {
            Pattern::Solid(c) => c.premultiply(),
            Pattern::Surface { surface, x: ox, y: oy } => surface
                .buffer()
                .get(x - i64::from(*ox), y - i64::from(*oy))
                .unwrap_or(PixelColor::TRANSPARENT),
        }
    }
}

/// Live rendering handle over one paint target.
///
/// `paint_with_alpha` consumes the context; a context never outlives a single
/// compositing operation once handed to the dispatcher.
#[derive(Debug)]
pub struct RenderContext<'a> {
    target: &'a mut Surface,
    source: Pattern,
    /// Device-space clip, normalized; `None` means the full target extent.
    clip: Option<Rect>,
    /// User-to-device transform.
    transform: Affine,
    operator: Operator,
}

impl<'a> RenderContext<'a> {
    pub fn new(target: &'a mut Surface) -> Self {
        Self {
            target,
            source: Pattern::Solid(Color::BLACK),
            clip: None,
            transform: Affine::IDENTITY,
            operator: Operator::Over,
        }
    }

    pub fn target(&self) -> &Surface {
        self.target
    }

    pub fn target_mut(&mut self) -> &mut Surface {
        self.target
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn set_operator(&mut self, op: Operator) {
        self.operator = op;
    }

    pub fn set_source_color(&mut self, color: Color) {
        self.source = Pattern::Solid(color);
    }

    pub fn set_source_surface(&mut self, surface: Surface, x: i32, y: i32) {
        self.source = Pattern::Surface { surface, x, y };
    }

    /// Swap in a new source, returning the previous one so a caller can
    /// restore it after an intermediate pass.
    pub fn replace_source(&mut self, source: Pattern) -> Pattern {
        std::mem::replace(&mut self.source, source)
    }

    pub fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    pub fn set_identity_transform(&mut self) {
        self.transform = Affine::IDENTITY;
    }

    /// Intersect the clip with `rect` (user space, mapped through the
    /// current transform).
    pub fn clip_rect(&mut self, rect: Rect) {
        let device = self.transform.transform_rect_bbox(rect);
        self.clip = Some(match self.clip {
            Some(existing) => existing.intersect(device),
            None => device,
        });
    }

    pub fn reset_clip(&mut self) {
        self.clip = None;
    }

    /// The clip bounding box as two corners in user coordinates. The corners
    /// are reported as mapped and may be unordered under rotation or flip.
    pub fn clip_extents(&self) -> (Point, Point) {
        let r = self.clip.unwrap_or_else(|| {
            Rect::new(
                0.0,
                0.0,
                f64::from(self.target.width()),
                f64::from(self.target.height()),
            )
        });
        let inv = self.transform.inverse();
        (inv * Point::new(r.x0, r.y0), inv * Point::new(r.x1, r.y1))
    }

    /// Region Extractor: the active clip's bounding box in device pixels.
    ///
    /// Maps both clip corners through the user-to-device transform and takes
    /// the min-corner bounding rectangle of the two mapped points.
    pub fn device_clip_region(&self) -> Region {
        // Mapped corners carry rounding noise from the transform round trip;
        // snap to the pixel grid before flooring/ceiling.
        const GRID_EPS: f64 = 1e-6;
        let (p0, p1) = self.clip_extents();
        let q0 = self.transform * p0;
        let q1 = self.transform * p1;
        let x0 = (q0.x.min(q1.x) + GRID_EPS).floor();
        let y0 = (q0.y.min(q1.y) + GRID_EPS).floor();
        let x1 = (q0.x.max(q1.x) - GRID_EPS).ceil();
        let y1 = (q0.y.max(q1.y) - GRID_EPS).ceil();
        Region {
            x0: x0 as i32,
            y0: y0 as i32,
            w: (x1 - x0).max(0.0) as u32,
            h: (y1 - y0).max(0.0) as u32,
        }
    }

    /// Composite the current source onto the target with the current
    /// operator, bounded by the clip, with the source scaled by `alpha`.
    pub fn paint(&mut self, alpha: f32) -> RastermixResult<()> {
        let alpha = alpha.clamp(0.0, 1.0);
        let region = self.device_clip_region();
        let op = self.operator;
        let source = &self.source;
        let mut mapped = self.target.map()?;
        let buf = mapped.pixels_mut();

        let (xs, xe, ys, ye) = intersect_extent(region, buf.width(), buf.height());
        for y in ys..ye {
            for x in xs..xe {
                let s = source.sample(x, y).scaled(alpha);
                let d = buf.pixel(x as u32, y as u32);
                buf.set_pixel(x as u32, y as u32, operators::composite(op, s, d));
            }
        }
        Ok(())
    }

    /// Like [`paint`](Self::paint) at full opacity, but the source is
    /// modulated per pixel by the alpha channel of `mask` (placed at
    /// `(mx, my)` in device space).
    pub fn mask_surface(&mut self, mask: &Surface, mx: i32, my: i32) -> RastermixResult<()> {
        let region = self.device_clip_region();
        let op = self.operator;
        let source = &self.source;
        let mut mapped = self.target.map()?;
        let buf = mapped.pixels_mut();

        let (xs, xe, ys, ye) = intersect_extent(region, buf.width(), buf.height());
        for y in ys..ye {
            for x in xs..xe {
                let coverage = mask
                    .buffer()
                    .get(x - i64::from(mx), y - i64::from(my))
                    .map_or(0, |p| p.a);
                let s = source.sample(x, y).scaled(u8_to_unit(coverage));
                let d = buf.pixel(x as u32, y as u32);
                buf.set_pixel(x as u32, y as u32, operators::composite(op, s, d));
            }
        }
        Ok(())
    }

    /// Isolation-group capture: render the current source contribution, at
    /// full opacity and bounded by the clip, into a fresh buffer sized to the
    /// device clip region. The target is not touched.
    pub fn capture_contribution(&self) -> RastermixResult<(Surface, Region)> {
        let region = self.device_clip_region();
        let mut group = Surface::new(region.w, region.h);
        {
            let mut mapped = group.map()?;
            let buf = mapped.pixels_mut();
            for y in 0..region.h {
                for x in 0..region.w {
                    let dx = i64::from(region.x0) + i64::from(x);
                    let dy = i64::from(region.y0) + i64::from(y);
                    buf.set_pixel(x, y, self.source.sample(dx, dy));
                }
            }
        }
        Ok((group, region))
    }
}

fn intersect_extent(region: Region, width: u32, height: u32) -> (i64, i64, i64, i64) {
    let xs = i64::from(region.x0).max(0);
    let ys = i64::from(region.y0).max(0);
    let xe = (i64::from(region.x0) + i64::from(region.w)).min(i64::from(width));
    let ye = (i64::from(region.y0) + i64::from(region.h)).min(i64::from(height));
    (xs, xe.max(xs), ys, ye.max(ys))
}
