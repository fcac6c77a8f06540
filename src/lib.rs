//! Rastermix is a raster layer-compositing engine for premultiplied-alpha
//! RGBA targets.
//!
//! Given a live [`RenderContext`] (paint target + source contribution + clip
//! + transform), [`paint_with_alpha`] combines the contribution with the
//! target under a selectable [`BlendMethod`] and a global opacity, in place.
//! Each method resolves to one of a closed set of strategies:
//!
//! 1. **Native operator** paints (Composite, Behind, Onto, AlphaOver, and the
//!    two-pass Straight decomposition)
//! 2. **Mask-simulated** blends that re-apply an alpha-scaled target snapshot
//!    as a mask (Brighten, Darken, Multiply, Hue, Saturation, Luminance,
//!    Screen, HardLight)
//! 3. **Destination pixel loops** over the clip region (Divide, Add,
//!    Subtract, Difference, Color, AlphaBrighten, AlphaDarken)
//! 4. **Source-mutating** Overlay, and **StraightOnto** composed from
//!    snapshots plus the Straight pass
//!
//! Key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Premultiplied RGBA8** in every buffer; straight-alpha f32 [`Color`]
//!   only inside blend formulas.
//! - **Scoped pixel access**: surfaces are mapped for the duration of one
//!   loop and unmapped on every exit path.
//! - **Typed errors**: mapping failures abort the paint and surface as
//!   [`RastermixError`]; the target keeps whatever the completed steps wrote.
#![forbid(unsafe_code)]

mod blend;
mod color;
mod compose;
mod context;
mod error;
mod operators;
mod surface;

pub use kurbo::{Affine, Point, Rect};

pub use blend::{BlendMethod, blend, blend_premultiplied};
pub use color::{Color, PixelColor};
pub use compose::{
    PixelMath, Strategy, copy_surface, copy_target_image, mask_alpha, paint_with_alpha,
    strategy_for,
};
pub use context::{Pattern, Region, RenderContext};
pub use error::{RastermixError, RastermixResult};
pub use operators::{Operator, composite};
pub use surface::{MappedPixels, PixelBuffer, Surface};
