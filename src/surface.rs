//! Raster surfaces and scoped pixel access.
//!
//! A [`Surface`] is a long-lived raster owned by the surrounding pipeline. A
//! compositing pass gains pixel access through [`Surface::map`], which flushes
//! pending draws and returns a [`MappedPixels`] guard; dropping the guard
//! commits the write-back and marks the surface dirty, on every exit path.

use crate::color::PixelColor;
use crate::error::{RastermixError, RastermixResult};

/// Row-major width x height array of premultiplied pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<PixelColor>,
}

impl PixelBuffer {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![PixelColor::TRANSPARENT; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: i64, y: i64) -> Option<PixelColor> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(self.data[(y as usize) * (self.width as usize) + (x as usize)])
    }

    /// In-bounds read. Panics on out-of-range coordinates; loops must
    /// pre-intersect their region with the buffer extent.
    pub fn pixel(&self, x: u32, y: u32) -> PixelColor {
        debug_assert!(x < self.width && y < self.height);
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// In-bounds write. Same contract as [`pixel`](Self::pixel).
    pub fn set_pixel(&mut self, x: u32, y: u32, p: PixelColor) {
        debug_assert!(x < self.width && y < self.height);
        self.data[(y as usize) * (self.width as usize) + (x as usize)] = p;
    }

    pub fn fill(&mut self, p: PixelColor) {
        self.data.fill(p);
    }
}

/// A raster surface with an explicit map/unmap pixel-access lifecycle.
#[derive(Clone, Debug)]
pub struct Surface {
    buffer: PixelBuffer,
    dirty: bool,
    device_error: Option<String>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_buffer(PixelBuffer::new(width, height))
    }

    pub fn from_buffer(buffer: PixelBuffer) -> Self {
        Self {
            buffer,
            dirty: false,
            device_error: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Read-only pixel access without the map lifecycle, for surfaces used
    /// as sources or masks (never mutated through this path).
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// True once any mapped access has committed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Put the surface into a device-error state. Subsequent maps fail with
    /// [`RastermixError::Mapping`]; the pipeline sets this when the backing
    /// store is lost.
    pub fn set_device_error(&mut self, status: impl Into<String>) {
        self.device_error = Some(status.into());
    }

    /// Acquire exclusive read/write pixel access, flushing pending draws
    /// first. Fails fast if the surface is in a device-error state.
    pub fn map(&mut self) -> RastermixResult<MappedPixels<'_>> {
        if let Some(status) = &self.device_error {
            tracing::error!(%status, "surface map failed");
            return Err(RastermixError::mapping(format!(
                "cannot map surface: {status}"
            )));
        }
        Ok(MappedPixels { surface: self })
    }
}

/// Scoped, exclusive pixel access to one surface. Dropping the guard commits
/// and marks the surface dirty.
#[derive(Debug)]
pub struct MappedPixels<'a> {
    surface: &'a mut Surface,
}

impl MappedPixels<'_> {
    pub fn pixels(&self) -> &PixelBuffer {
        &self.surface.buffer
    }

    pub fn pixels_mut(&mut self) -> &mut PixelBuffer {
        &mut self.surface.buffer
    }
}

impl Drop for MappedPixels<'_> {
    fn drop(&mut self) {
        self.surface.dirty = true;
    }
}
