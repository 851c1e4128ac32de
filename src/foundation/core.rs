use crate::foundation::error::{PixelMathError, PixelMathResult};

/// Canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a canvas, rejecting empty dimensions.
    pub fn new(width: u32, height: u32) -> PixelMathResult<Self> {
        if width == 0 || height == 0 {
            return Err(PixelMathError::compile(format!(
                "canvas dimensions must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Execution geometry: the evaluated region and the full canvas it belongs to.
///
/// Pixel coordinates seen by expressions are absolute (`x0 + x`, `y0 + y`) and normalized by the
/// full canvas size, so evaluating a sub-region produces the same samples as the matching area of
/// a full-canvas run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    /// Left edge of the region in full-canvas coordinates.
    pub x0: u32,
    /// Top edge of the region in full-canvas coordinates.
    pub y0: u32,
    /// Region width.
    pub width: u32,
    /// Region height.
    pub height: u32,
    /// Full canvas size.
    pub full: Canvas,
}

impl Geometry {
    /// Geometry covering the whole canvas.
    pub fn full(canvas: Canvas) -> Self {
        Self {
            x0: 0,
            y0: 0,
            width: canvas.width,
            height: canvas.height,
            full: canvas,
        }
    }

    /// Geometry covering a sub-region of `full`.
    pub fn region(full: Canvas, x0: u32, y0: u32, width: u32, height: u32) -> PixelMathResult<Self> {
        let fits_x = x0.checked_add(width).is_some_and(|e| e <= full.width);
        let fits_y = y0.checked_add(height).is_some_and(|e| e <= full.height);
        if width == 0 || height == 0 || !fits_x || !fits_y {
            return Err(PixelMathError::compile(format!(
                "region {width}x{height}+{x0}+{y0} does not fit a {}x{} canvas",
                full.width, full.height
            )));
        }
        Ok(Self {
            x0,
            y0,
            width,
            height,
            full,
        })
    }

    /// `true` when the region is a proper part of the canvas.
    pub fn is_partial(&self) -> bool {
        self.x0 != 0
            || self.y0 != 0
            || self.width != self.full.width
            || self.height != self.full.height
    }
}

/// One of the four expression slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Red channel, gray channel, or the combined RGB expression.
    RedOrGray,
    /// Green channel.
    Green,
    /// Blue channel.
    Blue,
    /// Alpha channel.
    Alpha,
}

impl Slot {
    /// All slots in evaluation order.
    pub const ALL: [Slot; 4] = [Slot::RedOrGray, Slot::Green, Slot::Blue, Slot::Alpha];

    /// Slot index (0..4).
    pub fn index(self) -> usize {
        match self {
            Slot::RedOrGray => 0,
            Slot::Green => 1,
            Slot::Blue => 2,
            Slot::Alpha => 3,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
