//! Sampled cell geometry
//!
//! [`PixelRect`] is what the rendering layer reports, [`CellBox`] is the same
//! rectangle expressed in percent of the workspace container.

use panelgrid_topology::Rect;
use serde::{Deserialize, Serialize};

/// Rendered size of the workspace container in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerSize {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl ContainerSize {
    /// Create container size
    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether the container has been laid out
    #[inline]
    #[must_use]
    pub fn is_laid_out(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Pixel rectangle relative to the container's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    /// Top edge in pixels
    pub top: f64,
    /// Left edge in pixels
    pub left: f64,
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl PixelRect {
    /// Create pixel rectangle
    #[inline]
    #[must_use]
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// One cell's box in container percent
///
/// Only boxes with positive, finite extents are accepted into encoding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CellBox {
    /// Distance from the container's top edge
    pub top: f64,
    /// Distance from the container's left edge
    pub left: f64,
    /// Horizontal extent
    pub width: f64,
    /// Vertical extent
    pub height: f64,
}

impl CellBox {
    /// Create box from percentages
    #[inline]
    #[must_use]
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Convert a pixel rectangle to container percent
    ///
    /// Returns `None` while the container has no size.
    #[must_use]
    pub fn from_pixels(rect: PixelRect, container: ContainerSize) -> Option<Self> {
        if !container.is_laid_out() {
            return None;
        }
        Some(Self {
            top: rect.top / container.height * 100.0,
            left: rect.left / container.width * 100.0,
            width: rect.width / container.width * 100.0,
            height: rect.height / container.height * 100.0,
        })
    }

    /// Convert back to pixels for a container
    #[must_use]
    pub fn to_pixels(&self, container: ContainerSize) -> PixelRect {
        PixelRect {
            top: self.top / 100.0 * container.height,
            left: self.left / 100.0 * container.width,
            width: self.width / 100.0 * container.width,
            height: self.height / 100.0 * container.height,
        }
    }

    /// Positive, finite extents and finite origin
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.top, self.left, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }

    /// As a topology rectangle
    #[inline]
    #[must_use]
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.top, self.left, self.width, self.height)
    }
}

impl From<Rect> for CellBox {
    fn from(rect: Rect) -> Self {
        Self::new(rect.top, rect.left, rect.width, rect.height)
    }
}
