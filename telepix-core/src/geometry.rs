//! Plane geometry and the pixel matrix index bijection.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rectangular pixel bounds of one detector plane.
///
/// Provides the bijection between a 2D pixel coordinate and the linear
/// index into the plane's per-pixel arrays (charge, noise, status).
/// Bounds are inclusive on both ends and fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaneGeometry {
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
}

impl PlaneGeometry {
    /// Creates plane bounds, rejecting inverted ranges.
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Result<Self> {
        if max_x < min_x || max_y < min_y {
            return Err(Error::InvalidBounds {
                min_x,
                max_x,
                min_y,
                max_y,
            });
        }
        Ok(Self {
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    /// Lower x bound (first column).
    #[inline]
    #[must_use]
    pub fn min_x(&self) -> i32 {
        self.min_x
    }

    /// Upper x bound (last column, inclusive).
    #[inline]
    #[must_use]
    pub fn max_x(&self) -> i32 {
        self.max_x
    }

    /// Lower y bound (first row).
    #[inline]
    #[must_use]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    /// Upper y bound (last row, inclusive).
    #[inline]
    #[must_use]
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        (self.max_x - self.min_x + 1) as usize
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        (self.max_y - self.min_y + 1) as usize
    }

    /// Total number of pixels on the plane.
    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Whether a coordinate lies within the plane bounds.
    ///
    /// Callers must check this before [`index_of`](Self::index_of).
    #[inline]
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Linear index of a coordinate (row-major, y outer).
    ///
    /// The coordinate must lie within bounds.
    #[inline]
    #[must_use]
    pub fn index_of(&self, x: i32, y: i32) -> usize {
        debug_assert!(self.contains(x, y));
        (y - self.min_y) as usize * self.width() + (x - self.min_x) as usize
    }

    /// Coordinate of a linear index.
    ///
    /// The index must be below [`pixel_count`](Self::pixel_count).
    #[inline]
    #[must_use]
    pub fn coord_of(&self, index: usize) -> (i32, i32) {
        debug_assert!(index < self.pixel_count());
        let x = self.min_x + (index % self.width()) as i32;
        let y = self.min_y + (index / self.width()) as i32;
        (x, y)
    }
}
