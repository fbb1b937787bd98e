//! Sparse pixel samples and their wire encodings.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One zero-suppressed pixel sample: coordinate plus charge.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SparsePixel {
    /// X coordinate (column).
    pub x: i32,
    /// Y coordinate (row).
    pub y: i32,
    /// Calibrated charge.
    pub charge: f32,
}

impl SparsePixel {
    /// Creates a new sparse pixel sample.
    #[inline]
    #[must_use]
    pub fn new(x: i32, y: i32, charge: f32) -> Self {
        Self { x, y, charge }
    }

    /// Squared Euclidean distance to another pixel.
    #[inline]
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        dx * dx + dy * dy
    }
}

/// Encoding variants of zero-suppressed pixel data.
///
/// The variant is carried as a runtime tag in the event metadata; an
/// unknown tag is a typed error, fatal to the plane/event being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PixelEncoding {
    /// Plain (x, y, charge) samples.
    Simple,
}

impl PixelEncoding {
    /// Decodes the encoding from its wire tag.
    pub fn from_tag(tag: i32) -> Result<Self> {
        match tag {
            1 => Ok(Self::Simple),
            _ => Err(Error::UnknownPixelEncoding { tag }),
        }
    }

    /// The wire tag of this encoding.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> i32 {
        match self {
            Self::Simple => 1,
        }
    }
}
