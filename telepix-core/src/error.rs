//! Error types for telepix-core.

use thiserror::Error;

/// Result type alias for telepix operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for telepix operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The sparse pixel encoding tag read from event metadata is not known.
    #[error("unknown sparse pixel encoding tag: {tag}")]
    UnknownPixelEncoding {
        /// The raw tag value.
        tag: i32,
    },

    /// A pixel coordinate falls outside the plane bounds.
    #[error("pixel ({x}, {y}) outside bounds of plane {plane}")]
    CoordinateOutOfBounds {
        /// The plane id.
        plane: usize,
        /// X coordinate (column).
        x: i32,
        /// Y coordinate (row).
        y: i32,
    },

    /// Plane bounds with a maximum below the minimum.
    #[error("invalid plane bounds: x [{min_x}, {max_x}], y [{min_y}, {max_y}]")]
    InvalidBounds {
        /// Lower x bound.
        min_x: i32,
        /// Upper x bound.
        max_x: i32,
        /// Lower y bound.
        min_y: i32,
        /// Upper y bound.
        max_y: i32,
    },

    /// A cluster window size must be an odd positive integer.
    #[error("cluster window size along {axis} has to be positive and odd, got {size}")]
    InvalidWindowSize {
        /// The axis the size applies to.
        axis: char,
        /// The rejected size.
        size: i32,
    },

    /// A per-pixel array does not match the plane pixel count.
    #[error("{what} has {actual} entries, plane expects {expected}")]
    SizeMismatch {
        /// What was being attached.
        what: &'static str,
        /// Expected number of entries.
        expected: usize,
        /// Actual number of entries.
        actual: usize,
    },

    /// A plane id outside the run layout.
    #[error("unknown plane id {0}")]
    UnknownPlane(usize),

    /// Noise values were attached to a cluster more than once.
    #[error("noise values already attached to cluster")]
    NoiseAlreadyAttached,

    /// A noise-dependent metric was requested before attaching noise values.
    #[error("noise values not attached to cluster")]
    NoiseNotAttached,

    /// A metric was requested on a cluster with no pixels.
    #[error("cannot compute metric of empty cluster")]
    EmptyCluster,
}
