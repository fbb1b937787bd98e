//! OR-accumulated cluster quality flags.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Quality flags of a cluster candidate.
///
/// The empty set means a good cluster. Flags are only ever added during a
/// candidate's lifetime, never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterQuality(u8);

impl ClusterQuality {
    /// No defect: every window position was in bounds, good and unclaimed.
    pub const GOOD: Self = Self(0);
    /// At least one window position was excluded (bad or claimed pixel).
    pub const INCOMPLETE: Self = Self(1);
    /// Part of the window fell outside the plane bounds.
    pub const BORDER: Self = Self(1 << 1);
    /// The window overlapped a pixel already owned by an earlier cluster.
    pub const MERGED: Self = Self(1 << 2);

    /// Rebuilds a quality set from its stored code.
    #[inline]
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        Self(code)
    }

    /// The raw code, as stored in pulse records.
    #[inline]
    #[must_use]
    pub fn code(&self) -> u8 {
        self.0
    }

    /// Whether no defect flag is set.
    #[inline]
    #[must_use]
    pub fn is_good(&self) -> bool {
        self.0 == 0
    }

    /// Whether every flag of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ClusterQuality {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ClusterQuality {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for ClusterQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_good() {
            return write!(f, "good");
        }
        let mut sep = "";
        for (flag, name) in [
            (Self::INCOMPLETE, "incomplete"),
            (Self::BORDER, "border"),
            (Self::MERGED, "merged"),
        ] {
            if self.contains(flag) {
                write!(f, "{sep}{name}")?;
                sep = "|";
            }
        }
        Ok(())
    }
}
