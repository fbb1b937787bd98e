//! Per-pixel status values.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Status of one pixel in a plane's status map.
///
/// `Bad` entries come from the external calibration and survive event
/// boundaries; `Hit` and `Missing` are transient markers valid for one
/// event only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PixelStatus {
    /// Usable pixel, not yet claimed by a cluster this event.
    #[default]
    Good,
    /// Claimed by an accepted cluster this event.
    Hit,
    /// Masked by calibration, never usable.
    Bad,
    /// No charge sample present this event.
    Missing,
}

/// Resets the transient per-event markers of a status map.
///
/// `Hit` and `Missing` go back to `Good`; `Bad` is preserved. Called once
/// per plane at the start of each event.
pub fn reset_event_status(status: &mut [PixelStatus]) {
    for entry in status.iter_mut() {
        if matches!(entry, PixelStatus::Hit | PixelStatus::Missing) {
            *entry = PixelStatus::Good;
        }
    }
}
