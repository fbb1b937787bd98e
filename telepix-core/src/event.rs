//! Per-event input model.

use crate::SparsePixel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Zero-suppressed readout of one plane for one event.
///
/// The encoding tag is resolved at processing time; an unknown tag aborts
/// the event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SparseFrame {
    /// Wire tag of the pixel encoding.
    pub encoding_tag: i32,
    /// The fired pixels.
    pub pixels: Vec<SparsePixel>,
}

/// Readout of one plane for one event. Either modality may be absent; a
/// plane with neither is skipped for the event.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaneFrame {
    /// Detector plane id.
    pub plane: usize,
    /// Dense charge matrix, one entry per pixel.
    pub dense: Option<Vec<f32>>,
    /// Zero-suppressed pixel list.
    pub sparse: Option<SparseFrame>,
}

impl PlaneFrame {
    /// Whether neither readout modality is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_none() && self.sparse.is_none()
    }
}

/// One event's worth of per-plane readouts.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event {
    /// Event number within the run.
    pub id: u64,
    /// Per-plane readouts; planes may appear in any order and be absent.
    pub planes: Vec<PlaneFrame>,
}

impl Event {
    /// Whether no plane carries any readout.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.planes.iter().all(PlaneFrame::is_empty)
    }
}
