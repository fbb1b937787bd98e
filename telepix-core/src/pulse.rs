//! Pulse records: the downstream-facing handle for accepted clusters.

use crate::quality::ClusterQuality;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which builder produced a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClusterSource {
    /// Fixed-window growth around a seed.
    FixedWindow,
    /// Connected-component grouping, enumeration pixel order.
    Sparse,
    /// Connected-component grouping, coordinate-sorted pixel order.
    SparseSorted,
}

/// Identification wrapper handed to the filter and downstream consumers.
///
/// `cluster_id` is local to one plane and one event and saturates at the
/// configured ceiling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PulseRecord {
    /// Detector plane id.
    pub plane: usize,
    /// Local cluster index within the plane/event.
    pub cluster_id: u16,
    /// Seed x coordinate.
    pub seed_x: i32,
    /// Seed y coordinate.
    pub seed_y: i32,
    /// Reported cluster width.
    pub x_size: u16,
    /// Reported cluster height.
    pub y_size: u16,
    /// The builder that produced the cluster.
    pub source: ClusterSource,
    /// Aggregate cluster charge.
    pub charge: f32,
    /// Quality flags of the cluster.
    pub quality: ClusterQuality,
}
