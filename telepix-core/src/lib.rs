//! telepix-core: Core types for pixel telescope cluster processing.
//!
//! This crate provides the data model shared by the clustering engines and
//! the cluster filter: plane geometry, pixel status and encoding, clusters,
//! pulse records and the per-event input model.

pub mod cluster;
pub mod detector;
pub mod error;
pub mod event;
pub mod geometry;
pub mod pixel;
pub mod pulse;
pub mod quality;
pub mod status;

pub use cluster::{Cluster, ClusterShape};
pub use detector::Telescope;
pub use error::{Error, Result};
pub use event::{Event, PlaneFrame, SparseFrame};
pub use geometry::PlaneGeometry;
pub use pixel::{PixelEncoding, SparsePixel};
pub use pulse::{ClusterSource, PulseRecord};
pub use quality::ClusterQuality;
pub use status::PixelStatus;
