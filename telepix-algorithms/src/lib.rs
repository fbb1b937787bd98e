//! telepix-algorithms: Clustering engines for pixel telescope data.
//!
//! Two engines are provided:
//! - **Fixed window** - seed-driven growth of a fixed rectangular window,
//!   for dense frames and for sparse frames scattered into a dense
//!   equivalent
//! - **Neighbor graph** - union-find connected components of sparse
//!   pixels, in enumeration or coordinate-sorted pixel order
//!
//! [`processing`] drives both per event and accumulates run counters.
#![warn(missing_docs)]

mod components;
mod processing;
mod seed;
mod window;

pub use components::{NeighborGraphClusterer, PixelOrdering, SparseConfig};
pub use processing::{
    process_events, ClusteringTotals, EventClusters, EventProcessor, ProcessorConfig,
    SparseAlgorithm,
};
pub use seed::{select_seeds, SeedCandidate};
pub use window::{FixedWindowClusterer, PlaneClusters, WindowConfig};
