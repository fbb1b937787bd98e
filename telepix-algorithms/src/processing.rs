//! Per-event processing driver and run-scoped accounting.

use crate::components::{NeighborGraphClusterer, PixelOrdering, SparseConfig};
use crate::window::{FixedWindowClusterer, WindowConfig};
use log::debug;
use rayon::prelude::*;
use telepix_core::{Cluster, Event, PixelEncoding, PulseRecord, Result, Telescope};

/// Which engine handles zero-suppressed frames.
///
/// Dense frames always go through the fixed-window engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SparseAlgorithm {
    /// Scatter into a dense equivalent and grow fixed windows.
    FixedWindow,
    /// Connected components, enumeration pixel order.
    #[default]
    NeighborGraph,
    /// Connected components, coordinate-sorted order with capped sizes.
    NeighborGraphSorted,
}

/// Configuration of the per-event driver.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessorConfig {
    /// Fixed-window engine settings.
    pub window: WindowConfig,
    /// Connected-component cuts; ordering and size cap follow
    /// `sparse_algorithm`.
    pub sparse: SparseConfig,
    /// Engine selection for zero-suppressed frames.
    pub sparse_algorithm: SparseAlgorithm,
}

/// Run-scoped clustering counters, merged once per event.
#[derive(Debug, Clone, Default)]
pub struct ClusteringTotals {
    /// Accepted clusters per plane over the whole run.
    pub clusters_per_plane: Vec<u64>,
    /// Acceptances past the per-plane/event id ceiling over the run.
    pub id_overflow: u64,
}

impl ClusteringTotals {
    /// Creates zeroed counters for a run with `plane_count` planes.
    #[must_use]
    pub fn new(plane_count: usize) -> Self {
        Self {
            clusters_per_plane: vec![0; plane_count],
            id_overflow: 0,
        }
    }

    /// Adds another counter set into this one.
    pub fn merge(&mut self, other: &Self) {
        if self.clusters_per_plane.len() < other.clusters_per_plane.len() {
            self.clusters_per_plane
                .resize(other.clusters_per_plane.len(), 0);
        }
        for (plane, count) in other.clusters_per_plane.iter().enumerate() {
            self.clusters_per_plane[plane] += count;
        }
        self.id_overflow += other.id_overflow;
    }

    /// Run-end textual report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut out = String::new();
        for (plane, count) in self.clusters_per_plane.iter().enumerate() {
            out.push_str(&format!("Found {count} clusters on plane {plane}\n"));
        }
        if self.id_overflow > 0 {
            out.push_str(&format!(
                "{} clusters were accepted past the id ceiling and share its last id\n",
                self.id_overflow
            ));
        }
        out
    }
}

/// Clusters found for one event.
#[derive(Debug, Clone, Default)]
pub struct EventClusters {
    /// The event number.
    pub event_id: u64,
    /// Accepted clusters with their pulse records, grouped by plane in
    /// frame order.
    pub clusters: Vec<(Cluster, PulseRecord)>,
    /// Whether the event carried no readout at all and was skipped.
    pub skipped: bool,
}

/// Drives the configured engines over each plane of an event.
#[derive(Debug, Clone)]
pub struct EventProcessor {
    window: FixedWindowClusterer,
    neighbor: NeighborGraphClusterer,
    sparse_algorithm: SparseAlgorithm,
}

impl EventProcessor {
    /// Builds the engines; window-size validation errors here are fatal to
    /// the run.
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        let window = FixedWindowClusterer::new(config.window)?;
        let sparse = match config.sparse_algorithm {
            SparseAlgorithm::NeighborGraphSorted => SparseConfig {
                ordering: PixelOrdering::CoordinateSorted,
                size_cap: config.sparse.size_cap.or(Some(31)),
                ..config.sparse
            },
            _ => SparseConfig {
                ordering: PixelOrdering::Enumeration,
                ..config.sparse
            },
        };
        Ok(Self {
            window,
            neighbor: NeighborGraphClusterer::new(sparse),
            sparse_algorithm: config.sparse_algorithm,
        })
    }

    /// Processes one event: resets each plane's transient status, runs the
    /// engine for every modality present and collects accepted clusters.
    ///
    /// A plane with neither modality is skipped; an event with no readout
    /// at all yields a skipped result. An unknown pixel encoding aborts
    /// the event and surfaces as an error.
    pub fn process_event(
        &self,
        telescope: &mut Telescope,
        event: &Event,
        totals: &mut ClusteringTotals,
    ) -> Result<EventClusters> {
        let mut out = EventClusters {
            event_id: event.id,
            ..EventClusters::default()
        };

        if event.is_empty() {
            debug!("event {}: no dense or sparse readout, skipping", event.id);
            out.skipped = true;
            return Ok(out);
        }

        for frame in &event.planes {
            if frame.is_empty() {
                debug!(
                    "event {}: plane {} has no readout, skipping",
                    event.id, frame.plane
                );
                continue;
            }

            telescope.reset_plane_status(frame.plane)?;

            if let Some(dense) = &frame.dense {
                let (geometry, noise, status) = telescope.plane_state(frame.plane)?;
                let geometry = *geometry;
                let found =
                    self.window
                        .cluster_plane(frame.plane, &geometry, dense, noise, status)?;
                collect_plane(frame.plane, found, totals, &mut out);
            }

            if let Some(sparse) = &frame.sparse {
                // Unknown encodings abort the event before any clustering.
                let _encoding = PixelEncoding::from_tag(sparse.encoding_tag)?;
                let found = match self.sparse_algorithm {
                    SparseAlgorithm::FixedWindow => {
                        let (geometry, noise, status) = telescope.plane_state(frame.plane)?;
                        let geometry = *geometry;
                        self.window.cluster_sparse_plane(
                            frame.plane,
                            &geometry,
                            &sparse.pixels,
                            noise,
                            status,
                        )?
                    }
                    SparseAlgorithm::NeighborGraph | SparseAlgorithm::NeighborGraphSorted => {
                        let geometry = telescope.geometry(frame.plane)?;
                        self.neighbor.cluster_plane(
                            frame.plane,
                            geometry,
                            telescope.noise(frame.plane)?,
                            &sparse.pixels,
                        )?
                    }
                };
                collect_plane(frame.plane, found, totals, &mut out);
            }
        }

        Ok(out)
    }
}

fn collect_plane(
    plane: usize,
    found: crate::window::PlaneClusters,
    totals: &mut ClusteringTotals,
    out: &mut EventClusters,
) {
    if totals.clusters_per_plane.len() <= plane {
        totals.clusters_per_plane.resize(plane + 1, 0);
    }
    totals.clusters_per_plane[plane] += found.clusters.len() as u64;
    totals.id_overflow += u64::from(found.id_overflow);
    out.clusters.extend(found.clusters);
}

/// Processes a batch of events in parallel.
///
/// Each event works on an isolated copy of the telescope state, so the
/// pixel-consumption bookkeeping never leaks between events; run counters
/// are merged after the parallel section. Per-event errors are returned in
/// event order.
pub fn process_events(
    processor: &EventProcessor,
    telescope: &Telescope,
    events: &[Event],
    totals: &mut ClusteringTotals,
) -> Vec<Result<EventClusters>> {
    let results: Vec<(Result<EventClusters>, ClusteringTotals)> = events
        .par_iter()
        .map(|event| {
            let mut local_telescope = telescope.clone();
            let mut local_totals = ClusteringTotals::new(telescope.plane_count());
            let result = processor.process_event(&mut local_telescope, event, &mut local_totals);
            (result, local_totals)
        })
        .collect();

    results
        .into_iter()
        .map(|(result, local_totals)| {
            totals.merge(&local_totals);
            result
        })
        .collect()
}
