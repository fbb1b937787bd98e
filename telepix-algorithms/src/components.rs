//! Connected-component clustering of sparse pixels.
//!
//! Uses a union-find structure to partition the pixel list into components
//! under the adjacency distance threshold, then validates each component
//! against independent seed and cluster SNR cuts.

use crate::window::PlaneClusters;
use log::warn;
use telepix_core::{
    Cluster, ClusterQuality, ClusterSource, Error, PlaneGeometry, PulseRecord, Result,
    SparsePixel,
};

/// Pixel retrieval order inside a component.
///
/// The partitioning is identical for both; only the enumeration of member
/// pixels differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelOrdering {
    /// Members keep the input enumeration order.
    #[default]
    Enumeration,
    /// Members are visited in coordinate-sorted order (y, then x).
    CoordinateSorted,
}

/// Configuration of the connected-component engine.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SparseConfig {
    /// Seed SNR threshold.
    pub seed_cut: f32,
    /// Cluster SNR threshold.
    pub cluster_cut: f32,
    /// Adjacency distance; non-positive falls back to touching including
    /// diagonal (`sqrt(2)`).
    pub min_distance: f32,
    /// Member pixel ordering.
    pub ordering: PixelOrdering,
    /// Cap on each reported cluster dimension, for storage compactness.
    pub size_cap: Option<u16>,
    /// Local cluster id ceiling per plane per event. The ceiling is the
    /// largest id actually emitted: acceptances past it reuse this value,
    /// so ids span `0..=id_ceiling`.
    pub id_ceiling: u16,
}

impl Default for SparseConfig {
    fn default() -> Self {
        Self {
            seed_cut: 4.5,
            cluster_cut: 3.0,
            min_distance: 0.0,
            ordering: PixelOrdering::Enumeration,
            size_cap: None,
            id_ceiling: 256,
        }
    }
}

impl SparseConfig {
    /// The coordinate-sorted variant: sorted retrieval, dimensions capped
    /// at 31.
    #[must_use]
    pub fn coordinate_sorted() -> Self {
        Self {
            ordering: PixelOrdering::CoordinateSorted,
            size_cap: Some(31),
            ..Self::default()
        }
    }
}

/// Union-Find structure for connected component detection.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) {
        let px = self.find(x);
        let py = self.find(y);

        if px == py {
            return;
        }

        match self.rank[px].cmp(&self.rank[py]) {
            std::cmp::Ordering::Less => self.parent[px] = py,
            std::cmp::Ordering::Greater => self.parent[py] = px,
            std::cmp::Ordering::Equal => {
                self.parent[py] = px;
                self.rank[px] += 1;
            }
        }
    }
}

/// Clusters sparse pixel lists by grouping adjacent pixels.
#[derive(Debug, Clone)]
pub struct NeighborGraphClusterer {
    config: SparseConfig,
}

impl NeighborGraphClusterer {
    /// Creates the engine.
    #[must_use]
    pub fn new(config: SparseConfig) -> Self {
        Self { config }
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &SparseConfig {
        &self.config
    }

    fn source(&self) -> ClusterSource {
        match self.config.ordering {
            PixelOrdering::Enumeration => ClusterSource::Sparse,
            PixelOrdering::CoordinateSorted => ClusterSource::SparseSorted,
        }
    }

    /// Effective adjacency threshold, squared.
    fn distance_squared_cut(&self) -> f64 {
        let touching = std::f32::consts::SQRT_2;
        let d = if self.config.min_distance > touching {
            self.config.min_distance
        } else {
            touching
        };
        f64::from(d) * f64::from(d)
    }

    /// Partitions the pixel list into connected components.
    ///
    /// Components are returned in first-seen order of the configured pixel
    /// ordering; members keep that ordering too.
    fn find_components(&self, pixels: &[SparsePixel]) -> Vec<Vec<usize>> {
        let n = pixels.len();
        if n == 0 {
            return Vec::new();
        }

        let mut order: Vec<usize> = (0..n).collect();
        if self.config.ordering == PixelOrdering::CoordinateSorted {
            order.sort_by_key(|i| (pixels[*i].y, pixels[*i].x));
        }

        let cut = self.distance_squared_cut();
        let mut uf = UnionFind::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let dist_sq = pixels[i].distance_squared(&pixels[j]);
                if dist_sq as f64 <= cut {
                    uf.union(i, j);
                }
            }
        }

        let mut components: Vec<Vec<usize>> = Vec::new();
        let mut slot_of_root = vec![usize::MAX; n];
        for index in order {
            let root = uf.find(index);
            if slot_of_root[root] == usize::MAX {
                slot_of_root[root] = components.len();
                components.push(Vec::new());
            }
            components[slot_of_root[root]].push(index);
        }
        components
    }

    /// Clusters one plane's sparse pixel list.
    ///
    /// Rejected components are discarded with no side effect; there is no
    /// competing-seed suppression across components, so quality is always
    /// reported good.
    pub fn cluster_plane(
        &self,
        plane: usize,
        geometry: &PlaneGeometry,
        noise: &[f32],
        pixels: &[SparsePixel],
    ) -> Result<PlaneClusters> {
        let expected = geometry.pixel_count();
        if noise.len() != expected {
            return Err(Error::SizeMismatch {
                what: "plane noise map",
                expected,
                actual: noise.len(),
            });
        }

        let mut out = PlaneClusters::default();
        let mut next_id: u16 = 0;

        for component in self.find_components(pixels) {
            let members: Vec<SparsePixel> = component.iter().map(|i| pixels[*i]).collect();
            let mut noise_values = Vec::with_capacity(members.len());
            for pixel in &members {
                if !geometry.contains(pixel.x, pixel.y) {
                    return Err(Error::CoordinateOutOfBounds {
                        plane,
                        x: pixel.x,
                        y: pixel.y,
                    });
                }
                noise_values.push(noise[geometry.index_of(pixel.x, pixel.y)]);
            }

            let mut cluster = Cluster::new_sparse(plane, members, ClusterQuality::GOOD);
            cluster.attach_noise(noise_values)?;

            if cluster.seed_snr()? < self.config.seed_cut
                || cluster.cluster_snr()? < self.config.cluster_cut
            {
                continue;
            }

            let (seed_x, seed_y) = cluster.seed_coord();
            let (mut x_size, mut y_size) = cluster.size();
            if let Some(cap) = self.config.size_cap {
                x_size = x_size.min(cap);
                y_size = y_size.min(cap);
            }

            let record = PulseRecord {
                plane,
                cluster_id: next_id,
                seed_x,
                seed_y,
                x_size,
                y_size,
                source: self.source(),
                charge: cluster.total_charge(),
                quality: cluster.quality(),
            };
            out.clusters.push((cluster, record));

            if next_id < self.config.id_ceiling {
                next_id += 1;
            } else {
                out.id_overflow += 1;
                warn!(
                    "plane {plane}: more than {} sparse clusters in one event ({})",
                    self.config.id_ceiling,
                    u32::from(next_id) + out.id_overflow
                );
            }
        }

        Ok(out)
    }
}
