//! Fixed-window cluster growth around seed pixels.

use crate::seed::select_seeds;
use log::warn;
use telepix_core::{
    Cluster, ClusterQuality, ClusterSource, Error, PixelStatus, PlaneGeometry, PulseRecord,
    Result, SparsePixel,
};

/// Configuration of the fixed-window engine.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowConfig {
    /// Window width; must be odd and positive.
    pub x_size: i32,
    /// Window height; must be odd and positive.
    pub y_size: i32,
    /// Seed significance threshold.
    pub seed_cut: f32,
    /// Cluster significance threshold.
    pub cluster_cut: f32,
    /// Local cluster id ceiling per plane per event. The ceiling is the
    /// largest id actually emitted: acceptances past it reuse this value,
    /// so ids span `0..=id_ceiling`.
    pub id_ceiling: u16,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            x_size: 5,
            y_size: 5,
            seed_cut: 4.5,
            cluster_cut: 3.0,
            id_ceiling: 256,
        }
    }
}

/// Clusters accepted on one plane for one event, plus the count of
/// acceptances past the id ceiling.
#[derive(Debug, Clone, Default)]
pub struct PlaneClusters {
    /// Accepted clusters with their pulse records, in acceptance order.
    pub clusters: Vec<(Cluster, PulseRecord)>,
    /// Acceptances past the id ceiling; these reuse the last id.
    pub id_overflow: u32,
}

/// Grows fixed-size rectangular clusters around seed pixels.
///
/// Seeds are visited in descending significance; a pixel consumed by an
/// accepted cluster is marked `Hit` in the status map, so later seeds
/// cannot re-claim it.
#[derive(Debug, Clone)]
pub struct FixedWindowClusterer {
    config: WindowConfig,
}

impl FixedWindowClusterer {
    /// Creates the engine, rejecting even or non-positive window sizes.
    pub fn new(config: WindowConfig) -> Result<Self> {
        for (axis, size) in [('x', config.x_size), ('y', config.y_size)] {
            if size <= 0 || size % 2 == 0 {
                return Err(Error::InvalidWindowSize { axis, size });
            }
        }
        Ok(Self { config })
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Clusters one plane's dense charge matrix.
    ///
    /// `status` is mutated: every pixel consumed by an accepted cluster is
    /// marked `Hit`. Rejected candidates leave no trace.
    pub fn cluster_plane(
        &self,
        plane: usize,
        geometry: &PlaneGeometry,
        charges: &[f32],
        noise: &[f32],
        status: &mut [PixelStatus],
    ) -> Result<PlaneClusters> {
        let expected = geometry.pixel_count();
        if charges.len() != expected {
            return Err(Error::SizeMismatch {
                what: "dense charge matrix",
                expected,
                actual: charges.len(),
            });
        }
        if noise.len() != expected || status.len() != expected {
            return Err(Error::SizeMismatch {
                what: "noise/status map",
                expected,
                actual: noise.len().min(status.len()),
            });
        }

        let seeds = select_seeds(charges, noise, status, self.config.seed_cut);

        let mut out = PlaneClusters::default();
        let mut next_id: u16 = 0;

        let x_half = self.config.x_size / 2;
        let y_half = self.config.y_size / 2;
        let window_len = (self.config.x_size * self.config.y_size) as usize;

        for seed in &seeds {
            // An earlier, higher-significance seed may have consumed this
            // pixel already.
            if status[seed.index] != PixelStatus::Good {
                continue;
            }

            let (seed_x, seed_y) = geometry.coord_of(seed.index);

            let mut signal = 0.0f64;
            let mut noise2 = 0.0f64;
            let mut candidate_charges = Vec::with_capacity(window_len);
            let mut candidate_indices = Vec::with_capacity(window_len);
            let mut quality = ClusterQuality::GOOD;

            // The seed stays at the window center; row-major, y outer.
            for y in (seed_y - y_half)..=(seed_y + y_half) {
                for x in (seed_x - x_half)..=(seed_x + x_half) {
                    if !geometry.contains(x, y) {
                        quality |= ClusterQuality::BORDER;
                        candidate_charges.push(0.0);
                        continue;
                    }
                    let index = geometry.index_of(x, y);
                    match status[index] {
                        PixelStatus::Good => {
                            signal += f64::from(charges[index]);
                            noise2 += f64::from(noise[index]) * f64::from(noise[index]);
                            candidate_charges.push(charges[index]);
                            candidate_indices.push(index);
                        }
                        PixelStatus::Hit => {
                            // Another cluster already owns this pixel. Only
                            // this candidate gets flagged; the owner keeps
                            // its quality.
                            quality |= ClusterQuality::INCOMPLETE | ClusterQuality::MERGED;
                            candidate_charges.push(0.0);
                        }
                        PixelStatus::Bad | PixelStatus::Missing => {
                            quality |= ClusterQuality::INCOMPLETE;
                            candidate_charges.push(0.0);
                        }
                    }
                }
            }

            if signal <= f64::from(self.config.cluster_cut) * noise2.sqrt() {
                // Candidate fails the cluster cut: no status mutation, no
                // id consumed.
                continue;
            }

            for index in &candidate_indices {
                status[*index] = PixelStatus::Hit;
            }

            let cluster = Cluster::new_window(
                plane,
                seed_x,
                seed_y,
                self.config.x_size as u16,
                self.config.y_size as u16,
                candidate_charges,
                quality,
            );
            let record = PulseRecord {
                plane,
                cluster_id: next_id,
                seed_x,
                seed_y,
                x_size: self.config.x_size as u16,
                y_size: self.config.y_size as u16,
                source: ClusterSource::FixedWindow,
                charge: cluster.total_charge(),
                quality,
            };
            out.clusters.push((cluster, record));

            if next_id < self.config.id_ceiling {
                next_id += 1;
            } else {
                // Known quirk: the last id is reused instead of dropping
                // the cluster, and the excess is reported at run end.
                out.id_overflow += 1;
                warn!(
                    "plane {plane}: more than {} clusters in one event ({})",
                    self.config.id_ceiling,
                    u32::from(next_id) + out.id_overflow
                );
            }
        }

        Ok(out)
    }

    /// Clusters a sparse pixel list by scattering it into a dense
    /// equivalent first; positions absent from the list carry zero charge.
    pub fn cluster_sparse_plane(
        &self,
        plane: usize,
        geometry: &PlaneGeometry,
        pixels: &[SparsePixel],
        noise: &[f32],
        status: &mut [PixelStatus],
    ) -> Result<PlaneClusters> {
        let mut charges = vec![0.0f32; geometry.pixel_count()];
        for pixel in pixels {
            if !geometry.contains(pixel.x, pixel.y) {
                return Err(Error::CoordinateOutOfBounds {
                    plane,
                    x: pixel.x,
                    y: pixel.y,
                });
            }
            charges[geometry.index_of(pixel.x, pixel.y)] = pixel.charge;
        }
        self.cluster_plane(plane, geometry, &charges, noise, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn geometry() -> PlaneGeometry {
        PlaneGeometry::new(0, 19, 0, 19).unwrap()
    }

    fn engine() -> FixedWindowClusterer {
        FixedWindowClusterer::new(WindowConfig::default()).unwrap()
    }

    #[test]
    fn test_even_window_rejected() {
        let config = WindowConfig {
            x_size: 4,
            ..WindowConfig::default()
        };
        assert!(matches!(
            FixedWindowClusterer::new(config),
            Err(Error::InvalidWindowSize { axis: 'x', size: 4 })
        ));

        let config = WindowConfig {
            y_size: -3,
            ..WindowConfig::default()
        };
        assert!(matches!(
            FixedWindowClusterer::new(config),
            Err(Error::InvalidWindowSize { axis: 'y', size: -3 })
        ));
    }

    #[test]
    fn test_single_seed_accepted() {
        let geo = geometry();
        let mut charges = vec![0.0f32; geo.pixel_count()];
        // Uniform 2.0 over the whole 5x5 window around (10, 10) gives
        // signal 50, noise2 100 with noise 2.0 everywhere.
        for y in 8..=12 {
            for x in 8..=12 {
                charges[geo.index_of(x, y)] = 2.0;
            }
        }
        // Lift the seed above the seed cut: 12 / 2 = 6 significance.
        charges[geo.index_of(10, 10)] = 12.0;
        // Compensate so the window total stays 50.
        charges[geo.index_of(10, 11)] = 0.0;
        charges[geo.index_of(10, 9)] = 0.0;
        charges[geo.index_of(11, 10)] = 0.0;
        charges[geo.index_of(9, 10)] = 0.0;
        charges[geo.index_of(9, 9)] = 0.0;

        let noise = vec![2.0f32; geo.pixel_count()];
        let mut status = vec![PixelStatus::Good; geo.pixel_count()];

        let out = engine()
            .cluster_plane(0, &geo, &charges, &noise, &mut status)
            .unwrap();
        assert_eq!(out.clusters.len(), 1);

        let (cluster, record) = &out.clusters[0];
        assert_relative_eq!(cluster.total_charge(), 50.0);
        assert_eq!(cluster.charges().len(), 25);
        assert!(cluster.quality().is_good());
        assert_eq!(record.cluster_id, 0);
        assert_eq!((record.seed_x, record.seed_y), (10, 10));

        // Every window pixel is now consumed.
        for y in 8..=12 {
            for x in 8..=12 {
                assert_eq!(status[geo.index_of(x, y)], PixelStatus::Hit);
            }
        }
    }

    #[test]
    fn test_corner_seed_flags_border() {
        let geo = geometry();
        let mut charges = vec![0.0f32; geo.pixel_count()];
        for y in 0..=2 {
            for x in 0..=2 {
                charges[geo.index_of(x, y)] = 10.0;
            }
        }
        charges[geo.index_of(0, 0)] = 30.0;

        let noise = vec![1.0f32; geo.pixel_count()];
        let mut status = vec![PixelStatus::Good; geo.pixel_count()];

        let out = engine()
            .cluster_plane(0, &geo, &charges, &noise, &mut status)
            .unwrap();
        assert_eq!(out.clusters.len(), 1);

        let (cluster, _) = &out.clusters[0];
        assert!(cluster.quality().contains(ClusterQuality::BORDER));
        // 25 positions enumerated, 16 of them off-plane for a corner seed.
        assert_eq!(cluster.charges().len(), 25);
        let zeros = cluster.charges().iter().filter(|c| **c == 0.0).count();
        assert_eq!(zeros, 16);
    }

    #[test]
    fn test_bad_pixel_flags_incomplete() {
        let geo = geometry();
        let mut charges = vec![0.0f32; geo.pixel_count()];
        for y in 8..=12 {
            for x in 8..=12 {
                charges[geo.index_of(x, y)] = 10.0;
            }
        }
        charges[geo.index_of(10, 10)] = 30.0;

        let noise = vec![1.0f32; geo.pixel_count()];
        let mut status = vec![PixelStatus::Good; geo.pixel_count()];
        status[geo.index_of(8, 8)] = PixelStatus::Bad;

        let out = engine()
            .cluster_plane(0, &geo, &charges, &noise, &mut status)
            .unwrap();
        let (cluster, _) = &out.clusters[0];
        assert!(cluster.quality().contains(ClusterQuality::INCOMPLETE));
        assert!(!cluster.quality().contains(ClusterQuality::MERGED));
        // The bad pixel stays bad, it is never consumed.
        assert_eq!(status[geo.index_of(8, 8)], PixelStatus::Bad);
    }

    #[test]
    fn test_later_seed_sees_merged() {
        let geo = geometry();
        let mut charges = vec![0.0f32; geo.pixel_count()];
        // Two seeds 4 pixels apart: their 5x5 windows overlap.
        charges[geo.index_of(8, 10)] = 100.0;
        charges[geo.index_of(12, 10)] = 50.0;

        let noise = vec![1.0f32; geo.pixel_count()];
        let mut status = vec![PixelStatus::Good; geo.pixel_count()];

        let out = engine()
            .cluster_plane(0, &geo, &charges, &noise, &mut status)
            .unwrap();
        assert_eq!(out.clusters.len(), 2);

        let (first, _) = &out.clusters[0];
        let (second, _) = &out.clusters[1];
        assert_eq!(first.seed_coord(), (8, 10));
        assert!(first.quality().is_good());
        assert!(second
            .quality()
            .contains(ClusterQuality::MERGED | ClusterQuality::INCOMPLETE));
    }

    #[test]
    fn test_rejected_candidate_leaves_no_trace() {
        let geo = geometry();
        let mut charges = vec![0.0f32; geo.pixel_count()];
        charges[geo.index_of(10, 10)] = 10.0;

        // High noise: seed passes (10 / 1.9 > 4.5) but the cluster cut
        // fails (10 <= 3 * sqrt(25 * 1.9^2) = 28.5).
        let noise = vec![1.9f32; geo.pixel_count()];
        let mut status = vec![PixelStatus::Good; geo.pixel_count()];

        let out = engine()
            .cluster_plane(0, &geo, &charges, &noise, &mut status)
            .unwrap();
        assert!(out.clusters.is_empty());
        assert!(status.iter().all(|s| *s == PixelStatus::Good));
    }

    #[test]
    fn test_id_ceiling_saturates() {
        let geo = PlaneGeometry::new(0, 99, 0, 0).unwrap();
        let config = WindowConfig {
            x_size: 1,
            y_size: 1,
            id_ceiling: 3,
            ..WindowConfig::default()
        };
        let engine = FixedWindowClusterer::new(config).unwrap();

        let charges = vec![100.0f32; geo.pixel_count()];
        let noise = vec![1.0f32; geo.pixel_count()];
        let mut status = vec![PixelStatus::Good; geo.pixel_count()];

        let out = engine
            .cluster_plane(0, &geo, &charges, &noise, &mut status)
            .unwrap();
        assert_eq!(out.clusters.len(), 100);
        assert_eq!(out.id_overflow, 97);
        let max_id = out.clusters.iter().map(|(_, r)| r.cluster_id).max();
        assert_eq!(max_id, Some(3));
    }

    #[test]
    fn test_sparse_scatter_equivalent() {
        let geo = geometry();
        let pixels = vec![
            SparsePixel::new(10, 10, 30.0),
            SparsePixel::new(11, 10, 10.0),
            SparsePixel::new(10, 11, 10.0),
        ];
        let noise = vec![1.0f32; geo.pixel_count()];
        let mut status = vec![PixelStatus::Good; geo.pixel_count()];

        let out = engine()
            .cluster_sparse_plane(0, &geo, &pixels, &noise, &mut status)
            .unwrap();
        assert_eq!(out.clusters.len(), 1);
        let (cluster, record) = &out.clusters[0];
        assert_relative_eq!(cluster.total_charge(), 50.0);
        assert_eq!(record.source, ClusterSource::FixedWindow);
    }

    #[test]
    fn test_sparse_out_of_bounds_pixel_is_error() {
        let geo = geometry();
        let pixels = vec![SparsePixel::new(25, 10, 30.0)];
        let noise = vec![1.0f32; geo.pixel_count()];
        let mut status = vec![PixelStatus::Good; geo.pixel_count()];

        assert!(matches!(
            engine().cluster_sparse_plane(0, &geo, &pixels, &noise, &mut status),
            Err(Error::CoordinateOutOfBounds { x: 25, y: 10, .. })
        ));
    }

    #[test]
    fn test_size_mismatch_is_error() {
        let geo = geometry();
        let charges = vec![0.0f32; 10];
        let noise = vec![1.0f32; geo.pixel_count()];
        let mut status = vec![PixelStatus::Good; geo.pixel_count()];

        assert!(matches!(
            engine().cluster_plane(0, &geo, &charges, &noise, &mut status),
            Err(Error::SizeMismatch { .. })
        ));
    }
}
