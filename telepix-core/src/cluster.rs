//! Cluster data model and on-demand metrics.

use crate::quality::ClusterQuality;
use crate::{Error, Result, SparsePixel};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shape of a cluster's charge enumeration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClusterShape {
    /// Fixed rectangular window centered on the seed. The charge list
    /// always holds exactly `x_size * y_size` entries in row-major order
    /// (y outer, x inner); excluded or out-of-bounds positions hold zero.
    Window {
        /// Window width (odd).
        x_size: u16,
        /// Window height (odd).
        y_size: u16,
    },
    /// Variable-shape cluster from connected-component grouping. The
    /// charge list is aligned one-to-one with the member pixels.
    Sparse(Vec<SparsePixel>),
}

/// A localized charge deposit extracted from one plane.
///
/// Created by exactly one builder call and immutable after validation,
/// except for the one-time noise attachment performed by the
/// filtering/summary stage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster {
    plane: usize,
    seed_x: i32,
    seed_y: i32,
    shape: ClusterShape,
    charges: Vec<f32>,
    quality: ClusterQuality,
    noise: Option<Vec<f32>>,
}

impl Cluster {
    /// Creates a fixed-window cluster.
    ///
    /// `charges` must enumerate all `x_size * y_size` window positions.
    #[must_use]
    pub fn new_window(
        plane: usize,
        seed_x: i32,
        seed_y: i32,
        x_size: u16,
        y_size: u16,
        charges: Vec<f32>,
        quality: ClusterQuality,
    ) -> Self {
        debug_assert_eq!(charges.len(), usize::from(x_size) * usize::from(y_size));
        Self {
            plane,
            seed_x,
            seed_y,
            shape: ClusterShape::Window { x_size, y_size },
            charges,
            quality,
            noise: None,
        }
    }

    /// Creates a connected-component cluster from its member pixels.
    ///
    /// The seed is the highest-charge member.
    #[must_use]
    pub fn new_sparse(plane: usize, pixels: Vec<SparsePixel>, quality: ClusterQuality) -> Self {
        let charges: Vec<f32> = pixels.iter().map(|p| p.charge).collect();
        let (seed_x, seed_y) = pixels
            .iter()
            .max_by(|a, b| a.charge.total_cmp(&b.charge))
            .map_or((0, 0), |p| (p.x, p.y));
        Self {
            plane,
            seed_x,
            seed_y,
            shape: ClusterShape::Sparse(pixels),
            charges,
            quality,
            noise: None,
        }
    }

    /// The detector plane this cluster was found on.
    #[inline]
    #[must_use]
    pub fn plane(&self) -> usize {
        self.plane
    }

    /// Seed pixel coordinate.
    #[inline]
    #[must_use]
    pub fn seed_coord(&self) -> (i32, i32) {
        (self.seed_x, self.seed_y)
    }

    /// The cluster shape.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> &ClusterShape {
        &self.shape
    }

    /// Per-position charge contributions, aligned to the shape enumeration.
    #[inline]
    #[must_use]
    pub fn charges(&self) -> &[f32] {
        &self.charges
    }

    /// Quality flags accumulated while growing the candidate.
    #[inline]
    #[must_use]
    pub fn quality(&self) -> ClusterQuality {
        self.quality
    }

    /// Member pixels, for connected-component clusters.
    #[must_use]
    pub fn pixels(&self) -> Option<&[SparsePixel]> {
        match &self.shape {
            ClusterShape::Sparse(pixels) => Some(pixels),
            ClusterShape::Window { .. } => None,
        }
    }

    /// Reported cluster size: the declared window, or the bounding span of
    /// the member pixels.
    #[must_use]
    pub fn size(&self) -> (u16, u16) {
        match &self.shape {
            ClusterShape::Window { x_size, y_size } => (*x_size, *y_size),
            ClusterShape::Sparse(pixels) => {
                if pixels.is_empty() {
                    return (0, 0);
                }
                let mut min_x = i32::MAX;
                let mut max_x = i32::MIN;
                let mut min_y = i32::MAX;
                let mut max_y = i32::MIN;
                for pixel in pixels {
                    min_x = min_x.min(pixel.x);
                    max_x = max_x.max(pixel.x);
                    min_y = min_y.min(pixel.y);
                    max_y = max_y.max(pixel.y);
                }
                ((max_x - min_x + 1) as u16, (max_y - min_y + 1) as u16)
            }
        }
    }

    /// Index of the seed position in the charge enumeration.
    fn seed_index(&self) -> Result<usize> {
        if self.charges.is_empty() {
            return Err(Error::EmptyCluster);
        }
        match &self.shape {
            // Odd window sizes put the seed at the exact center.
            ClusterShape::Window { .. } => Ok(self.charges.len() / 2),
            ClusterShape::Sparse(_) => {
                let mut best = 0;
                for (i, charge) in self.charges.iter().enumerate() {
                    if *charge > self.charges[best] {
                        best = i;
                    }
                }
                Ok(best)
            }
        }
    }

    /// Total collected charge.
    #[must_use]
    pub fn total_charge(&self) -> f32 {
        self.charges.iter().map(|c| f64::from(*c)).sum::<f64>() as f32
    }

    /// Charge of the seed pixel.
    pub fn seed_charge(&self) -> Result<f32> {
        Ok(self.charges[self.seed_index()?])
    }

    /// Summed charge of the `n` highest-magnitude contributions.
    #[must_use]
    pub fn charge_of_n(&self, n: usize) -> f32 {
        let mut sorted = self.charges.clone();
        sorted.sort_by(|a, b| b.abs().total_cmp(&a.abs()));
        sorted
            .iter()
            .take(n)
            .map(|c| f64::from(*c))
            .sum::<f64>() as f32
    }

    /// Attaches per-position noise values. Allowed exactly once; the list
    /// must align with the charge enumeration.
    pub fn attach_noise(&mut self, noise: Vec<f32>) -> Result<()> {
        if self.noise.is_some() {
            return Err(Error::NoiseAlreadyAttached);
        }
        if noise.len() != self.charges.len() {
            return Err(Error::SizeMismatch {
                what: "cluster noise values",
                expected: self.charges.len(),
                actual: noise.len(),
            });
        }
        self.noise = Some(noise);
        Ok(())
    }

    /// Whether noise values have been attached.
    #[inline]
    #[must_use]
    pub fn has_noise(&self) -> bool {
        self.noise.is_some()
    }

    fn noise_values(&self) -> Result<&[f32]> {
        self.noise.as_deref().ok_or(Error::NoiseNotAttached)
    }

    /// Quadrature sum of the attached noise values.
    pub fn cluster_noise(&self) -> Result<f32> {
        let noise = self.noise_values()?;
        let sum: f64 = noise.iter().map(|n| f64::from(*n) * f64::from(*n)).sum();
        Ok(sum.sqrt() as f32)
    }

    /// Total charge over the quadrature noise sum. Zero if the noise sum
    /// vanishes.
    pub fn cluster_snr(&self) -> Result<f32> {
        let noise = self.cluster_noise()?;
        if noise == 0.0 {
            return Ok(0.0);
        }
        Ok(self.total_charge() / noise)
    }

    /// Seed charge over the seed pixel noise. Zero if the seed noise
    /// vanishes.
    pub fn seed_snr(&self) -> Result<f32> {
        let index = self.seed_index()?;
        let noise = self.noise_values()?[index];
        if noise == 0.0 {
            return Ok(0.0);
        }
        Ok(self.charges[index] / noise)
    }
}
