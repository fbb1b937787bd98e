//! Run-scoped detector state: geometry, noise maps and status maps.

use crate::status::{reset_event_status, PixelStatus};
use crate::{Error, PlaneGeometry, Result};

/// The telescope for one run: per-plane bounds plus the per-plane noise
/// and status maps.
///
/// Bounds and plane count come from the run metadata and are immutable for
/// the run. Noise is calibration input; the status map is the only
/// cross-call mutable resource and is reset per plane at the start of each
/// event. Cloning yields an isolated copy suitable for per-event parallel
/// processing.
#[derive(Debug, Clone)]
pub struct Telescope {
    geometries: Vec<PlaneGeometry>,
    noise: Vec<Vec<f32>>,
    status: Vec<Vec<PixelStatus>>,
}

impl Telescope {
    /// Creates a telescope with unit noise and all-good status maps.
    #[must_use]
    pub fn new(geometries: Vec<PlaneGeometry>) -> Self {
        let noise = geometries
            .iter()
            .map(|g| vec![1.0; g.pixel_count()])
            .collect();
        let status = geometries
            .iter()
            .map(|g| vec![PixelStatus::Good; g.pixel_count()])
            .collect();
        Self {
            geometries,
            noise,
            status,
        }
    }

    /// Number of planes in the run.
    #[inline]
    #[must_use]
    pub fn plane_count(&self) -> usize {
        self.geometries.len()
    }

    /// Bounds of a plane.
    pub fn geometry(&self, plane: usize) -> Result<&PlaneGeometry> {
        self.geometries.get(plane).ok_or(Error::UnknownPlane(plane))
    }

    /// Installs the calibration noise map of a plane.
    pub fn set_noise(&mut self, plane: usize, noise: Vec<f32>) -> Result<()> {
        let expected = self.geometry(plane)?.pixel_count();
        if noise.len() != expected {
            return Err(Error::SizeMismatch {
                what: "plane noise map",
                expected,
                actual: noise.len(),
            });
        }
        self.noise[plane] = noise;
        Ok(())
    }

    /// Installs the calibration status map of a plane (`Bad` masking).
    pub fn set_status(&mut self, plane: usize, status: Vec<PixelStatus>) -> Result<()> {
        let expected = self.geometry(plane)?.pixel_count();
        if status.len() != expected {
            return Err(Error::SizeMismatch {
                what: "plane status map",
                expected,
                actual: status.len(),
            });
        }
        self.status[plane] = status;
        Ok(())
    }

    /// Noise map of a plane.
    pub fn noise(&self, plane: usize) -> Result<&[f32]> {
        self.noise
            .get(plane)
            .map(Vec::as_slice)
            .ok_or(Error::UnknownPlane(plane))
    }

    /// Status map of a plane.
    pub fn status(&self, plane: usize) -> Result<&[PixelStatus]> {
        self.status
            .get(plane)
            .map(Vec::as_slice)
            .ok_or(Error::UnknownPlane(plane))
    }

    /// Mutable status map of a plane.
    pub fn status_mut(&mut self, plane: usize) -> Result<&mut [PixelStatus]> {
        self.status
            .get_mut(plane)
            .map(Vec::as_mut_slice)
            .ok_or(Error::UnknownPlane(plane))
    }

    /// Clears the transient `Hit`/`Missing` markers of a plane before a new
    /// event; `Bad` calibration entries survive.
    pub fn reset_plane_status(&mut self, plane: usize) -> Result<()> {
        reset_event_status(self.status_mut(plane)?);
        Ok(())
    }

    /// Noise and status of a plane together with a mutable status borrow,
    /// for the clustering engines.
    pub fn plane_state(
        &mut self,
        plane: usize,
    ) -> Result<(&PlaneGeometry, &[f32], &mut [PixelStatus])> {
        if plane >= self.geometries.len() {
            return Err(Error::UnknownPlane(plane));
        }
        Ok((
            &self.geometries[plane],
            &self.noise[plane],
            &mut self.status[plane],
        ))
    }
}
