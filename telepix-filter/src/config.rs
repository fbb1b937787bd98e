//! Filter criterion configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One N-pixel charge cut: the summed charge of the `n` most significant
/// pixels must exceed the per-plane threshold.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NChargeCut {
    /// Number of pixels to sum.
    pub n: usize,
    /// One threshold per plane.
    pub thresholds: Vec<f32>,
}

/// Threshold vectors for the filter criteria.
///
/// A criterion is active only when at least one of its entries enables it
/// (positive threshold; non-negative for the quality code). Empty vectors
/// leave the criterion inactive. Per-plane vector lengths are checked once
/// when the filter is built: a mismatch warns and permanently disables
/// that one criterion.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterConfig {
    /// Minimum total cluster charge, one entry per plane.
    pub min_total_charge: Vec<f32>,
    /// N-pixel charge cuts, checked in increasing-N order.
    pub min_n_charge: Vec<NChargeCut>,
    /// Minimum seed pixel charge, one entry per plane.
    pub min_seed_charge: Vec<f32>,
    /// Required quality code per plane; negative disables the plane.
    pub required_quality: Vec<i32>,
    /// Minimum accepted clusters per plane per event; zero disables the
    /// plane.
    pub min_cluster_count: Vec<i32>,
    /// Maximum accepted clusters per plane per event; negative means
    /// unbounded for that plane.
    pub max_cluster_count: Vec<i32>,
}

impl FilterConfig {
    /// Whether any plane enables the total-charge cut.
    #[must_use]
    pub fn min_total_charge_requested(&self) -> bool {
        self.min_total_charge.iter().any(|t| *t > 0.0)
    }

    /// Whether any N-pixel charge cut is configured.
    #[must_use]
    pub fn min_n_charge_requested(&self) -> bool {
        self.min_n_charge.iter().any(|cut| cut.n > 0)
    }

    /// Whether any plane enables the seed-charge cut.
    #[must_use]
    pub fn min_seed_charge_requested(&self) -> bool {
        self.min_seed_charge.iter().any(|t| *t > 0.0)
    }

    /// Whether any plane enables the quality requirement.
    #[must_use]
    pub fn required_quality_requested(&self) -> bool {
        self.required_quality.iter().any(|q| *q >= 0)
    }

    /// Whether any plane enables the minimum-count cut.
    #[must_use]
    pub fn min_cluster_count_requested(&self) -> bool {
        self.min_cluster_count.iter().any(|c| *c > 0)
    }

    /// Whether any plane enables the maximum-count cut.
    #[must_use]
    pub fn max_cluster_count_requested(&self) -> bool {
        self.max_cluster_count.iter().any(|c| *c > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_requests_nothing() {
        let config = FilterConfig::default();
        assert!(!config.min_total_charge_requested());
        assert!(!config.min_n_charge_requested());
        assert!(!config.min_seed_charge_requested());
        assert!(!config.required_quality_requested());
        assert!(!config.min_cluster_count_requested());
        assert!(!config.max_cluster_count_requested());
    }

    #[test]
    fn test_single_positive_entry_activates() {
        let config = FilterConfig {
            min_total_charge: vec![0.0, 75.0, 0.0],
            required_quality: vec![-1, -1, 0],
            max_cluster_count: vec![-1, 5, -1],
            ..FilterConfig::default()
        };
        assert!(config.min_total_charge_requested());
        assert!(config.required_quality_requested());
        assert!(config.max_cluster_count_requested());
    }

    #[test]
    fn test_all_negative_quality_is_inactive() {
        let config = FilterConfig {
            required_quality: vec![-1, -1, -1],
            ..FilterConfig::default()
        };
        assert!(!config.required_quality_requested());
    }
}
