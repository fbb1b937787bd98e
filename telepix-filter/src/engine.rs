//! The cluster filter engine.

use crate::config::{FilterConfig, NChargeCut};
use crate::ledger::RejectionLedger;
use log::warn;
use telepix_core::{Cluster, PulseRecord};

const MIN_TOTAL_CHARGE_CUT: &str = "MinTotalChargeCut";
const MIN_N_CHARGE_CUT: &str = "MinNChargeCut";
const MIN_SEED_CHARGE_CUT: &str = "MinSeedChargeCut";
const CLUSTER_QUALITY_CUT: &str = "ClusterQualityCut";
const MIN_CLUSTER_NO_CUT: &str = "MinClusterNoCut";
const MAX_CLUSTER_NO_CUT: &str = "MaxClusterNoCut";

/// Result of filtering one event.
#[derive(Debug, Clone)]
pub enum FilterOutcome {
    /// At least one cluster survived; fresh copies of the survivors.
    Accepted(Vec<(Cluster, PulseRecord)>),
    /// Nothing survived. A skip signal, not a processing fault.
    Empty,
}

impl FilterOutcome {
    /// The surviving clusters, empty when the event was skipped.
    #[must_use]
    pub fn clusters(&self) -> &[(Cluster, PulseRecord)] {
        match self {
            Self::Accepted(clusters) => clusters,
            Self::Empty => &[],
        }
    }
}

/// Applies the configured criteria to each event's clusters.
///
/// Threshold vectors are validated against the plane count once, at
/// construction: a length mismatch warns and permanently disables that
/// one criterion, leaving the others untouched. Disabled criteria never
/// appear in the ledger and stop accumulating.
#[derive(Debug, Clone)]
pub struct ClusterFilter {
    plane_count: usize,
    min_total_charge: Option<Vec<f32>>,
    min_n_charge: Option<Vec<NChargeCut>>,
    min_seed_charge: Option<Vec<f32>>,
    required_quality: Option<Vec<i32>>,
    min_cluster_count: Option<Vec<i32>>,
    max_cluster_count: Option<Vec<i32>>,
    ledger: RejectionLedger,
}

impl ClusterFilter {
    /// Builds the filter for a run with `plane_count` planes.
    #[must_use]
    pub fn new(config: FilterConfig, plane_count: usize) -> Self {
        let mut ledger = RejectionLedger::new();

        let min_total_charge_requested = config.min_total_charge_requested();
        let min_n_charge_requested = config.min_n_charge_requested();
        let min_seed_charge_requested = config.min_seed_charge_requested();
        let required_quality_requested = config.required_quality_requested();
        let min_cluster_count_requested = config.min_cluster_count_requested();
        let max_cluster_count_requested = config.max_cluster_count_requested();

        let min_total_charge = if min_total_charge_requested {
            validate_planes(
                MIN_TOTAL_CHARGE_CUT,
                config.min_total_charge,
                plane_count,
                &mut ledger,
            )
        } else {
            None
        };

        let min_n_charge = if min_n_charge_requested {
            if config
                .min_n_charge
                .iter()
                .all(|cut| cut.thresholds.len() == plane_count)
            {
                ledger.register(MIN_N_CHARGE_CUT, plane_count);
                let mut cuts = config.min_n_charge;
                cuts.sort_by_key(|cut| cut.n);
                Some(cuts)
            } else {
                warn!(
                    "{MIN_N_CHARGE_CUT}: threshold vector does not match the \
                     {plane_count} planes of the run, disabling the criterion"
                );
                None
            }
        } else {
            None
        };

        let min_seed_charge = if min_seed_charge_requested {
            validate_planes(
                MIN_SEED_CHARGE_CUT,
                config.min_seed_charge,
                plane_count,
                &mut ledger,
            )
        } else {
            None
        };

        let required_quality = if required_quality_requested {
            validate_planes(
                CLUSTER_QUALITY_CUT,
                config.required_quality,
                plane_count,
                &mut ledger,
            )
        } else {
            None
        };

        let min_cluster_count = if min_cluster_count_requested {
            validate_planes(
                MIN_CLUSTER_NO_CUT,
                config.min_cluster_count,
                plane_count,
                &mut ledger,
            )
        } else {
            None
        };

        let max_cluster_count = if max_cluster_count_requested {
            // A negative entry means unbounded for that plane.
            validate_planes(
                MAX_CLUSTER_NO_CUT,
                config.max_cluster_count,
                plane_count,
                &mut ledger,
            )
            .map(|mut counts| {
                for count in &mut counts {
                    if *count < 0 {
                        *count = i32::MAX;
                    }
                }
                counts
            })
        } else {
            None
        };

        Self {
            plane_count,
            min_total_charge,
            min_n_charge,
            min_seed_charge,
            required_quality,
            min_cluster_count,
            max_cluster_count,
            ledger,
        }
    }

    /// The rejection ledger accumulated so far.
    #[must_use]
    pub fn ledger(&self) -> &RejectionLedger {
        &self.ledger
    }

    /// The run-end rejection table.
    #[must_use]
    pub fn summary(&self) -> String {
        self.ledger.summary()
    }

    /// Filters one event's clusters.
    ///
    /// Every active per-cluster criterion is evaluated for every cluster,
    /// so one cluster can feed several rejection counters. If an aggregate
    /// count criterion fails on any plane the whole event is discarded.
    pub fn filter_event(&mut self, clusters: &[(Cluster, PulseRecord)]) -> FilterOutcome {
        let Self {
            plane_count,
            min_total_charge,
            min_n_charge,
            min_seed_charge,
            required_quality,
            min_cluster_count,
            max_cluster_count,
            ledger,
        } = self;

        let mut accepted: Vec<usize> = Vec::new();
        for (index, (cluster, record)) in clusters.iter().enumerate() {
            let mut is_accepted = true;
            if let Some(thresholds) = min_total_charge {
                is_accepted &= above_min_total_charge(thresholds, cluster, record, ledger);
            }
            if let Some(cuts) = min_n_charge {
                is_accepted &= above_min_n_charge(cuts, cluster, record, ledger);
            }
            if let Some(thresholds) = min_seed_charge {
                is_accepted &= above_min_seed_charge(thresholds, cluster, record, ledger);
            }
            if let Some(required) = required_quality {
                is_accepted &= has_required_quality(required, record, ledger);
            }
            if is_accepted {
                accepted.push(index);
            }
        }

        let mut counts = vec![0i32; *plane_count];
        for index in &accepted {
            let plane = clusters[*index].1.plane;
            if let Some(count) = counts.get_mut(plane) {
                *count += 1;
            }
        }

        let event_accepted = enough_clusters(min_cluster_count.as_deref(), &counts, ledger)
            && !too_many_clusters(max_cluster_count.as_deref(), &counts, ledger);
        if !event_accepted {
            accepted.clear();
        }

        if accepted.is_empty() {
            return FilterOutcome::Empty;
        }
        FilterOutcome::Accepted(
            accepted
                .into_iter()
                .map(|index| clusters[index].clone())
                .collect(),
        )
    }
}

fn validate_planes<T>(
    criterion: &'static str,
    thresholds: Vec<T>,
    plane_count: usize,
    ledger: &mut RejectionLedger,
) -> Option<Vec<T>> {
    if thresholds.len() == plane_count {
        ledger.register(criterion, plane_count);
        Some(thresholds)
    } else {
        warn!(
            "{criterion}: threshold vector has {} entries but the run has \
             {plane_count} planes, disabling the criterion",
            thresholds.len()
        );
        None
    }
}

fn above_min_total_charge(
    thresholds: &[f32],
    cluster: &Cluster,
    record: &PulseRecord,
    ledger: &mut RejectionLedger,
) -> bool {
    let Some(threshold) = thresholds.get(record.plane) else {
        return true;
    };
    if cluster.total_charge() > *threshold {
        return true;
    }
    ledger.record(MIN_TOTAL_CHARGE_CUT, record.plane);
    false
}

fn above_min_n_charge(
    cuts: &[NChargeCut],
    cluster: &Cluster,
    record: &PulseRecord,
    ledger: &mut RejectionLedger,
) -> bool {
    for cut in cuts {
        let Some(threshold) = cut.thresholds.get(record.plane) else {
            continue;
        };
        // Checked in increasing-N order; the first failure settles it.
        if cluster.charge_of_n(cut.n) <= *threshold {
            ledger.record(MIN_N_CHARGE_CUT, record.plane);
            return false;
        }
    }
    true
}

fn above_min_seed_charge(
    thresholds: &[f32],
    cluster: &Cluster,
    record: &PulseRecord,
    ledger: &mut RejectionLedger,
) -> bool {
    let Some(threshold) = thresholds.get(record.plane) else {
        return true;
    };
    if cluster.seed_charge().unwrap_or(0.0) > *threshold {
        return true;
    }
    ledger.record(MIN_SEED_CHARGE_CUT, record.plane);
    false
}

fn has_required_quality(
    required: &[i32],
    record: &PulseRecord,
    ledger: &mut RejectionLedger,
) -> bool {
    let Some(required) = required.get(record.plane) else {
        return true;
    };
    if *required < 0 {
        return true;
    }
    if i32::from(record.quality.code()) == *required {
        return true;
    }
    ledger.record(CLUSTER_QUALITY_CUT, record.plane);
    false
}

fn enough_clusters(
    minimums: Option<&[i32]>,
    counts: &[i32],
    ledger: &mut RejectionLedger,
) -> bool {
    let Some(minimums) = minimums else {
        return true;
    };
    let mut enough = true;
    for (plane, minimum) in minimums.iter().enumerate() {
        if counts[plane] < *minimum {
            ledger.record(MIN_CLUSTER_NO_CUT, plane);
            enough = false;
        }
    }
    enough
}

fn too_many_clusters(
    maximums: Option<&[i32]>,
    counts: &[i32],
    ledger: &mut RejectionLedger,
) -> bool {
    let Some(maximums) = maximums else {
        return false;
    };
    let mut too_many = false;
    for (plane, maximum) in maximums.iter().enumerate() {
        if counts[plane] > *maximum {
            ledger.record(MAX_CLUSTER_NO_CUT, plane);
            too_many = true;
        }
    }
    too_many
}

#[cfg(test)]
mod tests {
    use super::*;
    use telepix_core::{ClusterQuality, ClusterSource, SparsePixel};

    fn sparse_cluster(plane: usize, cluster_id: u16, charges: &[f32]) -> (Cluster, PulseRecord) {
        let pixels: Vec<SparsePixel> = charges
            .iter()
            .enumerate()
            .map(|(i, charge)| SparsePixel::new(i as i32, 0, *charge))
            .collect();
        let cluster = Cluster::new_sparse(plane, pixels, ClusterQuality::GOOD);
        let (seed_x, seed_y) = cluster.seed_coord();
        let (x_size, y_size) = cluster.size();
        let record = PulseRecord {
            plane,
            cluster_id,
            seed_x,
            seed_y,
            x_size,
            y_size,
            source: ClusterSource::Sparse,
            charge: cluster.total_charge(),
            quality: cluster.quality(),
        };
        (cluster, record)
    }

    #[test]
    fn test_inactive_filter_passes_everything() {
        let mut filter = ClusterFilter::new(FilterConfig::default(), 2);
        let clusters = vec![sparse_cluster(0, 0, &[5.0]), sparse_cluster(1, 0, &[1.0])];

        match filter.filter_event(&clusters) {
            FilterOutcome::Accepted(accepted) => assert_eq!(accepted.len(), 2),
            FilterOutcome::Empty => panic!("inactive filter must accept"),
        }
    }

    #[test]
    fn test_total_charge_cut_counts_rejections() {
        let config = FilterConfig {
            min_total_charge: vec![50.0, 50.0],
            ..FilterConfig::default()
        };
        let mut filter = ClusterFilter::new(config, 2);
        let clusters = vec![
            sparse_cluster(0, 0, &[60.0]),
            sparse_cluster(0, 1, &[10.0]),
            sparse_cluster(1, 0, &[10.0]),
        ];

        let outcome = filter.filter_event(&clusters);
        assert_eq!(outcome.clusters().len(), 1);
        assert_eq!(outcome.clusters()[0].1.plane, 0);
        assert_eq!(filter.ledger().count(MIN_TOTAL_CHARGE_CUT, 0), 1);
        assert_eq!(filter.ledger().count(MIN_TOTAL_CHARGE_CUT, 1), 1);
    }

    #[test]
    fn test_mismatched_vector_soft_disables() {
        // Two thresholds for a three-plane run: the criterion is disabled,
        // everything passes it, and it never shows up in the ledger.
        let config = FilterConfig {
            min_total_charge: vec![50.0, 50.0],
            min_seed_charge: vec![5.0, 5.0, 5.0],
            ..FilterConfig::default()
        };
        let mut filter = ClusterFilter::new(config, 3);
        assert!(!filter.ledger().is_registered(MIN_TOTAL_CHARGE_CUT));
        assert!(filter.ledger().is_registered(MIN_SEED_CHARGE_CUT));

        let clusters = vec![sparse_cluster(2, 0, &[10.0])];
        match filter.filter_event(&clusters) {
            FilterOutcome::Accepted(accepted) => assert_eq!(accepted.len(), 1),
            FilterOutcome::Empty => panic!("disabled criterion must not reject"),
        }
    }

    #[test]
    fn test_n_charge_short_circuits_in_increasing_order() {
        let config = FilterConfig {
            min_n_charge: vec![
                NChargeCut {
                    n: 4,
                    thresholds: vec![100.0],
                },
                NChargeCut {
                    n: 1,
                    thresholds: vec![15.0],
                },
            ],
            ..FilterConfig::default()
        };
        let mut filter = ClusterFilter::new(config, 1);

        // Seed charge 10 fails the N=1 cut; counted once despite the N=4
        // cut also failing.
        let clusters = vec![sparse_cluster(0, 0, &[10.0, 5.0, 5.0, 5.0])];
        let outcome = filter.filter_event(&clusters);
        assert!(matches!(outcome, FilterOutcome::Empty));
        assert_eq!(filter.ledger().count(MIN_N_CHARGE_CUT, 0), 1);
    }

    #[test]
    fn test_quality_requires_exact_code() {
        let config = FilterConfig {
            required_quality: vec![0, -1],
            ..FilterConfig::default()
        };
        let mut filter = ClusterFilter::new(config, 2);

        let good = sparse_cluster(0, 0, &[10.0]);
        let mut flagged = sparse_cluster(0, 1, &[10.0]);
        flagged.1.quality = ClusterQuality::BORDER;
        // Plane 1 has the check disabled, any quality passes.
        let mut other_plane = sparse_cluster(1, 0, &[10.0]);
        other_plane.1.quality = ClusterQuality::MERGED;

        let outcome = filter.filter_event(&[good, flagged, other_plane]);
        assert_eq!(outcome.clusters().len(), 2);
        assert_eq!(filter.ledger().count(CLUSTER_QUALITY_CUT, 0), 1);
    }

    #[test]
    fn test_one_cluster_can_feed_several_counters() {
        let config = FilterConfig {
            min_total_charge: vec![100.0],
            min_seed_charge: vec![50.0],
            ..FilterConfig::default()
        };
        let mut filter = ClusterFilter::new(config, 1);

        let clusters = vec![sparse_cluster(0, 0, &[10.0])];
        let outcome = filter.filter_event(&clusters);
        assert!(matches!(outcome, FilterOutcome::Empty));
        assert_eq!(filter.ledger().count(MIN_TOTAL_CHARGE_CUT, 0), 1);
        assert_eq!(filter.ledger().count(MIN_SEED_CHARGE_CUT, 0), 1);
    }

    #[test]
    fn test_max_count_discards_whole_event() {
        let config = FilterConfig {
            max_cluster_count: vec![2, -1],
            ..FilterConfig::default()
        };
        let mut filter = ClusterFilter::new(config, 2);

        let clusters = vec![
            sparse_cluster(0, 0, &[10.0]),
            sparse_cluster(0, 1, &[10.0]),
            sparse_cluster(0, 2, &[10.0]),
            sparse_cluster(1, 0, &[10.0]),
        ];

        let outcome = filter.filter_event(&clusters);
        // Plane 1 was fine, but the whole event goes.
        assert!(matches!(outcome, FilterOutcome::Empty));
        // One event-level rejection, not one per cluster.
        assert_eq!(filter.ledger().count(MAX_CLUSTER_NO_CUT, 0), 1);
        assert_eq!(filter.ledger().count(MAX_CLUSTER_NO_CUT, 1), 0);
    }

    #[test]
    fn test_min_count_rejects_event_with_sparse_plane() {
        let config = FilterConfig {
            min_cluster_count: vec![1, 2],
            ..FilterConfig::default()
        };
        let mut filter = ClusterFilter::new(config, 2);

        let clusters = vec![sparse_cluster(0, 0, &[10.0]), sparse_cluster(1, 0, &[10.0])];
        let outcome = filter.filter_event(&clusters);
        assert!(matches!(outcome, FilterOutcome::Empty));
        assert_eq!(filter.ledger().count(MIN_CLUSTER_NO_CUT, 1), 1);
    }

    #[test]
    fn test_accepted_records_are_fresh_copies() {
        let mut filter = ClusterFilter::new(FilterConfig::default(), 1);
        let clusters = vec![sparse_cluster(0, 3, &[25.0, 5.0])];

        match filter.filter_event(&clusters) {
            FilterOutcome::Accepted(accepted) => {
                assert_eq!(accepted.len(), 1);
                assert_eq!(accepted[0].1, clusters[0].1);
                assert_eq!(accepted[0].0, clusters[0].0);
            }
            FilterOutcome::Empty => panic!("cluster should pass"),
        }
    }
}
