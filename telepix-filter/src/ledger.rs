//! Run-scoped rejection accounting.

use std::fmt::Write as _;

/// Per-criterion, per-plane rejection counters.
///
/// Criteria appear in registration order; counters accumulate additively
/// across the whole run and are never reset. The ledger is passed
/// explicitly to every predicate that records rejections.
#[derive(Debug, Clone, Default)]
pub struct RejectionLedger {
    entries: Vec<(&'static str, Vec<u64>)>,
}

impl RejectionLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a criterion with one zeroed counter per plane.
    pub fn register(&mut self, criterion: &'static str, plane_count: usize) {
        debug_assert!(self.entries.iter().all(|(name, _)| *name != criterion));
        self.entries.push((criterion, vec![0; plane_count]));
    }

    /// Whether a criterion has been registered.
    #[must_use]
    pub fn is_registered(&self, criterion: &str) -> bool {
        self.entries.iter().any(|(name, _)| *name == criterion)
    }

    /// Counts one rejection for a criterion on a plane.
    pub fn record(&mut self, criterion: &str, plane: usize) {
        if let Some((_, counters)) = self.entries.iter_mut().find(|(name, _)| *name == criterion)
        {
            if let Some(counter) = counters.get_mut(plane) {
                *counter += 1;
            }
        }
    }

    /// Rejections counted for a criterion on a plane.
    #[must_use]
    pub fn count(&self, criterion: &str, plane: usize) -> u64 {
        self.entries
            .iter()
            .find(|(name, _)| *name == criterion)
            .and_then(|(_, counters)| counters.get(plane))
            .copied()
            .unwrap_or(0)
    }

    /// Total rejections for a criterion over all planes.
    #[must_use]
    pub fn total(&self, criterion: &str) -> u64 {
        self.entries
            .iter()
            .find(|(name, _)| *name == criterion)
            .map(|(_, counters)| counters.iter().sum())
            .unwrap_or(0)
    }

    /// Iterates criteria in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[u64])> {
        self.entries
            .iter()
            .map(|(name, counters)| (*name, counters.as_slice()))
    }

    /// Renders the run-end rejection table, one line per criterion.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("========================================================\n");
        out.push_str(" Rejection summary\n");
        out.push_str("========================================================\n");
        for (criterion, counters) in &self.entries {
            let _ = write!(out, " {criterion}\t");
            for counter in counters {
                let _ = write!(out, "{counter}  ");
            }
            out.push('\n');
            out.push_str("--------------------------------------------------------\n");
        }
        out.push_str("========================================================\n");
        out
    }
}
