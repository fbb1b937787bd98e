//! telepix-filter: Multi-criterion cluster filtering.
//!
//! Applies independently-toggleable per-cluster criteria (total charge,
//! N-pixel charge, seed charge, required quality) and per-plane aggregate
//! criteria (minimum/maximum cluster count) to the clustering output,
//! accumulating a per-criterion, per-plane rejection ledger across the run.
#![warn(missing_docs)]

mod config;
mod engine;
mod ledger;

pub use config::{FilterConfig, NChargeCut};
pub use engine::{ClusterFilter, FilterOutcome};
pub use ledger::RejectionLedger;
