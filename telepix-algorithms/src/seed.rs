//! Seed candidate selection.

use telepix_core::PixelStatus;

/// One seed candidate: a pixel whose significance clears the seed cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedCandidate {
    /// Linear pixel index on the plane.
    pub index: usize,
    /// Charge over noise of the pixel.
    pub significance: f32,
}

/// Scans a plane and returns seed candidates ordered by descending
/// significance.
///
/// A pixel qualifies when its status is `Good` and its charge exceeds
/// `seed_cut` times its noise. Ties keep insertion order (stable sort).
/// The returned sequence is never mutated by the builders; consumed seeds
/// are skipped through the status map instead.
#[must_use]
pub fn select_seeds(
    charges: &[f32],
    noise: &[f32],
    status: &[PixelStatus],
    seed_cut: f32,
) -> Vec<SeedCandidate> {
    debug_assert_eq!(charges.len(), noise.len());
    debug_assert_eq!(charges.len(), status.len());

    let mut candidates = Vec::new();
    for (index, charge) in charges.iter().enumerate() {
        if status[index] != PixelStatus::Good {
            continue;
        }
        if *charge > seed_cut * noise[index] {
            candidates.push(SeedCandidate {
                index,
                significance: charge / noise[index],
            });
        }
    }
    candidates.sort_by(|a, b| b.significance.total_cmp(&a.significance));
    candidates
}
