// Chord progression planning: one diatonic chord per bar.
//
// The plan is stitched together from short catalog progressions (see
// `tables::PROGRESSIONS`), drawn with a familiarity bonus for progressions
// that have been available for several levels, then cut to length and closed
// with a fixed dominant-tonic cadence. Both bar generators and the cadence
// finisher read the same plan, so melody and bass agree on the harmony.

use crate::tables::{self, Level};
use crate::weighted::{WEIGHT_EPSILON, pick_weighted};
use rand::Rng;

/// Closing degrees of every plan with at least two bars.
pub const CADENCE: [u8; 2] = [5, 1];

/// Build a bar-by-bar sequence of scale degrees (1..=7).
///
/// Plans of two or more bars always end `[5, 1]`. A single bar is just the
/// tonic.
pub fn build_chord_plan(bars: usize, level: Level, rng: &mut impl Rng) -> Vec<u8> {
    if bars < 2 {
        return vec![1];
    }

    let available = tables::progressions_available_at(level);
    let target = bars - CADENCE.len();
    let mut degrees: Vec<u8> = Vec::with_capacity(bars + 4);

    while degrees.len() < target {
        let Some(next) = pick_weighted(
            &available,
            |p| {
                let familiarity = 1.0 + 0.1 * level.get().saturating_sub(p.min_level) as f64;
                (p.weight * familiarity).max(WEIGHT_EPSILON)
            },
            rng,
        ) else {
            // Only reachable with an empty catalog; hold the tonic.
            degrees.resize(target, 1);
            break;
        };
        degrees.extend_from_slice(next.degrees);
    }

    degrees.truncate(target);
    degrees.extend_from_slice(&CADENCE);
    tracing::debug!(?degrees, "planned chords");
    degrees
}
