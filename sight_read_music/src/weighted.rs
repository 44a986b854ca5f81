// Weighted random selection, the primitive behind every musical choice.
//
// Every decision in the generator (key, meter, duration, letter, chord tone,
// progression) is a draw from a small candidate list with hand-tuned weights.
// Constraint satisfaction is approximate: callers shape weights instead of
// rejecting and retrying, which keeps generation linear in the bar count.
//
// Callers floor weights to `WEIGHT_EPSILON` so a distribution never collapses
// to all zeros. If it does anyway, selection degrades to a uniform pick
// rather than failing.

use rand::Rng;

/// Lower bound callers apply to shaped weights.
pub const WEIGHT_EPSILON: f64 = 0.0001;

/// Pick an index with probability proportional to `weights[i]`.
///
/// Consumes exactly one draw from `rng`. The first index whose cumulative
/// weight exceeds the draw wins, so equal draws resolve to the earlier item.
/// Returns None only when `weights` is empty.
pub fn pick_weighted_index(weights: &[f64], rng: &mut impl Rng) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    if total <= 0.0 || !total.is_finite() {
        tracing::debug!(candidates = weights.len(), "degenerate weights, picking uniformly");
        return Some(rng.random_range(0..weights.len()));
    }

    let r = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        let w = w.max(0.0);
        if w > 0.0 {
            last_positive = i;
        }
        cumulative += w;
        if cumulative > r {
            return Some(i);
        }
    }
    // Rounding can leave the draw a hair above the final sum.
    Some(last_positive)
}

/// Pick one item with probability proportional to `weight(item)`.
pub fn pick_weighted<'a, T>(
    items: &'a [T],
    weight: impl Fn(&T) -> f64,
    rng: &mut impl Rng,
) -> Option<&'a T> {
    let weights: Vec<f64> = items.iter().map(weight).collect();
    pick_weighted_index(&weights, rng).map(|i| &items[i])
}
