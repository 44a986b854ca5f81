// Bass-staff accompaniment.
//
// The accompaniment style from the preset decides the texture:
// - None: a full-bar rest in every bar
// - Drone: one sustained chord root per bar
// - Halves / Quarters: bars filled from a fixed duration palette, each note a
//   chord tone of that bar's planned chord
//
// Chord tones are weighted root > fifth > third and always voiced at their
// lowest position in the bass pool. The final bar is rewritten later by the
// cadence finisher.

use crate::pitch::{Letter, Pitch, triad};
use crate::score::{Bar, Token};
use crate::tables::{AccompanimentStyle, DOTTED_QUARTER, DurationCandidate, EIGHTH, HALF, QUARTER};
use crate::weighted::{pick_weighted, pick_weighted_index};
use rand::Rng;

const HALVES_PALETTE: [DurationCandidate; 4] = [
    DurationCandidate::note(HALF, 0.55),
    DurationCandidate::note(QUARTER, 0.25),
    DurationCandidate::rest(HALF, 0.12),
    DurationCandidate::rest(QUARTER, 0.08),
];

const QUARTERS_PALETTE: [DurationCandidate; 7] = [
    DurationCandidate::note(HALF, 0.40),
    DurationCandidate::note(DOTTED_QUARTER, 0.15),
    DurationCandidate::note(QUARTER, 0.30),
    DurationCandidate::note(EIGHTH, 0.05),
    DurationCandidate::rest(HALF, 0.05),
    DurationCandidate::rest(QUARTER, 0.04),
    DurationCandidate::rest(EIGHTH, 0.01),
];

/// Weights for root, third and fifth.
const CHORD_TONE_WEIGHTS: [f64; 3] = [3.0, 0.8, 1.5];

/// Lowest pool pitch with the given letter.
pub fn lowest_in_pool(pool: &[Pitch], letter: Letter) -> Option<Pitch> {
    pool.iter()
        .copied()
        .filter(|p| p.letter == letter)
        .min_by_key(|p| p.staff_step())
}

/// Voice `letter` at its lowest pool position, falling back to the lowest
/// pool pitch when the letter is missing.
fn voice_in_pool(pool: &[Pitch], letter: Letter) -> Pitch {
    lowest_in_pool(pool, letter)
        .or_else(|| pool.iter().copied().min_by_key(|p| p.staff_step()))
        .unwrap_or(Pitch::new(letter, 3))
}

/// Draw a chord tone of the triad on `degree` and voice it low.
fn pick_chord_tone(pool: &[Pitch], degree: u8, tonic: Letter, rng: &mut impl Rng) -> Pitch {
    let tones = triad(degree, tonic);
    let letter = pick_weighted_index(&CHORD_TONE_WEIGHTS, rng)
        .map(|i| tones[i])
        .unwrap_or(tones[0]);
    voice_in_pool(pool, letter)
}

fn palette_for(style: AccompanimentStyle) -> &'static [DurationCandidate] {
    match style {
        AccompanimentStyle::Halves => &HALVES_PALETTE,
        AccompanimentStyle::Quarters => &QUARTERS_PALETTE,
        AccompanimentStyle::None | AccompanimentStyle::Drone => &[],
    }
}

/// Fill one bar from the palette. Rests never open a bar or follow a rest,
/// and a remainder no candidate fits becomes one chord tone.
fn fill_bar(
    palette: &[DurationCandidate],
    pool: &[Pitch],
    bar_ticks: u32,
    degree: u8,
    tonic: Letter,
    rng: &mut impl Rng,
) -> Bar {
    let mut bar = Bar::default();
    let mut used = 0;
    let mut prev_rest = false;
    while used < bar_ticks {
        let remaining = bar_ticks - used;
        let no_rest = used == 0 || prev_rest;
        let candidates: Vec<&DurationCandidate> = palette
            .iter()
            .filter(|d| d.ticks <= remaining && !(d.is_rest && no_rest))
            .collect();
        let (ticks, is_rest) = match pick_weighted(&candidates, |d| d.weight, rng) {
            Some(d) => (d.ticks, d.is_rest),
            None => (remaining, false),
        };
        if is_rest {
            bar.tokens.push(Token::rest(ticks));
        } else {
            bar.tokens.push(Token::note(pick_chord_tone(pool, degree, tonic, rng), ticks));
        }
        prev_rest = is_rest;
        used += ticks;
    }
    bar
}

/// Generate every accompaniment bar.
pub fn generate_accompaniment(
    style: AccompanimentStyle,
    pool: &[Pitch],
    bar_ticks: u32,
    chord_plan: &[u8],
    tonic: Letter,
    rng: &mut impl Rng,
) -> Vec<Bar> {
    chord_plan
        .iter()
        .map(|&degree| match style {
            AccompanimentStyle::None => Bar::single(Token::rest(bar_ticks)),
            AccompanimentStyle::Drone => {
                let [root, _, _] = triad(degree, tonic);
                Bar::single(Token::note(voice_in_pool(pool, root), bar_ticks))
            }
            AccompanimentStyle::Halves | AccompanimentStyle::Quarters => {
                fill_bar(palette_for(style), pool, bar_ticks, degree, tonic, rng)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::lh_pool;
    use crate::tables::METERS;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const PLAN: [u8; 6] = [1, 4, 6, 2, 5, 1];

    #[test]
    fn test_none_style_is_silent() {
        let mut rng = StdRng::seed_from_u64(1);
        let bars =
            generate_accompaniment(AccompanimentStyle::None, &lh_pool(0.2), 12, &PLAN, Letter::C, &mut rng);
        assert_eq!(bars.len(), PLAN.len());
        for bar in &bars {
            assert_eq!(bar.tokens.len(), 1);
            assert!(bar.tokens[0].is_rest());
            assert_eq!(bar.total_ticks(), 12);
        }
    }

    #[test]
    fn test_drone_holds_chord_root() {
        let pool = lh_pool(0.4);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let bars = generate_accompaniment(AccompanimentStyle::Drone, &pool, 16, &PLAN, Letter::G, &mut rng);
            for (bar, &degree) in bars.iter().zip(&PLAN) {
                assert_eq!(bar.tokens.len(), 1);
                let pitch = bar.tokens[0].pitches()[0];
                assert_eq!(pitch.letter, triad(degree, Letter::G)[0], "bar on degree {degree}");
                assert_eq!(pitch.octave, 3);
                assert_eq!(bar.total_ticks(), 16);
            }
        }
    }

    #[test]
    fn test_filled_styles_sum_to_bar_length() {
        let pool = lh_pool(0.8);
        let mut rng = StdRng::seed_from_u64(3);
        for style in [AccompanimentStyle::Halves, AccompanimentStyle::Quarters] {
            for m in &METERS {
                for _ in 0..10 {
                    let bars = generate_accompaniment(style, &pool, m.ticks_per_bar(), &PLAN, Letter::F, &mut rng);
                    for bar in &bars {
                        assert_eq!(bar.total_ticks(), m.ticks_per_bar(), "{style:?} in {}", m.label);
                        assert!(!bar.tokens[0].is_rest());
                        for pair in bar.tokens.windows(2) {
                            assert!(!(pair[0].is_rest() && pair[1].is_rest()));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_notes_are_low_chord_tones() {
        let pool = lh_pool(0.8);
        let mut rng = StdRng::seed_from_u64(4);
        let bars = generate_accompaniment(AccompanimentStyle::Quarters, &pool, 16, &PLAN, Letter::D, &mut rng);
        for (bar, &degree) in bars.iter().zip(&PLAN) {
            for t in bar.tokens.iter().filter(|t| !t.is_rest()) {
                let p = t.pitches()[0];
                assert!(triad(degree, Letter::D).contains(&p.letter));
                assert_eq!(p.octave, 3, "{p} not in lowest position");
            }
        }
    }

    #[test]
    fn test_root_is_most_common() {
        let pool = lh_pool(0.2);
        let mut rng = StdRng::seed_from_u64(5);
        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            let p = pick_chord_tone(&pool, 1, Letter::C, &mut rng);
            let i = triad(1, Letter::C).iter().position(|&l| l == p.letter).unwrap();
            counts[i] += 1;
        }
        assert!(counts[0] > counts[2] && counts[2] > counts[1], "counts {counts:?}");
    }

    #[test]
    fn test_lowest_in_pool() {
        let pool = [Pitch::new(Letter::E, 4), Pitch::new(Letter::E, 3), Pitch::new(Letter::G, 3)];
        assert_eq!(lowest_in_pool(&pool, Letter::E), Some(Pitch::new(Letter::E, 3)));
        assert_eq!(lowest_in_pool(&pool, Letter::A), None);
    }
}
