// Melody generation for the treble staff.
//
// Each bar is filled left to right by drawing durations from the preset's
// palette until the bar is full. Weight shaping, not rejection, steers the
// rhythm:
// - the fastest value is damped after three in a row,
// - a longer value is boosted near the end of a bar that has none yet,
// - rests are ineligible at the start of a bar and straight after a rest.
//
// Pitches are chosen as letters first (stepwise motion favoured, chord tones
// favoured on strong beats and often on secondary beats) and then placed in
// register from the pitch pool, preferring the octave nearest the previous
// note. Melodic state carries across barlines.

use crate::pitch::{Letter, Pitch, diatonic_letters, step_distance, triad};
use crate::score::{Bar, Token};
use crate::tables::{DurationCandidate, MeterDef};
use crate::weighted::{WEIGHT_EPSILON, pick_weighted, pick_weighted_index};
use rand::Rng;

/// Consecutive fastest notes tolerated before that value is damped.
const MAX_FAST_RUN: u32 = 3;

/// Chance a note on a secondary beat prefers chord tones.
const SECONDARY_CHORD_TONE_CHANCE: f64 = 0.6;

/// Inputs for one melody staff.
#[derive(Debug, Clone, Copy)]
pub struct MelodyContext<'a> {
    pub pool: &'a [Pitch],
    pub durations: &'a [DurationCandidate],
    pub bar_ticks: u32,
    pub bars: usize,
    pub chord_plan: &'a [u8],
    pub tonic: Letter,
    pub meter: &'a MeterDef,
}

/// Rhythmic state while filling one bar.
#[derive(Debug, Default)]
struct BarState {
    used: u32,
    fast_run: u32,
    has_longer: bool,
    prev_rest: bool,
}

/// Weight a letter by chord-tone preference and step distance from the
/// previous letter. Repeated letters are discounted, not forbidden.
fn letter_weight(letter: Letter, preferred: Option<&[Letter]>, prev: Option<Letter>) -> f64 {
    let mut w = 1.0;
    if preferred.is_some_and(|p| p.contains(&letter)) {
        w *= 2.2;
    }
    if let Some(prev) = prev {
        w *= match step_distance(prev, letter) {
            0 => 0.15,
            1 => 1.4,
            2 => 0.9,
            3 => 0.4,
            _ => 0.2,
        };
    }
    w
}

/// Draw a scale letter for the next melody note.
pub fn pick_letter(
    scale: &[Letter; 7],
    preferred: Option<&[Letter]>,
    prev: Option<Letter>,
    rng: &mut impl Rng,
) -> Letter {
    pick_weighted(scale, |&l| letter_weight(l, preferred, prev), rng)
        .copied()
        .unwrap_or(scale[0])
}

/// Place a letter in register: pool entries with that letter, weighted by
/// closeness to the previous pitch (pool duplicates count separately).
///
/// If the pool has no such letter, any pool pitch is drawn instead.
pub fn pick_pitch_near(
    pool: &[Pitch],
    letter: Letter,
    prev: Option<Pitch>,
    rng: &mut impl Rng,
) -> Pitch {
    let candidates: Vec<Pitch> = pool.iter().copied().filter(|p| p.letter == letter).collect();
    if candidates.is_empty() {
        tracing::debug!(?letter, "letter missing from pool, drawing any pitch");
        return match pool.len() {
            0 => Pitch::new(letter, 5),
            n => pool[rng.random_range(0..n)],
        };
    }
    let weights: Vec<f64> = candidates
        .iter()
        .map(|c| match prev {
            Some(p) => 1.0 / (1.0 + (c.staff_step() - p.staff_step()).abs() as f64 / 4.0),
            None => 1.0,
        })
        .collect();
    pick_weighted_index(&weights, rng)
        .map(|i| candidates[i])
        .unwrap_or(candidates[0])
}

/// Weight of a duration candidate given the bar so far.
fn duration_weight(d: &DurationCandidate, state: &BarState, remaining: u32, fastest: u32) -> f64 {
    let mut w = d.weight;
    if d.ticks == fastest && state.fast_run >= MAX_FAST_RUN {
        w *= 0.2;
    }
    if !state.has_longer && remaining <= fastest * 2 && d.ticks > fastest {
        w *= 3.0;
    }
    w.max(WEIGHT_EPSILON)
}

/// Generate every melody bar for the exercise.
pub fn generate_melody(ctx: &MelodyContext<'_>, rng: &mut impl Rng) -> Vec<Bar> {
    let scale = diatonic_letters(ctx.tonic);
    let fastest = ctx.durations.iter().map(|d| d.ticks).min().unwrap_or(ctx.bar_ticks);
    let mut prev_letter: Option<Letter> = None;
    let mut prev_pitch: Option<Pitch> = None;
    let mut bars = Vec::with_capacity(ctx.bars);

    for b in 0..ctx.bars {
        let chord = triad(ctx.chord_plan.get(b).copied().unwrap_or(1), ctx.tonic);
        let mut state = BarState::default();
        let mut bar = Bar::default();

        while state.used < ctx.bar_ticks {
            let remaining = ctx.bar_ticks - state.used;
            let no_rest = state.used == 0 || state.prev_rest;
            let candidates: Vec<&DurationCandidate> = ctx
                .durations
                .iter()
                .filter(|d| d.ticks <= remaining && !(d.is_rest && no_rest))
                .collect();

            // Nothing fits: close the bar with one note of the exact remainder.
            let (ticks, is_rest) = match pick_weighted(
                &candidates,
                |d| duration_weight(d, &state, remaining, fastest),
                rng,
            ) {
                Some(d) => (d.ticks, d.is_rest),
                None => (remaining, false),
            };

            if is_rest {
                bar.tokens.push(Token::rest(ticks));
                state.prev_rest = true;
            } else {
                let beat = ctx.meter.beat_at(state.used);
                let prefer_chord = ctx.meter.strong_beats.contains(&beat)
                    || (ctx.meter.secondary_beats.contains(&beat)
                        && rng.random_bool(SECONDARY_CHORD_TONE_CHANCE));
                let preferred = prefer_chord.then_some(&chord[..]);
                let letter = pick_letter(&scale, preferred, prev_letter, rng);
                let pitch = pick_pitch_near(ctx.pool, letter, prev_pitch, rng);
                bar.tokens.push(Token::note(pitch, ticks));
                state.prev_rest = false;
                prev_letter = Some(letter);
                prev_pitch = Some(pitch);
            }

            state.used += ticks;
            if ticks == fastest {
                state.fast_run += 1;
            } else {
                state.fast_run = 0;
                state.has_longer = true;
            }
        }
        bars.push(bar);
    }
    bars
}
