// Cadence finishing: rewriting the final token of each staff so the piece
// lands on the last planned chord.
//
// Only the sound of the final token changes. Its duration and any attached
// decorations are kept, so bar lengths are untouched. The bass chord grows
// richer with level (open fifth, triad, seventh, ninth) and is always voiced
// as low as the bass pool allows.

use crate::accompaniment::lowest_in_pool;
use crate::melody::pick_pitch_near;
use crate::pitch::{Letter, Pitch, degree_letter, triad};
use crate::score::{Bar, Sound};
use crate::tables::{AccompanimentStyle, Level};
use rand::Rng;

/// Chance the melody ends on the root; otherwise it tries the fifth first.
const ROOT_FIRST_CHANCE: f64 = 0.7;

/// Inputs the cadence finisher reads.
#[derive(Debug, Clone, Copy)]
pub struct CadenceContext<'a> {
    pub chord_plan: &'a [u8],
    pub tonic: Letter,
    pub level: Level,
    pub style: AccompanimentStyle,
    pub rh_pool: &'a [Pitch],
    pub lh_pool: &'a [Pitch],
}

/// Letters of the closing bass chord on `degree`, by level.
pub fn final_chord_letters(degree: u8, tonic: Letter, level: Level) -> Vec<Letter> {
    let [root, third, fifth] = triad(degree, tonic);
    let mut letters = match level.get() {
        0..=3 => vec![root, fifth],
        _ => vec![root, third, fifth],
    };
    if level.get() >= 7 {
        letters.push(degree_letter(tonic, degree + 6));
    }
    if level.get() >= 8 {
        letters.push(degree_letter(tonic, degree + 8));
    }
    letters
}

/// Voice chord letters at their lowest pool positions, dropping letters the
/// pool lacks and duplicate pitches.
fn voice_low(pool: &[Pitch], letters: &[Letter]) -> Vec<Pitch> {
    let mut pitches: Vec<Pitch> = Vec::with_capacity(letters.len());
    for &letter in letters {
        match lowest_in_pool(pool, letter) {
            Some(p) if !pitches.contains(&p) => pitches.push(p),
            _ => {}
        }
    }
    pitches.sort_by_key(|p| p.staff_step());
    pitches
}

/// Rewrite the final tokens of both staves.
pub fn finish_cadence(
    rh: &mut [Bar],
    lh: &mut [Bar],
    ctx: &CadenceContext<'_>,
    rng: &mut impl Rng,
) {
    let degree = ctx.chord_plan.last().copied().unwrap_or(1);
    let [root, third, fifth] = triad(degree, ctx.tonic);

    let order = if rng.random_bool(ROOT_FIRST_CHANCE) {
        [root, third, fifth]
    } else {
        [fifth, root, third]
    };
    let prev_pitch = rh
        .last()
        .and_then(|bar| bar.tokens.iter().rev().skip(1).find_map(|t| t.pitches().first().copied()));
    let letter = order.into_iter().find(|l| ctx.rh_pool.iter().any(|p| p.letter == *l));
    if let (Some(letter), Some(last)) = (letter, rh.last_mut().and_then(|bar| bar.tokens.last_mut())) {
        last.sound = Sound::Note(pick_pitch_near(ctx.rh_pool, letter, prev_pitch, rng));
    }

    if ctx.style == AccompanimentStyle::None {
        return;
    }
    let letters = final_chord_letters(degree, ctx.tonic, ctx.level);
    let mut voicing = voice_low(ctx.lh_pool, &letters);
    let sound = match voicing.len() {
        0 => return,
        1 => Sound::Note(voicing.remove(0)),
        _ => Sound::Chord(voicing),
    };
    if let Some(last) = lh.last_mut().and_then(|bar| bar.tokens.last_mut()) {
        last.sound = sound;
    }
    tracing::debug!(degree, ?letters, "finished cadence");
}
