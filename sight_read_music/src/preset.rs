// Preset building: resolving one level into a concrete exercise setup.
//
// A preset fixes everything the bar generators need: key, meter, tempo,
// duration palette, pitch pools for both hands, accompaniment style and the
// dynamics palette. All sub-choices are independent weighted draws from the
// catalogs in tables.rs. There is no backtracking: a hard key paired with a
// busy meter is accepted as drawn, and the key-hardness coupling in
// `effective_complexity` keeps the rhythm and tempo tractable instead.
//
// Presets own their pools and palettes, so nothing is shared between
// generations.

use crate::pitch::{Letter, Pitch};
use crate::tables::{
    self, AccompanimentStyle, BaseUnit, COMPLEXITY_JITTER, DurationCandidate, Dynamic, KeyDef,
    Level, MeterDef,
};
use crate::weighted::{WEIGHT_EPSILON, pick_weighted};
use rand::Rng;
use serde::Serialize;

/// Everything resolved for one exercise.
#[derive(Debug, Clone, Serialize)]
pub struct Preset {
    pub level: Level,
    pub tempo_bpm: u32,
    pub key: KeyDef,
    pub meter: MeterDef,
    pub total_bars: usize,
    pub bars_per_line: usize,
    /// Rhythmic complexity after key-hardness penalty and jitter, in [0, 1].
    pub complexity: f64,
    pub base_unit: BaseUnit,
    pub durations: Vec<DurationCandidate>,
    /// Treble pitches; duplicates weight the middle of the staff.
    pub rh_pool: Vec<Pitch>,
    /// Bass pitches.
    pub lh_pool: Vec<Pitch>,
    pub accompaniment: AccompanimentStyle,
    pub dynamics: Vec<Dynamic>,
}

impl Preset {
    pub fn tonic(&self) -> Letter {
        self.key.tonic()
    }

    pub fn bar_ticks(&self) -> u32 {
        self.meter.ticks_per_bar()
    }

    /// Bar length in `L:` units.
    pub fn units_per_bar(&self) -> u32 {
        self.bar_ticks() / self.base_unit.ticks()
    }
}

const RH_BASE: [Pitch; 14] = [
    Pitch::new(Letter::G, 4),
    Pitch::new(Letter::A, 4),
    Pitch::new(Letter::B, 4),
    Pitch::new(Letter::B, 4),
    Pitch::new(Letter::C, 5),
    Pitch::new(Letter::C, 5),
    Pitch::new(Letter::C, 5),
    Pitch::new(Letter::D, 5),
    Pitch::new(Letter::D, 5),
    Pitch::new(Letter::D, 5),
    Pitch::new(Letter::E, 5),
    Pitch::new(Letter::E, 5),
    Pitch::new(Letter::F, 5),
    Pitch::new(Letter::G, 5),
];

/// Build the treble pool, unlocking higher notes as complexity grows.
pub fn rh_pool(complexity: f64) -> Vec<Pitch> {
    let mut pool = RH_BASE.to_vec();
    if complexity >= 0.5 {
        pool.extend([Pitch::new(Letter::A, 5), Pitch::new(Letter::B, 5)]);
    }
    if complexity >= 0.7 {
        pool.push(Pitch::new(Letter::C, 6));
    }
    if complexity >= 0.85 {
        pool.push(Pitch::new(Letter::D, 6));
    }
    pool
}

/// Build the bass pool: one octave below middle C, plus the octave above
/// once complexity reaches 0.5.
pub fn lh_pool(complexity: f64) -> Vec<Pitch> {
    let mut pool: Vec<Pitch> = Letter::ALL.iter().map(|&l| Pitch::new(l, 3)).collect();
    if complexity >= 0.5 {
        pool.extend(Letter::ALL.iter().map(|&l| Pitch::new(l, 4)));
    }
    pool
}

/// Draw a key, favouring few accidentals at low levels and many at high ones.
pub fn pick_key(level: Level, rng: &mut impl Rng) -> KeyDef {
    let g = level.fraction();
    let available = tables::keys_available_at(level);
    pick_weighted(
        &available,
        |k| {
            let acc = k.accidentals.unsigned_abs() as f64;
            let soft = 1.0 / (1.0 + acc);
            let hard = 0.4 + acc / 7.0;
            k.base_weight * ((1.0 - g) * soft + g * hard) + 0.01
        },
        rng,
    )
    .map(|k| **k)
    .unwrap_or(tables::KEYS[0])
}

/// Draw a meter. Meters available for longer get a familiarity bonus.
pub fn pick_meter(level: Level, rng: &mut impl Rng) -> MeterDef {
    let available = tables::meters_available_at(level);
    pick_weighted(
        &available,
        |m| {
            let familiarity = 1.0 + 0.15 * level.get().saturating_sub(m.min_level) as f64;
            (m.base_weight * familiarity).max(WEIGHT_EPSILON)
        },
        rng,
    )
    .map(|m| **m)
    .unwrap_or(tables::METERS[0])
}

/// Draw a tempo within the level's range, scaled down for hard keys.
pub fn pick_tempo(level: Level, key: &KeyDef, rng: &mut impl Rng) -> u32 {
    let (low, high) = tables::tempo_range_at(level);
    let scale = tables::tempo_scale(key);
    let low = (low as f64 * scale).round() as u32;
    let high = (high as f64 * scale).round() as u32;
    rng.random_range(low..=high.max(low))
}

/// Resolve a level into a full preset. `cap` is the highest level offered;
/// complexity spans `1..=cap`, so the top level of a shorter ladder still
/// reaches full complexity.
pub fn build_preset(
    level: Level,
    cap: Level,
    total_bars: usize,
    bars_per_line: usize,
    rng: &mut impl Rng,
) -> Preset {
    let key = pick_key(level, rng);
    let jitter = rng.random_range(-COMPLEXITY_JITTER..COMPLEXITY_JITTER);
    let complexity = tables::effective_complexity(level, cap, &key, jitter);
    let tempo_bpm = pick_tempo(level, &key, rng);
    let meter = pick_meter(level, rng);
    let durations = tables::duration_palette(complexity, &meter, level);
    let accompaniment = AccompanimentStyle::for_level(level);

    tracing::debug!(
        level = level.get(),
        key = key.label,
        meter = meter.label,
        tempo_bpm,
        complexity,
        ?accompaniment,
        "built preset"
    );

    Preset {
        level,
        tempo_bpm,
        key,
        meter,
        total_bars: total_bars.max(1),
        bars_per_line: bars_per_line.max(1),
        complexity,
        base_unit: BaseUnit::for_complexity(complexity),
        durations,
        rh_pool: rh_pool(complexity),
        lh_pool: lh_pool(complexity),
        accompaniment,
        dynamics: tables::dynamics_available_at(level).to_vec(),
    }
}
