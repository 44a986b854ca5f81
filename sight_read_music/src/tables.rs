// Difficulty parameter tables: the static catalogs every exercise draws from.
//
// Each catalog entry carries a minimum level and a base weight. Lookups filter
// by `min_level <= level`, so raising the level can only add options, never
// remove them. The weights here are the generator's tuning surface; the
// builders in preset.rs and progression.rs shape them further per request.
//
// Also home of the two cross-couplings that keep cognitive load roughly flat
// at a fixed level: keys with many accidentals pull rhythmic complexity and
// tempo back down (`effective_complexity`, `tempo_scale`).

use crate::pitch::Letter;
use serde::{Deserialize, Serialize};

/// Ticks per whole note. One tick is a sixteenth, the shortest value used.
pub const TICKS_PER_WHOLE: u32 = 16;

/// Difficulty level, always within `Level::MIN..=Level::MAX`. Deserializing
/// clamps the same way `Level::new` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64")]
pub struct Level(u8);

impl From<i64> for Level {
    fn from(raw: i64) -> Level {
        Level::new(raw)
    }
}

impl Level {
    pub const MIN: Level = Level(1);
    pub const MAX: Level = Level(8);

    /// Clamp an arbitrary request into the supported range.
    pub fn new(raw: i64) -> Level {
        Level(raw.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
    }

    /// Clamp into `1..=cap` (itself clamped to the supported range).
    pub fn capped(raw: i64, cap: u8) -> Level {
        let cap = cap.clamp(Self::MIN.0, Self::MAX.0);
        Level(raw.clamp(Self::MIN.0 as i64, cap as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Position of this level in [0, 1] across the full range.
    pub fn fraction(self) -> f64 {
        self.fraction_of(Self::MAX)
    }

    /// Position of this level in [0, 1] when `cap` is the highest level
    /// offered. A single-level range sits at 0.
    pub fn fraction_of(self, cap: Level) -> f64 {
        let span = cap.0.saturating_sub(Self::MIN.0);
        if span == 0 {
            return 0.0;
        }
        (self.0.saturating_sub(Self::MIN.0) as f64 / span as f64).min(1.0)
    }

    pub fn all() -> impl Iterator<Item = Level> {
        (Self::MIN.0..=Self::MAX.0).map(Level)
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// A key signature the generator may write.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyDef {
    /// ABC key label: tonic, optional `#`/`b`, trailing `m` for minor.
    pub label: &'static str,
    /// Sharps (positive) or flats (negative) in the signature.
    pub accidentals: i8,
    pub min_level: u8,
    pub base_weight: f64,
}

impl KeyDef {
    /// 0.0 for no accidentals, 1.0 for seven.
    pub fn hardness(&self) -> f64 {
        self.accidentals.unsigned_abs() as f64 / 7.0
    }

    pub fn is_minor(&self) -> bool {
        self.label.ends_with('m')
    }

    pub fn tonic(&self) -> Letter {
        self.label
            .chars()
            .next()
            .and_then(Letter::from_char)
            .unwrap_or(Letter::C)
    }
}

const fn key(label: &'static str, accidentals: i8, min_level: u8, base_weight: f64) -> KeyDef {
    KeyDef { label, accidentals, min_level, base_weight }
}

/// All 15 major and 15 minor key signatures.
pub const KEYS: [KeyDef; 30] = [
    key("C", 0, 1, 3.0),
    key("G", 1, 1, 3.0),
    key("F", -1, 1, 3.0),
    key("D", 2, 2, 3.0),
    key("Bb", -2, 2, 3.0),
    key("A", 3, 3, 2.7),
    key("Eb", -3, 3, 2.7),
    key("E", 4, 5, 2.4),
    key("Ab", -4, 5, 2.4),
    key("B", 5, 6, 2.1),
    key("Db", -5, 6, 2.1),
    key("F#", 6, 7, 1.8),
    key("Gb", -6, 7, 1.8),
    key("C#", 7, 8, 1.5),
    key("Cb", -7, 8, 1.5),
    key("Am", 0, 1, 3.0),
    key("Em", 1, 1, 3.0),
    key("Dm", -1, 1, 3.0),
    key("Bm", 2, 2, 3.0),
    key("Gm", -2, 2, 3.0),
    key("F#m", 3, 3, 2.7),
    key("Cm", -3, 3, 2.7),
    key("C#m", 4, 5, 2.4),
    key("Fm", -4, 5, 2.4),
    key("G#m", 5, 6, 2.1),
    key("Bbm", -5, 6, 2.1),
    key("D#m", 6, 7, 1.8),
    key("Ebm", -6, 7, 1.8),
    key("A#m", 7, 8, 1.5),
    key("Abm", -7, 8, 1.5),
];

pub fn keys_available_at(level: Level) -> Vec<&'static KeyDef> {
    KEYS.iter().filter(|k| k.min_level <= level.get()).collect()
}

// ---------------------------------------------------------------------------
// Meters
// ---------------------------------------------------------------------------

/// A time signature with its metric accent pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeterDef {
    pub label: &'static str,
    pub beats_per_bar: u8,
    pub beat_unit: u8,
    pub min_level: u8,
    pub base_weight: f64,
    /// 1-based beat indices. Always contains beat 1.
    pub strong_beats: &'static [u8],
    /// 1-based beat indices, disjoint from `strong_beats`.
    pub secondary_beats: &'static [u8],
}

impl MeterDef {
    pub fn ticks_per_beat(&self) -> u32 {
        TICKS_PER_WHOLE / self.beat_unit as u32
    }

    pub fn ticks_per_bar(&self) -> u32 {
        self.beats_per_bar as u32 * self.ticks_per_beat()
    }

    /// 1-based beat containing the given tick offset into the bar.
    pub fn beat_at(&self, tick: u32) -> u8 {
        (tick / self.ticks_per_beat()) as u8 + 1
    }
}

const fn meter(
    label: &'static str,
    beats_per_bar: u8,
    beat_unit: u8,
    min_level: u8,
    base_weight: f64,
    strong_beats: &'static [u8],
    secondary_beats: &'static [u8],
) -> MeterDef {
    MeterDef {
        label,
        beats_per_bar,
        beat_unit,
        min_level,
        base_weight,
        strong_beats,
        secondary_beats,
    }
}

pub const METERS: [MeterDef; 14] = [
    meter("2/4", 2, 4, 1, 3.5, &[1], &[]),
    meter("3/4", 3, 4, 1, 3.2, &[1], &[3]),
    meter("4/4", 4, 4, 1, 5.0, &[1], &[3]),
    meter("2/2", 2, 2, 2, 2.2, &[1], &[]),
    meter("3/8", 3, 8, 3, 1.6, &[1], &[3]),
    meter("4/8", 4, 8, 3, 1.3, &[1], &[3]),
    meter("6/8", 6, 8, 3, 2.4, &[1], &[4]),
    meter("3/2", 3, 2, 4, 1.4, &[1], &[3]),
    meter("4/2", 4, 2, 5, 1.0, &[1], &[3]),
    meter("6/4", 6, 4, 5, 1.1, &[1], &[4]),
    meter("9/8", 9, 8, 6, 1.2, &[1], &[4, 7]),
    meter("12/8", 12, 8, 7, 1.0, &[1], &[4, 7, 10]),
    meter("5/4", 5, 4, 7, 0.9, &[1], &[4]),
    meter("7/8", 7, 8, 8, 0.8, &[1], &[3, 5]),
];

pub fn meters_available_at(level: Level) -> Vec<&'static MeterDef> {
    METERS.iter().filter(|m| m.min_level <= level.get()).collect()
}

// ---------------------------------------------------------------------------
// Tempo and complexity coupling
// ---------------------------------------------------------------------------

/// Inclusive tempo range in quarter-note beats per minute.
pub fn tempo_range_at(level: Level) -> (u32, u32) {
    match level.get() {
        1 => (60, 72),
        2 => (60, 84),
        3 => (60, 96),
        4 => (70, 110),
        5 => (70, 120),
        6 => (80, 132),
        7 => (80, 144),
        _ => (80, 160),
    }
}

/// Tempo multiplier for a key: up to 15% slower for seven accidentals.
pub fn tempo_scale(key: &KeyDef) -> f64 {
    1.0 - 0.15 * key.hardness()
}

/// Rhythmic complexity in [0, 1] after the key-hardness penalty, with
/// `level` placed within `1..=cap`.
///
/// `jitter` is drawn by the caller from ±`COMPLEXITY_JITTER`.
pub fn effective_complexity(level: Level, cap: Level, key: &KeyDef, jitter: f64) -> f64 {
    (level.fraction_of(cap) - 0.35 * key.hardness() + jitter).clamp(0.0, 1.0)
}

pub const COMPLEXITY_JITTER: f64 = 0.05;

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

/// A note or rest length the bar fillers may draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationCandidate {
    pub ticks: u32,
    pub weight: f64,
    pub is_rest: bool,
}

impl DurationCandidate {
    pub const fn note(ticks: u32, weight: f64) -> Self {
        DurationCandidate { ticks, weight, is_rest: false }
    }

    pub const fn rest(ticks: u32, weight: f64) -> Self {
        DurationCandidate { ticks, weight, is_rest: true }
    }
}

pub const WHOLE: u32 = 16;
pub const HALF: u32 = 8;
pub const DOTTED_QUARTER: u32 = 6;
pub const QUARTER: u32 = 4;
pub const EIGHTH: u32 = 2;
pub const SIXTEENTH: u32 = 1;

/// The `L:` unit note length of the written score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseUnit {
    Eighth,
    Sixteenth,
}

impl BaseUnit {
    /// Complexity from which scores are written in sixteenth units.
    pub const SIXTEENTH_THRESHOLD: f64 = 0.55;

    pub fn for_complexity(complexity: f64) -> BaseUnit {
        if complexity >= Self::SIXTEENTH_THRESHOLD {
            BaseUnit::Sixteenth
        } else {
            BaseUnit::Eighth
        }
    }

    pub fn ticks(self) -> u32 {
        match self {
            BaseUnit::Eighth => EIGHTH,
            BaseUnit::Sixteenth => SIXTEENTH,
        }
    }

    /// Denominator written in the `L:1/n` header.
    pub fn denominator(self) -> u32 {
        TICKS_PER_WHOLE / self.ticks()
    }
}

/// Level from which sixteenth notes join the melody palette.
pub const SIXTEENTH_MIN_LEVEL: u8 = 4;

/// Melody duration palette for a complexity, meter and level.
///
/// Meters counted in half notes lean toward longer values (and gain whole
/// notes); meters counted in eighths lean slightly toward shorter ones.
pub fn duration_palette(complexity: f64, meter: &MeterDef, level: Level) -> Vec<DurationCandidate> {
    let den_factor = 4.0 / meter.beat_unit as f64;
    let long_boost = if den_factor > 1.0 { (den_factor - 1.0) * 0.25 } else { 0.0 };
    let short_penalty = if den_factor > 1.0 { (den_factor - 1.0) * 0.15 } else { 0.0 };

    let whole_w = if den_factor > 1.0 { 0.06 * (den_factor - 1.0) } else { 0.0 };
    let half_w = 0.18 + long_boost;
    let dotted_quarter_w = 0.12 + long_boost * 0.3;
    let quarter_w = 0.28;
    let eighth_w = (0.22 - 0.08 * complexity - short_penalty).max(0.10);
    let sixteenth_w = if level.get() >= SIXTEENTH_MIN_LEVEL && den_factor <= 1.0 {
        0.06 * complexity
    } else {
        0.0
    };

    let whole_rest_w = if den_factor > 1.0 { 0.02 * (den_factor - 1.0) } else { 0.0 };
    let half_rest_w = 0.06 + long_boost * 0.2;
    let quarter_rest_w = 0.08;
    let eighth_rest_w = (0.04 - short_penalty * 0.3).max(0.02);

    let mut palette = Vec::with_capacity(11);
    if whole_w > 0.0 {
        palette.push(DurationCandidate::note(WHOLE, whole_w));
    }
    palette.extend([
        DurationCandidate::note(HALF, half_w),
        DurationCandidate::note(DOTTED_QUARTER, dotted_quarter_w),
        DurationCandidate::note(QUARTER, quarter_w),
        DurationCandidate::note(EIGHTH, eighth_w),
        DurationCandidate::rest(HALF, half_rest_w),
        DurationCandidate::rest(QUARTER, quarter_rest_w),
        DurationCandidate::rest(EIGHTH, eighth_rest_w),
    ]);
    if whole_rest_w > 0.0 {
        palette.push(DurationCandidate::rest(WHOLE, whole_rest_w));
    }
    if sixteenth_w > 0.0 {
        palette.push(DurationCandidate::note(SIXTEENTH, sixteenth_w));
        palette.push(DurationCandidate::rest(SIXTEENTH, 0.02));
    }
    palette
}

// ---------------------------------------------------------------------------
// Chord progressions
// ---------------------------------------------------------------------------

/// A short diatonic progression, as 1-based scale degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressionDef {
    pub degrees: &'static [u8],
    pub min_level: u8,
    pub weight: f64,
}

const fn prog(degrees: &'static [u8], min_level: u8, weight: f64) -> ProgressionDef {
    ProgressionDef { degrees, min_level, weight }
}

/// Progression catalog. Colour chords unlock in order: ii, then vi, then iii.
pub const PROGRESSIONS: [ProgressionDef; 19] = [
    prog(&[1, 5, 1], 1, 3.0),
    prog(&[1, 4, 1], 1, 2.5),
    prog(&[1, 4, 5, 1], 1, 3.5),
    prog(&[1, 5, 4, 1], 1, 2.0),
    prog(&[1, 4, 5], 1, 2.5),
    prog(&[4, 5, 1], 1, 2.0),
    prog(&[1, 2, 5, 1], 3, 2.8),
    prog(&[1, 4, 2, 5], 3, 2.5),
    prog(&[2, 5, 1], 3, 2.2),
    prog(&[1, 2, 4, 5], 3, 2.0),
    prog(&[1, 6, 4, 5], 4, 3.0),
    prog(&[1, 5, 6, 4], 4, 2.8),
    prog(&[6, 4, 1, 5], 4, 2.5),
    prog(&[1, 4, 6, 5], 6, 2.0),
    prog(&[1, 6, 4, 2], 6, 1.8),
    prog(&[4, 1, 5, 6], 6, 1.5),
    prog(&[1, 3, 4, 5], 7, 1.0),
    prog(&[1, 3, 6, 4], 7, 0.9),
    prog(&[1, 5, 3, 4], 7, 0.8),
];

pub fn progressions_available_at(level: Level) -> Vec<&'static ProgressionDef> {
    PROGRESSIONS.iter().filter(|p| p.min_level <= level.get()).collect()
}

// ---------------------------------------------------------------------------
// Accompaniment and dynamics
// ---------------------------------------------------------------------------

/// Rhythmic density policy for the bass staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccompanimentStyle {
    /// Staff present but every bar is a full rest.
    None,
    /// One sustained chord root per bar.
    Drone,
    /// Mostly half and quarter notes.
    Halves,
    /// Half, dotted quarter, quarter and occasional eighth notes.
    Quarters,
}

impl AccompanimentStyle {
    pub fn for_level(level: Level) -> AccompanimentStyle {
        match level.get() {
            0..=2 => AccompanimentStyle::None,
            3 => AccompanimentStyle::Drone,
            4 => AccompanimentStyle::Halves,
            _ => AccompanimentStyle::Quarters,
        }
    }
}

/// Dynamic marking levels, softest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dynamic {
    P,
    Mp,
    Mf,
    F,
    Ff,
}

impl Dynamic {
    pub fn abc(self) -> &'static str {
        match self {
            Dynamic::P => "p",
            Dynamic::Mp => "mp",
            Dynamic::Mf => "mf",
            Dynamic::F => "f",
            Dynamic::Ff => "ff",
        }
    }
}

pub fn dynamics_available_at(level: Level) -> &'static [Dynamic] {
    match level.get() {
        0..=2 => &[Dynamic::P, Dynamic::F],
        3..=5 => &[Dynamic::P, Dynamic::Mp, Dynamic::Mf, Dynamic::F],
        _ => &[Dynamic::P, Dynamic::Mp, Dynamic::Mf, Dynamic::F, Dynamic::Ff],
    }
}
