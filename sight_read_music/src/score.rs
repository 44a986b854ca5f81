// Score representation and ABC serialization.
//
// Bars are sequences of tokens (note, chord or rest) with tick durations and
// attached decorations. The bar generators build them, the cadence finisher
// and dynamics pass edit them in place, and `assemble` writes the final
// two-staff ABC text: header, then one `[V:RH]` / `[V:LH]` line pair per
// system.
//
// Durations are stored in ticks (sixteenths) and only converted to `L:`
// units when rendering, so a sixteenth against an eighth unit comes out as
// `/2` without any fractional arithmetic.
//
// The text is the sole artifact handed to rendering and playback; it is
// built once per generation and never edited afterwards.

use crate::config::{DynamicsConfig, LayoutConfig};
use crate::pitch::{Letter, Pitch};
use crate::tables::Dynamic;
use rand::Rng;
use serde::Serialize;
use std::fmt::{self, Write};

/// What a token sounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Sound {
    Rest,
    Note(Pitch),
    Chord(Vec<Pitch>),
}

/// Inline expression markings attached to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decoration {
    Dynamic(Dynamic),
    CrescendoStart,
    CrescendoEnd,
    DiminuendoStart,
    DiminuendoEnd,
}

impl Decoration {
    pub fn abc(self) -> String {
        match self {
            Decoration::Dynamic(d) => format!("!{}!", d.abc()),
            Decoration::CrescendoStart => "!<(!".to_string(),
            Decoration::CrescendoEnd => "!<)!".to_string(),
            Decoration::DiminuendoStart => "!>(!".to_string(),
            Decoration::DiminuendoEnd => "!>)!".to_string(),
        }
    }
}

/// One note, chord or rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub sound: Sound,
    pub ticks: u32,
    /// Written immediately before the token.
    pub before: Vec<Decoration>,
    /// Written immediately after the token.
    pub after: Vec<Decoration>,
}

impl Token {
    fn new(sound: Sound, ticks: u32) -> Self {
        Token { sound, ticks, before: Vec::new(), after: Vec::new() }
    }

    pub fn rest(ticks: u32) -> Self {
        Token::new(Sound::Rest, ticks)
    }

    pub fn note(pitch: Pitch, ticks: u32) -> Self {
        Token::new(Sound::Note(pitch), ticks)
    }

    pub fn chord(pitches: Vec<Pitch>, ticks: u32) -> Self {
        Token::new(Sound::Chord(pitches), ticks)
    }

    pub fn is_rest(&self) -> bool {
        matches!(self.sound, Sound::Rest)
    }

    /// Letter of a single note; None for rests and chords.
    pub fn letter(&self) -> Option<Letter> {
        match &self.sound {
            Sound::Note(p) => Some(p.letter),
            _ => None,
        }
    }

    /// All sounding pitches (empty for a rest).
    pub fn pitches(&self) -> &[Pitch] {
        match &self.sound {
            Sound::Rest => &[],
            Sound::Note(p) => std::slice::from_ref(p),
            Sound::Chord(ps) => ps,
        }
    }

    pub fn render(&self, base_ticks: u32) -> String {
        let mut out = String::new();
        for d in &self.before {
            out.push_str(&d.abc());
        }
        match &self.sound {
            Sound::Rest => out.push('z'),
            Sound::Note(p) => out.push_str(&p.to_abc()),
            Sound::Chord(ps) => {
                out.push('[');
                for p in ps {
                    out.push_str(&p.to_abc());
                }
                out.push(']');
            }
        }
        out.push_str(&duration_suffix(self.ticks, base_ticks));
        for d in &self.after {
            out.push_str(&d.abc());
        }
        out
    }
}

/// ABC length suffix for a duration: empty for one unit, `n` for n units,
/// `/2` for half a unit.
pub fn duration_suffix(ticks: u32, base_ticks: u32) -> String {
    if ticks == base_ticks {
        String::new()
    } else if ticks % base_ticks == 0 {
        (ticks / base_ticks).to_string()
    } else if ticks == 1 && base_ticks == 2 {
        "/2".to_string()
    } else {
        format!("{}/{}", ticks, base_ticks)
    }
}

/// One measure of one staff.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Bar {
    pub tokens: Vec<Token>,
}

impl Bar {
    pub fn single(token: Token) -> Self {
        Bar { tokens: vec![token] }
    }

    pub fn total_ticks(&self) -> u32 {
        self.tokens.iter().map(|t| t.ticks).sum()
    }

    pub fn render(&self, base_ticks: u32) -> String {
        self.tokens
            .iter()
            .map(|t| t.render(base_ticks))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Header fields of the written score.
#[derive(Debug, Clone)]
pub struct ScoreHeader<'a> {
    pub meter: &'a str,
    pub unit_denominator: u32,
    pub key: &'a str,
    pub layout: &'a LayoutConfig,
}

/// The finished ABC text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GeneratedScore(String);

impl GeneratedScore {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for GeneratedScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render one staff's slice of bars as a line, closed with `|]` on the last
/// system and `|` otherwise.
fn render_line(bars: &[Bar], base_ticks: u32, is_last: bool) -> String {
    let body = bars
        .iter()
        .map(|b| b.render(base_ticks))
        .collect::<Vec<_>>()
        .join(" | ");
    let close = if is_last { " |]" } else { " |" };
    format!("{body}{close}")
}

/// Serialize both staves into the final score.
///
/// Bars are grouped `bars_per_line` to a system; each system writes the
/// melody line then the accompaniment line.
pub fn assemble(
    rh: &[Bar],
    lh: &[Bar],
    header: &ScoreHeader<'_>,
    base_ticks: u32,
    bars_per_line: usize,
) -> GeneratedScore {
    let bars_per_line = bars_per_line.max(1);
    let mut lines = vec![
        "X:1".to_string(),
        format!("M:{}", header.meter),
        format!("L:1/{}", header.unit_denominator),
        format!("K:{}", header.key),
    ];
    if let Some(sep) = header.layout.staff_separation {
        lines.push(format!("%%staffsep {sep}"));
    }
    if let Some(space) = header.layout.music_space {
        lines.push(format!("%%musicspace {space}"));
    }
    lines.push("%%staves {RH LH}".to_string());
    lines.push("V:RH clef=treble".to_string());
    lines.push("V:LH clef=bass".to_string());

    let total = rh.len().max(lh.len());
    let mut start = 0;
    while start < total {
        let end = (start + bars_per_line).min(total);
        let is_last = end >= total;
        let rh_slice = &rh[start.min(rh.len())..end.min(rh.len())];
        let lh_slice = &lh[start.min(lh.len())..end.min(lh.len())];
        let mut line = String::new();
        let _ = write!(line, "[V:RH] {}", render_line(rh_slice, base_ticks, is_last));
        lines.push(line);
        let mut line = String::new();
        let _ = write!(line, "[V:LH] {}", render_line(lh_slice, base_ticks, is_last));
        lines.push(line);
        start = end;
    }

    GeneratedScore(lines.join("\n"))
}

/// Attach dynamic markings to the melody staff.
///
/// An opening dynamic always goes on the first token. Pieces of
/// `config.min_bars_for_changes` bars or more may also get a different
/// dynamic halfway through and a crescendo or diminuendo hairpin spanning
/// one or two bars, never starting in the first bar.
pub fn apply_dynamics(
    bars: &mut [Bar],
    palette: &[Dynamic],
    config: &DynamicsConfig,
    rng: &mut impl Rng,
) {
    if !config.enabled || palette.is_empty() || bars.is_empty() {
        return;
    }
    let n = bars.len();

    let opening = palette[rng.random_range(0..palette.len())];
    push_before(&mut bars[0], Decoration::Dynamic(opening));

    if n < config.min_bars_for_changes.max(4) {
        return;
    }

    if rng.random_bool(probability(config.mid_change_probability)) {
        let others: Vec<Dynamic> = palette.iter().copied().filter(|&d| d != opening).collect();
        if !others.is_empty() {
            let mid = others[rng.random_range(0..others.len())];
            push_before(&mut bars[n / 2], Decoration::Dynamic(mid));
        }
    }

    if rng.random_bool(probability(config.hairpin_probability)) {
        let start = 1 + rng.random_range(0..n - 3);
        let end = if rng.random_bool(0.5) { start + 1 } else { start };
        let (open, close) = if rng.random_bool(0.5) {
            (Decoration::CrescendoStart, Decoration::CrescendoEnd)
        } else {
            (Decoration::DiminuendoStart, Decoration::DiminuendoEnd)
        };
        push_before(&mut bars[start], open);
        if let Some(last) = bars[end].tokens.last_mut() {
            last.after.push(close);
        }
    }
}

/// Clamp a configured chance into [0, 1]; NaN counts as never.
fn probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

fn push_before(bar: &mut Bar, decoration: Decoration) {
    if let Some(first) = bar.tokens.first_mut() {
        first.before.push(decoration);
    }
}
