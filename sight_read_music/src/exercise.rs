// The generation pipeline: one request in, one finished exercise out.
//
// Stages run in a fixed order, each a pure function of its inputs plus the
// caller's RNG:
//   preset -> chord plan -> melody + accompaniment -> cadence -> dynamics
//   -> ABC assembly
// The RNG is threaded through every stage in that order, so the same seed
// and request always produce byte-identical text.
//
// Out-of-range requests are clamped here (with a warning) rather than
// rejected. Nothing is cached between calls.

use crate::accompaniment::generate_accompaniment;
use crate::cadence::{CadenceContext, finish_cadence};
use crate::config::GeneratorConfig;
use crate::melody::{MelodyContext, generate_melody};
use crate::preset::{Preset, build_preset};
use crate::progression::build_chord_plan;
use crate::score::{Bar, GeneratedScore, ScoreHeader, apply_dynamics, assemble};
use crate::tables::Level;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What the caller asks for. Bar counts fall back to the config defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseRequest {
    pub level: i64,
    pub total_bars: Option<i64>,
    pub bars_per_line: Option<i64>,
}

impl ExerciseRequest {
    pub fn new(level: i64) -> Self {
        ExerciseRequest { level, total_bars: None, bars_per_line: None }
    }

    pub fn with_bars(mut self, total_bars: i64, bars_per_line: i64) -> Self {
        self.total_bars = Some(total_bars);
        self.bars_per_line = Some(bars_per_line);
        self
    }
}

/// A generated exercise: the score text plus everything that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Exercise {
    pub preset: Preset,
    pub chord_plan: Vec<u8>,
    pub rh_bars: Vec<Bar>,
    pub lh_bars: Vec<Bar>,
    pub score: GeneratedScore,
}

/// The descriptive data a renderer or player needs alongside the text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseMetadata {
    pub level: u8,
    pub key: String,
    pub tempo_bpm: u32,
    pub meter_numerator: u8,
    pub meter_denominator: u8,
    pub total_bars: usize,
}

impl Exercise {
    pub fn metadata(&self) -> ExerciseMetadata {
        ExerciseMetadata {
            level: self.preset.level.get(),
            key: self.preset.key.label.to_string(),
            tempo_bpm: self.preset.tempo_bpm,
            meter_numerator: self.preset.meter.beats_per_bar,
            meter_denominator: self.preset.meter.beat_unit,
            total_bars: self.preset.total_bars,
        }
    }
}

fn clamp_count(name: &str, raw: Option<i64>, default: usize) -> usize {
    match raw {
        None => default.max(1),
        Some(n) if n >= 1 => n as usize,
        Some(n) => {
            tracing::warn!(name, requested = n, "count below 1, using 1");
            1
        }
    }
}

/// Run the full pipeline for one request.
pub fn generate_exercise(
    request: &ExerciseRequest,
    config: &GeneratorConfig,
    rng: &mut impl Rng,
) -> Exercise {
    if let Err(e) = config.validate() {
        tracing::warn!(error = %e, "invalid generator config, out-of-range values will be clamped");
    }
    let cap = Level::new(i64::from(config.max_level));
    let level = Level::capped(request.level, cap.get());
    if i64::from(level.get()) != request.level {
        tracing::warn!(requested = request.level, used = level.get(), "level out of range, clamped");
    }
    let total_bars = clamp_count("total_bars", request.total_bars, config.default_bars);
    let bars_per_line = clamp_count("bars_per_line", request.bars_per_line, config.default_bars_per_line);

    let preset = build_preset(level, cap, total_bars, bars_per_line, rng);
    let chord_plan = build_chord_plan(preset.total_bars, level, rng);
    let tonic = preset.tonic();

    let mut rh_bars = generate_melody(
        &MelodyContext {
            pool: &preset.rh_pool,
            durations: &preset.durations,
            bar_ticks: preset.bar_ticks(),
            bars: preset.total_bars,
            chord_plan: &chord_plan,
            tonic,
            meter: &preset.meter,
        },
        rng,
    );
    let mut lh_bars = generate_accompaniment(
        preset.accompaniment,
        &preset.lh_pool,
        preset.bar_ticks(),
        &chord_plan,
        tonic,
        rng,
    );

    finish_cadence(
        &mut rh_bars,
        &mut lh_bars,
        &CadenceContext {
            chord_plan: &chord_plan,
            tonic,
            level,
            style: preset.accompaniment,
            rh_pool: &preset.rh_pool,
            lh_pool: &preset.lh_pool,
        },
        rng,
    );
    apply_dynamics(&mut rh_bars, &preset.dynamics, &config.dynamics, rng);

    let header = ScoreHeader {
        meter: preset.meter.label,
        unit_denominator: preset.base_unit.denominator(),
        key: preset.key.label,
        layout: &config.layout,
    };
    let score = assemble(
        &rh_bars,
        &lh_bars,
        &header,
        preset.base_unit.ticks(),
        preset.bars_per_line,
    );

    tracing::debug!(
        level = level.get(),
        bars = preset.total_bars,
        chars = score.as_str().len(),
        "generated exercise"
    );

    Exercise { preset, chord_plan, rh_bars, lh_bars, score }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn generate(request: ExerciseRequest, seed: u64) -> Exercise {
        let mut rng = StdRng::seed_from_u64(seed);
        generate_exercise(&request, &GeneratorConfig::default(), &mut rng)
    }

    #[test]
    fn test_same_seed_same_text() {
        let request = ExerciseRequest::new(6).with_bars(12, 4);
        assert_eq!(generate(request, 42).score, generate(request, 42).score);
    }

    #[test]
    fn test_different_seeds_differ() {
        let request = ExerciseRequest::new(6).with_bars(12, 4);
        assert_ne!(generate(request, 1).score, generate(request, 2).score);
    }

    #[test]
    fn test_out_of_range_requests_clamped() {
        let high = generate(ExerciseRequest::new(40).with_bars(4, 4), 3);
        assert_eq!(high.preset.level, Level::MAX);
        let low = generate(ExerciseRequest::new(-2).with_bars(0, -5), 3);
        assert_eq!(low.preset.level, Level::MIN);
        assert_eq!(low.preset.total_bars, 1);
        assert_eq!(low.preset.bars_per_line, 1);
        assert_eq!(low.chord_plan, vec![1]);
    }

    #[test]
    fn test_config_caps_level() {
        let config = GeneratorConfig { max_level: 5, ..GeneratorConfig::default() };
        let mut rng = StdRng::seed_from_u64(8);
        let ex = generate_exercise(&ExerciseRequest::new(8), &config, &mut rng);
        assert_eq!(ex.preset.level.get(), 5);
        assert_eq!(ex.preset.total_bars, config.default_bars);
    }

    #[test]
    fn test_capped_top_level_uses_full_complexity() {
        let config = GeneratorConfig { max_level: 5, ..GeneratorConfig::default() };
        let mut rng = StdRng::seed_from_u64(31);
        let best = (0..200)
            .map(|_| generate_exercise(&ExerciseRequest::new(5).with_bars(4, 4), &config, &mut rng))
            .map(|ex| ex.preset.complexity)
            .fold(0.0, f64::max);
        assert!(best >= 0.95, "max complexity at capped top level {best:.3}");
    }

    #[test]
    fn test_out_of_range_dynamics_config_still_generates() {
        for (mid, hairpin) in [(1.5, 1.5), (-0.5, 2.0), (f64::NAN, 0.4)] {
            let mut config = GeneratorConfig::default();
            config.dynamics.mid_change_probability = mid;
            config.dynamics.hairpin_probability = hairpin;
            assert!(config.validate().is_err());
            let mut rng = StdRng::seed_from_u64(12);
            let ex = generate_exercise(&ExerciseRequest::new(6).with_bars(8, 4), &config, &mut rng);
            assert_eq!(ex.rh_bars.len(), 8);
            assert!(ex.score.as_str().ends_with("|]"));
        }
    }

    #[test]
    fn test_metadata_matches_header() {
        let ex = generate(ExerciseRequest::new(4).with_bars(8, 4), 10);
        let meta = ex.metadata();
        let text = ex.score.as_str();
        assert!(text.contains(&format!("M:{}/{}", meta.meter_numerator, meta.meter_denominator)));
        assert!(text.contains(&format!("K:{}\n", meta.key)));
        assert_eq!(meta.total_bars, 8);
    }
}
