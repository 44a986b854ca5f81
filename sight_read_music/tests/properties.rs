// End-to-end properties of generated exercises, checked across every level
// and a spread of seeds.

use rand::SeedableRng;
use rand::rngs::StdRng;
use sight_read_music::config::GeneratorConfig;
use sight_read_music::exercise::{Exercise, ExerciseRequest, generate_exercise};
use sight_read_music::pitch::{Letter, degree_letter, triad};
use sight_read_music::tables::{self, AccompanimentStyle, BaseUnit, Level};

const SEEDS: u64 = 25;

fn generate(level: i64, bars: i64, bars_per_line: i64, seed: u64) -> Exercise {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_exercise(
        &ExerciseRequest::new(level).with_bars(bars, bars_per_line),
        &GeneratorConfig::default(),
        &mut rng,
    )
}

fn each_exercise(mut check: impl FnMut(&Exercise)) {
    for level in 1..=8 {
        for seed in 0..SEEDS {
            check(&generate(level, 8, 4, seed * 31 + level as u64));
        }
    }
}

#[test]
fn test_every_bar_sums_to_bar_length() {
    each_exercise(|ex| {
        let bar_ticks = ex.preset.bar_ticks();
        assert_eq!(ex.rh_bars.len(), 8);
        assert_eq!(ex.lh_bars.len(), 8);
        for bar in ex.rh_bars.iter().chain(&ex.lh_bars) {
            assert_eq!(bar.total_ticks(), bar_ticks, "meter {}", ex.preset.meter.label);
        }
    });
}

#[test]
fn test_plan_ends_with_cadence_and_melody_resolves() {
    each_exercise(|ex| {
        assert_eq!(&ex.chord_plan[ex.chord_plan.len() - 2..], &[5, 1]);
        let tonic = ex.preset.tonic();
        let last = ex.rh_bars.last().and_then(|b| b.tokens.last()).unwrap();
        let letter = last.letter().expect("melody ends on a single note");
        assert!(triad(1, tonic).contains(&letter), "{letter:?} outside tonic triad of {tonic:?}");
    });
}

#[test]
fn test_no_leading_or_consecutive_rests() {
    each_exercise(|ex| {
        let staves = [&ex.rh_bars, &ex.lh_bars];
        for bars in staves {
            if bars.iter().all(|b| b.tokens.len() == 1 && b.tokens[0].is_rest()) {
                // Silent accompaniment.
                continue;
            }
            for bar in bars.iter() {
                assert!(!bar.tokens[0].is_rest());
                for pair in bar.tokens.windows(2) {
                    assert!(!(pair[0].is_rest() && pair[1].is_rest()));
                }
            }
        }
    });
}

#[test]
fn test_low_levels_have_silent_accompaniment() {
    for level in 1..=2 {
        for seed in 0..SEEDS {
            let ex = generate(level, 6, 3, seed);
            assert_eq!(ex.preset.accompaniment, AccompanimentStyle::None);
            for bar in &ex.lh_bars {
                assert_eq!(bar.tokens.len(), 1);
                assert!(bar.tokens[0].is_rest());
            }
            assert!(ex.score.as_str().contains("[V:LH] z"));
        }
    }
}

#[test]
fn test_drone_bars_sit_on_chord_root() {
    for seed in 0..50 {
        let ex = generate(3, 8, 4, seed);
        assert_eq!(ex.preset.accompaniment, AccompanimentStyle::Drone);
        let tonic = ex.preset.tonic();
        // The final bar belongs to the cadence.
        let body = ex.lh_bars.len() - 1;
        for (bar, &degree) in ex.lh_bars[..body].iter().zip(&ex.chord_plan) {
            assert_eq!(bar.tokens.len(), 1);
            assert_eq!(bar.tokens[0].letter(), Some(triad(degree, tonic)[0]), "seed {seed}, degree {degree}");
        }
    }
}

#[test]
fn test_fixed_seed_is_byte_identical() {
    for level in 1..=8 {
        let a = generate(level, 12, 4, 2024);
        let b = generate(level, 12, 4, 2024);
        assert_eq!(a.score.as_str(), b.score.as_str());
    }
}

#[test]
fn test_level_one_scenario() {
    for seed in 0..SEEDS {
        let ex = generate(1, 4, 4, seed);
        let p = &ex.preset;
        assert!(p.key.accidentals.abs() <= 1);
        assert!(["2/4", "3/4", "4/4"].contains(&p.meter.label));
        let (low, high) = tables::tempo_range_at(p.level);
        let scale = tables::tempo_scale(&p.key);
        let bounds = (low as f64 * scale).round() as u32..=(high as f64 * scale).round() as u32;
        assert!(bounds.contains(&p.tempo_bpm), "tempo {} for key {}", p.tempo_bpm, p.key.label);
        assert_eq!(p.base_unit, BaseUnit::Eighth);
        assert!(ex.chord_plan.iter().all(|d| [1, 4, 5].contains(d)));

        let text = ex.score.as_str();
        assert!(text.starts_with("X:1\n"));
        assert!(text.contains("\nL:1/8\n"));
        assert_eq!(text.lines().filter(|l| l.starts_with("[V:RH]")).count(), 1);
        assert!(text.ends_with("|]"));
    }
}

#[test]
fn test_level_eight_scenario() {
    let mut saw_sixteenths = false;
    let mut saw_sixteenth_unit = false;
    for seed in 0..(SEEDS * 4) {
        let ex = generate(8, 16, 4, seed);
        let p = &ex.preset;
        assert_eq!(p.accompaniment, AccompanimentStyle::Quarters);
        assert_eq!(p.dynamics.len(), 5);
        saw_sixteenths |= ex.rh_bars.iter().flat_map(|b| &b.tokens).any(|t| t.ticks == 1);
        saw_sixteenth_unit |= p.base_unit == BaseUnit::Sixteenth;

        // Closing bass chord carries the seventh and ninth over the tonic.
        let tonic = p.tonic();
        let last = ex.lh_bars.last().and_then(|b| b.tokens.last()).unwrap();
        let letters: Vec<Letter> = last.pitches().iter().map(|p| p.letter).collect();
        assert!(letters.contains(&tonic));
        assert!(letters.contains(&degree_letter(tonic, 7)), "no seventh in {letters:?}");
        assert!(letters.contains(&degree_letter(tonic, 9)), "no ninth in {letters:?}");
    }
    assert!(saw_sixteenths);
    assert!(saw_sixteenth_unit);
}

#[test]
fn test_systems_follow_bars_per_line() {
    let ex = generate(5, 10, 4, 77);
    let text = ex.score.as_str();
    let rh_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("[V:RH]")).collect();
    let lh_lines: Vec<&str> = text.lines().filter(|l| l.starts_with("[V:LH]")).collect();
    assert_eq!(rh_lines.len(), 3);
    assert_eq!(lh_lines.len(), 3);
    assert!(rh_lines[0].ends_with(" |") && !rh_lines[0].ends_with("|]"));
    assert!(rh_lines[2].ends_with(" |]"));
    // Four bars means three inner barlines plus the closing one.
    assert_eq!(rh_lines[0].matches(" | ").count(), 3);
}

#[test]
fn test_catalogs_grow_with_level() {
    for pair in Level::all().collect::<Vec<_>>().windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        assert!(tables::keys_available_at(hi).len() >= tables::keys_available_at(lo).len());
        assert!(tables::meters_available_at(hi).len() >= tables::meters_available_at(lo).len());
        assert!(
            tables::progressions_available_at(hi).len()
                >= tables::progressions_available_at(lo).len()
        );
    }
}

#[test]
fn test_out_of_range_level_clamped() {
    assert_eq!(generate(0, 4, 4, 1).preset.level, Level::MIN);
    assert_eq!(generate(12, 4, 4, 1).preset.level, Level::MAX);
}
