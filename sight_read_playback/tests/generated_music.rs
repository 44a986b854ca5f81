// Loading freshly generated exercises into a playback session.

use rand::SeedableRng;
use rand::rngs::StdRng;
use sight_read_music::config::GeneratorConfig;
use sight_read_music::exercise::{ExerciseRequest, generate_exercise};
use sight_read_playback::error::PlaybackError;
use sight_read_playback::metronome::{MetronomeBeat, MetronomePattern};
use sight_read_playback::session::{MusicData, PlaybackSession};
use sight_read_playback::synth::{Synth, SynthConfig, millis_per_measure};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct RecordingSynth {
    configs: Vec<SynthConfig>,
}

impl Synth for RecordingSynth {
    fn initialize(&mut self, config: &SynthConfig) -> Result<(), PlaybackError> {
        self.configs.push(config.clone());
        Ok(())
    }
    fn prime(&mut self) -> Result<(), PlaybackError> {
        Ok(())
    }
    fn start(&mut self) -> Result<(), PlaybackError> {
        Ok(())
    }
    fn stop(&mut self) {}
}

#[test]
fn test_generated_exercise_plays_with_its_own_timing() {
    let mut rng = StdRng::seed_from_u64(99);
    let exercise = generate_exercise(
        &ExerciseRequest::new(6).with_bars(8, 4),
        &GeneratorConfig::default(),
        &mut rng,
    );
    let meta = exercise.metadata();

    let mut session = PlaybackSession::new(RecordingSynth::default());
    session.set_music(Some(MusicData::from_exercise(&exercise)));
    session.play().unwrap();

    let config = &session.synth().configs[0];
    assert_eq!(config.score, exercise.score.as_str());
    assert_eq!(
        config.millis_per_measure,
        millis_per_measure(meta.tempo_bpm, meta.meter_numerator, meta.meter_denominator)
    );
    assert!(session.state().is_playing);
}

#[test]
fn test_generate_request_loads_new_music() {
    let mut session = PlaybackSession::new(RecordingSynth::default());
    let requests = Rc::new(RefCell::new(0u64));
    let sink = Rc::clone(&requests);
    session.on_generate_request(move || *sink.borrow_mut() += 1);

    // The owner reacts to each request by generating and loading music;
    // loading cuts off whatever was still playing.
    for round in 0..3 {
        session.request_generate();
        let seed = *requests.borrow();
        assert_eq!(seed, round + 1);
        let mut rng = StdRng::seed_from_u64(seed);
        let exercise = generate_exercise(&ExerciseRequest::new(3), &GeneratorConfig::default(), &mut rng);
        session.set_music(Some(MusicData::from_exercise(&exercise)));
        assert!(!session.state().is_playing);
        session.play().unwrap();
    }
    assert_eq!(session.synth().configs.len(), 3);
}

#[test]
fn test_metronome_matches_generated_meter() {
    let mut rng = StdRng::seed_from_u64(5);
    let exercise = generate_exercise(&ExerciseRequest::new(8), &GeneratorConfig::default(), &mut rng);
    let pattern = MetronomePattern::for_meter(&exercise.preset.meter);
    assert_eq!(pattern.beats().len(), exercise.preset.meter.beats_per_bar as usize);
    assert_eq!(pattern.beats()[0], MetronomeBeat::Accent);
}
