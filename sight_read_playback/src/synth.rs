// The synthesizer capability a playback backend provides.
//
// A backend is driven through a fixed sequence on every play request:
// `initialize` with the score and timing, `prime` to prepare buffers, then
// `start`. `stop` may be called at any time and must not fail. The session
// never inspects the backend beyond this trait.

use crate::error::PlaybackError;
use serde::Serialize;

/// Everything a backend needs to render one exercise to audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthConfig {
    /// ABC text of the exercise.
    pub score: String,
    pub millis_per_measure: u64,
}

pub trait Synth {
    fn initialize(&mut self, config: &SynthConfig) -> Result<(), PlaybackError>;
    fn prime(&mut self) -> Result<(), PlaybackError>;
    fn start(&mut self) -> Result<(), PlaybackError>;
    fn stop(&mut self);
}

/// Length of one measure in milliseconds: the quarter-note beat length times
/// the measure's length in quarter notes, rounded.
pub fn millis_per_measure(tempo_bpm: u32, numerator: u8, denominator: u8) -> u64 {
    let quarter_ms = 60_000.0 / tempo_bpm.max(1) as f64;
    let quarters = 4.0 * numerator as f64 / denominator.max(1) as f64;
    (quarter_ms * quarters).round() as u64
}
