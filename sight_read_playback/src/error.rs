// Failures a synth backend can report while getting ready to play.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("synth initialization failed: {0}")]
    Initialize(String),

    #[error("synth priming failed: {0}")]
    Prime(String),

    #[error("synth failed to start: {0}")]
    Start(String),
}
