// Sight-Read Playback
//
// Session state for listening to generated exercises. One `PlaybackSession`
// is owned by the application's composition root and handed by reference to
// whichever handler needs it; UI surfaces observe it through subscriptions
// instead of reading shared globals.
//
// Architecture:
// - synth.rs: The `Synth` capability trait an audio backend implements, and
//   the per-play configuration it receives
// - session.rs: `PlaybackSession` (music, play/stop state, observers) and
//   the `MusicData` handed over from the generator
// - metronome.rs: Per-beat metronome patterns derived from the meter
// - error.rs: Playback failures
//
// Audio synthesis itself is out of scope; backends live behind `Synth`.

pub mod error;
pub mod metronome;
pub mod session;
pub mod synth;
