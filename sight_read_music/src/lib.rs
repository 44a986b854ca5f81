// Sight-Read Exercise Generator
//
// Procedurally generates short two-staff piano sight-reading exercises at a
// requested difficulty level and writes them as ABC notation text. Each
// exercise is a chain of weighted random draws: a level selects a key,
// meter, tempo and rhythm palette, a diatonic chord plan ending on a V-I
// cadence, a melody and an accompaniment that follow the plan, and a few
// dynamic markings.
//
// Architecture:
// - weighted.rs: Weighted random selection, the primitive behind every choice
// - pitch.rs: Letters, scale degrees, key signatures, pitches in ABC notation
// - tables.rs: Level-gated catalogs (keys, meters, tempi, durations,
//   progressions, accompaniment styles, dynamics)
// - preset.rs: Resolving a level into a concrete preset
// - progression.rs: One chord degree per bar, closing on V-I
// - melody.rs: Treble-staff bars (rhythm shaping + stepwise pitch choice)
// - accompaniment.rs: Bass-staff bars in the preset's texture
// - cadence.rs: Rewriting the final tokens onto the closing chord
// - score.rs: Token/bar model, dynamics placement, ABC assembly
// - exercise.rs: The end-to-end pipeline and its request/metadata types
// - midi.rs: Standard MIDI File export
// - config.rs / error.rs: Tunable configuration and error types
//
// Generation is deterministic given a seeded RNG.

pub mod accompaniment;
pub mod cadence;
pub mod config;
pub mod error;
pub mod exercise;
pub mod melody;
pub mod midi;
pub mod pitch;
pub mod preset;
pub mod progression;
pub mod score;
pub mod tables;
pub mod weighted;
