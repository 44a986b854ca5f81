// MIDI export of generated exercises.
//
// Converts an Exercise into a Standard MIDI File (SMF Format 1): a conductor
// track carrying tempo, time signature and key signature, then one track per
// staff (right hand on channel 0, left hand on channel 1). Pitches are
// resolved under the key signature, so an `F` in G major sounds F#. Dynamic
// markings on the melody set note velocities from that point on.
//
// Uses the `midly` crate for MIDI writing.

use crate::error::ExportError;
use crate::exercise::Exercise;
use crate::score::{Bar, Decoration};
use crate::tables::Dynamic;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// MIDI ticks per score tick (a sixteenth note).
const MIDI_TICKS_PER_TICK: u32 = TICKS_PER_QUARTER as u32 / 4;

/// Largest delta a variable-length quantity can hold.
const MAX_DELTA: u32 = 0x0FFF_FFFF;

const DEFAULT_VELOCITY: u8 = 72;

fn velocity(dynamic: Dynamic) -> u8 {
    match dynamic {
        Dynamic::P => 45,
        Dynamic::Mp => 58,
        Dynamic::Mf => 72,
        Dynamic::F => 88,
        Dynamic::Ff => 104,
    }
}

/// Convert an exercise to MIDI and write it to a file.
pub fn write_midi(exercise: &Exercise, path: &Path) -> Result<(), ExportError> {
    let smf = exercise_to_smf(exercise)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    std::fs::write(path, &buf)?;
    tracing::debug!(path = %path.display(), bytes = buf.len(), "wrote MIDI");
    Ok(())
}

/// Convert an exercise to an in-memory SMF.
pub fn exercise_to_smf(exercise: &Exercise) -> Result<Smf<'static>, ExportError> {
    let preset = &exercise.preset;
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: conductor
    let tempo_microseconds = 60_000_000 / preset.tempo_bpm.max(1);
    let denominator_pow2 = preset.meter.beat_unit.trailing_zeros() as u8;
    let conductor: Track<'static> = vec![
        meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
        meta(MetaMessage::TimeSignature(
            preset.meter.beats_per_bar,
            denominator_pow2,
            24,
            8,
        )),
        meta(MetaMessage::KeySignature(preset.key.accidentals, preset.key.is_minor())),
        meta(MetaMessage::EndOfTrack),
    ];
    smf.tracks.push(conductor);

    let accidentals = preset.key.accidentals;
    smf.tracks.push(staff_track(b"Right hand", u4::new(0), &exercise.rh_bars, accidentals)?);
    smf.tracks.push(staff_track(b"Left hand", u4::new(1), &exercise.lh_bars, accidentals)?);
    Ok(smf)
}

fn meta(message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent { delta: u28::new(0), kind: TrackEventKind::Meta(message) }
}

fn checked_delta(delta: u32) -> Result<u28, ExportError> {
    if delta > MAX_DELTA {
        return Err(ExportError::Midi(format!("delta of {delta} ticks exceeds the SMF limit")));
    }
    Ok(u28::new(delta))
}

fn staff_track(
    name: &'static [u8],
    channel: u4,
    bars: &[Bar],
    accidentals: i8,
) -> Result<Track<'static>, ExportError> {
    let mut track: Track<'static> = vec![
        meta(MetaMessage::TrackName(name)),
        // Acoustic grand piano.
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi { channel, message: MidiMessage::ProgramChange { program: u7::new(0) } },
        },
    ];

    let mut vel = DEFAULT_VELOCITY;
    // Time since the last written event, in MIDI ticks.
    let mut pending: u32 = 0;

    for token in bars.iter().flat_map(|b| &b.tokens) {
        if let Some(d) = token.before.iter().rev().find_map(|d| match d {
            Decoration::Dynamic(d) => Some(*d),
            _ => None,
        }) {
            vel = velocity(d);
        }

        let length = token.ticks * MIDI_TICKS_PER_TICK;
        let keys: Vec<u7> = token.pitches().iter().map(|p| u7::new(p.midi(accidentals))).collect();
        if keys.is_empty() {
            pending += length;
            continue;
        }

        for (i, &key) in keys.iter().enumerate() {
            let delta = if i == 0 { checked_delta(pending)? } else { u28::new(0) };
            track.push(TrackEvent {
                delta,
                kind: TrackEventKind::Midi { channel, message: MidiMessage::NoteOn { key, vel: u7::new(vel) } },
            });
        }
        for (i, &key) in keys.iter().enumerate() {
            let delta = if i == 0 { checked_delta(length)? } else { u28::new(0) };
            track.push(TrackEvent {
                delta,
                kind: TrackEventKind::Midi { channel, message: MidiMessage::NoteOff { key, vel: u7::new(0) } },
            });
        }
        pending = 0;
    }

    track.push(TrackEvent { delta: checked_delta(pending)?, kind: TrackEventKind::Meta(MetaMessage::EndOfTrack) });
    Ok(track)
}
