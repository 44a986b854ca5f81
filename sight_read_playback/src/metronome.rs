// Metronome click patterns.
//
// A pattern holds one state per beat of the bar. The default pattern accents
// the meter's strong beats and clicks normally on the rest; the user can
// cycle any beat through normal, mute and accent.

use serde::{Deserialize, Serialize};
use sight_read_music::tables::MeterDef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetronomeBeat {
    Accent,
    Normal,
    Mute,
}

impl MetronomeBeat {
    /// The state a beat moves to when toggled: normal, mute, accent, normal.
    pub fn next(self) -> MetronomeBeat {
        match self {
            MetronomeBeat::Normal => MetronomeBeat::Mute,
            MetronomeBeat::Mute => MetronomeBeat::Accent,
            MetronomeBeat::Accent => MetronomeBeat::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetronomeBeat::Accent => "Accent beat",
            MetronomeBeat::Normal => "Normal beat",
            MetronomeBeat::Mute => "Muted beat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetronomePattern {
    beats: Vec<MetronomeBeat>,
}

impl MetronomePattern {
    /// Accent the meter's strong beats, click the others.
    pub fn for_meter(meter: &MeterDef) -> Self {
        let beats = (1..=meter.beats_per_bar)
            .map(|beat| {
                if meter.strong_beats.contains(&beat) {
                    MetronomeBeat::Accent
                } else {
                    MetronomeBeat::Normal
                }
            })
            .collect();
        MetronomePattern { beats }
    }

    pub fn beats(&self) -> &[MetronomeBeat] {
        &self.beats
    }

    /// Advance one beat to its next state. Out-of-range indices are ignored.
    pub fn cycle(&mut self, index: usize) -> Option<MetronomeBeat> {
        let beat = self.beats.get_mut(index)?;
        *beat = beat.next();
        Some(*beat)
    }

    /// Click state for an absolute beat count from the start of playback.
    pub fn beat_at(&self, beat_index: usize) -> MetronomeBeat {
        match self.beats.len() {
            0 => MetronomeBeat::Mute,
            n => self.beats[beat_index % n],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sight_read_music::tables::METERS;

    fn meter(label: &str) -> &'static MeterDef {
        METERS.iter().find(|m| m.label == label).unwrap()
    }

    #[test]
    fn test_cycle_order() {
        let mut b = MetronomeBeat::Normal;
        let mut seen = Vec::new();
        for _ in 0..4 {
            b = b.next();
            seen.push(b);
        }
        assert_eq!(
            seen,
            vec![MetronomeBeat::Mute, MetronomeBeat::Accent, MetronomeBeat::Normal, MetronomeBeat::Mute]
        );
    }

    #[test]
    fn test_pattern_follows_meter() {
        let p = MetronomePattern::for_meter(meter("6/8"));
        assert_eq!(p.beats().len(), 6);
        assert_eq!(p.beats()[0], MetronomeBeat::Accent);
        assert!(p.beats()[1..].iter().all(|&b| b == MetronomeBeat::Normal));
    }

    #[test]
    fn test_every_meter_accents_downbeat() {
        for m in &METERS {
            let p = MetronomePattern::for_meter(m);
            assert_eq!(p.beats().len(), m.beats_per_bar as usize);
            assert_eq!(p.beat_at(0), MetronomeBeat::Accent);
            assert_eq!(p.beat_at(m.beats_per_bar as usize), MetronomeBeat::Accent);
        }
    }

    #[test]
    fn test_cycle_beat() {
        let mut p = MetronomePattern::for_meter(meter("3/4"));
        assert_eq!(p.cycle(1), Some(MetronomeBeat::Mute));
        assert_eq!(p.cycle(1), Some(MetronomeBeat::Accent));
        assert_eq!(p.cycle(0), Some(MetronomeBeat::Normal));
        assert_eq!(p.cycle(9), None);
        assert_eq!(p.beat_at(4), MetronomeBeat::Accent);
    }
}
