// Playback session: the one place that knows what is loaded and whether it
// is sounding.
//
// The session owns its synth backend and the currently loaded music. State
// changes (music loaded or cleared, playback started, stopped or ended) are
// broadcast to every subscriber; a new subscriber is told the current state
// straight away. A second list carries "generate a new exercise" requests
// from playback controls back to whoever owns the generator.
//
// Loading new music stops whatever is playing, so a regenerated exercise
// never plays over the old one.
//
// `play` marks the session as playing before touching the backend, so a
// second `play` during start-up is ignored. Any backend failure puts the
// session back to stopped and is returned to the caller.

use crate::error::PlaybackError;
use crate::synth::{Synth, SynthConfig, millis_per_measure};
use serde::Serialize;
use sight_read_music::exercise::Exercise;

/// What observers see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    /// True when music is loaded.
    pub can_play: bool,
}

/// A loaded exercise, as far as playback is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MusicData {
    pub score: String,
    pub tempo_bpm: u32,
    pub meter_numerator: u8,
    pub meter_denominator: u8,
}

impl MusicData {
    pub fn from_exercise(exercise: &Exercise) -> Self {
        let meta = exercise.metadata();
        MusicData {
            score: exercise.score.as_str().to_string(),
            tempo_bpm: meta.tempo_bpm,
            meter_numerator: meta.meter_numerator,
            meter_denominator: meta.meter_denominator,
        }
    }

    pub fn synth_config(&self) -> SynthConfig {
        SynthConfig {
            score: self.score.clone(),
            millis_per_measure: millis_per_measure(
                self.tempo_bpm,
                self.meter_numerator,
                self.meter_denominator,
            ),
        }
    }
}

/// Handle returned by `subscribe` and `on_generate_request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type StateListener = Box<dyn FnMut(PlaybackState)>;
type GenerateListener = Box<dyn FnMut()>;

pub struct PlaybackSession<S: Synth> {
    synth: S,
    /// Whether the synth has been initialized at least once and may need
    /// stopping before reuse.
    synth_used: bool,
    music: Option<MusicData>,
    is_playing: bool,
    next_id: u64,
    listeners: Vec<(SubscriptionId, StateListener)>,
    generate_listeners: Vec<(SubscriptionId, GenerateListener)>,
}

impl<S: Synth> PlaybackSession<S> {
    pub fn new(synth: S) -> Self {
        PlaybackSession {
            synth,
            synth_used: false,
            music: None,
            is_playing: false,
            next_id: 0,
            listeners: Vec::new(),
            generate_listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.is_playing,
            can_play: self.music.is_some(),
        }
    }

    pub fn music(&self) -> Option<&MusicData> {
        self.music.as_ref()
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    fn notify(&mut self) {
        let state = self.state();
        for (_, listener) in &mut self.listeners {
            listener(state);
        }
    }

    fn fresh_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Register a state observer. It is called once immediately with the
    /// current state, then on every change.
    pub fn subscribe(&mut self, mut listener: impl FnMut(PlaybackState) + 'static) -> SubscriptionId {
        listener(self.state());
        let id = self.fresh_id();
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Register a listener for "generate a new exercise" requests.
    pub fn on_generate_request(&mut self, listener: impl FnMut() + 'static) -> SubscriptionId {
        let id = self.fresh_id();
        self.generate_listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a subscription of either kind. Returns false if it was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len() + self.generate_listeners.len();
        self.listeners.retain(|(i, _)| *i != id);
        self.generate_listeners.retain(|(i, _)| *i != id);
        before != self.listeners.len() + self.generate_listeners.len()
    }

    /// Load new music, or clear it with `None`. Anything still sounding is
    /// stopped first; observers get one notification with the final state.
    pub fn set_music(&mut self, music: Option<MusicData>) {
        if self.is_playing {
            self.synth.stop();
            self.is_playing = false;
            tracing::debug!("stopped playback to load new music");
        }
        self.music = music;
        self.notify();
    }

    /// Start playing the loaded music. Does nothing when nothing is loaded
    /// or playback is already underway.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        let Some(music) = &self.music else {
            tracing::debug!("play requested with nothing loaded");
            return Ok(());
        };
        if self.is_playing {
            return Ok(());
        }
        let config = music.synth_config();

        self.is_playing = true;
        self.notify();

        if self.synth_used {
            self.synth.stop();
        }
        self.synth_used = true;

        if let Err(e) = start_synth(&mut self.synth, &config) {
            tracing::warn!(error = %e, "playback failed to start");
            self.is_playing = false;
            self.notify();
            return Err(e);
        }
        tracing::debug!(millis_per_measure = config.millis_per_measure, "playback started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.synth_used {
            self.synth.stop();
        }
        self.is_playing = false;
        self.notify();
    }

    /// Called by the backend owner when the audio reaches its end.
    pub fn notify_ended(&mut self) {
        self.is_playing = false;
        self.notify();
    }

    /// Ask whoever owns the generator for a new exercise.
    pub fn request_generate(&mut self) {
        for (_, listener) in &mut self.generate_listeners {
            listener();
        }
    }
}

fn start_synth<S: Synth>(synth: &mut S, config: &SynthConfig) -> Result<(), PlaybackError> {
    synth.initialize(config)?;
    synth.prime()?;
    synth.start()
}
