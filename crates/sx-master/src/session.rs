//! Game session: playback clock plus beat tracking.

use std::sync::Arc;
use sx_audio::{AudioError, PlaybackHandle};
use sx_engine::{BeatSample, BeatTracker};
use sx_ir::Song;

use crate::EngineConfig;

/// What happened on one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Playback time the beat was evaluated at
    pub time: f64,
    pub strength: f64,
    /// A new beat fired
    pub beat: bool,
    /// Playback was rewound to the loop start on this tick
    pub looped: bool,
}

/// Drives a playing song and its beat tracker from one loop.
///
/// Playback loops shortly before the sequenced music ends; the tracker is
/// reset in the same tick so the first beat of the next pass isn't lost
/// to the previous pass's cooldown.
pub struct Session<P: PlaybackHandle> {
    song: Arc<Song>,
    player: P,
    tracker: BeatTracker,
    loop_at: f64,
    restart_at: f64,
}

impl<P: PlaybackHandle> Session<P> {
    pub fn new(song: Arc<Song>, player: P, config: &EngineConfig) -> Self {
        let music_end = song.music_duration(config.sample_rate).min(player.duration());
        let loop_at = music_end - config.playback.loop_margin;
        let restart_at = config.playback.restart_at;
        if loop_at <= restart_at {
            log::warn!("song too short to loop ({:.2}s of music)", music_end);
        }
        Self {
            tracker: BeatTracker::new(config.beat_config(), config.sample_rate),
            song,
            player,
            loop_at,
            restart_at,
        }
    }

    pub fn song(&self) -> &Arc<Song> {
        &self.song
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn tracker(&self) -> &BeatTracker {
        &self.tracker
    }

    /// Time at which playback is rewound.
    pub fn loop_point(&self) -> f64 {
        self.loop_at
    }

    pub fn play(&mut self) -> Result<(), AudioError> {
        self.player.play()
    }

    pub fn pause(&mut self) -> Result<(), AudioError> {
        self.player.pause()
    }

    /// Stop, rewind to the start and forget beat state.
    pub fn restart(&mut self) -> Result<(), AudioError> {
        self.player.pause()?;
        self.player.seek(0.0);
        self.tracker.reset();
        Ok(())
    }

    /// Read the clock, loop if needed and poll the beat tracker.
    pub fn tick(&mut self) -> TickReport {
        let mut time = self.player.current_time();
        let mut looped = false;
        if self.loop_at > self.restart_at && time >= self.loop_at {
            log::debug!("looping at {:.3}s", time);
            self.player.seek(self.restart_at);
            self.tracker.reset();
            time = self.player.current_time();
            looped = true;
        }

        let BeatSample { strength, fired } = self.tracker.poll(&self.song, time);
        TickReport { time, strength, beat: fired, looped }
    }
}
