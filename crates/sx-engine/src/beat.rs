//! Beat detection from song data.
//!
//! Rather than analysing audio, the detector looks up the most recent note
//! on a monitored channel and reconstructs its envelope to estimate how
//! loud that channel is at a given playback time.

use core::fmt;
use core::str::FromStr;
use sx_ir::{Instrument, RowPosition, Song, PATTERN_ROWS};

/// Envelopes shorter than this many samples are stretched (release only)
/// so short notes still give a visible pulse.
pub const MIN_ENVELOPE_SAMPLES: u32 = 10000;

/// Strength above which a beat fires.
pub const TRIGGER_LEVEL: f64 = 0.8;

/// Samples elapsed since the most recent note on `channel` at time `t`.
///
/// Looks back at most one measure's worth of rows. Returns `None` when no
/// note is found, or the walk would pass the start of the song.
pub fn samples_since_note(song: &Song, t: f64, channel: usize, sample_rate: u32) -> Option<f64> {
    let inst = song.instrument(channel)?;
    let pos = RowPosition::from_seconds(t, song.row_len, sample_rate);
    for k in 0..PATTERN_ROWS as u64 {
        let (seq_pos, row) = pos.rows_back(k)?;
        if inst.note_at(seq_pos, row).is_some() {
            return Some((k as f64 + pos.fraction) * song.row_len as f64);
        }
    }
    None
}

/// Reconstructed envelope level `samples` after a note onset, or `None`
/// outside the (stretched) envelope.
///
/// Attack ramps up linearly; sustain and release are treated as a single
/// linear decay.
pub fn envelope_strength(inst: &Instrument, samples: f64, min_total: u32) -> Option<f64> {
    let attack = inst.envelope.attack as f64;
    let total = (inst.envelope.attack as f64 + inst.envelope.sustain as f64 + inst.envelope.release as f64)
        .max(min_total as f64);
    let release = total - attack;

    if !(samples >= 0.0 && samples < total) {
        return None;
    }
    if samples < attack {
        Some(samples / attack)
    } else {
        Some(1.0 - (samples - attack) / release)
    }
}

/// Cooldown presets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Minimum seconds between beats.
    pub const fn cooldown(self) -> f64 {
        match self {
            Difficulty::Easy => 2.0,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 0.5,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown difficulty name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownDifficulty;

impl fmt::Display for UnknownDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("expected one of: easy, medium, hard")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownDifficulty {}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(UnknownDifficulty),
        }
    }
}

/// Beat detector settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatConfig {
    /// Instrument index to monitor
    pub channel: usize,
    /// Strength a pulse must exceed to fire
    pub trigger_level: f64,
    /// Minimum reconstructed envelope length in samples
    pub min_envelope: u32,
    /// Minimum seconds between fired beats
    pub cooldown: f64,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            channel: 1,
            trigger_level: TRIGGER_LEVEL,
            min_envelope: MIN_ENVELOPE_SAMPLES,
            cooldown: Difficulty::default().cooldown(),
        }
    }
}

impl BeatConfig {
    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            cooldown: difficulty.cooldown(),
            ..Self::default()
        }
    }
}

/// Result of one poll.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BeatSample {
    /// Current beat strength in [0, 1]
    pub strength: f64,
    /// A new beat fired on this poll
    pub fired: bool,
}

/// Turns beat strength into discrete beat events.
///
/// Fires at most once per pulse: after firing, the tracker waits for the
/// strength to drop back to the trigger level before it can fire again,
/// and never fires within `cooldown` seconds of the previous beat.
#[derive(Clone, Debug)]
pub struct BeatTracker {
    config: BeatConfig,
    sample_rate: u32,
    strength: f64,
    last_beat: Option<f64>,
    awaiting: bool,
}

impl BeatTracker {
    pub fn new(config: BeatConfig, sample_rate: u32) -> Self {
        Self {
            config,
            sample_rate,
            strength: 0.0,
            last_beat: None,
            awaiting: true,
        }
    }

    pub fn config(&self) -> &BeatConfig {
        &self.config
    }

    /// Strength as of the last poll.
    pub fn strength(&self) -> f64 {
        self.strength
    }

    /// Time of the last fired beat.
    pub fn last_beat(&self) -> Option<f64> {
        self.last_beat
    }

    /// Forget the last beat and wait for a new one. Call whenever playback
    /// jumps backwards.
    pub fn reset(&mut self) {
        self.strength = 0.0;
        self.last_beat = None;
        self.awaiting = true;
    }

    /// Update from `song` at playback time `t` seconds.
    ///
    /// A time of exactly zero means playback hasn't started; the state is
    /// left untouched.
    pub fn poll(&mut self, song: &Song, t: f64) -> BeatSample {
        if t == 0.0 {
            return BeatSample { strength: self.strength, fired: false };
        }
        let channel = self.config.channel;
        let strength = song.instrument(channel).and_then(|inst| {
            let samples = samples_since_note(song, t, channel, self.sample_rate)?;
            envelope_strength(inst, samples, self.config.min_envelope)
        });
        self.observe(t, strength)
    }

    /// Feed a strength reading taken at time `t`. `None` means no beat
    /// data, which counts as zero strength.
    pub fn observe(&mut self, t: f64, strength: Option<f64>) -> BeatSample {
        let strength = strength.unwrap_or(0.0);
        self.strength = strength;

        if strength <= self.config.trigger_level {
            self.awaiting = true;
            return BeatSample { strength, fired: false };
        }

        let cooled = self.last_beat.map_or(true, |last| t - last > self.config.cooldown);
        let fired = self.awaiting && cooled;
        if fired {
            log::trace!("beat at {:.3}s (strength {:.2})", t, strength);
            self.last_beat = Some(t);
            self.awaiting = false;
        }
        BeatSample { strength, fired }
    }
}
