//! Engine configuration, loadable from TOML.
//!
//! ```toml
//! sample_rate = 44100
//! slice_budget_ms = 33
//!
//! [beat]
//! channel = 1
//! difficulty = "hard"
//!
//! [playback]
//! loop_margin = 0.7
//! restart_at = 1.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use sx_engine::beat::{MIN_ENVELOPE_SAMPLES, TRIGGER_LEVEL};
use sx_engine::{BeatConfig, Difficulty};

use crate::MasterError;

/// Seed for the noise oscillators when none is configured.
pub const DEFAULT_NOISE_SEED: u64 = 0x736f_6e61_6e74;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// Wall-clock length of one generation slice
    pub slice_budget_ms: u64,
    pub noise_seed: u64,
    pub beat: BeatSection,
    pub playback: PlaybackSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatSection {
    /// Instrument whose notes drive the beat
    pub channel: usize,
    pub trigger_level: f64,
    /// Minimum envelope length in samples
    pub min_envelope: u32,
    pub difficulty: Difficulty,
    /// Explicit cooldown in seconds; overrides `difficulty`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSection {
    /// Seconds before the end of the music at which playback loops
    pub loop_margin: f64,
    /// Where playback resumes after looping, in seconds. The first second
    /// is skipped so the song's opening row isn't replayed on every pass.
    pub restart_at: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: sx_ir::SAMPLE_RATE,
            slice_budget_ms: 33,
            noise_seed: DEFAULT_NOISE_SEED,
            beat: BeatSection::default(),
            playback: PlaybackSection::default(),
        }
    }
}

impl Default for BeatSection {
    fn default() -> Self {
        Self {
            channel: 1,
            trigger_level: TRIGGER_LEVEL,
            min_envelope: MIN_ENVELOPE_SAMPLES,
            difficulty: Difficulty::default(),
            cooldown: None,
        }
    }
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self { loop_margin: 0.7, restart_at: 1.0 }
    }
}

impl BeatSection {
    pub fn cooldown(&self) -> f64 {
        self.cooldown.unwrap_or_else(|| self.difficulty.cooldown())
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, MasterError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, MasterError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, MasterError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Beat detector settings.
    pub fn beat_config(&self) -> BeatConfig {
        BeatConfig {
            channel: self.beat.channel,
            trigger_level: self.beat.trigger_level,
            min_envelope: self.beat.min_envelope,
            cooldown: self.beat.cooldown(),
        }
    }
}
