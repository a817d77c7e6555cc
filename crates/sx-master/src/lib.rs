//! Headless controller for the sonant synthesizer.
//!
//! Provides a unified API for loading songs, generating audio and running
//! a beat-tracking playback session that the CLI (or a game) can share.

mod config;
mod job;
mod package;
mod parallel;
mod session;

use std::path::Path;
use std::sync::Arc;
use sx_audio::PlaybackHandle;
use sx_engine::{render_note, BeatTracker};
use thiserror::Error;

// Re-export common types so callers don't need the lower crates directly.
pub use config::{BeatSection, EngineConfig, PlaybackSection, DEFAULT_NOISE_SEED};
pub use job::GenerationJob;
pub use package::{AudioPackage, Packager};
pub use parallel::render_parallel;
pub use session::{Session, TickReport};
pub use sx_audio::{AudioError, CpalPlayer, OfflinePlayer};
pub use sx_engine::{BeatSample, Difficulty, Frame, StepStatus};
pub use sx_formats::FormatError;
pub use sx_ir::{Song, SongIssue};

#[derive(Debug, Error)]
pub enum MasterError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("couldn't write config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
    #[error("song has no instrument {0}")]
    NoInstrument(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Owns a song and the engine settings used to render and track it.
pub struct SynthEngine {
    song: Arc<Song>,
    config: EngineConfig,
}

impl SynthEngine {
    pub fn new(song: Song, config: EngineConfig) -> Self {
        Self { song: Arc::new(song), config }
    }

    /// Parse a sonant-x JSON song.
    pub fn from_json(json: &str, config: EngineConfig) -> Result<Self, MasterError> {
        Ok(Self::new(sx_formats::load_song_json(json)?, config))
    }

    /// Load a sonant-x JSON song file, titled after the file name.
    pub fn load(path: &Path, config: EngineConfig) -> Result<Self, MasterError> {
        let json = std::fs::read_to_string(path)?;
        let mut song = sx_formats::load_song_json(&json)?;
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            song.set_title(stem);
        }
        log::info!("loaded {}", path.display());
        Ok(Self::new(song, config))
    }

    pub fn song(&self) -> &Arc<Song> {
        &self.song
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Problems found in the song at the configured sample rate.
    pub fn issues(&self) -> Vec<SongIssue> {
        self.song.issues(self.config.sample_rate)
    }

    // --- Generation ---

    /// A resumable job rendering the whole song.
    pub fn job(&self) -> GenerationJob {
        GenerationJob::new(self.song.clone(), &self.config)
    }

    /// Render the whole song on this thread.
    pub fn generate(&self) -> AudioPackage {
        let mix = sx_engine::MusicGenerator::new(self.song.clone(), self.config.sample_rate, self.config.noise_seed).run();
        AudioPackage::from_mix(mix, self.config.sample_rate)
    }

    /// Render the whole song with one thread per instrument.
    pub fn generate_parallel(&self) -> AudioPackage {
        let mix = render_parallel(&self.song, self.config.sample_rate, self.config.noise_seed);
        AudioPackage::from_mix(mix, self.config.sample_rate)
    }

    /// Render one note of one instrument, with its delay tail.
    pub fn preview_note(&self, instrument: usize, note: u8) -> Result<AudioPackage, MasterError> {
        let inst = self.song.instrument(instrument).ok_or(MasterError::NoInstrument(instrument))?;
        let frames = render_note(inst, note, self.song.row_len, self.config.sample_rate, self.config.noise_seed);
        Ok(AudioPackage::from_mix(frames, self.config.sample_rate))
    }

    // --- Playback ---

    /// A beat tracker for this song.
    pub fn beat_tracker(&self) -> BeatTracker {
        BeatTracker::new(self.config.beat_config(), self.config.sample_rate)
    }

    /// Start a session on `player`, which should be playing this song's audio.
    pub fn session<P: PlaybackHandle>(&self, player: P) -> Session<P> {
        Session::new(self.song.clone(), player, &self.config)
    }

    /// Open the default audio device for a generated package.
    pub fn open_player(&self, package: &AudioPackage) -> Result<CpalPlayer, MasterError> {
        Ok(CpalPlayer::new(package.frames.as_slice().into(), package.sample_rate)?)
    }
}
