//! Playback trait and error types.

use thiserror::Error;

/// Error type for audio operations.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Failed to initialize audio device
    #[error("device init error: {0}")]
    DeviceInit(String),
    /// Failed to create audio stream
    #[error("stream create error: {0}")]
    StreamCreate(String),
    /// Playback error
    #[error("playback error: {0}")]
    Playback(String),
    /// No audio device available
    #[error("no audio device available")]
    NoDevice,
    /// Couldn't start the feeder thread
    #[error("failed to start feeder thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A seekable player for one rendered song.
///
/// Mirrors a media element: the song plays once and stops at the end;
/// looping is up to the caller.
pub trait PlaybackHandle {
    /// Length of the audio in seconds.
    fn duration(&self) -> f64;

    /// Start or resume playback.
    fn play(&mut self) -> Result<(), AudioError>;

    /// Pause playback, keeping the position.
    fn pause(&mut self) -> Result<(), AudioError>;

    /// Jump to `seconds`, clamped to the audio.
    fn seek(&mut self, seconds: f64);

    /// Playback position in seconds.
    fn current_time(&self) -> f64;

    /// Playing and not yet at the end.
    fn is_playing(&self) -> bool;
}
