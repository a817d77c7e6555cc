//! File formats for the sonant synthesizer.
//!
//! Loads sonant-x JSON songs into the IR and reads/writes PCM WAV files.

mod sonant_json;
mod wav_format;

pub use sonant_json::load_song_json;
pub use wav_format::{frames_to_wav, read_wav, write_wav, WavAudio};

use thiserror::Error;

/// Error type for format parsing.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Malformed or incomplete song JSON
    #[error("invalid song JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Waveform index outside 0-3
    #[error("instrument {instrument}: {field} {value} is not a waveform (0-3)")]
    InvalidWaveform { instrument: usize, field: &'static str, value: u8 },
    /// Filter index outside 0-4
    #[error("instrument {instrument}: filter {value} is not a filter type (0-4)")]
    InvalidFilter { instrument: usize, value: u8 },
    /// Pattern without exactly 32 notes
    #[error("instrument {instrument}: pattern {pattern} has {len} notes, expected 32")]
    PatternLength { instrument: usize, pattern: usize, len: usize },
    /// Invalid file header or magic bytes
    #[error("invalid WAV header")]
    InvalidHeader,
    /// Unexpected end of file
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Valid WAV, but an encoding we don't read
    #[error("unsupported WAV encoding: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
