//! Synthesis engine for the sonant synthesizer.
//!
//! Renders songs into 16-bit stereo frames, one instrument at a time, and
//! re-derives beat timing from the same song data during playback.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod beat;
mod delay;
mod frame;
mod frequency;
mod music;
pub mod oscillator;
pub mod scheduler;
mod sound;
mod track;

pub use beat::{envelope_strength, samples_since_note, BeatConfig, BeatSample, BeatTracker, Difficulty};
pub use delay::{apply_delay, DelayPass};
pub use frame::{Frame, OUTPUT_GAIN};
pub use frequency::{note_frequency, oscillator_increment};
pub use music::{MusicGenerator, ProgressFn};
pub use scheduler::{SliceBudget, StepStatus, Unbounded, WorkBudget, CHECK_INTERVAL};
#[cfg(feature = "std")]
pub use scheduler::TimeBudget;
pub use sound::{render_note, SoundGenerator};
pub use track::{render_track, TrackRenderer};
