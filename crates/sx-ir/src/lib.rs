//! Core song types for the sonant synthesizer.
//!
//! This crate defines the song representation shared by the generator
//! and the beat detector. Format loaders emit these types; the engine
//! only ever reads them.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod analysis;
mod instrument;
mod lint;
mod pattern;
pub mod song;
mod timestamp;

pub use analysis::{analyze, SongSummary};
pub use instrument::{Delay, Envelope, Filter, FilterKind, Instrument, Lfo, Oscillator, Panning, Waveform};
pub use lint::SongIssue;
pub use pattern::{Pattern, PATTERN_ROWS, REFERENCE_NOTE};
pub use song::{Song, DEFAULT_ROW_LEN, SAMPLE_RATE};
pub use timestamp::RowPosition;
