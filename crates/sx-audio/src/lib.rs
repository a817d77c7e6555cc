//! Audio playback for the sonant synthesizer.
//!
//! Rendered songs are played through a [`PlaybackHandle`]: either a real
//! output device ([`CpalPlayer`]) or a clock driven by the caller
//! ([`OfflinePlayer`]).

mod cpal_backend;
mod offline;
mod traits;

pub use cpal_backend::CpalPlayer;
pub use offline::OfflinePlayer;
pub use traits::{AudioError, PlaybackHandle};
