//! Note-to-frequency conversion.
//!
//! Frequencies are phase increments in cycles per sample, so they don't
//! depend on the output sample rate.

use sx_ir::{Instrument, Oscillator, REFERENCE_NOTE};

/// Phase increment of the reference note (128): 1/256 cycle per sample.
const BASE_INCREMENT: f64 = 0.00390625;

/// Equal-tempered semitone ratio, 2^(1/12).
const SEMITONE: f64 = 1.059463094;

/// Phase increment for note `n` (may be outside the 1-255 note range
/// after transposition).
pub fn note_frequency(n: i32) -> f64 {
    BASE_INCREMENT * libm::pow(SEMITONE, (n - REFERENCE_NOTE as i32) as f64)
}

/// Phase increment of `osc` playing `note`, including octave, semitone
/// and fine detune.
pub fn oscillator_increment(osc: &Oscillator, note: u8) -> f64 {
    note_frequency(osc.transpose(note)) * osc.detune_factor()
}

/// Phase increment of an LFO-style rate exponent (`2^(rate-8)` cycles per row).
pub fn rate_increment(rate: u8, row_len: u32) -> f64 {
    libm::pow(2.0, rate as f64 - 8.0) / row_len as f64
}

/// LFO increment for an instrument.
pub fn lfo_increment(inst: &Instrument, row_len: u32) -> f64 {
    rate_increment(inst.lfo.freq, row_len)
}

/// Auto-pan increment for an instrument.
pub fn pan_increment(inst: &Instrument, row_len: u32) -> f64 {
    rate_increment(inst.pan.freq, row_len)
}
