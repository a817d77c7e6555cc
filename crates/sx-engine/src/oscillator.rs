//! Stateless waveform generators.
//!
//! Phases are in cycles, not radians: a phase of 1.0 is one full period.

use sx_ir::Waveform;

/// 2π as the synth has always rounded it. Part of the output's bit pattern.
const TWO_PI: f64 = 6.283184;

pub fn sine(phase: f64) -> f64 {
    libm::sin(phase * TWO_PI)
}

/// ±1, following the sign of [`sine`]; a zero sine maps to +1.
pub fn square(phase: f64) -> f64 {
    if sine(phase) < 0.0 { -1.0 } else { 1.0 }
}

pub fn saw(phase: f64) -> f64 {
    (phase % 1.0) - 0.5
}

/// Rises from -1 at phase 0 to +1 at phase 0.5, then falls back.
pub fn triangle(phase: f64) -> f64 {
    let v = (phase % 1.0) * 4.0;
    if v < 2.0 { v - 1.0 } else { 3.0 - v }
}

/// Evaluate `waveform` at `phase`.
pub fn oscillate(waveform: Waveform, phase: f64) -> f64 {
    match waveform {
        Waveform::Sine => sine(phase),
        Waveform::Square => square(phase),
        Waveform::Saw => saw(phase),
        Waveform::Triangle => triangle(phase),
    }
}
