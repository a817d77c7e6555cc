//! Instrument definitions: oscillators, envelope, filter and effects.

use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::song::copy_truncated;

use crate::pattern::Pattern;

/// Oscillator waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Saw,
    Triangle,
}

impl Waveform {
    /// Map a song-file waveform index (0-3) to a waveform.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Waveform::Sine),
            1 => Some(Waveform::Square),
            2 => Some(Waveform::Saw),
            3 => Some(Waveform::Triangle),
            _ => None,
        }
    }

    /// Song-file index of this waveform.
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Saw => "saw",
            Waveform::Triangle => "triangle",
        }
    }
}

/// One of the instrument's two tone oscillators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Oscillator {
    pub waveform: Waveform,
    /// Octave (8 = the note's own octave)
    pub octave: u8,
    /// Semitone offset added to the note
    pub semitone: u8,
    /// Fine detune (0-255, each step is 0.08% of the frequency)
    pub detune: u8,
    /// Oscillator volume (0-255)
    pub volume: u8,
    /// Scale the frequency by the squared envelope (pitch drops with the envelope)
    pub envelope_follow: bool,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            octave: 8,
            semitone: 0,
            detune: 0,
            volume: 0,
            envelope_follow: false,
        }
    }
}

impl Oscillator {
    /// Note value after applying octave and semitone offsets.
    pub fn transpose(&self, note: u8) -> i32 {
        note as i32 + (self.octave as i32 - 8) * 12 + self.semitone as i32
    }

    /// Frequency multiplier applied by the fine detune.
    pub fn detune_factor(&self) -> f64 {
        1.0 + 0.0008 * self.detune as f64
    }
}

/// Amplitude envelope, in samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Envelope {
    pub attack: u32,
    pub sustain: u32,
    pub release: u32,
    /// Master volume (0-255)
    pub master: u8,
}

impl Envelope {
    /// Total number of samples a note lasts.
    pub fn length(&self) -> u32 {
        self.attack.saturating_add(self.sustain).saturating_add(self.release)
    }

    /// Envelope gain `j` samples after note onset.
    ///
    /// Ramps 0→1 over the attack, holds 1 through the sustain and ramps
    /// 1→0 over the release. Samples past the end have no gain.
    pub fn gain(&self, j: u32) -> f64 {
        if j >= self.length() {
            return 0.0;
        }
        if j < self.attack {
            j as f64 / self.attack as f64
        } else if j >= self.attack.saturating_add(self.sustain) {
            1.0 - (j - self.attack - self.sustain) as f64 / self.release as f64
        } else {
            1.0
        }
    }
}

/// State-variable filter output tap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterKind {
    #[default]
    None,
    HighPass,
    LowPass,
    BandPass,
    Notch,
}

impl FilterKind {
    /// Map a song-file filter index (0-4) to a filter kind.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(FilterKind::None),
            1 => Some(FilterKind::HighPass),
            2 => Some(FilterKind::LowPass),
            3 => Some(FilterKind::BandPass),
            4 => Some(FilterKind::Notch),
            _ => None,
        }
    }

    pub const fn index(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    pub kind: FilterKind,
    /// Cutoff frequency in Hz
    pub cutoff: u32,
    /// Resonance (0-255, 255 = least damping)
    pub resonance: u8,
}

impl Filter {
    /// Feedback coefficient for a cutoff at the given sample rate.
    ///
    /// `1.5·sin(f·π/sr)`; exceeds 1 (and may ring or blow up) for high
    /// cutoffs. This is left uncorrected.
    pub fn coefficient(cutoff: f64, sample_rate: u32) -> f64 {
        1.5 * libm::sin(cutoff * 3.141592 / sample_rate as f64)
    }
}

/// Low-frequency oscillator shared by oscillator 1 and the filter cutoff.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lfo {
    pub waveform: Waveform,
    /// Rate exponent: one cycle every `row_len · 2^(8 - freq)` samples
    pub freq: u8,
    /// Depth (0-255)
    pub amount: u8,
    /// Add the LFO to oscillator 1's phase increment
    pub modulate_osc1: bool,
    /// Scale the filter cutoff by the LFO
    pub modulate_filter: bool,
}

/// Stereo cross-feedback delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Delay {
    /// Delay length in half-rows
    pub time: u8,
    /// Feedback amount (0-255)
    pub amount: u8,
}

impl Delay {
    /// Delay length in samples for the given row length.
    pub fn offset(&self, row_len: u32) -> usize {
        (self.time as usize * row_len as usize) >> 1
    }

    /// Feedback gain in [0, 1].
    pub fn gain(&self) -> f64 {
        self.amount as f64 / 255.0
    }
}

/// Auto-panner driven by a sine LFO.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Panning {
    /// Rate exponent, same scale as [`Lfo::freq`]
    pub freq: u8,
    /// Depth (0-255, 0 = centered)
    pub amount: u8,
}

/// A synthesized instrument and its note data.
#[derive(Clone, Debug, Default)]
pub struct Instrument {
    /// Instrument name
    pub name: ArrayString<26>,
    pub osc1: Oscillator,
    pub osc2: Oscillator,
    /// White noise level (0-255)
    pub noise_fader: u8,
    pub envelope: Envelope,
    pub filter: Filter,
    pub lfo: Lfo,
    pub delay: Delay,
    pub pan: Panning,
    /// Pattern played at each song position (1-based, 0 = silence)
    pub sequence: Vec<u8>,
    /// Pattern pool referenced by `sequence`
    pub patterns: Vec<Pattern>,
}

impl Instrument {
    /// Create a new instrument with default (silent) settings.
    pub fn new(name: &str) -> Self {
        let mut inst = Self::default();
        inst.set_name(name);
        inst
    }

    /// Replace the name, cutting it short if it doesn't fit.
    pub fn set_name(&mut self, name: &str) {
        copy_truncated(&mut self.name, name);
    }

    /// Pattern scheduled at song position `seq_pos`.
    ///
    /// Returns `None` for silent positions, positions past the end of the
    /// sequence, and references to patterns that don't exist.
    pub fn pattern_at(&self, seq_pos: usize) -> Option<&Pattern> {
        let index = *self.sequence.get(seq_pos)? as usize;
        if index == 0 {
            return None;
        }
        self.patterns.get(index - 1)
    }

    /// Note triggered at `row` of song position `seq_pos`, if any.
    pub fn note_at(&self, seq_pos: usize, row: usize) -> Option<u8> {
        self.pattern_at(seq_pos)?.note(row)
    }
}
