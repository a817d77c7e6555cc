//! Audio packaging: turns a raw mix into playable audio.

use sx_engine::{Frame, SliceBudget, StepStatus, CHECK_INTERVAL, OUTPUT_GAIN};

/// Finished, playable audio.
///
/// Frames are already amplified by [`OUTPUT_GAIN`] and clamped to the
/// 16-bit range.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPackage {
    pub sample_rate: u32,
    pub frames: Vec<Frame>,
}

impl AudioPackage {
    /// Package a raw mix in one go.
    pub fn from_mix(mix: Vec<Frame>, sample_rate: u32) -> Self {
        let mut packager = Packager::new(mix, sample_rate);
        packager.step(&mut sx_engine::Unbounded);
        packager.finish()
    }

    pub fn duration(&self) -> f64 {
        self.frames.len() as f64 / self.sample_rate as f64
    }

    /// Size of the PCM data in bytes (16-bit stereo).
    pub fn byte_len(&self) -> usize {
        self.frames.len() * 4
    }

    /// Encode as a 16-bit stereo WAV file.
    pub fn to_wav(&self) -> Vec<u8> {
        sx_formats::frames_to_wav(&self.frames, self.sample_rate)
    }

    /// Deinterleave into normalized `(left, right)` float channels.
    pub fn to_float_channels(&self) -> (Vec<f32>, Vec<f32>) {
        self.frames.iter().map(|f| f.to_f32()).unzip()
    }
}

/// Resumable packaging pass: amplifies and clamps a mix in place.
#[derive(Debug)]
pub struct Packager {
    frames: Vec<Frame>,
    sample_rate: u32,
    cursor: usize,
}

impl Packager {
    pub fn new(mix: Vec<Frame>, sample_rate: u32) -> Self {
        log::debug!("packaging {} frames (gain {})", mix.len(), OUTPUT_GAIN);
        Self { frames: mix, sample_rate, cursor: 0 }
    }

    pub fn is_done(&self) -> bool {
        self.cursor >= self.frames.len()
    }

    pub fn step(&mut self, budget: &mut impl SliceBudget) -> StepStatus {
        let mut count = 0;
        while self.cursor < self.frames.len() {
            self.frames[self.cursor] = self.frames[self.cursor].amplified();
            self.cursor += 1;
            count += 1;
            if count % CHECK_INTERVAL == 0 && budget.should_yield() {
                return StepStatus::Pending;
            }
        }
        StepStatus::Done
    }

    /// The packaged audio. Frames past the cursor are still raw if called
    /// before the pass is done.
    pub fn finish(self) -> AudioPackage {
        AudioPackage { sample_rate: self.sample_rate, frames: self.frames }
    }
}
