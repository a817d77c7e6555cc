//! Sound generator: renders one instrument note into a frame buffer.

use alloc::vec;
use alloc::vec::Vec;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use sx_ir::{Envelope, Filter, FilterKind, Instrument, Lfo, Oscillator, Panning, PATTERN_ROWS};

use crate::delay::apply_delay;
use crate::frame::Frame;
use crate::frequency::{lfo_increment, oscillator_increment, pan_increment};
use crate::oscillator::{oscillate, sine};

/// Per-instrument synthesis state.
///
/// Holds a copy of the instrument's synthesis parameters, the derived
/// LFO/pan rates and the noise generator. Notes rendered with the same
/// generator draw consecutive noise from the same stream.
#[derive(Clone, Debug)]
pub struct SoundGenerator {
    osc1: Oscillator,
    osc2: Oscillator,
    noise_fader: u8,
    envelope: Envelope,
    filter: Filter,
    lfo: Lfo,
    pan: Panning,
    lfo_increment: f64,
    pan_increment: f64,
    sample_rate: u32,
    noise: Pcg32,
}

impl SoundGenerator {
    /// Create a generator for `inst` at the given row length and sample rate.
    pub fn new(inst: &Instrument, row_len: u32, sample_rate: u32, noise_seed: u64) -> Self {
        Self {
            osc1: inst.osc1,
            osc2: inst.osc2,
            noise_fader: inst.noise_fader,
            envelope: inst.envelope,
            filter: inst.filter,
            lfo: inst.lfo,
            pan: inst.pan,
            lfo_increment: lfo_increment(inst, row_len),
            pan_increment: pan_increment(inst, row_len),
            sample_rate,
            noise: Pcg32::seed_from_u64(noise_seed),
        }
    }

    /// Number of frames a note occupies.
    pub fn note_length(&self) -> usize {
        self.envelope.length() as usize
    }

    /// Render `note` starting at frame `start`, adding into `buf`.
    ///
    /// Samples are generated from the end of the note backwards; the
    /// oscillator phases and filter state run in that order. Frames that
    /// fall outside `buf` are still computed (they feed the filter) but
    /// not written.
    pub fn render(&mut self, note: u8, buf: &mut [Frame], start: usize) {
        let len = self.envelope.length();
        if start + len as usize > buf.len() {
            log::trace!("note at {} overhangs buffer end {}", start, buf.len());
        }

        let osc1_inc = oscillator_increment(&self.osc1, note);
        let osc2_inc = oscillator_increment(&self.osc2, note);
        let q = self.filter.resonance as f64 / 255.0;
        let lfo_depth = self.lfo.amount as f64 / 512.0;
        let pan_depth = self.pan.amount as f64 / 512.0;
        let gain = 39.0 * self.envelope.master as f64;

        let mut phase1 = 0.0;
        let mut phase2 = 0.0;
        let mut low = 0.0;
        let mut band = 0.0;

        for j in (0..len).rev() {
            let k = start + j as usize;
            let lfo = oscillate(self.lfo.waveform, k as f64 * self.lfo_increment) * lfo_depth + 0.5;
            let e = self.envelope.gain(j);

            let mut inc = osc1_inc;
            if self.lfo.modulate_osc1 {
                inc += lfo;
            }
            if self.osc1.envelope_follow {
                inc *= e * e;
            }
            phase1 += inc;
            let mut sample = oscillate(self.osc1.waveform, phase1) * self.osc1.volume as f64;

            let mut inc = osc2_inc;
            if self.osc2.envelope_follow {
                inc *= e * e;
            }
            phase2 += inc;
            sample += oscillate(self.osc2.waveform, phase2) * self.osc2.volume as f64;

            if self.noise_fader != 0 {
                let white = 2.0 * self.noise.gen::<f64>() - 1.0;
                sample += white * self.noise_fader as f64 * e;
            }

            sample *= e / 255.0;

            let mut cutoff = self.filter.cutoff as f64;
            if self.lfo.modulate_filter {
                cutoff *= lfo;
            }
            let f = Filter::coefficient(cutoff, self.sample_rate);
            low += f * band;
            let high = q * (sample - band) - low;
            band += f * high;
            sample = match self.filter.kind {
                FilterKind::None => sample,
                FilterKind::HighPass => high,
                FilterKind::LowPass => low,
                FilterKind::BandPass => band,
                FilterKind::Notch => low + high,
            };

            let pan = sine(k as f64 * self.pan_increment) * pan_depth + 0.5;
            sample *= gain;

            if let Some(frame) = buf.get_mut(k) {
                frame.accumulate(sample * (1.0 - pan), sample * pan);
            }
        }
    }
}

/// Render a single note of `inst` in isolation, with its delay applied.
///
/// The buffer is long enough for the note plus one measure of delay tail.
pub fn render_note(inst: &Instrument, note: u8, row_len: u32, sample_rate: u32, noise_seed: u64) -> Vec<Frame> {
    let len = (inst.envelope.length() as usize).saturating_sub(1) + PATTERN_ROWS * row_len as usize;
    let mut buf = vec![Frame::silence(); len];
    let mut gen = SoundGenerator::new(inst, row_len, sample_rate, noise_seed);
    gen.render(note, &mut buf, 0);
    apply_delay(&mut buf, &inst.delay, row_len);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use sx_ir::{Delay, Waveform};

    fn tone() -> Instrument {
        let mut inst = Instrument::new("tone");
        inst.osc1 = Oscillator { volume: 192, waveform: Waveform::Square, ..Default::default() };
        inst.osc2 = Oscillator { volume: 64, waveform: Waveform::Saw, octave: 7, ..Default::default() };
        inst.envelope = Envelope { attack: 100, sustain: 400, release: 500, master: 128 };
        inst
    }

    #[test]
    fn renders_audible_note_within_envelope() {
        let inst = tone();
        let mut buf = vec![Frame::silence(); 2000];
        SoundGenerator::new(&inst, 2242, 44100, 0).render(128, &mut buf, 100);

        assert!(buf[..100].iter().all(|f| *f == Frame::silence()));
        assert!(buf[100..1100].iter().any(|f| *f != Frame::silence()));
        assert!(buf[1100..].iter().all(|f| *f == Frame::silence()));
    }

    #[test]
    fn rendering_adds_into_existing_content() {
        let inst = tone();
        let mut once = vec![Frame::silence(); 1200];
        SoundGenerator::new(&inst, 2242, 44100, 0).render(128, &mut once, 0);

        let mut twice = vec![Frame::silence(); 1200];
        let mut gen = SoundGenerator::new(&inst, 2242, 44100, 0);
        gen.render(128, &mut twice, 0);
        gen.render(128, &mut twice, 0);

        // Two identical noise-free renders roughly double the signal
        let peak_once = once.iter().map(|f| (f.left as i32).abs()).max().unwrap_or(0);
        let peak_twice = twice.iter().map(|f| (f.left as i32).abs()).max().unwrap_or(0);
        assert!(peak_once > 0);
        assert!((peak_twice - 2 * peak_once).abs() <= 2, "{} vs {}", peak_twice, peak_once);
    }

    #[test]
    fn overhanging_note_is_clipped_silently() {
        let inst = tone();
        let mut buf = vec![Frame::silence(); 600];
        SoundGenerator::new(&inst, 2242, 44100, 0).render(128, &mut buf, 300);
        assert!(buf[300..].iter().any(|f| *f != Frame::silence()));

        let mut empty: Vec<Frame> = Vec::new();
        SoundGenerator::new(&inst, 2242, 44100, 0).render(128, &mut empty, 0);
    }

    #[test]
    fn noise_free_render_is_reproducible() {
        let inst = tone();
        let mut a = vec![Frame::silence(); 1000];
        let mut b = vec![Frame::silence(); 1000];
        SoundGenerator::new(&inst, 2242, 44100, 1).render(140, &mut a, 0);
        SoundGenerator::new(&inst, 2242, 44100, 2).render(140, &mut b, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn seeded_noise_is_reproducible() {
        let mut inst = tone();
        inst.noise_fader = 200;
        let mut a = vec![Frame::silence(); 1000];
        let mut b = vec![Frame::silence(); 1000];
        let mut c = vec![Frame::silence(); 1000];
        SoundGenerator::new(&inst, 2242, 44100, 9).render(128, &mut a, 0);
        SoundGenerator::new(&inst, 2242, 44100, 9).render(128, &mut b, 0);
        SoundGenerator::new(&inst, 2242, 44100, 10).render(128, &mut c, 0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn pan_amount_moves_signal_between_channels() {
        let mut inst = tone();
        let mut centered = vec![Frame::silence(); 1000];
        SoundGenerator::new(&inst, 2242, 44100, 0).render(128, &mut centered, 0);
        assert!(centered.iter().all(|f| (f.left as i32 - f.right as i32).abs() <= 1));

        inst.pan = Panning { freq: 6, amount: 255 };
        let mut panned = vec![Frame::silence(); 1000];
        SoundGenerator::new(&inst, 2242, 44100, 0).render(128, &mut panned, 0);
        assert!(panned.iter().any(|f| (f.left as i32 - f.right as i32).abs() > 1));
    }

    #[test]
    fn lowpass_removes_high_notes() {
        let mut inst = tone();
        inst.osc2.volume = 0;
        let mut open = vec![Frame::silence(); 1000];
        SoundGenerator::new(&inst, 2242, 44100, 0).render(200, &mut open, 0);

        inst.filter = Filter { kind: FilterKind::LowPass, cutoff: 100, resonance: 255 };
        let mut filtered = vec![Frame::silence(); 1000];
        SoundGenerator::new(&inst, 2242, 44100, 0).render(200, &mut filtered, 0);

        let energy = |buf: &[Frame]| buf.iter().map(|f| (f.left as f64).powi(2)).sum::<f64>();
        assert!(energy(&filtered) < energy(&open) * 0.1);
    }

    #[test]
    fn preview_covers_note_and_delay_tail() {
        let mut inst = tone();
        inst.delay = Delay { time: 2, amount: 128 };
        let buf = render_note(&inst, 128, 100, 44100, 0);
        assert_eq!(buf.len(), 999 + 32 * 100);
        // Delay echoes land past the dry note
        assert!(buf[1000..1300].iter().any(|f| *f != Frame::silence()));
    }
}
