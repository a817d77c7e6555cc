//! Music generator: renders every instrument of a song into one mix.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use sx_ir::Song;

use crate::frame::Frame;
use crate::scheduler::{SliceBudget, StepStatus, Unbounded, CHECK_INTERVAL};
use crate::track::TrackRenderer;

/// Callback receiving `(completed, total)` work units.
pub type ProgressFn = Box<dyn FnMut(usize, usize) + Send>;

enum Stage {
    /// Rendering an instrument into the channel buffer
    Track(TrackRenderer),
    /// Adding the channel buffer into the mix
    Merge { cursor: usize },
    Finished,
}

/// Resumable whole-song renderer.
///
/// Instruments are rendered one at a time into a reusable channel buffer,
/// which is then added into the master mix with wrapping 16-bit addition.
/// All buffers are allocated up front, so stepping doesn't allocate.
pub struct MusicGenerator {
    song: Arc<Song>,
    sample_rate: u32,
    noise_seed: u64,
    mix: Vec<Frame>,
    channel: Vec<Frame>,
    /// Instruments completed so far
    completed: usize,
    stage: Stage,
    on_progress: Option<ProgressFn>,
}

impl MusicGenerator {
    /// Create a generator for `song`.
    pub fn new(song: Arc<Song>, sample_rate: u32, noise_seed: u64) -> Self {
        let frames = song.frames(sample_rate);
        let stage = match TrackRenderer::new(&song, 0, sample_rate, noise_seed) {
            Some(track) => Stage::Track(track),
            None => Stage::Finished,
        };
        log::debug!(
            "generating {} instruments, {} frames at {} Hz",
            song.instruments.len(),
            frames,
            sample_rate
        );
        Self {
            song,
            sample_rate,
            noise_seed,
            mix: vec![Frame::silence(); frames],
            channel: vec![Frame::silence(); frames],
            completed: 0,
            stage,
            on_progress: None,
        }
    }

    /// Register a progress callback, called with `(instruments_done, instruments + 1)`
    /// after each instrument is mixed in. The extra unit is left for packaging.
    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn song(&self) -> &Arc<Song> {
        &self.song
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// `(instruments_done, instruments + 1)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.completed, self.song.instruments.len() + 1)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Finished)
    }

    /// The mix so far. Complete once [`is_finished`](Self::is_finished).
    pub fn mix(&self) -> &[Frame] {
        &self.mix
    }

    /// Do one slice of work.
    pub fn step(&mut self, budget: &mut impl SliceBudget) -> StepStatus {
        loop {
            match &mut self.stage {
                Stage::Track(track) => {
                    if track.step(&self.song, &mut self.channel, budget) == StepStatus::Pending {
                        return StepStatus::Pending;
                    }
                    self.stage = Stage::Merge { cursor: 0 };
                }
                Stage::Merge { cursor } => {
                    let mut count = 0;
                    while *cursor < self.mix.len() {
                        self.mix[*cursor].wrapping_mix(self.channel[*cursor]);
                        *cursor += 1;
                        count += 1;
                        if count % CHECK_INTERVAL == 0 && budget.should_yield() {
                            return StepStatus::Pending;
                        }
                    }
                    self.finish_instrument();
                    if budget.should_yield() {
                        return if self.is_finished() { StepStatus::Done } else { StepStatus::Pending };
                    }
                }
                Stage::Finished => return StepStatus::Done,
            }
        }
    }

    fn finish_instrument(&mut self) {
        self.completed += 1;
        let (done, total) = self.progress();
        if let Some(on_progress) = self.on_progress.as_mut() {
            on_progress(done, total);
        }

        self.stage = match TrackRenderer::new(&self.song, self.completed, self.sample_rate, self.noise_seed) {
            Some(track) => {
                self.channel.fill(Frame::silence());
                Stage::Track(track)
            }
            None => {
                log::debug!("mix complete");
                Stage::Finished
            }
        };
    }

    /// Run to completion and return the mix.
    pub fn run(mut self) -> Vec<Frame> {
        self.step(&mut Unbounded);
        self.mix
    }

    /// Take the finished mix. Returns `None` while work remains.
    pub fn into_mix(self) -> Option<Vec<Frame>> {
        if self.is_finished() { Some(self.mix) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::WorkBudget;
    use crate::track::render_track;
    use std::sync::Mutex;
    use sx_ir::{Envelope, Instrument, Oscillator, Pattern, Waveform};

    fn voice(waveform: Waveform, note_row: usize) -> Instrument {
        let mut inst = Instrument::new("v");
        inst.osc1 = Oscillator { volume: 200, waveform, ..Default::default() };
        inst.envelope = Envelope { attack: 20, sustain: 300, release: 200, master: 150 };
        let mut pat = Pattern::new();
        pat.set_note(note_row, 130);
        inst.patterns.push(pat);
        inst.sequence = vec![1, 1];
        inst
    }

    fn two_voice_song() -> Song {
        let mut song = Song::new("mix");
        song.row_len = 800;
        song.end_pattern = 3;
        song.song_len = 1.0;
        song.instruments.push(voice(Waveform::Sine, 0));
        song.instruments.push(voice(Waveform::Triangle, 2));
        song
    }

    #[test]
    fn mix_is_sum_of_tracks() {
        let song = two_voice_song();
        let frames = song.frames(44100);
        let a = render_track(&song, 0, frames, 44100, 0);
        let b = render_track(&song, 1, frames, 44100, 0);

        let mix = MusicGenerator::new(Arc::new(song), 44100, 0).run();
        assert_eq!(mix.len(), 44100);
        for i in 0..frames {
            let mut expected = a[i];
            expected.wrapping_mix(b[i]);
            assert_eq!(mix[i], expected, "frame {}", i);
        }
    }

    #[test]
    fn progress_reports_each_instrument() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let gen = MusicGenerator::new(Arc::new(two_voice_song()), 44100, 0)
            .with_progress(Box::new(move |done, total| sink.lock().unwrap().push((done, total))));
        gen.run();

        assert_eq!(*calls.lock().unwrap(), vec![(1, 3), (2, 3)]);
    }

    #[test]
    fn sliced_generation_matches_unbounded() {
        let song = Arc::new(two_voice_song());
        let whole = MusicGenerator::new(song.clone(), 44100, 7).run();

        let mut gen = MusicGenerator::new(song, 44100, 7);
        let mut slices = 0;
        while gen.step(&mut WorkBudget::new(2)) == StepStatus::Pending {
            slices += 1;
            assert!(slices < 10_000);
        }
        assert!(slices > 4);
        assert_eq!(gen.progress(), (2, 3));
        assert_eq!(gen.into_mix().unwrap(), whole);
    }

    #[test]
    fn unfinished_generator_has_no_mix() {
        let mut gen = MusicGenerator::new(Arc::new(two_voice_song()), 44100, 0);
        gen.step(&mut WorkBudget::new(0));
        assert!(!gen.is_finished());
        assert!(gen.into_mix().is_none());
    }

    #[test]
    fn empty_song_finishes_immediately() {
        let mut song = Song::new("empty");
        song.song_len = 0.5;
        let gen = MusicGenerator::new(Arc::new(song), 44100, 0);
        assert!(gen.is_finished());
        let mix = gen.run();
        assert_eq!(mix.len(), 22050);
        assert!(mix.iter().all(|f| *f == Frame::silence()));
    }
}
