//! Generation job: music generation followed by packaging.

use std::sync::Arc;
use std::time::Duration;
use sx_engine::{MusicGenerator, ProgressFn, SliceBudget, StepStatus, TimeBudget, Unbounded};
use sx_ir::Song;

use crate::package::{AudioPackage, Packager};
use crate::EngineConfig;

enum Stage {
    Generating(MusicGenerator),
    Packaging(Packager),
    Done(Option<AudioPackage>),
}

/// Renders a song to playable audio in resumable slices.
///
/// Progress is reported in `(done, total)` units: one per instrument plus
/// one for packaging.
pub struct GenerationJob {
    stage: Stage,
    sample_rate: u32,
    slice: Duration,
    reported: usize,
    total: usize,
    on_progress: Option<ProgressFn>,
}

impl GenerationJob {
    pub fn new(song: Arc<Song>, config: &EngineConfig) -> Self {
        let total = song.instruments.len() + 1;
        Self {
            stage: Stage::Generating(MusicGenerator::new(song, config.sample_rate, config.noise_seed)),
            sample_rate: config.sample_rate,
            slice: Duration::from_millis(config.slice_budget_ms),
            reported: 0,
            total,
            on_progress: None,
        }
    }

    /// Register a progress callback.
    pub fn with_progress(mut self, on_progress: ProgressFn) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    /// `(done, total)` work units.
    pub fn progress(&self) -> (usize, usize) {
        match &self.stage {
            Stage::Generating(gen) => gen.progress(),
            Stage::Packaging(_) => (self.total - 1, self.total),
            Stage::Done(_) => (self.total, self.total),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.stage, Stage::Done(_))
    }

    /// Do one slice of work.
    pub fn step(&mut self, budget: &mut impl SliceBudget) -> StepStatus {
        loop {
            match &mut self.stage {
                Stage::Generating(gen) => {
                    let status = gen.step(budget);
                    self.report();
                    if status == StepStatus::Pending {
                        return StepStatus::Pending;
                    }
                    if let Stage::Generating(gen) = std::mem::replace(&mut self.stage, Stage::Done(None)) {
                        self.stage = match gen.into_mix() {
                            Some(mix) => Stage::Packaging(Packager::new(mix, self.sample_rate)),
                            None => Stage::Done(None),
                        };
                    }
                }
                Stage::Packaging(packager) => {
                    if packager.step(budget) == StepStatus::Pending {
                        return StepStatus::Pending;
                    }
                    if let Stage::Packaging(packager) = std::mem::replace(&mut self.stage, Stage::Done(None)) {
                        self.stage = Stage::Done(Some(packager.finish()));
                    }
                    self.report();
                    log::info!("generation complete");
                }
                Stage::Done(_) => return StepStatus::Done,
            }
        }
    }

    /// Forward newly completed units to the callback.
    fn report(&mut self) {
        let (done, total) = self.progress();
        if let Some(on_progress) = self.on_progress.as_mut() {
            for unit in self.reported + 1..=done {
                on_progress(unit, total);
            }
        }
        self.reported = self.reported.max(done);
    }

    /// Take the finished audio. `None` until the job is done.
    pub fn take_package(&mut self) -> Option<AudioPackage> {
        match &mut self.stage {
            Stage::Done(package) => package.take(),
            _ => None,
        }
    }

    /// Run to completion without yielding.
    pub fn run(mut self) -> Option<AudioPackage> {
        self.step(&mut Unbounded);
        self.take_package()
    }

    /// Run to completion in wall-clock slices of the configured length,
    /// calling `between` after every slice.
    pub fn run_sliced(mut self, mut between: impl FnMut(&Self)) -> Option<AudioPackage> {
        while self.step(&mut TimeBudget::new(self.slice)) == StepStatus::Pending {
            between(&self);
        }
        self.take_package()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use sx_engine::{Frame, WorkBudget};
    use sx_ir::{Envelope, Instrument, Oscillator, Pattern, Waveform};

    fn small_song(instruments: usize) -> Arc<Song> {
        let mut song = Song::new("job");
        song.row_len = 1000;
        song.end_pattern = 2;
        song.song_len = 0.5;
        for i in 0..instruments {
            let mut inst = Instrument::new("sq");
            inst.osc1 = Oscillator { waveform: Waveform::Square, volume: 100, ..Default::default() };
            inst.envelope = Envelope { attack: 100, sustain: 500, release: 400, master: 80 };
            let mut pat = Pattern::new();
            pat.set_note(i * 2, 128 + i as u8);
            inst.patterns.push(pat);
            inst.sequence = vec![1];
            song.instruments.push(inst);
        }
        Arc::new(song)
    }

    #[test]
    fn job_produces_amplified_mix() {
        let song = small_song(2);
        let raw = MusicGenerator::new(song.clone(), 44100, 3).run();
        let config = EngineConfig { noise_seed: 3, ..EngineConfig::default() };
        let package = GenerationJob::new(song, &config).run().unwrap();

        assert_eq!(package.frames.len(), 22050);
        let expected: Vec<Frame> = raw.iter().map(|f| f.amplified()).collect();
        assert_eq!(package.frames, expected);
    }

    #[test]
    fn progress_counts_instruments_then_packaging() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let job = GenerationJob::new(small_song(3), &EngineConfig::default())
            .with_progress(Box::new(move |done, total| sink.lock().unwrap().push((done, total))));
        job.run().unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[test]
    fn sliced_job_matches_unbounded() {
        let song = small_song(2);
        let whole = GenerationJob::new(song.clone(), &EngineConfig::default()).run().unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let mut job = GenerationJob::new(song, &EngineConfig::default())
            .with_progress(Box::new(move |done, total| sink.lock().unwrap().push((done, total))));
        let mut slices = 0;
        while job.step(&mut WorkBudget::new(4)) == StepStatus::Pending {
            slices += 1;
        }
        assert!(slices > 2);
        assert_eq!(job.progress(), (3, 3));
        assert_eq!(job.take_package().unwrap(), whole);
        assert_eq!(*calls.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn wall_clock_slices_complete() {
        let package = GenerationJob::new(small_song(1), &EngineConfig::default())
            .run_sliced(|job| assert!(!job.is_done()))
            .unwrap();
        assert_eq!(package.frames.len(), 22050);
    }

    #[test]
    fn song_without_instruments_is_silent() {
        let package = GenerationJob::new(small_song(0), &EngineConfig::default()).run().unwrap();
        assert!(package.frames.iter().all(|f| *f == Frame::silence()));
    }
}
