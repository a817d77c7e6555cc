//! Track rendering: one instrument's whole timeline into a channel buffer.

use alloc::vec;
use alloc::vec::Vec;
use sx_ir::{Song, PATTERN_ROWS};

use crate::delay::DelayPass;
use crate::frame::Frame;
use crate::scheduler::{SliceBudget, StepStatus, Unbounded};
use crate::sound::SoundGenerator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TrackPhase {
    Record,
    Delay,
    Done,
}

/// Resumable renderer for one instrument.
///
/// Walks the instrument's sequence row by row, rendering each note at its
/// row's sample position, then runs the instrument's delay over the whole
/// channel buffer. The channel buffer must start out silent.
#[derive(Clone, Debug)]
pub struct TrackRenderer {
    channel: usize,
    sound: SoundGenerator,
    delay: DelayPass,
    phase: TrackPhase,
    seq_pos: usize,
    row: usize,
    position: usize,
}

impl TrackRenderer {
    /// Create a renderer for `song`'s instrument on `channel`.
    ///
    /// Returns `None` if the song has no such instrument.
    pub fn new(song: &Song, channel: usize, sample_rate: u32, noise_seed: u64) -> Option<Self> {
        let inst = song.instrument(channel)?;
        Some(Self {
            channel,
            sound: SoundGenerator::new(inst, song.row_len, sample_rate, noise_seed ^ channel as u64),
            delay: DelayPass::new(&inst.delay, song.row_len),
            phase: TrackPhase::Record,
            seq_pos: 0,
            row: 0,
            position: 0,
        })
    }

    /// Channel this renderer is drawing.
    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn is_done(&self) -> bool {
        self.phase == TrackPhase::Done
    }

    /// Render until the track is complete or the budget runs out.
    ///
    /// The budget is checked after every row while recording, so a slice
    /// never ends partway through a note.
    pub fn step(&mut self, song: &Song, buf: &mut [Frame], budget: &mut impl SliceBudget) -> StepStatus {
        if self.phase == TrackPhase::Record {
            if self.record(song, buf, budget) == StepStatus::Pending {
                return StepStatus::Pending;
            }
            self.phase = TrackPhase::Delay;
        }
        if self.phase == TrackPhase::Delay {
            if self.delay.step(buf, budget) == StepStatus::Pending {
                return StepStatus::Pending;
            }
            log::debug!("channel {} rendered", self.channel);
            self.phase = TrackPhase::Done;
        }
        StepStatus::Done
    }

    fn record(&mut self, song: &Song, buf: &mut [Frame], budget: &mut impl SliceBudget) -> StepStatus {
        let Some(inst) = song.instrument(self.channel) else {
            return StepStatus::Done;
        };
        let measures = song.measures();
        let row_len = song.row_len as usize;

        loop {
            if self.row == PATTERN_ROWS {
                self.row = 0;
                self.seq_pos += 1;
            }
            if self.seq_pos >= measures {
                return StepStatus::Done;
            }
            // Rows starting past the buffer can't be heard
            if self.position >= buf.len() {
                log::warn!(
                    "channel {}: song runs past {} frames, dropping from position {}",
                    self.channel,
                    buf.len(),
                    self.seq_pos
                );
                return StepStatus::Done;
            }

            if let Some(note) = inst.note_at(self.seq_pos, self.row) {
                self.sound.render(note, buf, self.position);
            }
            self.position += row_len;
            self.row += 1;

            if budget.should_yield() {
                return StepStatus::Pending;
            }
        }
    }
}

/// Render one instrument's full timeline (with delay) into a new buffer
/// of `frames` frames.
pub fn render_track(song: &Song, channel: usize, frames: usize, sample_rate: u32, noise_seed: u64) -> Vec<Frame> {
    let mut buf = vec![Frame::silence(); frames];
    if let Some(mut track) = TrackRenderer::new(song, channel, sample_rate, noise_seed) {
        track.step(song, &mut buf, &mut Unbounded);
    }
    buf
}
