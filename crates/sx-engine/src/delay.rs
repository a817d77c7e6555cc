//! Stereo cross-feedback delay.
//!
//! Each frame's right channel is fed into the left channel `offset` frames
//! later, and its left channel into the right. Frames are processed in
//! ascending order and read after any echo already written to them, so
//! echoes recirculate with the configured gain.

use sx_ir::Delay;

use crate::frame::{accumulate_sample, Frame};
use crate::scheduler::{SliceBudget, StepStatus, Unbounded, CHECK_INTERVAL};

/// Resumable delay pass over a channel buffer.
#[derive(Clone, Debug)]
pub struct DelayPass {
    offset: usize,
    gain: f64,
    cursor: usize,
}

impl DelayPass {
    pub fn new(delay: &Delay, row_len: u32) -> Self {
        Self {
            offset: delay.offset(row_len),
            gain: delay.gain(),
            cursor: 0,
        }
    }

    /// Process frames until the pass completes or the budget runs out.
    pub fn step(&mut self, buf: &mut [Frame], budget: &mut impl SliceBudget) -> StepStatus {
        let end = buf.len().saturating_sub(self.offset);
        let mut count = 0;
        while self.cursor < end {
            let dst = self.cursor + self.offset;
            // Re-read the source after each write; with a zero offset the
            // right channel sees the freshly written left.
            let right = buf[self.cursor].right as f64 * self.gain;
            buf[dst].left = accumulate_sample(buf[dst].left, right);
            let left = buf[self.cursor].left as f64 * self.gain;
            buf[dst].right = accumulate_sample(buf[dst].right, left);
            self.cursor += 1;

            count += 1;
            if count % CHECK_INTERVAL == 0 && budget.should_yield() {
                return StepStatus::Pending;
            }
        }
        StepStatus::Done
    }
}

/// Apply an instrument's delay to a whole buffer in one go.
pub fn apply_delay(buf: &mut [Frame], delay: &Delay, row_len: u32) {
    let mut pass = DelayPass::new(delay, row_len);
    pass.step(buf, &mut Unbounded);
}
