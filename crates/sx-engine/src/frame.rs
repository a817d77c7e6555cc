//! Audio frame type.
//!
//! Frames hold the signed value of a bias-128 16-bit sample pair: the
//! byte-pair midpoint (0x8000) is stored as 0. Arithmetic on frames wraps
//! modulo 2^16 the way the byte-pair encoding does; only [`Frame::amplified`]
//! clamps.

/// Gain applied when a mix is turned into playable audio.
pub const OUTPUT_GAIN: i32 = 4;

/// A stereo audio frame (16-bit integer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub left: i16,
    pub right: i16,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0, right: 0 }
    }

    /// Create a mono frame (same value for both channels).
    pub const fn mono(value: i16) -> Self {
        Self {
            left: value,
            right: value,
        }
    }

    /// Add a fractional contribution to both channels.
    pub fn accumulate(&mut self, left: f64, right: f64) {
        self.left = accumulate_sample(self.left, left);
        self.right = accumulate_sample(self.right, right);
    }

    /// Mix another frame into this one, wrapping on overflow.
    pub fn wrapping_mix(&mut self, other: Frame) {
        self.left = self.left.wrapping_add(other.left);
        self.right = self.right.wrapping_add(other.right);
    }

    /// Amplify by [`OUTPUT_GAIN`] and clamp to the 16-bit range.
    pub fn amplified(self) -> Self {
        Self {
            left: amplify(self.left),
            right: amplify(self.right),
        }
    }

    /// Normalized `(left, right)` in [-1, 1).
    pub fn to_f32(self) -> (f32, f32) {
        (self.left as f32 / 32768.0, self.right as f32 / 32768.0)
    }
}

/// Add `value` to a sample the way the byte-pair buffer does: the biased
/// sum is truncated toward zero, then wrapped to 16 bits.
pub(crate) fn accumulate_sample(sample: i16, value: f64) -> i16 {
    let biased = (sample as f64 + 32768.0 + value) as i64;
    (biased - 32768) as i16
}

fn amplify(sample: i16) -> i16 {
    (sample as i32 * OUTPUT_GAIN).clamp(-32768, 32767) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_truncates_in_biased_domain() {
        let mut f = Frame::silence();
        f.accumulate(1.9, -1.1);
        // 32769.9 -> 32769, 32766.9 -> 32766
        assert_eq!(f, Frame { left: 1, right: -2 });
    }

    #[test]
    fn accumulate_wraps() {
        let mut f = Frame::mono(32767);
        f.accumulate(1.0, 0.0);
        assert_eq!(f.left, -32768);
        assert_eq!(f.right, 32767);
    }

    #[test]
    fn wrapping_mix_wraps() {
        let mut f = Frame::mono(30000);
        f.wrapping_mix(Frame::mono(5000));
        assert_eq!(f.left, (35000i32 - 65536) as i16);
    }

    #[test]
    fn amplified_clamps() {
        assert_eq!(Frame::mono(100).amplified(), Frame::mono(400));
        assert_eq!(Frame::mono(10000).amplified(), Frame::mono(32767));
        assert_eq!(Frame::mono(-10000).amplified(), Frame::mono(-32768));
        assert_eq!(Frame::silence().amplified(), Frame::silence());
    }

    #[test]
    fn to_f32_normalizes() {
        assert_eq!(Frame::mono(-32768).to_f32(), (-1.0, -1.0));
        assert_eq!(Frame { left: 16384, right: 0 }.to_f32(), (0.5, 0.0));
    }
}
