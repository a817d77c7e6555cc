//! Row-based position within a song.

use crate::pattern::PATTERN_ROWS;

/// A playback position expressed in rows.
///
/// `row` counts whole rows from song start; `fraction` is how far into
/// that row playback is, in [0, 1).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RowPosition {
    /// Absolute row from song start
    pub row: u64,
    /// Fraction of the current row elapsed
    pub fraction: f64,
}

impl RowPosition {
    /// Position at an exact row boundary.
    pub const fn from_row(row: u64) -> Self {
        Self { row, fraction: 0.0 }
    }

    /// Convert a playback time in seconds to a row position.
    ///
    /// Negative times clamp to the song start.
    pub fn from_seconds(seconds: f64, row_len: u32, sample_rate: u32) -> Self {
        if row_len == 0 || !(seconds > 0.0) {
            return Self::default();
        }
        let rows = seconds * sample_rate as f64 / row_len as f64;
        let row = libm::floor(rows);
        Self { row: row as u64, fraction: rows - row }
    }

    /// Song position (measure) containing this row.
    pub fn seq_pos(self) -> usize {
        (self.row / PATTERN_ROWS as u64) as usize
    }

    /// Row within the measure.
    pub fn pattern_row(self) -> usize {
        (self.row % PATTERN_ROWS as u64) as usize
    }

    /// `(seq_pos, pattern_row)` of the row `rows_back` rows earlier, or
    /// `None` if that would be before the song start.
    pub fn rows_back(self, rows_back: u64) -> Option<(usize, usize)> {
        let row = self.row.checked_sub(rows_back)?;
        let pos = Self::from_row(row);
        Some((pos.seq_pos(), pos.pattern_row()))
    }

    /// Sample offset of this position.
    pub fn to_samples(self, row_len: u32) -> f64 {
        (self.row as f64 + self.fraction) * row_len as f64
    }
}
