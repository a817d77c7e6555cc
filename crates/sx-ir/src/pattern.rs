//! Patterns: reusable one-measure note sequences.

/// Number of rows in every pattern (one measure).
pub const PATTERN_ROWS: usize = 32;

/// Note value that plays at the oscillator's base frequency.
pub const REFERENCE_NOTE: u8 = 128;

/// A 32-row measure of notes for a single instrument.
///
/// A note value of 0 means "no note on this row"; any other value is a
/// pitch where 128 is the reference pitch and each step is one semitone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    pub notes: [u8; PATTERN_ROWS],
}

impl Pattern {
    /// Create a silent pattern.
    pub const fn new() -> Self {
        Self { notes: [0; PATTERN_ROWS] }
    }

    /// Create a pattern from a full row array.
    pub const fn from_notes(notes: [u8; PATTERN_ROWS]) -> Self {
        Self { notes }
    }

    /// Note triggered on `row`, if any.
    pub fn note(&self, row: usize) -> Option<u8> {
        match self.notes.get(row) {
            Some(&n) if n != 0 => Some(n),
            _ => None,
        }
    }

    /// Set (or clear, with 0) the note on `row`.
    pub fn set_note(&mut self, row: usize, note: u8) {
        debug_assert!(row < PATTERN_ROWS);
        self.notes[row] = note;
    }

    /// Returns true if no row triggers a note.
    pub fn is_empty(&self) -> bool {
        self.notes.iter().all(|&n| n == 0)
    }

    /// Iterate over `(row, note)` for every triggered row.
    pub fn triggers(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.notes
            .iter()
            .enumerate()
            .filter(|(_, &n)| n != 0)
            .map(|(row, &n)| (row, n))
    }
}
