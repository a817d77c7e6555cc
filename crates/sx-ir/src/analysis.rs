//! Song analysis: scans a Song to report what it plays.

use alloc::vec::Vec;
use core::fmt;

use crate::pattern::PATTERN_ROWS;
use crate::song::Song;

/// Summary of the notes a song actually sequences.
pub struct SongSummary {
    pub measures: usize,
    pub duration: f64,
    pub total_notes: usize,
    pub note_range: Option<(u8, u8)>,
    /// Triggered notes per instrument
    pub notes_per_instrument: Vec<usize>,
}

/// Analyze a song and return a summary of the notes it triggers.
///
/// Only positions before the end sentinel are counted.
pub fn analyze(song: &Song) -> SongSummary {
    let mut summary = SongSummary {
        measures: song.measures(),
        duration: song.song_len,
        total_notes: 0,
        note_range: None,
        notes_per_instrument: Vec::with_capacity(song.instruments.len()),
    };

    for inst in &song.instruments {
        let mut count = 0;
        for seq_pos in 0..song.measures() {
            let Some(pattern) = inst.pattern_at(seq_pos) else {
                continue;
            };
            for (_, n) in pattern.triggers() {
                count += 1;
                summary.note_range = Some(match summary.note_range {
                    Some((lo, hi)) => (lo.min(n), hi.max(n)),
                    None => (n, n),
                });
            }
        }
        summary.total_notes += count;
        summary.notes_per_instrument.push(count);
    }

    summary
}

impl fmt::Display for SongSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Measures: {} ({} rows), {:.2}s",
            self.measures,
            self.measures * PATTERN_ROWS,
            self.duration,
        )?;
        writeln!(f, "Notes:    {} total", self.total_notes)?;
        if let Some((lo, hi)) = self.note_range {
            writeln!(f, "Range:    {} - {}", lo, hi)?;
        }
        for (i, count) in self.notes_per_instrument.iter().enumerate() {
            writeln!(f, "  Ch {}: {} notes", i, count)?;
        }
        Ok(())
    }
}
