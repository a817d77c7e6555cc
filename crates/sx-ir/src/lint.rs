//! Consistency checks for hand-edited song data.
//!
//! None of these stop a song from rendering: dangling references play as
//! silence and unstable filters render as they are. They are reported so
//! loaders and tools can warn about them.

use alloc::vec::Vec;
use core::fmt;

use crate::instrument::{Filter, FilterKind};
use crate::song::Song;

/// A problem found in a song.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SongIssue {
    /// A sequence entry names a pattern the instrument doesn't have
    DanglingPattern { instrument: usize, seq_pos: usize, pattern: u8 },
    /// The sequence ends before the song does; the rest plays silence
    ShortSequence { instrument: usize, len: usize, measures: usize },
    /// `end_pattern` is 0, so nothing is sequenced
    NoMeasures,
    /// The filter's feedback coefficient exceeds 1 at this cutoff
    UnstableFilter { instrument: usize, coefficient: f64 },
}

impl fmt::Display for SongIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SongIssue::DanglingPattern { instrument, seq_pos, pattern } => write!(
                f,
                "instrument {} position {} references missing pattern {}",
                instrument, seq_pos, pattern
            ),
            SongIssue::ShortSequence { instrument, len, measures } => write!(
                f,
                "instrument {} sequence has {} of {} positions",
                instrument, len, measures
            ),
            SongIssue::NoMeasures => write!(f, "song has no sequenced measures"),
            SongIssue::UnstableFilter { instrument, coefficient } => write!(
                f,
                "instrument {} filter coefficient {:.3} exceeds 1",
                instrument, coefficient
            ),
        }
    }
}

impl Song {
    /// Check the song for inconsistencies, at the given sample rate.
    pub fn issues(&self, sample_rate: u32) -> Vec<SongIssue> {
        let mut issues = Vec::new();
        let measures = self.measures();
        if measures == 0 {
            issues.push(SongIssue::NoMeasures);
        }

        for (i, inst) in self.instruments.iter().enumerate() {
            for (seq_pos, &pattern) in inst.sequence.iter().enumerate() {
                if pattern != 0 && pattern as usize > inst.patterns.len() {
                    issues.push(SongIssue::DanglingPattern { instrument: i, seq_pos, pattern });
                }
            }
            if inst.sequence.len() < measures {
                issues.push(SongIssue::ShortSequence {
                    instrument: i,
                    len: inst.sequence.len(),
                    measures,
                });
            }
            if inst.filter.kind != FilterKind::None {
                // The LFO can only scale the cutoff down, so the base cutoff is the worst case
                let coefficient = Filter::coefficient(inst.filter.cutoff as f64, sample_rate);
                if coefficient > 1.0 {
                    issues.push(SongIssue::UnstableFilter { instrument: i, coefficient });
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrument;
    use crate::pattern::Pattern;

    fn song_with(inst: Instrument, end_pattern: u32) -> Song {
        let mut song = Song::new("lint");
        song.end_pattern = end_pattern;
        song.instruments.push(inst);
        song
    }

    #[test]
    fn clean_song_has_no_issues() {
        let mut inst = Instrument::new("ok");
        inst.patterns.push(Pattern::new());
        inst.sequence = alloc::vec![1, 0];
        assert!(song_with(inst, 3).issues(44100).is_empty());
    }

    #[test]
    fn reports_dangling_and_short_sequences() {
        let mut inst = Instrument::new("bad");
        inst.patterns.push(Pattern::new());
        inst.sequence = alloc::vec![1, 3];

        let issues = song_with(inst, 4).issues(44100);
        assert_eq!(
            issues,
            alloc::vec![
                SongIssue::DanglingPattern { instrument: 0, seq_pos: 1, pattern: 3 },
                SongIssue::ShortSequence { instrument: 0, len: 2, measures: 3 },
            ]
        );
    }

    #[test]
    fn reports_unstable_filter() {
        let mut inst = Instrument::new("hot");
        inst.filter.kind = FilterKind::LowPass;
        inst.filter.cutoff = 11025;

        let issues = song_with(inst, 1).issues(44100);
        assert!(issues.contains(&SongIssue::NoMeasures));
        assert!(issues
            .iter()
            .any(|i| matches!(i, SongIssue::UnstableFilter { instrument: 0, coefficient } if *coefficient > 1.0)));
    }
}
