//! Song structure and sequencing types.

use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::instrument::Instrument;
use crate::pattern::PATTERN_ROWS;

/// Output sample rate the song data is authored against.
pub const SAMPLE_RATE: u32 = 44100;

/// Row length used when a song doesn't specify one.
pub const DEFAULT_ROW_LEN: u32 = 5605;

/// A complete song.
///
/// Songs are authored offline and treated as read-only by both the
/// generator and the beat detector.
#[derive(Clone, Debug)]
pub struct Song {
    /// Song title
    pub title: ArrayString<32>,
    /// Samples per row
    pub row_len: u32,
    /// One past the last song position; position `end_pattern - 1` marks the end
    pub end_pattern: u32,
    /// Length of the rendered audio in seconds
    pub song_len: f64,
    /// Instruments, one per channel
    pub instruments: Vec<Instrument>,
}

/// Copy as much of `src` into `dst` as fits, ending on a char boundary.
pub(crate) fn copy_truncated<const CAP: usize>(dst: &mut ArrayString<CAP>, src: &str) {
    dst.clear();
    let mut end = src.len().min(CAP);
    while !src.is_char_boundary(end) {
        end -= 1;
    }
    dst.push_str(&src[..end]);
}

impl Default for Song {
    fn default() -> Self {
        Self {
            title: ArrayString::new(),
            row_len: DEFAULT_ROW_LEN,
            end_pattern: 1,
            song_len: 0.0,
            instruments: Vec::new(),
        }
    }
}

impl Song {
    /// Create a new empty song.
    pub fn new(title: &str) -> Self {
        let mut song = Self::default();
        song.set_title(title);
        song
    }

    /// Replace the title, cutting it short if it doesn't fit.
    pub fn set_title(&mut self, title: &str) {
        copy_truncated(&mut self.title, title);
    }

    /// Number of measures that are actually sequenced.
    pub fn measures(&self) -> usize {
        self.end_pattern.saturating_sub(1) as usize
    }

    /// Number of sequenced rows.
    pub fn rows(&self) -> usize {
        self.measures() * PATTERN_ROWS
    }

    /// Number of stereo frames in the rendered audio.
    pub fn frames(&self, sample_rate: u32) -> usize {
        let frames = libm::round(self.song_len * sample_rate as f64);
        if frames > 0.0 { frames as usize } else { 0 }
    }

    /// Sample offset at which the sequenced music ends.
    pub fn music_frames(&self) -> usize {
        self.rows() * self.row_len as usize
    }

    /// Time at which the sequenced music ends, capped at the audio length.
    pub fn music_duration(&self, sample_rate: u32) -> f64 {
        let music = self.music_frames() as f64 / sample_rate as f64;
        music.min(self.song_len)
    }

    /// Length of one row in seconds.
    pub fn row_duration(&self, sample_rate: u32) -> f64 {
        self.row_len as f64 / sample_rate as f64
    }

    /// Instrument on the given channel.
    pub fn instrument(&self, channel: usize) -> Option<&Instrument> {
        self.instruments.get(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_song() -> Song {
        let mut song = Song::new("test");
        song.row_len = 2242;
        song.end_pattern = 5;
        song.song_len = 4.0;
        song.instruments.push(Instrument::new("bass"));
        song
    }

    #[test]
    fn sentinel_position_is_not_a_measure() {
        let song = make_test_song();
        assert_eq!(song.measures(), 4);
        assert_eq!(song.rows(), 128);
        assert_eq!(song.music_frames(), 128 * 2242);
    }

    #[test]
    fn frames_round_song_length() {
        let mut song = make_test_song();
        assert_eq!(song.frames(44100), 176400);
        song.song_len = 0.1;
        assert_eq!(song.frames(44100), 4410);
        song.song_len = -1.0;
        assert_eq!(song.frames(44100), 0);
    }

    #[test]
    fn music_duration_is_capped_by_song_length() {
        let mut song = make_test_song();
        song.song_len = 10.0;
        let music = (128 * 2242) as f64 / 44100.0;
        assert!((song.music_duration(44100) - music).abs() < 1e-9);

        song.song_len = 2.0;
        assert_eq!(song.music_duration(44100), 2.0);
    }

    #[test]
    fn long_titles_are_truncated() {
        let mut song = Song::new("a title well past the thirty-two byte limit");
        assert_eq!(song.title.as_str(), "a title well past the thirty-two");
        song.set_title("short");
        assert_eq!(song.title.as_str(), "short");
    }

    #[test]
    fn zero_end_pattern_has_no_measures() {
        let mut song = make_test_song();
        song.end_pattern = 0;
        assert_eq!(song.measures(), 0);
        assert_eq!(song.music_frames(), 0);
    }
}
