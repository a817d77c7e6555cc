//! Device-less player driven by an explicit clock.

use crate::traits::{AudioError, PlaybackHandle};

/// A player that produces no sound; time moves only when
/// [`advance`](OfflinePlayer::advance) is called.
///
/// Used for offline beat timelines and for testing sessions without an
/// audio device.
#[derive(Clone, Debug)]
pub struct OfflinePlayer {
    duration: f64,
    position: f64,
    playing: bool,
}

impl OfflinePlayer {
    pub fn new(duration: f64) -> Self {
        Self { duration: duration.max(0.0), position: 0.0, playing: false }
    }

    /// Move the clock forward by `seconds` if playing. Stops at the end.
    pub fn advance(&mut self, seconds: f64) {
        if !self.playing {
            return;
        }
        self.position = (self.position + seconds).min(self.duration);
        if self.position >= self.duration {
            self.playing = false;
        }
    }
}

impl PlaybackHandle for OfflinePlayer {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.position >= self.duration {
            self.position = 0.0;
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.playing = false;
        Ok(())
    }

    fn seek(&mut self, seconds: f64) {
        self.position = seconds.clamp(0.0, self.duration);
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_moves_only_while_playing() {
        let mut player = OfflinePlayer::new(10.0);
        player.advance(1.0);
        assert_eq!(player.current_time(), 0.0);

        player.play().unwrap();
        player.advance(1.5);
        assert_eq!(player.current_time(), 1.5);

        player.pause().unwrap();
        player.advance(1.0);
        assert_eq!(player.current_time(), 1.5);
        assert!(!player.is_playing());
    }

    #[test]
    fn stops_at_the_end() {
        let mut player = OfflinePlayer::new(2.0);
        player.play().unwrap();
        player.advance(5.0);
        assert_eq!(player.current_time(), 2.0);
        assert!(!player.is_playing());

        // Playing again from the end starts over
        player.play().unwrap();
        assert_eq!(player.current_time(), 0.0);
    }

    #[test]
    fn seek_is_clamped() {
        let mut player = OfflinePlayer::new(3.0);
        player.seek(1.25);
        assert_eq!(player.current_time(), 1.25);
        player.seek(-1.0);
        assert_eq!(player.current_time(), 0.0);
        player.seek(99.0);
        assert_eq!(player.current_time(), 3.0);
    }
}
