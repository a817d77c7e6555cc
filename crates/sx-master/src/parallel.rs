//! Multi-threaded rendering.

use rayon::prelude::*;
use sx_engine::{render_track, Frame};
use sx_ir::Song;

/// Render every instrument on the rayon pool and mix the results.
///
/// Tracks are independent and mixing is wrapping addition, so the output
/// is bit-identical to [`sx_engine::MusicGenerator`].
pub fn render_parallel(song: &Song, sample_rate: u32, noise_seed: u64) -> Vec<Frame> {
    let frames = song.frames(sample_rate);
    log::debug!("rendering {} instruments in parallel", song.instruments.len());

    (0..song.instruments.len())
        .into_par_iter()
        .map(|channel| render_track(song, channel, frames, sample_rate, noise_seed))
        .reduce(
            || vec![Frame::silence(); frames],
            |mut mix, track| {
                for (out, frame) in mix.iter_mut().zip(track) {
                    out.wrapping_mix(frame);
                }
                mix
            },
        )
}
