//! CPAL-based playback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use sx_engine::Frame;

use crate::traits::{AudioError, PlaybackHandle};

/// Frames pushed per feeder pass before re-checking for seeks.
const FEED_BATCH: usize = 1024;

/// A frame on its way to the device, tagged with where it came from.
#[derive(Clone, Copy, Debug)]
struct Queued {
    /// Seek generation the frame was queued in
    epoch: u32,
    /// Song frame index
    index: u32,
    frame: Frame,
}

/// Seek generation plus the next song frame to play.
///
/// Packed into one atomic so a seek and a position update can't interleave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Playhead {
    epoch: u32,
    index: u32,
}

impl Playhead {
    fn pack(self) -> u64 {
        ((self.epoch as u64) << 32) | self.index as u64
    }

    fn unpack(bits: u64) -> Self {
        Self { epoch: (bits >> 32) as u32, index: bits as u32 }
    }
}

/// State shared by the player, the feeder thread and the stream callback.
#[derive(Debug, Default)]
struct Shared {
    playing: AtomicBool,
    shutdown: AtomicBool,
    /// Packed [`Playhead`]
    playhead: AtomicU64,
}

impl Shared {
    fn playhead(&self) -> Playhead {
        Playhead::unpack(self.playhead.load(Ordering::Acquire))
    }

    /// Start a new epoch at song frame `index`. Frames queued before this
    /// call are dropped by the callback.
    fn seek(&self, index: u32) {
        let mut current = self.playhead.load(Ordering::Acquire);
        loop {
            let epoch = Playhead::unpack(current).epoch.wrapping_add(1);
            let next = Playhead { epoch, index }.pack();
            match self.playhead.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Record `queued` as played. Returns `false` if a seek made it stale.
    fn advance(&self, queued: &Queued) -> bool {
        let mut current = self.playhead.load(Ordering::Acquire);
        loop {
            if Playhead::unpack(current).epoch != queued.epoch {
                return false;
            }
            let next = Playhead { epoch: queued.epoch, index: queued.index.saturating_add(1) }.pack();
            match self.playhead.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Plays a rendered song on the default output device.
///
/// A feeder thread copies frames into a ring buffer (about 100ms deep)
/// which the device callback drains. The playback position is the song
/// frame after the last one the callback consumed. When the device can't
/// run at the song's rate, the feeder steps through the song at
/// `song_rate / device_rate` frames per device frame.
pub struct CpalPlayer {
    shared: Arc<Shared>,
    len: usize,
    sample_rate: u32,
    output_rate: u32,
    stream: Stream,
    feeder: Option<JoinHandle<()>>,
}

impl CpalPlayer {
    /// Open the default device and prepare `frames` (at `sample_rate`) for
    /// playback. Starts paused.
    pub fn new(frames: Arc<[Frame]>, sample_rate: u32) -> Result<Self, AudioError> {
        if u32::try_from(frames.len()).is_err() {
            return Err(AudioError::Playback(format!("{} frames is too long to play", frames.len())));
        }

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let config = output_config(&device, sample_rate)?;
        let output_rate = config.sample_rate.0;

        let buffer_size = (output_rate as usize / 10).max(FEED_BATCH);
        let (producer, consumer) = HeapRb::<Queued>::new(buffer_size).split();

        let shared = Arc::new(Shared::default());
        let stream = build_stream(&device, &config, consumer, shared.clone())?;
        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;

        let len = frames.len();
        let step = sample_rate as f64 / output_rate as f64;
        let feeder = {
            let shared = shared.clone();
            thread::Builder::new()
                .name("sx-audio-feeder".into())
                .spawn(move || feed(frames, producer, shared, step))?
        };

        log::debug!("playback ready: {} frames at {} Hz, device at {} Hz", len, sample_rate, output_rate);
        Ok(Self {
            shared,
            len,
            sample_rate,
            output_rate,
            stream,
            feeder: Some(feeder),
        })
    }

    /// Rate the device stream actually runs at.
    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    fn position(&self) -> usize {
        self.shared.playhead().index as usize
    }
}

/// A stereo config at `sample_rate` if the device offers one, otherwise
/// the device's default rate with the channel count forced to 2.
fn output_config(device: &cpal::Device, sample_rate: u32) -> Result<StreamConfig, AudioError> {
    let wanted = SampleRate(sample_rate);
    match device.supported_output_configs() {
        Ok(mut configs) => {
            let supported = configs
                .find(|c| c.channels() == 2 && c.min_sample_rate() <= wanted && wanted <= c.max_sample_rate());
            if let Some(range) = supported {
                return Ok(range.with_sample_rate(wanted).into());
            }
        }
        Err(e) => log::warn!("couldn't list output configs: {}", e),
    }

    let default = device
        .default_output_config()
        .map_err(|e| AudioError::DeviceInit(e.to_string()))?;
    let mut config: StreamConfig = default.into();
    // The callback assumes 2-channel interleaving
    config.channels = 2;
    log::info!("device doesn't offer {} Hz, resampling to {} Hz", sample_rate, config.sample_rate.0);
    Ok(config)
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut consumer: HeapCons<Queued>,
    shared: Arc<Shared>,
) -> Result<Stream, AudioError> {
    let channels = config.channels as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                fill_output(data, channels, &shared, || consumer.try_pop());
            },
            |err| log::error!("audio stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::StreamCreate(e.to_string()))
}

/// Fill an interleaved device buffer from `pop`, dropping frames queued
/// before the most recent seek.
fn fill_output(data: &mut [f32], channels: usize, shared: &Shared, mut pop: impl FnMut() -> Option<Queued>) {
    if !shared.playing.load(Ordering::Relaxed) {
        data.fill(0.0);
        return;
    }

    for chunk in data.chunks_mut(channels) {
        let frame = loop {
            match pop() {
                Some(q) if !shared.advance(&q) => continue,
                Some(q) => break Some(q.frame),
                None => break None,
            }
        };
        match frame {
            Some(frame) => {
                let (left, right) = frame.to_f32();
                // Write stereo pair; zero-fill any extra channels
                for (i, sample) in chunk.iter_mut().enumerate() {
                    *sample = match i {
                        0 => left,
                        1 => right,
                        _ => 0.0,
                    };
                }
            }
            None => chunk.fill(0.0),
        }
    }
}

/// Queue up to [`FEED_BATCH`] device frames starting at song position
/// `cursor`, advancing it by `step` per frame. Stops early when `push`
/// refuses a frame; the cursor stays on the refused frame.
fn feed_batch(
    frames: &[Frame],
    epoch: u32,
    cursor: &mut f64,
    step: f64,
    mut push: impl FnMut(Queued) -> bool,
) -> usize {
    let mut pushed = 0;
    while pushed < FEED_BATCH {
        let index = *cursor as usize;
        if index >= frames.len() {
            break;
        }
        if !push(Queued { epoch, index: index as u32, frame: frames[index] }) {
            break;
        }
        *cursor += step;
        pushed += 1;
    }
    pushed
}

/// Feeder thread body: keep the ring buffer topped up from `frames`.
fn feed(frames: Arc<[Frame]>, mut producer: HeapProd<Queued>, shared: Arc<Shared>, step: f64) {
    let mut epoch = shared.playhead().epoch;
    let mut cursor = 0.0;

    while !shared.shutdown.load(Ordering::Relaxed) {
        let head = shared.playhead();
        if head.epoch != epoch {
            epoch = head.epoch;
            cursor = head.index as f64;
        }

        let pushed = feed_batch(&frames, epoch, &mut cursor, step, |q| producer.try_push(q).is_ok());
        if pushed == 0 {
            thread::sleep(Duration::from_millis(2));
        }
    }
}

impl PlaybackHandle for CpalPlayer {
    fn duration(&self) -> f64 {
        self.len as f64 / self.sample_rate as f64
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.position() >= self.len {
            self.seek(0.0);
        }
        self.shared.playing.store(true, Ordering::Relaxed);
        self.stream.play().map_err(|e| AudioError::Playback(e.to_string()))
    }

    fn pause(&mut self) -> Result<(), AudioError> {
        self.shared.playing.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn seek(&mut self, seconds: f64) {
        let target = (seconds.max(0.0) * self.sample_rate as f64).round() as usize;
        // len fits in u32, checked in new()
        self.shared.seek(target.min(self.len) as u32);
    }

    fn current_time(&self) -> f64 {
        self.position() as f64 / self.sample_rate as f64
    }

    fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Relaxed) && self.position() < self.len
    }
}

impl Drop for CpalPlayer {
    fn drop(&mut self) {
        self.shared.playing.store(false, Ordering::Relaxed);
        self.shared.shutdown.store(true, Ordering::Relaxed);
        if let Some(feeder) = self.feeder.take() {
            if feeder.join().is_err() {
                log::warn!("feeder thread panicked");
            }
        }
    }
}
