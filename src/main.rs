//! sonant CLI: song info, WAV export, note previews and beat tracking.
//!
//! Usage:
//!   sonant info song.json
//!   sonant render song.json -o song.wav
//!   sonant beats song.json --difficulty hard
//!   sonant play song.json

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use sx_master::{Difficulty, EngineConfig, OfflinePlayer, SynthEngine};

/// Chiptune synthesizer and beat tracker for sonant-x songs
#[derive(Parser)]
#[command(name = "sonant")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output sample rate
    #[arg(long, global = true)]
    sample_rate: Option<u32>,

    /// Noise oscillator seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of a song and any problems in it
    Info {
        /// Song file (sonant-x JSON)
        song: PathBuf,
    },

    /// Render a song to a WAV file
    Render {
        song: PathBuf,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        /// Render instruments on all cores
        #[arg(long)]
        parallel: bool,
    },

    /// Render a single note of one instrument
    Note {
        song: PathBuf,

        /// Instrument index
        #[arg(short, long, default_value_t = 0)]
        instrument: usize,

        /// Note value (128 = reference pitch)
        #[arg(short, long, default_value_t = 128)]
        note: u8,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the beats a session would fire, without playing audio
    Beats {
        song: PathBuf,

        /// Seconds of playback to simulate (default: one pass of the song)
        #[arg(long)]
        seconds: Option<f64>,

        /// Polls per second
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        #[arg(short, long)]
        difficulty: Option<Difficulty>,

        /// Instrument whose notes drive the beat
        #[arg(long)]
        channel: Option<usize>,
    },

    /// Play a song with a live beat meter
    Play {
        song: PathBuf,

        #[arg(short, long)]
        difficulty: Option<Difficulty>,

        /// Stop after this many seconds (default: loop forever)
        #[arg(long)]
        seconds: Option<f64>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("reading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(rate) = cli.sample_rate {
        config.sample_rate = rate;
    }
    if let Some(seed) = cli.seed {
        config.noise_seed = seed;
    }

    match cli.command {
        Commands::Info { song } => info(&load(&song, config)?),
        Commands::Render { song, output, parallel } => render(&load(&song, config)?, &output, parallel),
        Commands::Note { song, instrument, note, output } => {
            let engine = load(&song, config)?;
            let package = engine.preview_note(instrument, note)?;
            write_file(&output, &package.to_wav())?;
            log::info!("wrote {:.2}s preview to {}", package.duration(), output.display());
            Ok(())
        }
        Commands::Beats { song, seconds, fps, difficulty, channel } => {
            if let Some(d) = difficulty {
                config.beat.difficulty = d;
                config.beat.cooldown = None;
            }
            if let Some(ch) = channel {
                config.beat.channel = ch;
            }
            beats(&load(&song, config)?, seconds, fps)
        }
        Commands::Play { song, difficulty, seconds } => {
            if let Some(d) = difficulty {
                config.beat.difficulty = d;
                config.beat.cooldown = None;
            }
            play(&load(&song, config)?, seconds)
        }
    }
}

fn load(path: &Path, config: EngineConfig) -> Result<SynthEngine> {
    SynthEngine::load(path, config).with_context(|| format!("loading {}", path.display()))
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))
}

fn info(engine: &SynthEngine) -> Result<()> {
    let song = engine.song();
    let sample_rate = engine.config().sample_rate;
    println!("Title:       {}", song.title);
    println!("Row length:  {} samples ({:.1} ms)", song.row_len, song.row_duration(sample_rate) * 1000.0);
    println!("Instruments: {}", song.instruments.len());
    println!("Music ends:  {:.2}s", song.music_duration(sample_rate));
    println!();
    print!("{}", sx_ir::analyze(song));

    let issues = engine.issues();
    if !issues.is_empty() {
        println!();
        println!("Issues:");
        for issue in issues {
            println!("  {}", issue);
        }
    }
    Ok(())
}

fn render(engine: &SynthEngine, output: &Path, parallel: bool) -> Result<()> {
    let start = Instant::now();
    let package = if parallel {
        engine.generate_parallel()
    } else {
        let job = engine
            .job()
            .with_progress(Box::new(|done, total| log::info!("rendered {}/{}", done, total)));
        match job.run_sliced(|_| {}) {
            Some(package) => package,
            None => bail!("generation did not finish"),
        }
    };
    log::info!("generated {:.2}s of audio in {:.2?}", package.duration(), start.elapsed());

    write_file(output, &package.to_wav())?;
    println!("Wrote {} ({} bytes of PCM)", output.display(), package.byte_len());
    Ok(())
}

fn beats(engine: &SynthEngine, seconds: Option<f64>, fps: f64) -> Result<()> {
    if !(fps > 0.0) {
        bail!("--fps must be positive");
    }
    let song = engine.song();
    let seconds = seconds.unwrap_or(song.song_len);
    let mut session = engine.session(OfflinePlayer::new(song.song_len));
    session.play()?;

    let dt = 1.0 / fps;
    let mut elapsed = 0.0;
    let mut count = 0;
    println!("{:>9}  {:>8}", "time", "strength");
    while elapsed < seconds {
        session.player_mut().advance(dt);
        elapsed += dt;
        let report = session.tick();
        if report.looped {
            println!("-- loop at {:.3}s --", elapsed);
        }
        if report.beat {
            count += 1;
            println!("{:>8.3}s  {:>8.3}", report.time, report.strength);
        }
    }
    println!("{} beats in {:.1}s (cooldown {:.1}s)", count, seconds, engine.config().beat.cooldown());
    Ok(())
}

fn play(engine: &SynthEngine, seconds: Option<f64>) -> Result<()> {
    println!("Generating...");
    let package = engine
        .job()
        .run_sliced(|job| {
            let (done, total) = job.progress();
            print!("\r{:3}%", done * 100 / total);
            let _ = std::io::stdout().flush();
        })
        .context("generation did not finish")?;
    println!("\rPlaying {} ({:.1}s)", engine.song().title, package.duration());

    let player = engine.open_player(&package)?;
    let mut session = engine.session(player);
    session.play()?;

    let start = Instant::now();
    let mut beats = 0;
    loop {
        let report = session.tick();
        if report.beat {
            beats += 1;
        }
        let meter = (report.strength * 20.0).round() as usize;
        print!(
            "\r{:7.2}s {} [{:<20}] beats: {}",
            report.time,
            if report.beat { '*' } else { ' ' },
            "#".repeat(meter.min(20)),
            beats
        );
        let _ = std::io::stdout().flush();

        if seconds.is_some_and(|s| start.elapsed().as_secs_f64() >= s) {
            break;
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    session.pause()?;
    println!("\nDone.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn difficulty_flag_parses() {
        let cli = Cli::parse_from(["sonant", "beats", "song.json", "--difficulty", "hard", "--fps", "30"]);
        match cli.command {
            Commands::Beats { difficulty, fps, .. } => {
                assert_eq!(difficulty, Some(Difficulty::Hard));
                assert_eq!(fps, 30.0);
            }
            _ => panic!("expected beats"),
        }
        assert!(Cli::try_parse_from(["sonant", "play", "song.json", "-d", "brutal"]).is_err());
    }
}
