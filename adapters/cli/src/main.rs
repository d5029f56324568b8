#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Meter Rider game.

mod driver;
mod host_clock;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use meter_rider_world::{query, World};

use crate::{driver::GameReport, host_clock::HostClock, session::SessionFile};

/// Plays a game of Meter Rider against an emulated display-driven frame clock.
#[derive(Debug, Parser)]
#[command(name = "meter-rider", version)]
struct Cli {
    /// TOML session file with `[game]` and `[host]` tables.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed of the opening round.
    #[arg(long)]
    seed: Option<u32>,
    /// Number of rounds to play.
    #[arg(long)]
    rounds: Option<u32>,
    /// Countdown length of each round in seconds.
    #[arg(long, value_name = "SECONDS")]
    round_duration: Option<f64>,
    /// Gain held for the whole game, in decibels.
    #[arg(long, value_name = "DB", allow_negative_numbers = true)]
    gain: Option<f64>,
    /// Dynamics intensity held for the whole game.
    #[arg(long)]
    dynamics: Option<f64>,
    /// Nominal frame rate of the emulated host.
    #[arg(long)]
    fps: Option<f64>,
    /// Relative spread of the host frame intervals, below one.
    #[arg(long)]
    jitter: Option<f64>,
    /// Seed of the host frame interval generator.
    #[arg(long)]
    frame_seed: Option<u64>,
    /// Pause for one second after every this many seconds of host time.
    #[arg(long, value_name = "SECONDS")]
    pause_every: Option<f64>,
}

impl Cli {
    fn session(&self) -> Result<SessionFile> {
        let mut session = match &self.config {
            Some(path) => SessionFile::load(path)?,
            None => SessionFile::default(),
        };

        let game = &mut session.game;
        if let Some(seed) = self.seed {
            game.seed = seed;
        }
        if let Some(rounds) = self.rounds {
            game.rounds = rounds;
        }
        if let Some(duration) = self.round_duration {
            game.round_duration_secs = duration;
        }
        if let Some(gain) = self.gain {
            game.initial_gain_db = gain;
        }
        if let Some(dynamics) = self.dynamics {
            game.initial_dynamics = dynamics;
        }

        let host = &mut session.host;
        if let Some(fps) = self.fps {
            host.fps = fps;
        }
        if let Some(jitter) = self.jitter {
            host.jitter = jitter;
        }
        if let Some(frame_seed) = self.frame_seed {
            host.frame_seed = frame_seed;
        }
        if self.pause_every.is_some() {
            host.pause_every_secs = self.pause_every;
        }

        session.host.validate()?;
        Ok(session)
    }
}

/// Entry point for the Meter Rider command-line interface.
fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let session = cli.session()?;
    let host = session.host;
    let pause_every = host.pause_every()?;
    let frame_limit = driver::frame_budget(
        session.game.rounds,
        session.game.round_duration(),
        host.fps,
        host.jitter,
        pause_every,
    );

    let mut world = World::with_tuning(session.game).context("invalid game tuning")?;
    let mut clock = HostClock::new(&host);
    info!(
        "playing {} rounds at {} fps with seed {}",
        query::total_rounds(&world),
        host.fps,
        query::round_seed(&world).get()
    );

    let report = driver::play(&mut world, &mut clock, pause_every, frame_limit)?;
    info!("host clock stopped at {:?}", clock.now());
    print_report(&report);
    Ok(())
}

fn print_report(report: &GameReport) {
    for (round, score) in &report.rounds {
        println!("Round {}: {}", round.get(), score.get());
    }
    println!("Total: {}", report.total);
    println!(
        "Gain: {:.1} dB | Dynamics: {:.2}",
        report.gain.get(),
        report.dynamics.get()
    );

    let readings = report.final_readings.clamped();
    println!(
        "Final meters: VU {:.3} | Peak {:.3} | PPM {:.3} | LUFS {:.3}",
        readings.vu, readings.peak, readings.ppm, readings.lufs
    );
    let tail: Vec<String> = report
        .waveform_tail
        .iter()
        .map(|sample| format!("{sample:.3}"))
        .collect();
    println!("Waveform tail: [{}]", tail.join(", "));
    println!("Frames: {}", report.frames);
}
