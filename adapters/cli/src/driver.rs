//! Headless loop that plays a full game against the emulated host clock.

use std::time::Duration;

use anyhow::{bail, Result};
use log::{debug, info};
use meter_rider_core::{
    Command, Dynamics, Event, GainDb, MeterReadings, RoundIndex, RoundScore,
};
use meter_rider_world::{self as world, query, World};

use crate::host_clock::HostClock;

const PAUSE_LENGTH: Duration = Duration::from_secs(1);
const WAVEFORM_TAIL: usize = 8;

/// Outcome of a completed headless game.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GameReport {
    pub(crate) rounds: Vec<(RoundIndex, RoundScore)>,
    pub(crate) total: u32,
    pub(crate) frames: u64,
    pub(crate) gain: GainDb,
    pub(crate) dynamics: Dynamics,
    pub(crate) final_readings: MeterReadings,
    pub(crate) waveform_tail: Vec<f64>,
}

/// Runs `world` until the game is over.
///
/// When `pause_every` is set the game is paused for one second of host time
/// after every such period of play. Fails if the game does not end within
/// `frame_limit` frames.
pub(crate) fn play(
    world: &mut World,
    clock: &mut HostClock,
    pause_every: Option<Duration>,
    frame_limit: u64,
) -> Result<GameReport> {
    let mut rounds = Vec::new();
    let mut final_readings = query::meter_readings(world);
    let mut waveform_tail = Vec::new();
    let mut frames = 0;

    let mut events = Vec::new();
    world::apply(world, Command::SetRunning { running: true }, &mut events);

    while !query::is_game_over(world) {
        if frames >= frame_limit {
            bail!("game did not finish within {frame_limit} frames");
        }

        let timestamp = clock.tick();
        if let Some(period) = pause_every {
            let running = should_run(timestamp, period);
            if running != query::is_running(world) {
                debug!("host toggles running to {running} at {timestamp:?}");
                world::apply(world, Command::SetRunning { running }, &mut events);
            }
        }

        // Readings and the waveform reset at round boundaries, so keep the
        // last committed values of the final round.
        world::apply(world, Command::Frame { timestamp }, &mut events);
        frames += 1;

        for event in events.drain(..) {
            match event {
                Event::MetersUpdated { readings } => final_readings = readings,
                Event::RoundScored { round, score } => {
                    waveform_tail = tail(world);
                    rounds.push((round, score));
                }
                Event::GameOver { total } => {
                    info!("game finished with {total} points after {frames} frames");
                }
                _ => {}
            }
        }
    }

    Ok(GameReport {
        rounds,
        total: query::total_score(world),
        frames,
        gain: query::gain(world),
        dynamics: query::dynamics(world),
        final_readings,
        waveform_tail,
    })
}

/// Generous upper bound on the frames a game may need.
pub(crate) fn frame_budget(
    rounds: u32,
    round_duration: Duration,
    fps: f64,
    jitter: f64,
    pause_every: Option<Duration>,
) -> u64 {
    let mut play_secs = f64::from(rounds) * round_duration.as_secs_f64();
    if let Some(period) = pause_every {
        play_secs *= 1.0 + PAUSE_LENGTH.as_secs_f64() / period.as_secs_f64();
    }
    let slowest_fps = fps * (1.0 - jitter);
    let expected = (play_secs + 1.0) * slowest_fps;
    ((expected * 2.0).ceil() as u64).saturating_add(100)
}

fn should_run(timestamp: Duration, period: Duration) -> bool {
    let cycle = period + PAUSE_LENGTH;
    let phase = timestamp.as_nanos() % cycle.as_nanos();
    phase < period.as_nanos()
}

fn tail(world: &World) -> Vec<f64> {
    let waveform = query::waveform(world);
    let skip = waveform.len().saturating_sub(WAVEFORM_TAIL);
    waveform.iter().skip(skip).collect()
}
