#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Meter Rider.
//!
//! The world owns every piece of mutable simulation state: the frame clock, the
//! random stream, the meter bank, the loudness window, the waveform history and
//! the round state machine. Adapters mutate it exclusively through [`apply`]
//! and observe it through the [`query`] module.

mod clock;
mod round;

use std::{collections::VecDeque, time::Duration};

use log::{debug, info, trace};
use meter_rider_core::{
    Command, Dynamics, Event, GainDb, GameTuning, MeterReadings, RoundIndex, Seed, TuningError,
    WAVEFORM_CAPACITY,
};
use meter_rider_system_metering::{LoudnessWindow, MeterBank};
use meter_rider_system_scoring::score_round;
use meter_rider_system_signal::{RandomState, SignalGenerator};

use self::{clock::SimulationClock, round::RoundState};

/// Represents the authoritative Meter Rider world state.
#[derive(Debug)]
pub struct World {
    tuning: GameTuning,
    clock: SimulationClock,
    random: RandomState,
    generator: SignalGenerator,
    meters: MeterBank,
    loudness: LoudnessWindow,
    waveform: VecDeque<f64>,
    readings: MeterReadings,
    gain: GainDb,
    dynamics: Dynamics,
    round: RoundState,
}

impl World {
    /// Creates a new world using the default tuning, paused on round one.
    #[must_use]
    pub fn new() -> Self {
        Self::build(GameTuning::default())
    }

    /// Creates a new world from a custom tuning, paused on round one.
    pub fn with_tuning(tuning: GameTuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self::build(tuning))
    }

    fn build(tuning: GameTuning) -> Self {
        let seed = tuning.initial_seed();
        Self {
            clock: SimulationClock::new(),
            random: RandomState::seeded(seed),
            generator: SignalGenerator::new(seed),
            meters: MeterBank::default(),
            loudness: LoudnessWindow::new(tuning.loudness),
            waveform: VecDeque::with_capacity(WAVEFORM_CAPACITY + 1),
            readings: MeterReadings::default(),
            gain: tuning.initial_gain(),
            dynamics: tuning.initial_dynamics(),
            round: RoundState::new(tuning.round_duration()),
            tuning,
        }
    }

    fn step(&mut self, dt: Duration, wall_time: Duration, out_events: &mut Vec<Event>) {
        let (sample, random) = self
            .generator
            .next(self.random, self.gain, self.dynamics, wall_time);
        self.random = random;

        self.meters = self.meters.step(sample, dt);
        let lufs = self.loudness.push(sample, dt);
        self.readings = self.meters.readings(lufs);
        self.round.observe_peak(self.readings.peak);
        self.record_sample(sample);

        trace!("frame dt={dt:?} sample={sample:.4} readings={:?}", self.readings);
        out_events.push(Event::SampleGenerated { sample });
        out_events.push(Event::MetersUpdated {
            readings: self.readings,
        });

        if self.round.count_down(dt) {
            self.submit_round(out_events);
        }
    }

    fn record_sample(&mut self, sample: f64) {
        self.waveform.push_back(sample);
        while self.waveform.len() > WAVEFORM_CAPACITY {
            let _ = self.waveform.pop_front();
        }
    }

    fn submit_round(&mut self, out_events: &mut Vec<Event>) {
        if self.round.game_over {
            debug!("ignoring submission after game over");
            out_events.push(Event::SubmissionIgnored);
            return;
        }

        let round = self.round.index;
        let score = score_round(self.gain, self.round.peak, &self.tuning.scoring);
        self.round.scores.push(score);
        info!(
            "round {} scored {} (gain {:.1} dB, peak {:.3})",
            round.get(),
            score.get(),
            self.gain.get(),
            self.round.peak
        );
        out_events.push(Event::RoundScored { round, score });

        if round.get() < self.tuning.rounds {
            let seed = self.generator.seed().next();
            self.reset_round(round.next(), seed);
            info!("round {} started with seed {}", round.next().get(), seed.get());
            out_events.push(Event::RoundStarted {
                round: round.next(),
                seed,
            });
            return;
        }

        let was_running = self.round.running;
        self.round.game_over = true;
        self.round.running = false;
        let total = self.round.total_score();
        info!("game over with {total} points");
        out_events.push(Event::GameOver { total });
        if was_running {
            out_events.push(Event::RunningChanged { running: false });
        }
    }

    /// Moves every piece of per-round state to the start of `round` in one go.
    fn reset_round(&mut self, round: RoundIndex, seed: Seed) {
        self.random = RandomState::seeded(seed);
        self.generator = SignalGenerator::new(seed);
        self.meters = MeterBank::default();
        self.loudness.clear();
        self.waveform.clear();
        self.readings = MeterReadings::default();
        self.round.index = round;
        self.round.remaining = self.tuning.round_duration();
        self.round.peak = 0.0;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Frame { timestamp } => {
            let dt = world.clock.advance(timestamp);
            out_events.push(Event::FrameAdvanced { dt });
            if world.round.is_live() {
                world.step(dt, timestamp, out_events);
            }
        }
        Command::SetGain { gain } => {
            world.gain = gain;
        }
        Command::SetDynamics { dynamics } => {
            world.dynamics = dynamics;
        }
        Command::SetRunning { running } => {
            if world.round.game_over {
                debug!("ignoring running change after game over");
                return;
            }
            if world.round.running != running {
                world.round.running = running;
                debug!("running set to {running}");
                out_events.push(Event::RunningChanged { running });
            }
        }
        Command::SubmitRound => world.submit_round(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::{collections::VecDeque, time::Duration};

    use super::World;
    use meter_rider_core::{Dynamics, GainDb, MeterReadings, RoundIndex, RoundScore, Seed};

    /// Latest unclamped meter readings.
    #[must_use]
    pub fn meter_readings(world: &World) -> MeterReadings {
        world.readings
    }

    /// Latest meter readings clamped into `[0, 1]` for display.
    #[must_use]
    pub fn display_readings(world: &World) -> MeterReadings {
        world.readings.clamped()
    }

    /// Captures a read-only view of the recent instantaneous samples.
    #[must_use]
    pub fn waveform(world: &World) -> WaveformView<'_> {
        WaveformView {
            samples: &world.waveform,
        }
    }

    /// Round currently being played, or the last round once the game is over.
    #[must_use]
    pub fn round_index(world: &World) -> RoundIndex {
        world.round.index
    }

    /// Number of rounds in the game.
    #[must_use]
    pub fn total_rounds(world: &World) -> u32 {
        world.tuning.rounds
    }

    /// Countdown left in the current round.
    #[must_use]
    pub fn time_remaining(world: &World) -> Duration {
        world.round.remaining
    }

    /// Countdown left in the current round rounded up to whole seconds.
    #[must_use]
    pub fn time_remaining_display(world: &World) -> u64 {
        let remaining = world.round.remaining;
        if remaining.subsec_nanos() == 0 {
            remaining.as_secs()
        } else {
            remaining.as_secs().saturating_add(1)
        }
    }

    /// Scores of every completed round, in order.
    #[must_use]
    pub fn round_scores(world: &World) -> &[RoundScore] {
        &world.round.scores
    }

    /// Sum of every completed round's score.
    #[must_use]
    pub fn total_score(world: &World) -> u32 {
        world.round.total_score()
    }

    /// Reports whether the final round has been scored.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.round.game_over
    }

    /// Reports whether frames currently advance the simulation.
    #[must_use]
    pub fn is_running(world: &World) -> bool {
        world.round.running
    }

    /// Gain currently applied to the source.
    #[must_use]
    pub fn gain(world: &World) -> GainDb {
        world.gain
    }

    /// Dynamics intensity currently applied to the source.
    #[must_use]
    pub fn dynamics(world: &World) -> Dynamics {
        world.dynamics
    }

    /// Seed the current round's signal was generated from.
    #[must_use]
    pub fn round_seed(world: &World) -> Seed {
        world.generator.seed()
    }

    /// Highest peak-meter level observed during the current round.
    #[must_use]
    pub fn round_peak(world: &World) -> f64 {
        world.round.peak
    }

    /// Seconds of audio currently retained by the loudness window.
    #[must_use]
    pub fn loudness_window_duration(world: &World) -> f64 {
        world.loudness.retained_secs()
    }

    /// Floored delta of the most recent frame.
    #[must_use]
    pub fn last_frame_dt(world: &World) -> Duration {
        world.clock.dt()
    }

    /// Read-only view of the waveform history, oldest sample first.
    #[derive(Clone, Copy, Debug)]
    pub struct WaveformView<'a> {
        samples: &'a VecDeque<f64>,
    }

    impl<'a> WaveformView<'a> {
        /// Iterator over the samples in chronological order.
        pub fn iter(&self) -> impl Iterator<Item = f64> + 'a {
            self.samples.iter().copied()
        }

        /// Number of samples currently held.
        #[must_use]
        pub fn len(&self) -> usize {
            self.samples.len()
        }

        /// Reports whether the history is empty.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.samples.is_empty()
        }

        /// Most recent sample, if any.
        #[must_use]
        pub fn latest(&self) -> Option<f64> {
            self.samples.back().copied()
        }

        /// Copies the samples into an owned vector.
        #[must_use]
        pub fn to_vec(&self) -> Vec<f64> {
            self.iter().collect()
        }
    }
}
