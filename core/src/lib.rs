#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Meter Rider engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing player input and host frames, the world executes those commands
//! via its `apply` entry point, and then broadcasts [`Event`] values describing
//! what the metering chain and the round state machine did in response.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod tuning;

pub use tuning::{GameTuning, LoudnessTuning, ScoringTuning, TuningError};

/// Smallest frame delta the simulation will ever integrate over.
///
/// Stalled or repeated host timestamps are floored to this value so the
/// envelope coefficients never degenerate.
pub const MIN_FRAME_DT: Duration = Duration::from_millis(1);

/// Floors a host frame delta to [`MIN_FRAME_DT`].
#[must_use]
pub fn floor_frame_dt(dt: Duration) -> Duration {
    dt.max(MIN_FRAME_DT)
}

/// Number of instantaneous samples retained for waveform display.
pub const WAVEFORM_CAPACITY: usize = 200;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation by one host frame.
    Frame {
        /// Host timestamp of the frame, measured from an arbitrary fixed origin.
        timestamp: Duration,
    },
    /// Updates the gain the player is riding.
    SetGain {
        /// New gain applied to the synthetic source.
        gain: GainDb,
    },
    /// Updates the intensity of transient spikes in the synthetic source.
    SetDynamics {
        /// New dynamics intensity.
        dynamics: Dynamics,
    },
    /// Starts or pauses the simulation.
    SetRunning {
        /// Whether frames should advance the signal, meters and countdown.
        running: bool,
    },
    /// Ends the current round early and scores it.
    SubmitRound,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced, whether or not it is running.
    FrameAdvanced {
        /// Floored time delta since the previous frame.
        dt: Duration,
    },
    /// Reports the instantaneous sample synthesised for a running frame.
    SampleGenerated {
        /// Sample value, never above one.
        sample: f64,
    },
    /// Reports the meter values committed at the end of a running frame.
    MetersUpdated {
        /// Unclamped meter readings.
        readings: MeterReadings,
    },
    /// Confirms that a round was scored.
    RoundScored {
        /// Round that was scored.
        round: RoundIndex,
        /// Score awarded for the round.
        score: RoundScore,
    },
    /// Announces that a new round started with a fresh signal seed.
    RoundStarted {
        /// Round that became active.
        round: RoundIndex,
        /// Seed the signal generator was reset to.
        seed: Seed,
    },
    /// Announces that the final round was scored and the game ended.
    GameOver {
        /// Sum of all round scores.
        total: u32,
    },
    /// Confirms a change of the running flag.
    RunningChanged {
        /// Running flag after processing the command.
        running: bool,
    },
    /// Reports that a submission arrived after the game ended and was dropped.
    SubmissionIgnored,
}

/// Gain applied to the synthetic source, expressed in decibels.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct GainDb(f64);

impl GainDb {
    /// Creates a new gain value. Non-finite inputs collapse to unity gain.
    #[must_use]
    pub fn new(decibels: f64) -> Self {
        if decibels.is_finite() {
            Self(decibels)
        } else {
            Self(0.0)
        }
    }

    /// Retrieves the gain in decibels.
    #[must_use]
    pub const fn get(&self) -> f64 {
        self.0
    }

    /// Converts the gain into a linear amplitude factor.
    #[must_use]
    pub fn linear(&self) -> f64 {
        10f64.powf(self.0 / 20.0)
    }
}

/// Intensity of transient spikes in the synthetic source, within `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Dynamics(f64);

impl Dynamics {
    /// Creates a new dynamics value clamped into `[0, 1]`.
    ///
    /// Non-finite inputs produce zero dynamics.
    #[must_use]
    pub fn new(intensity: f64) -> Self {
        if intensity.is_finite() {
            Self(intensity.clamp(0.0, 1.0))
        } else {
            Self(0.0)
        }
    }

    /// Retrieves the intensity.
    #[must_use]
    pub const fn get(&self) -> f64 {
        self.0
    }
}

/// Seed that determines a round's signal character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seed(u32);

impl Seed {
    /// Creates a new seed wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the raw seed value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Seed used for the round that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// One-based index of a round within a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoundIndex(u32);

impl RoundIndex {
    /// Index of the opening round.
    pub const FIRST: Self = Self(1);

    /// Creates a new round index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the round that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Points awarded for a single round, between 0 and 100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoundScore(u32);

impl RoundScore {
    /// Creates a new round score.
    #[must_use]
    pub const fn new(points: u32) -> Self {
        Self(points)
    }

    /// Retrieves the awarded points.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Snapshot of every meter in the chain after a frame.
///
/// Values are the raw smoothed levels. They stay close to `[0, 1]` but are
/// not clamped; use [`MeterReadings::clamped`] before presenting them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterReadings {
    /// Slow symmetric VU level.
    pub vu: f64,
    /// Fast-attack peak detector level.
    pub peak: f64,
    /// PPM level as displayed, including the peak-hold ceiling.
    pub ppm: f64,
    /// PPM ballistic level without the hold ceiling.
    pub ppm_core: f64,
    /// Windowed RMS loudness. This approximates LUFS and is not a BS.1770 measurement.
    pub lufs: f64,
}

impl MeterReadings {
    /// Returns the readings clamped into `[0, 1]` for display.
    ///
    /// Non-finite values are presented as zero.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            vu: display_level(self.vu),
            peak: display_level(self.peak),
            ppm: display_level(self.ppm),
            ppm_core: display_level(self.ppm_core),
            lufs: display_level(self.lufs),
        }
    }
}

fn display_level(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
